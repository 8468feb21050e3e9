//! Error types for SAC pole-zero parsing.

use thiserror::Error;

/// Errors that can occur while reading a SAC pole-zero file.
#[derive(Debug, Error)]
pub enum ParseError {
    /// I/O error reading the file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Syntax error on a given line.
    #[error("Syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// Missing required section.
    #[error("Missing required {kind}: {name}")]
    Missing { kind: &'static str, name: String },

    /// Inconsistent value for a field.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Nom parsing error (internal).
    #[error("Parse error: {0}")]
    Nom(String),
}

impl ParseError {
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    pub fn missing_section(name: impl Into<String>) -> Self {
        Self::Missing {
            kind: "section",
            name: name.into(),
        }
    }

    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl<'a> From<nom::Err<nom::error::Error<&'a str>>> for ParseError {
    fn from(err: nom::Err<nom::error::Error<&'a str>>) -> Self {
        match err {
            nom::Err::Incomplete(_) => ParseError::Nom("Incomplete input".to_string()),
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                let preview: String = e.input.chars().take(20).collect();
                ParseError::Nom(format!("{:?} at '{}...'", e.code, preview))
            }
        }
    }
}
