//! SAC pole-zero file parser and writer.
//!
//! ```text
//! * NETWORK   (KNETWK): IU
//! ZEROS   3
//! POLES   5
//!     -0.0370  +0.0370
//!     -0.0370  -0.0370
//!     ...
//! CONSTANT  6.0e17
//! ```
//!
//! Keywords are case-insensitive and sections may come in any order. A
//! missing CONSTANT means 1.0. Any line that is not a keyword, comment, blank
//! or value pair is a syntax error.

use crate::error::ParseError;
use lib_dsp::SacPoleZero;
use lib_types::Complex64;
use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, digit1, line_ending, not_line_ending, space0, space1},
    combinator::{eof, map, map_res, opt, value},
    multi::many0,
    number::complete::double,
    sequence::preceded,
    IResult, Parser,
};
use std::fmt;
use std::path::Path;

/// Parsed SAC pole-zero file: header comments plus the response.
#[derive(Clone, Debug, PartialEq)]
pub struct SacPzFile {
    /// Comment lines without the leading `*`, in file order.
    pub comments: Vec<String>,
    pub pole_zero: SacPoleZero,
}

impl SacPzFile {
    pub fn new(pole_zero: SacPoleZero) -> Self {
        Self {
            comments: Vec::new(),
            pole_zero,
        }
    }

    pub fn with_comments(mut self, comments: Vec<String>) -> Self {
        self.comments = comments;
        self
    }

    /// Value of a `KEY ... : value` header comment, matched on the key prefix
    /// ignoring case.
    ///
    /// `header("network")` finds `* NETWORK   (KNETWK): IU`.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.comments.iter().find_map(|line| {
            let (name, value) = line.split_once(':')?;
            let name = name.trim();
            if name.get(..key.len()).map_or(false, |prefix| prefix.eq_ignore_ascii_case(key)) {
                Some(value.trim())
            } else {
                None
            }
        })
    }

    pub fn into_pole_zero(self) -> SacPoleZero {
        self.pole_zero
    }
}

impl fmt::Display for SacPzFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", write_sacpz(&self.pole_zero, &self.comments))
    }
}

/// Parse SAC pole-zero text.
pub fn parse_sacpz(content: &str) -> Result<SacPzFile, ParseError> {
    let (remaining, lines) = many0(parse_line).parse(content)?;

    if !remaining.trim().is_empty() {
        let preview: String = remaining.lines().next().unwrap_or_default().chars().take(40).collect();
        return Err(ParseError::syntax(
            lines.len() + 1,
            format!("expected a keyword, comment or value pair, found {:?}", preview),
        ));
    }

    build_file(&lines)
}

/// Parse a SAC pole-zero file from a path.
pub fn parse_sacpz_file(path: &Path) -> Result<SacPzFile, ParseError> {
    let content = std::fs::read_to_string(path)?;
    let file = parse_sacpz(&content)?;
    tracing::debug!(
        path = %path.display(),
        zeros = file.pole_zero.zeros.len(),
        poles = file.pole_zero.poles.len(),
        "Parsed SAC pole-zero file"
    );
    Ok(file)
}

/// Render a response as SAC pole-zero text, every zero and pole listed.
pub fn write_sacpz(pole_zero: &SacPoleZero, comments: &[String]) -> String {
    let mut out = String::new();
    for comment in comments {
        out.push_str(&format!("* {}\n", comment));
    }
    out.push_str(&format!("ZEROS\t{}\n", pole_zero.zeros.len()));
    for z in &pole_zero.zeros {
        out.push_str(&format!("\t{:+e}\t{:+e}\n", z.re, z.im));
    }
    out.push_str(&format!("POLES\t{}\n", pole_zero.poles.len()));
    for p in &pole_zero.poles {
        out.push_str(&format!("\t{:+e}\t{:+e}\n", p.re, p.im));
    }
    out.push_str(&format!("CONSTANT\t{:e}\n", pole_zero.constant));
    out
}

// ============================================================================
// Nom Parsers (nom 8 compatible)
// ============================================================================

/// One physical line of the file.
#[derive(Clone, Debug, PartialEq)]
enum Line<'a> {
    Blank,
    Comment(&'a str),
    Zeros(usize),
    Poles(usize),
    Constant(f64),
    Pair(f64, f64),
}

fn parse_line(input: &str) -> IResult<&str, Line<'_>> {
    alt((comment_line, blank_line, header_line, pair_line)).parse(input)
}

fn comment_line(input: &str) -> IResult<&str, Line<'_>> {
    map(
        (space0, char('*'), not_line_ending, opt(line_ending)),
        |(_, _, text, _): (&str, char, &str, Option<&str>)| Line::Comment(text.trim()),
    )
    .parse(input)
}

fn blank_line(input: &str) -> IResult<&str, Line<'_>> {
    value(Line::Blank, (space0, line_ending)).parse(input)
}

fn count(input: &str) -> IResult<&str, usize> {
    map_res(digit1, str::parse::<usize>).parse(input)
}

/// Trailing blanks and an optional `*` comment up to the end of the line.
fn end_of_line(input: &str) -> IResult<&str, ()> {
    map(
        (
            space0,
            opt(preceded(char('*'), not_line_ending)),
            alt((line_ending, eof)),
        ),
        |_| (),
    )
    .parse(input)
}

fn header_line(input: &str) -> IResult<&str, Line<'_>> {
    let (input, _) = space0(input)?;
    let (input, line) = alt((
        map(preceded((tag_no_case("ZEROS"), space1), count), Line::Zeros),
        map(preceded((tag_no_case("POLES"), space1), count), Line::Poles),
        map(preceded((tag_no_case("CONSTANT"), space1), double), Line::Constant),
    ))
    .parse(input)?;
    let (input, _) = end_of_line(input)?;
    Ok((input, line))
}

fn pair_line(input: &str) -> IResult<&str, Line<'_>> {
    let (input, _) = space0(input)?;
    let (input, re) = double(input)?;
    let (input, _) = space1(input)?;
    let (input, im) = double(input)?;
    let (input, _) = end_of_line(input)?;
    Ok((input, Line::Pair(re, im)))
}

// ============================================================================
// Assembly
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Zeros,
    Poles,
    Constant,
}

impl Section {
    fn name(self) -> &'static str {
        match self {
            Section::Zeros => "ZEROS",
            Section::Poles => "POLES",
            Section::Constant => "CONSTANT",
        }
    }
}

/// Declared count and listed values of a ZEROS or POLES section.
#[derive(Default)]
struct RootList {
    declared: Option<usize>,
    listed: Vec<Complex64>,
}

impl RootList {
    fn open(&mut self, count: usize, line: usize, section: Section) -> Result<(), ParseError> {
        if self.declared.is_some() {
            return Err(ParseError::syntax(line, format!("duplicate {} section", section.name())));
        }
        self.declared = Some(count);
        Ok(())
    }

    /// Listed values padded with origin roots up to the declared count.
    fn finish(self, section: Section) -> Result<Vec<Complex64>, ParseError> {
        let declared = self.declared.unwrap_or(0);
        if self.listed.len() > declared {
            return Err(ParseError::invalid_value(
                section.name(),
                format!("{} values listed but {} declared", self.listed.len(), declared),
            ));
        }
        let mut roots = self.listed;
        roots.resize(declared, Complex64::new(0.0, 0.0));
        Ok(roots)
    }
}

fn build_file(lines: &[Line<'_>]) -> Result<SacPzFile, ParseError> {
    let mut comments = Vec::new();
    let mut zeros = RootList::default();
    let mut poles = RootList::default();
    let mut constant: Option<f64> = None;
    let mut current: Option<Section> = None;

    // Every parsed item is exactly one line.
    for (index, line) in lines.iter().enumerate() {
        let line_no = index + 1;
        match *line {
            Line::Blank => {}
            Line::Comment(text) => comments.push(text.to_string()),
            Line::Zeros(n) => {
                zeros.open(n, line_no, Section::Zeros)?;
                current = Some(Section::Zeros);
            }
            Line::Poles(n) => {
                poles.open(n, line_no, Section::Poles)?;
                current = Some(Section::Poles);
            }
            Line::Constant(c) => {
                if constant.is_some() {
                    return Err(ParseError::syntax(line_no, "duplicate CONSTANT"));
                }
                constant = Some(c);
                current = Some(Section::Constant);
            }
            Line::Pair(re, im) => match current {
                Some(Section::Zeros) => zeros.listed.push(Complex64::new(re, im)),
                Some(Section::Poles) => poles.listed.push(Complex64::new(re, im)),
                _ => {
                    return Err(ParseError::syntax(
                        line_no,
                        "value pair outside a ZEROS or POLES section",
                    ))
                }
            },
        }
    }

    if zeros.declared.is_none() && poles.declared.is_none() && constant.is_none() {
        return Err(ParseError::missing_section("ZEROS, POLES or CONSTANT"));
    }

    let zeros = zeros.finish(Section::Zeros)?;
    let poles = poles.finish(Section::Poles)?;
    let constant = constant.unwrap_or(1.0);

    Ok(SacPzFile {
        comments,
        pole_zero: SacPoleZero::new(poles, zeros, constant),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PZ: &str = "* **********************************
* NETWORK   (KNETWK): IU
* STATION    (KSTNM): HRV
* CHANNEL   (KCMPNM): BHE
* INPUT UNIT        : M
* **********************************
ZEROS\t3
POLES\t5
\t-3.700400e-02\t+3.701600e-02
\t-3.700400e-02\t-3.701600e-02
\t-2.513300e+02\t+0.000000e+00
\t-1.310400e+02\t-4.672900e+02
\t-1.310400e+02\t+4.672900e+02
CONSTANT\t+3.948580e+17
";

    #[test]
    fn test_parse_iris_style() {
        let file = parse_sacpz(SAMPLE_PZ).unwrap();
        let pz = &file.pole_zero;

        assert_eq!(pz.zeros, vec![Complex64::new(0.0, 0.0); 3]);
        assert_eq!(pz.poles.len(), 5);
        assert_eq!(pz.poles[2], Complex64::new(-251.33, 0.0));
        assert!((pz.poles[0].im - 0.037016).abs() < 1e-12);
        assert!((pz.constant - 3.94858e17).abs() / 3.94858e17 < 1e-12);

        assert_eq!(file.header("network"), Some("IU"));
        assert_eq!(file.header("STATION"), Some("HRV"));
        assert_eq!(file.header("input unit"), Some("M"));
        assert_eq!(file.header("location"), None);
    }

    #[test]
    fn test_partial_zero_list_is_padded() {
        let text = "zeros 3\n  -1.5 0.0\npoles 1\n  -2.0 0.0 * damping\nconstant 4.0\n";
        let pz = parse_sacpz(text).unwrap().into_pole_zero();
        assert_eq!(
            pz.zeros,
            vec![Complex64::new(-1.5, 0.0), Complex64::new(0.0, 0.0), Complex64::new(0.0, 0.0)]
        );
        assert_eq!(pz.poles, vec![Complex64::new(-2.0, 0.0)]);
        assert_eq!(pz.constant, 4.0);
    }

    #[test]
    fn test_sections_in_any_order_and_default_constant() {
        let text = "POLES 2\n-1 1\n-1 -1\n\nZEROS 0\n";
        let pz = parse_sacpz(text).unwrap().into_pole_zero();
        assert_eq!(pz.poles.len(), 2);
        assert!(pz.zeros.is_empty());
        assert_eq!(pz.constant, 1.0);
    }

    #[test]
    fn test_too_many_values() {
        let err = parse_sacpz("ZEROS 1\n0 0\n1 0\nPOLES 0\nCONSTANT 1\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidValue { ref field, .. } if field == "ZEROS"));
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(
            parse_sacpz("ZEROS 1\nZEROS 2\n"),
            Err(ParseError::Syntax { line: 2, .. })
        ));
        assert!(matches!(
            parse_sacpz("* header\n1.0 2.0\nPOLES 1\n"),
            Err(ParseError::Syntax { line: 2, .. })
        ));
        assert!(matches!(
            parse_sacpz("CONSTANT 2\n1.0 2.0\n"),
            Err(ParseError::Syntax { line: 2, .. })
        ));
        assert!(matches!(parse_sacpz("* only comments\n"), Err(ParseError::Missing { .. })));
    }

    #[test]
    fn test_malformed_line_is_rejected() {
        let err = parse_sacpz("ZEROS 1\n0 0\nPOLES 3\n-1 1\n-1,-1\n-2 0\nCONSTANT 5e9\n").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 5, .. }), "{:?}", err);

        let err = parse_sacpz("POLES 1\n-1 0\nCONSTANT 2\nthis is not pole-zero text\n").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 4, .. }), "{:?}", err);
    }

    #[test]
    fn test_write_then_parse() {
        let pz = SacPoleZero::new(
            vec![Complex64::new(-0.0123456789, 0.0370161), Complex64::new(-0.0123456789, -0.0370161)],
            vec![Complex64::new(0.0, 0.0), Complex64::new(-15.15, 0.0)],
            -8.184e11,
        );
        let file = SacPzFile::new(pz.clone()).with_comments(vec!["NETWORK   (KNETWK): XX".into()]);
        let text = file.to_string();
        assert!(text.starts_with("* NETWORK   (KNETWK): XX\nZEROS\t2\n"));

        let parsed = parse_sacpz(&text).unwrap();
        assert_eq!(parsed.pole_zero, pz);
        assert_eq!(parsed.header("network"), Some("XX"));
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.pz");
        std::fs::write(&path, SAMPLE_PZ).unwrap();

        let file = parse_sacpz_file(&path).unwrap();
        assert_eq!(file.pole_zero.poles.len(), 5);

        assert!(matches!(
            parse_sacpz_file(&dir.path().join("missing.pz")),
            Err(ParseError::Io(_))
        ));
    }
}
