//! 80-byte header card parsing.
//!
//! A card is one line of a FITS header: an eight-byte keyword, optionally
//! the value indicator `"= "`, then a value area that may hold a quoted
//! string, a number, a logical and a `/`-prefixed comment. FITS mandates
//! the fixed format (value in columns 11-30, strings opening at column
//! 11) but real files are loose about it, so the parser is tolerant: a
//! value area it cannot make sense of yields `value = None` and the raw
//! 80-byte line is retained for downstream re-parsing.

use log::warn;
use serde::Serialize;

use crate::error::Error;

/// Number of bytes of a header card.
pub const CARD_SIZE: usize = 80;
/// Number of bytes of the keyword token starting a card.
pub const KEYWORD_SIZE: usize = 8;

/// A scalar value held in the value area of a card.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Logical(bool),
    CharacterString(String),
    /// The value area was blank.
    Undefined,
}

/// One parsed 80-byte line of a header.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct Card {
    /// The leading eight-byte token, right-trimmed.
    pub keyword: String,
    /// The raw 80-byte line, kept verbatim so callers can re-parse
    /// value areas this crate refuses.
    pub raw: String,
    /// The parsed value field. `None` when the card carries no value
    /// indicator or when the value area failed to parse.
    pub value: Option<Value>,
    /// Any single-quoted string appearing in the value area.
    pub name: Option<String>,
    /// Everything after the first `/` outside quotes, trimmed. For
    /// commentary cards (COMMENT, HISTORY, blank keyword) this is the
    /// whole text after the keyword.
    pub comment: Option<String>,
}

impl Card {
    /// Parse one 80-byte line. `raw` must be exactly [`CARD_SIZE`] bytes.
    pub fn parse(raw: &[u8]) -> Self {
        debug_assert_eq!(raw.len(), CARD_SIZE);

        let keyword = String::from_utf8_lossy(raw[..KEYWORD_SIZE].trim_ascii()).into_owned();
        let raw_line = String::from_utf8_lossy(raw).into_owned();

        // Commentary cards (COMMENT, HISTORY, blank keyword) and END have
        // no value indicator: the rest of the line is free text.
        if &raw[KEYWORD_SIZE..KEYWORD_SIZE + 2] != b"= " {
            let text = raw[KEYWORD_SIZE..].trim_ascii();
            return Card {
                keyword,
                raw: raw_line,
                value: None,
                name: None,
                comment: if text.is_empty() {
                    None
                } else {
                    Some(String::from_utf8_lossy(text).into_owned())
                },
            };
        }

        let (value, comment) = match parse_value_area(&raw[KEYWORD_SIZE + 2..]) {
            Ok((value, comment)) => (Some(value), comment),
            Err(()) => {
                warn!("unparsable value area, keeping the raw line: {raw_line:?}");
                (None, None)
            }
        };
        let name = match &value {
            Some(Value::CharacterString(s)) => Some(s.clone()),
            _ => None,
        };

        Card {
            keyword,
            raw: raw_line,
            value,
            name,
            comment,
        }
    }

    /// Whether this card is the `END` sentinel closing a header.
    pub fn is_end(&self) -> bool {
        self.keyword == "END"
    }
}

/// Split the value area on the first `/` outside quotes and parse both
/// halves. `Err(())` means the area is unparsable; the caller decides how
/// tolerant to be.
fn parse_value_area(area: &[u8]) -> Result<(Value, Option<String>), ()> {
    let (value_part, comment_part) = split_on_comment(area);

    let comment = comment_part.map(|c| String::from_utf8_lossy(c.trim_ascii()).into_owned());

    let trimmed = value_part.trim_ascii_start();
    if trimmed.is_empty() {
        return Ok((Value::Undefined, comment));
    }

    if trimmed[0] == b'\'' {
        let s = parse_quoted_string(&trimmed[1..])?;
        return Ok((Value::CharacterString(s), comment));
    }

    let token = String::from_utf8_lossy(trimmed.trim_ascii_end()).into_owned();
    match token.as_str() {
        "T" => return Ok((Value::Logical(true), comment)),
        "F" => return Ok((Value::Logical(false), comment)),
        _ => (),
    }
    if let Ok(int) = token.parse::<i64>() {
        return Ok((Value::Integer(int), comment));
    }
    if let Ok(float) = token.parse::<f64>() {
        return Ok((Value::Float(float), comment));
    }
    // Fortran-style exponent marker, e.g. 1.0D3.
    if token.contains(['D', 'd']) {
        if let Ok(float) = token.replacen(['D', 'd'], "E", 1).parse::<f64>() {
            return Ok((Value::Float(float), comment));
        }
    }

    Err(())
}

/// Locate the first `/` that does not lie between single quotes.
fn split_on_comment(area: &[u8]) -> (&[u8], Option<&[u8]>) {
    let mut in_quotes = false;
    for (idx, &byte) in area.iter().enumerate() {
        match byte {
            b'\'' => in_quotes = !in_quotes,
            b'/' if !in_quotes => return (&area[..idx], Some(&area[idx + 1..])),
            _ => (),
        }
    }
    (area, None)
}

/// Parse a quoted string whose opening quote has been consumed. A doubled
/// `''` is an escaped quote. Trailing spaces are not significant in FITS
/// string values and are trimmed; leading spaces are kept.
fn parse_quoted_string(bytes: &[u8]) -> Result<String, ()> {
    let mut out = Vec::new();
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'\'' {
            if bytes.get(idx + 1) == Some(&b'\'') {
                out.push(b'\'');
                idx += 2;
                continue;
            }
            while out.last() == Some(&b' ') {
                out.pop();
            }
            return Ok(String::from_utf8_lossy(&out).into_owned());
        }
        out.push(bytes[idx]);
        idx += 1;
    }
    // No closing quote on the line.
    Err(())
}

/// Typed extraction of a card [`Value`], used by the schema builder to
/// read mandatory keywords.
pub trait CardValue {
    fn parse(value: &Value) -> Option<Self>
    where
        Self: Sized;
}

impl CardValue for i64 {
    fn parse(value: &Value) -> Option<Self> {
        // Asking for an integer on a float card is a malformed-card
        // error upstream, not a silent truncation.
        match value {
            Value::Integer(int) => Some(*int),
            _ => None,
        }
    }
}

impl CardValue for f64 {
    fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::Float(float) => Some(*float),
            // Widening an integer card is lossless enough for header use.
            Value::Integer(int) => Some(*int as f64),
            _ => None,
        }
    }
}

impl CardValue for bool {
    fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::Logical(logical) => Some(*logical),
            _ => None,
        }
    }
}

impl CardValue for String {
    fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::CharacterString(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Helper shared by the typed header accessors: `None` keeps the raw line
/// close to the failure.
pub(crate) fn malformed(card: &Card) -> Error {
    Error::MalformedCard(card.raw.clone())
}

#[cfg(test)]
mod tests {
    use super::{Card, Value};
    use test_case::test_case;

    fn card(line: &str) -> Card {
        let mut raw = line.as_bytes().to_vec();
        raw.resize(super::CARD_SIZE, b' ');
        Card::parse(&raw)
    }

    #[test_case("NAXIS1  =                   17", Value::Integer(17) ; "naxis1_positive")]
    #[test_case("NAXIS1  =                  -17", Value::Integer(-17) ; "naxis1_negative")]
    #[test_case("CRVAL1  =            -32768.0", Value::Float(-32768.0) ; "crval1_negative")]
    #[test_case("CRVAL1  =               1.5E3", Value::Float(1500.0) ; "crval1_exponent")]
    #[test_case("DEC     =              -1.5D2", Value::Float(-150.0) ; "dec_d_exponent")]
    #[test_case("SIMPLE  =                    T", Value::Logical(true) ; "simple_true")]
    #[test_case("EXTEND  =                    F", Value::Logical(false) ; "extend_false")]
    #[test_case("BLANKVAL=                     ", Value::Undefined ; "blankval_undefined")]
    fn test_value_parsing(line: &str, expected: Value) {
        assert_eq!(card(line).value, Some(expected));
    }

    #[test]
    fn test_quoted_string() {
        let c = card("XTENSION= 'BINTABLE'           / binary table extension");
        assert_eq!(
            c.value,
            Some(Value::CharacterString("BINTABLE".to_owned()))
        );
        assert_eq!(c.name.as_deref(), Some("BINTABLE"));
        assert_eq!(c.comment.as_deref(), Some("binary table extension"));
    }

    #[test]
    fn test_quoted_string_trailing_spaces_dropped() {
        let c = card("TTYPE1  = 'target    '");
        assert_eq!(c.value, Some(Value::CharacterString("target".to_owned())));
    }

    #[test]
    fn test_doubled_quote_is_escaped() {
        let c = card("OBJECT  = 'Barnard''s star'");
        assert_eq!(
            c.value,
            Some(Value::CharacterString("Barnard's star".to_owned()))
        );
    }

    #[test]
    fn test_slash_inside_quotes_is_not_a_comment() {
        let c = card("ORIGIN  = 'CDS/Strasbourg'     / origin of the file");
        assert_eq!(
            c.value,
            Some(Value::CharacterString("CDS/Strasbourg".to_owned()))
        );
        assert_eq!(c.comment.as_deref(), Some("origin of the file"));
    }

    #[test]
    fn test_comment_on_numeric_card() {
        let c = card("BITPIX  =                    8 / bits per pixel");
        assert_eq!(c.value, Some(Value::Integer(8)));
        assert_eq!(c.comment.as_deref(), Some("bits per pixel"));
    }

    #[test]
    fn test_commentary_card() {
        let c = card("HISTORY produced by the hipsgen pipeline");
        assert_eq!(c.keyword, "HISTORY");
        assert_eq!(c.value, None);
        assert_eq!(
            c.comment.as_deref(),
            Some("produced by the hipsgen pipeline")
        );
    }

    #[test]
    fn test_unparsable_value_keeps_raw() {
        let c = card("WEIRD   = (1.0, 2.0)");
        assert_eq!(c.value, None);
        assert_eq!(c.raw.len(), super::CARD_SIZE);
        assert!(c.raw.starts_with("WEIRD   = (1.0, 2.0)"));
    }

    #[test]
    fn test_unclosed_string_is_unparsable() {
        let c = card("BADSTR  = 'no closing quote");
        assert_eq!(c.value, None);
    }

    #[test]
    fn test_end_card() {
        assert!(card("END").is_end());
        assert!(!card("ENDOFOBS=                    T").is_end());
    }
}
