//! Conversion of input lines into byte buffers.
//!
//! Text lines are sent as their UTF-8 bytes followed by a terminator; hex
//! lines are decoded into raw bytes, so arbitrary binary frames can be typed
//! or piped in.

use crate::Buffer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How an input line is turned into bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// UTF-8 text plus the configured terminator
    #[default]
    Text,
    /// Hex byte pairs, e.g. `01 02 ff` or `0x01,0xFF`
    Hex,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// `column` counts characters from 1.
    #[error("Invalid hex digit '{ch}' at column {column}")]
    InvalidHexDigit { ch: char, column: usize },

    #[error("Odd number of hex digits in '{0}'")]
    OddLength(String),

    #[error("Unknown escape sequence '\\{0}'")]
    UnknownEscape(char),
}

/// Decode one input line (without its trailing newline).
///
/// Returns `Ok(None)` for lines that carry no payload.
pub fn decode_line(
    line: &str,
    format: InputFormat,
    terminator: &[u8],
) -> Result<Option<Buffer>, CodecError> {
    let bytes = match format {
        InputFormat::Text => {
            if line.is_empty() {
                return Ok(None);
            }
            let mut bytes = Vec::with_capacity(line.len() + terminator.len());
            bytes.extend_from_slice(line.as_bytes());
            bytes.extend_from_slice(terminator);
            bytes
        }
        InputFormat::Hex => {
            let bytes = decode_hex(line)?;
            if bytes.is_empty() {
                return Ok(None);
            }
            bytes
        }
    };
    Ok(Some(Buffer::from(bytes)))
}

fn decode_hex(line: &str) -> Result<Vec<u8>, CodecError> {
    let mut bytes = Vec::new();

    for token in line.split(|c: char| c.is_whitespace() || c == ',') {
        if token.is_empty() {
            continue;
        }
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        let start = byte_offset(line, digits);

        let nibbles = digits
            .char_indices()
            .map(|(at, ch)| {
                ch.to_digit(16)
                    .map(|v| v as u8)
                    .ok_or_else(|| CodecError::InvalidHexDigit {
                        ch,
                        column: line[..start + at].chars().count() + 1,
                    })
            })
            .collect::<Result<Vec<u8>, _>>()?;
        if nibbles.len() % 2 != 0 {
            return Err(CodecError::OddLength(token.to_string()));
        }
        bytes.extend(nibbles.chunks_exact(2).map(|pair| pair[0] << 4 | pair[1]));
    }

    Ok(bytes)
}

/// Byte position of `part`, a subslice of `line`.
fn byte_offset(line: &str, part: &str) -> usize {
    part.as_ptr() as usize - line.as_ptr() as usize
}

/// Resolve `\n`, `\r`, `\t`, `\0` and `\\` in a configured terminator.
pub fn parse_terminator(raw: &str) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            let mut utf8 = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => out.push(b'\n'),
            Some('r') => out.push(b'\r'),
            Some('t') => out.push(b'\t'),
            Some('0') => out.push(0),
            Some('\\') => out.push(b'\\'),
            Some(other) => return Err(CodecError::UnknownEscape(other)),
            None => out.push(b'\\'),
        }
    }

    Ok(out)
}

/// Render up to `max` bytes as space-separated hex, marking truncation.
pub fn hex_preview(bytes: &[u8], max: usize) -> String {
    let mut out = bytes
        .iter()
        .take(max)
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ");
    if bytes.len() > max {
        out.push_str(" ...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_appends_terminator() {
        let buf = decode_line("ATZ", InputFormat::Text, b"\r\n").unwrap().unwrap();
        assert_eq!(&buf[..], b"ATZ\r\n");
    }

    #[test]
    fn test_empty_lines_yield_nothing() {
        assert_eq!(decode_line("", InputFormat::Text, b"\n").unwrap(), None);
        assert_eq!(decode_line("   ", InputFormat::Hex, b"").unwrap(), None);
    }

    #[test]
    fn test_hex_forms() {
        let spaced = decode_line("01 02 ff", InputFormat::Hex, b"").unwrap().unwrap();
        assert_eq!(&spaced[..], &[0x01, 0x02, 0xFF]);

        let prefixed = decode_line("0x01,0XAA", InputFormat::Hex, b"").unwrap().unwrap();
        assert_eq!(&prefixed[..], &[0x01, 0xAA]);

        let packed = decode_line("deadBEEF", InputFormat::Hex, b"\n").unwrap().unwrap();
        assert_eq!(&packed[..], &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_hex_errors() {
        assert_eq!(
            decode_line("01 0g", InputFormat::Hex, b""),
            Err(CodecError::InvalidHexDigit { ch: 'g', column: 5 })
        );
        assert_eq!(
            decode_line("abc", InputFormat::Hex, b""),
            Err(CodecError::OddLength("abc".to_string()))
        );
    }

    #[test]
    fn test_hex_error_column_counts_characters() {
        assert_eq!(
            decode_line("µ 0z", InputFormat::Hex, b""),
            Err(CodecError::InvalidHexDigit { ch: 'µ', column: 1 })
        );
        assert_eq!(
            decode_line("0x01,é1 0z", InputFormat::Hex, b""),
            Err(CodecError::InvalidHexDigit { ch: 'é', column: 6 })
        );
        // Two bytes but one character: not a hex pair
        assert_eq!(
            decode_line("01 ü", InputFormat::Hex, b""),
            Err(CodecError::InvalidHexDigit { ch: 'ü', column: 4 })
        );
    }

    #[test]
    fn test_parse_terminator() {
        assert_eq!(parse_terminator("\\r\\n").unwrap(), b"\r\n");
        assert_eq!(parse_terminator("").unwrap(), b"");
        assert_eq!(parse_terminator(";\\0").unwrap(), b";\0");
        assert_eq!(parse_terminator("\\q"), Err(CodecError::UnknownEscape('q')));
    }

    #[test]
    fn test_hex_preview() {
        assert_eq!(hex_preview(&[0x01, 0xAB], 16), "01 ab");
        assert_eq!(hex_preview(&[1, 2, 3], 2), "01 02 ...");
        assert_eq!(hex_preview(&[], 4), "");
    }
}
