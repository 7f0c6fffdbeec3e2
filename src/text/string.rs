use std::borrow::Cow;

use memchr::memchr;

use crate::{Error, Result};

/// Strips the surrounding quotes of a string literal and interprets its escapes.
///
/// Literals without a backslash are returned borrowed. Byte escapes (`\x`, octal)
/// may build multi-byte characters, but the result must be valid UTF-8.
pub fn unquote(literal: &str) -> Result<Cow<'_, str>> {
    let inner = literal
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(|| Error::lexical(format!("malformed string literal {literal}")))?;

    if memchr(b'\\', inner.as_bytes()).is_none() {
        return Ok(Cow::Borrowed(inner));
    }

    let mut out: Vec<u8> = Vec::with_capacity(inner.len());
    let mut chars = inner.char_indices();
    while let Some((_, ch)) = chars.next() {
        if ch != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let Some((_, escape)) = chars.next() else {
            return Err(Error::lexical("string literal ends inside an escape"));
        };
        match escape {
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            'f' => out.push(0x0C),
            'n' => out.push(b'\n'),
            'r' => out.push(b'\r'),
            't' => out.push(b'\t'),
            'v' => out.push(0x0B),
            '\\' => out.push(b'\\'),
            '"' => out.push(b'"'),
            'x' => {
                let value = read_digits(&mut chars, 2, 16)?;
                out.push(value as u8);
            }
            '0'..='7' => {
                let rest = read_digits(&mut chars, 2, 8)?;
                let value = (escape as u32 - '0' as u32) * 64 + rest;
                let byte = u8::try_from(value)
                    .map_err(|_| Error::lexical(format!("octal escape \\{value:o} out of range")))?;
                out.push(byte);
            }
            'u' | 'U' => {
                let width = if escape == 'u' { 4 } else { 8 };
                let value = read_digits(&mut chars, width, 16)?;
                let decoded = char::from_u32(value).ok_or_else(|| {
                    Error::lexical(format!("escape \\{escape}{value:x} is not a valid character"))
                })?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(decoded.encode_utf8(&mut buf).as_bytes());
            }
            other => {
                return Err(Error::lexical(format!("unknown escape sequence \\{other}")));
            }
        }
    }

    String::from_utf8(out)
        .map(Cow::Owned)
        .map_err(|_| Error::lexical("string escapes do not form valid UTF-8"))
}

fn read_digits(chars: &mut std::str::CharIndices<'_>, count: usize, radix: u32) -> Result<u32> {
    let mut value = 0u32;
    for _ in 0..count {
        let digit = chars
            .next()
            .and_then(|(_, ch)| ch.to_digit(radix))
            .ok_or_else(|| Error::lexical(format!("escape expects {count} base-{radix} digits")))?;
        value = value * radix + digit;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case(r#""plain""#, "plain")]
    #[case(r#""""#, "")]
    #[case(r#""a\nb\t\"c\"\\""#, "a\nb\t\"c\"\\")]
    #[case(r#""\x41\101""#, "AA")]
    #[case(r#""\xc3\xa9""#, "é")]
    #[case(r#""é\U0001F600""#, "é😀")]
    fn test_unquote(#[case] literal: &str, #[case] expected: &str) {
        assert_eq!(unquote(literal).unwrap(), expected);
    }

    #[rstest::rstest]
    fn test_unquote_borrows_without_escapes() {
        assert!(matches!(unquote(r#""abc""#).unwrap(), Cow::Borrowed("abc")));
    }

    #[rstest::rstest]
    #[case(r#""\q""#)]
    #[case(r#""\xff""#)]
    #[case(r#""\u12""#)]
    #[case(r#""\ud800""#)]
    #[case(r#""\477""#)]
    #[case("unquoted")]
    fn test_unquote_rejects(#[case] literal: &str) {
        assert!(unquote(literal).is_err());
    }
}
