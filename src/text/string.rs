use memchr::memchr;
use smallvec::SmallVec;

/// Appends `value` to `out` as a quoted literal, escaping quote, backslash and
/// control characters.
pub fn escape_string_into(out: &mut String, value: &str) {
    out.push('"');
    let bytes = value.as_bytes();
    let mut start = 0;
    for (idx, byte) in bytes.iter().enumerate() {
        let escaped = match byte {
            b'\n' => "\\n",
            b'\r' => "\\r",
            b'\t' => "\\t",
            b'\x08' => "\\b",
            b'\x0c' => "\\f",
            b'"' => "\\\"",
            b'\\' => "\\\\",
            0x00..=0x1f | 0x7f => "",
            _ => continue,
        };
        if start < idx {
            out.push_str(&value[start..idx]);
        }
        if escaped.is_empty() {
            push_hex_escape(out, *byte);
        } else {
            out.push_str(escaped);
        }
        start = idx + 1;
    }
    if start < value.len() {
        out.push_str(&value[start..]);
    }
    out.push('"');
}

fn push_hex_escape(out: &mut String, byte: u8) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    out.push_str("\\x");
    out.push(HEX[(byte >> 4) as usize] as char);
    out.push(HEX[(byte & 0x0f) as usize] as char);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnescapeError {
    /// Offset of the offending backslash inside the raw literal.
    InvalidEscape(usize),
    InvalidUtf8(usize),
}

/// Resolves backslash escapes in `raw` (the text between the quotes) and
/// appends the result to `out`.
pub fn unescape_into(out: &mut String, raw: &str) -> Result<(), UnescapeError> {
    let bytes = raw.as_bytes();
    let mut idx = 0;
    let mut pending: SmallVec<[u8; 4]> = SmallVec::new();
    while idx < bytes.len() {
        let Some(offset) = memchr(b'\\', &bytes[idx..]) else {
            flush_pending(out, &mut pending, idx)?;
            out.push_str(&raw[idx..]);
            break;
        };
        let pos = idx + offset;
        if pos > idx {
            flush_pending(out, &mut pending, pos)?;
            out.push_str(&raw[idx..pos]);
        }
        let next = *bytes.get(pos + 1).ok_or(UnescapeError::InvalidEscape(pos))?;
        if next == b'x' {
            let byte = parse_hex(bytes, pos + 2, 2).ok_or(UnescapeError::InvalidEscape(pos))?;
            if byte < 0x80 && pending.is_empty() {
                out.push(byte as u8 as char);
            } else {
                pending.push(byte as u8);
            }
            idx = pos + 4;
            continue;
        }
        flush_pending(out, &mut pending, pos)?;
        match next {
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'b' => out.push('\x08'),
            b'f' => out.push('\x0c'),
            b'"' => out.push('"'),
            b'\\' => out.push('\\'),
            b'/' => out.push('/'),
            b'u' => {
                let (ch, consumed) = parse_unicode(bytes, pos).ok_or(UnescapeError::InvalidEscape(pos))?;
                out.push(ch);
                idx = pos + consumed;
                continue;
            }
            _ => return Err(UnescapeError::InvalidEscape(pos)),
        }
        idx = pos + 2;
    }
    flush_pending(out, &mut pending, bytes.len())
}

fn flush_pending(
    out: &mut String,
    pending: &mut SmallVec<[u8; 4]>,
    at: usize,
) -> Result<(), UnescapeError> {
    if pending.is_empty() {
        return Ok(());
    }
    let text = std::str::from_utf8(pending).map_err(|_| UnescapeError::InvalidUtf8(at))?;
    out.push_str(text);
    pending.clear();
    Ok(())
}

fn parse_hex(bytes: &[u8], start: usize, len: usize) -> Option<u32> {
    let digits = bytes.get(start..start + len)?;
    let mut value = 0u32;
    for &byte in digits {
        value = (value << 4) | (byte as char).to_digit(16)?;
    }
    Some(value)
}

/// Decodes `\uXXXX` at `pos`, joining a following low surrogate when present.
/// Returns the char and the number of bytes consumed.
fn parse_unicode(bytes: &[u8], pos: usize) -> Option<(char, usize)> {
    let high = parse_hex(bytes, pos + 2, 4)?;
    if !(0xD800..0xDC00).contains(&high) {
        return char::from_u32(high).map(|ch| (ch, 6));
    }
    if bytes.get(pos + 6..pos + 8) != Some(b"\\u".as_slice()) {
        return None;
    }
    let low = parse_hex(bytes, pos + 8, 4)?;
    if !(0xDC00..0xE000).contains(&low) {
        return None;
    }
    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
    char::from_u32(code).map(|ch| (ch, 12))
}

pub fn is_name_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte == b'*'
}

pub fn is_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'*' | b'-')
}
