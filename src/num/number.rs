use std::fmt;

use num_bigint::BigInt;

/// A numeric literal kept in its textual form. Conversions happen on access so
/// the caller picks the target type.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Number<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Decimal,
    Hex,
    Float,
}

struct Literal<'a> {
    negative: bool,
    /// Text without the 64-bit suffix, sign included.
    signed: &'a str,
    /// Digits only: no sign, no `0x` prefix, no suffix.
    digits: &'a str,
    kind: LiteralKind,
    long: bool,
}

impl<'a> Number<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    pub fn as_str(&self) -> &'a str {
        self.text
    }

    pub fn kind(&self) -> LiteralKind {
        self.literal().kind
    }

    pub fn is_float(&self) -> bool {
        self.kind() == LiteralKind::Float
    }

    pub fn is_hex(&self) -> bool {
        self.kind() == LiteralKind::Hex
    }

    /// True for integers written with the `L`/`LL` 64-bit marker.
    pub fn is_long(&self) -> bool {
        self.literal().long
    }

    fn literal(&self) -> Literal<'a> {
        let text = self.text;
        let (negative, body) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let is_hex = body.len() > 1 && (body.starts_with("0x") || body.starts_with("0X"));
        let suffix = if is_hex || !body.contains(['.', 'e', 'E']) {
            long_suffix_len(body)
        } else {
            0
        };
        let body = &body[..body.len() - suffix];
        let signed = &text[..text.len() - suffix];
        if is_hex {
            return Literal {
                negative,
                signed,
                digits: &body[2..],
                kind: LiteralKind::Hex,
                long: suffix > 0,
            };
        }
        let kind = if body.contains(['.', 'e', 'E']) || !body.bytes().all(|b| b.is_ascii_digit()) {
            LiteralKind::Float
        } else {
            LiteralKind::Decimal
        };
        Literal {
            negative,
            signed,
            digits: body,
            kind,
            long: suffix > 0,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        let literal = self.literal();
        match literal.kind {
            LiteralKind::Decimal => literal.signed.parse().ok(),
            LiteralKind::Hex => {
                let bits = u64::from_str_radix(literal.digits, 16).ok()? as i64;
                Some(if literal.negative {
                    bits.wrapping_neg()
                } else {
                    bits
                })
            }
            LiteralKind::Float => {
                let value = self.as_f64()?;
                if value.fract() == 0.0 && value >= -9.223_372_036_854_776e18 && value < 9.223_372_036_854_776e18 {
                    Some(value as i64)
                } else {
                    None
                }
            }
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        let literal = self.literal();
        match literal.kind {
            LiteralKind::Decimal if !literal.negative => literal.digits.parse().ok(),
            LiteralKind::Hex if !literal.negative => u64::from_str_radix(literal.digits, 16).ok(),
            LiteralKind::Float => {
                let value = self.as_f64()?;
                if value.fract() == 0.0 && value >= 0.0 && value < 1.844_674_407_370_955_2e19 {
                    Some(value as u64)
                } else {
                    None
                }
            }
            _ => self.as_i64().filter(|value| *value == 0).map(|_| 0),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        let literal = self.literal();
        match literal.kind {
            LiteralKind::Hex => {
                let value = u64::from_str_radix(literal.digits, 16).ok()? as f64;
                Some(if literal.negative { -value } else { value })
            }
            LiteralKind::Decimal | LiteralKind::Float => literal.signed.parse().ok(),
        }
    }

    /// Exact integer value of any integer literal regardless of width.
    pub fn as_bigint(&self) -> Option<BigInt> {
        let literal = self.literal();
        let radix = match literal.kind {
            LiteralKind::Decimal => 10,
            LiteralKind::Hex => 16,
            LiteralKind::Float => return None,
        };
        let value = BigInt::parse_bytes(literal.digits.as_bytes(), radix)?;
        Some(if literal.negative { -value } else { value })
    }

    /// Canonical `0x`-prefixed uppercase rendering of the 64-bit pattern of an
    /// integer literal.
    pub fn to_hex(&self) -> Option<String> {
        if self.is_float() {
            return None;
        }
        let bits = self.as_u64().or_else(|| self.as_i64().map(|value| value as u64))?;
        Some(format!("0x{bits:X}"))
    }
}

fn long_suffix_len(body: &str) -> usize {
    let bytes = body.as_bytes();
    let mut len = 0;
    while len < 2 && len < bytes.len() && matches!(bytes[bytes.len() - 1 - len], b'L' | b'l') {
        len += 1;
    }
    len
}

impl fmt::Debug for Number<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Number").field(&self.text).finish()
    }
}

impl fmt::Display for Number<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}

/// Returns true when `token` is a complete numeric literal of the dialect.
pub fn is_valid_literal(token: &str) -> bool {
    let bytes = token.as_bytes();
    let mut idx = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        idx += 1;
    }
    let body = &bytes[idx..];
    if body.len() > 2 && body[0] == b'0' && matches!(body[1], b'x' | b'X') {
        let digits = &body[2..];
        let end = digits.len() - long_suffix_len(token);
        return end > 0 && digits[..end].iter().all(u8::is_ascii_hexdigit);
    }

    let int_len = body.iter().take_while(|b| b.is_ascii_digit()).count();
    let rest = &body[int_len..];
    if rest.iter().all(|b| matches!(b, b'L' | b'l')) {
        return int_len > 0 && rest.len() <= 2;
    }

    let mut pos = int_len;
    let mut frac_len = 0;
    if body.get(pos) == Some(&b'.') {
        pos += 1;
        frac_len = body[pos..].iter().take_while(|b| b.is_ascii_digit()).count();
        pos += frac_len;
    }
    if int_len + frac_len == 0 {
        return false;
    }
    if matches!(body.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(body.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let exp_len = body[pos..].iter().take_while(|b| b.is_ascii_digit()).count();
        if exp_len == 0 {
            return false;
        }
        pos += exp_len;
    }
    pos == body.len()
}

pub(crate) fn write_i64_into(out: &mut String, value: i64) {
    let mut buffer = itoa::Buffer::new();
    out.push_str(buffer.format(value));
}

pub(crate) fn write_f64_into(out: &mut String, value: f64) {
    if !value.is_finite() {
        // ryu renders non-finite values with its own spelling; keep them
        // parseable by `f64::from_str`.
        out.push_str(if value.is_nan() {
            "NaN"
        } else if value > 0.0 {
            "inf"
        } else {
            "-inf"
        });
        return;
    }
    let mut buffer = ryu::Buffer::new();
    out.push_str(buffer.format_finite(value));
}
