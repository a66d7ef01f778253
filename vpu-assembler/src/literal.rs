//! Numeric literal classification
//!
//! `0x` prefixed text is unsigned hex, a leading `-` makes a signed decimal,
//! a `.` anywhere or a trailing `f`/`F` makes a float, anything else is
//! unsigned decimal. Classification happens here; whether the value fits a
//! 16-bit instruction slot is the encoder's business.

/// A classified literal value
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Literal {
    Uint(u64),
    Int(i64),
    Float(f64),
}

/// Parse a RAW token as a literal. `None` means the text is not a literal
/// (unknown characters, a second `.`, a non-hex digit after `0x`, ...).
pub fn parse_literal(text: &str) -> Option<Literal> {
    if text.is_empty() {
        return None;
    }

    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok().map(Literal::Uint);
    }

    let is_float = text.contains('.') || text.ends_with('f') || text.ends_with('F');
    if is_float {
        let digits = text
            .strip_suffix('f')
            .or_else(|| text.strip_suffix('F'))
            .unwrap_or(text);
        // reject "f", "1.2f3" and friends; f64::parse rejects a second dot
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit() || b == b'.' || b == b'-') {
            return None;
        }
        return digits.parse::<f64>().ok().map(Literal::Float);
    }

    if text.starts_with('-') {
        return text.parse::<i64>().ok().map(Literal::Int);
    }

    text.parse::<u64>().ok().map(Literal::Uint)
}
