use memchr::memchr;

// `&#x10FFFF;` is the longest reference we accept.
const MAX_REFERENCE_LEN: usize = 10;

/// Decode the entity subset server-rendered fragments actually use.
///
/// Named references: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`.
/// Numeric references must be `;`-terminated and name a Unicode scalar value.
/// Anything else is copied through unchanged.
pub(crate) fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = memchr(b'&', rest.as_bytes()) {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match decode_reference(tail) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// `tail` starts at `&`. Returns the decoded char and the byte length consumed.
fn decode_reference(tail: &str) -> Option<(char, usize)> {
    let window = &tail.as_bytes()[..tail.len().min(MAX_REFERENCE_LEN + 1)];
    let semi = memchr(b';', window)?;
    let body = &tail[1..semi];
    let ch = match body.strip_prefix('#') {
        Some(numeric) => decode_numeric(numeric)?,
        None => match body {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            "nbsp" => '\u{a0}',
            _ => return None,
        },
    };
    Some((ch, semi + 1))
}

fn decode_numeric(numeric: &str) -> Option<char> {
    let (digits, radix) = match numeric.strip_prefix(['x', 'X']) {
        Some(hex) => (hex, 16),
        None => (numeric, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    char::from_u32(u32::from_str_radix(digits, radix).ok()?)
}
