// Lenient numeric parsing for message content.
//
// The game sends numbers as ASCII text and occasionally sends garbage
// (truncated floats, stray characters, empty fields when arity is wrong).
// These helpers never fail: they read the longest numeric prefix of a token
// and fall back to zero when there is none, so a malformed payload degrades to
// a zero value instead of dropping the message.

/// Parse the leading integer of `token`. `"12abc"` is 12, `"abc"` is 0, and
/// values outside the `i32` range saturate.
pub fn parse_int(token: &str) -> i32 {
    let text = token.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let mut value: i64 = 0;
    for byte in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(byte - b'0'));
    }
    if negative {
        value = -value;
    }
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Parse the leading decimal number of `token` as `f64`. Accepts an optional
/// sign, digits with an optional fraction, and an optional exponent.
pub fn parse_real(token: &str) -> f64 {
    let text = token.trim_start();
    let end = numeric_prefix_len(text.as_bytes());
    text[..end].parse().unwrap_or(0.0)
}

/// [`parse_real`] narrowed to `f32`, used for vector and collision fields.
pub fn parse_float(token: &str) -> f32 {
    parse_real(token) as f32
}

/// Length of the longest prefix of `bytes` that forms a decimal number.
fn numeric_prefix_len(bytes: &[u8]) -> usize {
    let mut pos = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        pos += 1;
    }

    let int_digits = count_digits(&bytes[pos..]);
    pos += int_digits;

    let mut frac_digits = 0;
    if bytes.get(pos) == Some(&b'.') {
        frac_digits = count_digits(&bytes[pos + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            pos += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return 0;
    }

    // Exponent only counts when at least one digit follows it.
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mut exp = pos + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = count_digits(&bytes[exp..]);
        if exp_digits > 0 {
            pos = exp + exp_digits;
        }
    }

    pos
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
