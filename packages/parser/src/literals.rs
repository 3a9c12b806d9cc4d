//! Literal decoding shared by the parser and the interpreter.

/// Numeric literal text to its value
pub fn parse_number(text: &str) -> Option<f64> {
    let with_prefix = |prefix: [&str; 2], radix: u32| {
        text.strip_prefix(prefix[0])
            .or_else(|| text.strip_prefix(prefix[1]))
            .map(|digits| u64::from_str_radix(digits, radix).ok().map(|v| v as f64))
    };
    if let Some(value) = with_prefix(["0x", "0X"], 16)
        .or_else(|| with_prefix(["0b", "0B"], 2))
        .or_else(|| with_prefix(["0o", "0O"], 8))
    {
        return value;
    }
    text.parse::<f64>().ok()
}

/// Number to string the way script code observes it: shortest round-trip
/// digits, exponent notation outside `1e-7 .. 1e21`
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if value < 0.0 {
        return format!("-{}", format_number(-value));
    }

    // `{:e}` yields the shortest digits as `d.ddde±x`
    let exp_form = format!("{:e}", value);
    let (mantissa, exponent) = match exp_form.split_once('e') {
        Some(parts) => parts,
        None => return exp_form,
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let n = exponent + 1;

    if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        format!("{}.{}", &digits[..n as usize], &digits[n as usize..])
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let sign = if n - 1 >= 0 { "+" } else { "-" };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, (n - 1).abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, (n - 1).abs())
        }
    }
}

/// Canonical property key for a numeric literal key
pub fn number_key(value: f64) -> String {
    format_number(value)
}

/// Decode the escape sequences of a string or template literal body
pub fn unescape(raw: &str) -> Result<String, String> {
    if !raw.contains('\\') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') if !chars.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) => out.push('\0'),
            Some('x') => {
                let code = take_hex(&mut chars, 2)?;
                out.push(char::from_u32(code).ok_or("Invalid hexadecimal escape sequence")?);
            }
            Some('u') => {
                let code = if chars.peek() == Some(&'{') {
                    chars.next();
                    let mut hex = String::new();
                    for c in chars.by_ref() {
                        if c == '}' {
                            break;
                        }
                        hex.push(c);
                    }
                    u32::from_str_radix(&hex, 16).map_err(|_| "Invalid Unicode escape sequence".to_string())?
                } else {
                    take_hex(&mut chars, 4)?
                };
                if (0xD800..0xDC00).contains(&code) {
                    // High surrogate: combine with a following `\uXXXX` low surrogate
                    let mut lookahead = chars.clone();
                    if lookahead.next() == Some('\\') && lookahead.next() == Some('u') {
                        if let Ok(low) = take_hex(&mut lookahead, 4) {
                            if (0xDC00..0xE000).contains(&low) {
                                chars = lookahead;
                                let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                                out.push(char::from_u32(combined).unwrap_or('\u{fffd}'));
                                continue;
                            }
                        }
                    }
                }
                out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
            }
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some('\n') | Some('\u{2028}') | Some('\u{2029}') => {}
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Ok(out)
}

fn take_hex(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, count: usize) -> Result<u32, String> {
    let hex: String = chars.by_ref().take(count).collect();
    if hex.len() != count {
        return Err("Invalid hexadecimal escape sequence".to_string());
    }
    u32::from_str_radix(&hex, 16).map_err(|_| "Invalid hexadecimal escape sequence".to_string())
}
