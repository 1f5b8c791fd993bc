//! Noise removal for console text.
//!
//! The console interleaves command output with colour escapes, a status bar
//! of pin voltages and `GND` labels. [`scrub`] removes all of that and
//! collapses whitespace to single spaces, leaving only the tokens a command
//! actually produced. Scrubbing is idempotent.

const ESC: char = '\x1b';
const CSI: char = '\u{9b}';
const BEL: char = '\x07';

pub fn scrub(raw: &str) -> String {
    let stripped = strip_control(raw);
    let tokens: Vec<&str> = stripped
        .split_whitespace()
        .filter(|token| !is_noise(token))
        .collect();
    tokens.join(" ")
}

/// True when a chunk carries nothing once scrubbed.
pub(crate) fn is_blank(raw: &str) -> bool {
    strip_control(raw)
        .split_whitespace()
        .all(is_noise)
}

fn is_noise(token: &str) -> bool {
    token == "GND" || is_voltage(token)
}

/// `3.30V`, `0.0V`: a decimal reading immediately followed by the volt unit.
fn is_voltage(token: &str) -> bool {
    let Some(number) = token.strip_suffix('V') else {
        return false;
    };
    let Some((whole, fraction)) = number.split_once('.') else {
        return false;
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && digits(fraction)
}

/// Remove ANSI escape sequences and non-whitespace control characters.
fn strip_control(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ESC => match chars.next() {
                Some('[') => skip_csi(&mut chars),
                Some(']') => skip_osc(&mut chars),
                // Two-character escape, or a lone trailing ESC.
                Some(_) | None => {}
            },
            CSI => skip_csi(&mut chars),
            c if c.is_control() && !c.is_whitespace() => {}
            c => out.push(c),
        }
    }
    out
}

/// Parameter bytes, then intermediate bytes, then one final byte.
fn skip_csi(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while chars.next_if(|c| ('0'..='?').contains(c)).is_some() {}
    while chars.next_if(|c| (' '..='/').contains(c)).is_some() {}
    chars.next_if(|c| ('@'..='~').contains(c));
}

/// Operating system command, terminated by BEL or ST (`ESC \`).
fn skip_osc(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while let Some(c) = chars.next() {
        match c {
            BEL => return,
            ESC => {
                chars.next_if_eq(&'\\');
                return;
            }
            _ => {}
        }
    }
}
