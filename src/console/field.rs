//! Byte fields embedded in command output.
//!
//! A read prints `RX: 0x70 ACK 0x6B ACK ... 0xFC NACK` and a write prints
//! `TX: 0xEE ACK 0xF4 ACK`. A field is the marker followed by a contiguous run
//! of hex byte tokens; the acknowledge tokens between bytes belong to the run.
//! The run ends at the first other token.

pub(crate) const RX_MARKER: &str = "RX:";
pub(crate) const TX_MARKER: &str = "TX:";

const ACK: &str = "ACK";
const NACK: &str = "NACK";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Byte(u8),
    Ack,
    Nack,
}

fn token(text: &str) -> Option<Token> {
    match text {
        ACK => Some(Token::Ack),
        NACK => Some(Token::Nack),
        _ => hex_byte(text).map(Token::Byte),
    }
}

pub(crate) fn hex_byte(text: &str) -> Option<u8> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))?;
    if !(1..=2).contains(&digits.len()) {
        return None;
    }
    u8::from_str_radix(digits, 16).ok()
}

/// Tokens of the first field introduced by `marker`, or `None` if absent.
fn field_tokens(scrubbed: &str, marker: &str) -> Option<Vec<Token>> {
    let mut words = scrubbed.split(' ');
    // The marker may be glued to its first value (`RX:0x60`).
    let first = loop {
        let word = words.next()?;
        if let Some(rest) = word.strip_prefix(marker) {
            break rest;
        }
    };

    let mut tokens = Vec::new();
    for word in std::iter::once(first).chain(words) {
        if word.is_empty() {
            continue;
        }
        match token(word) {
            Some(t) => tokens.push(t),
            None => break,
        }
    }
    Some(tokens)
}

/// Bytes of the first `RX:` field.
pub fn rx_bytes(scrubbed: &str) -> Option<Vec<u8>> {
    let tokens = field_tokens(scrubbed, RX_MARKER)?;
    Some(
        tokens
            .into_iter()
            .filter_map(|t| match t {
                Token::Byte(b) => Some(b),
                _ => None,
            })
            .collect(),
    )
}

/// True when the first `TX:` field reports a byte that was not acknowledged.
pub fn tx_nacked(scrubbed: &str) -> bool {
    field_tokens(scrubbed, TX_MARKER).is_some_and(|tokens| tokens.contains(&Token::Nack))
}

/// 7-bit addresses listed by the `scan` command.
///
/// Each hit is printed as `0x77 (0xEE W) (0xEF R)`; only the bare leading
/// token is the 7-bit address.
pub fn scan_addresses(scrubbed: &str) -> Vec<u8> {
    let mut found = Vec::new();
    for address in scrubbed.split(' ').filter_map(hex_byte) {
        if address < 0x80 && !found.contains(&address) {
            found.push(address);
        }
    }
    found
}
