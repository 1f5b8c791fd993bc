use crate::modes::Modes;

/// Mode named by a prompt token such as `I2C>` or `HiZ>`.
fn prompt_token(token: &str) -> Option<Modes> {
    token.strip_suffix('>')?.parse().ok()
}

/// Prompt the scrubbed text ends with, i.e. the console is waiting for input.
pub fn trailing_prompt(scrubbed: &str) -> Option<Modes> {
    scrubbed.rsplit(' ').next().and_then(prompt_token)
}

/// Latest prompt anywhere in the scrubbed text, with its byte offset.
pub fn last_prompt(scrubbed: &str) -> Option<(usize, Modes)> {
    let mut found = None;
    let mut offset = 0;
    for token in scrubbed.split(' ') {
        if let Some(mode) = prompt_token(token) {
            found = Some((offset, mode));
        }
        offset += token.len() + 1;
    }
    found
}
