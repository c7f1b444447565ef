//! Rough token estimation for dispatch decisions.
//!
//! ASCII text averages about four characters per token. Japanese and other
//! non-ASCII characters usually encode to one token or more each, so they are
//! counted individually.

/// ASCII characters per estimated token.
const ASCII_CHARS_PER_TOKEN: u32 = 4;

/// Estimate the token count of `text`.
///
/// ASCII characters count 1/4 token each (rounded up over the whole text);
/// every non-ASCII character counts as one token.
pub fn estimate_tokens(text: &str) -> u32 {
    let (ascii, other) = text.chars().fold((0u32, 0u32), |(ascii, other), c| {
        if c.is_ascii() {
            (ascii.saturating_add(1), other)
        } else {
            (ascii, other.saturating_add(1))
        }
    });

    ascii
        .div_ceil(ASCII_CHARS_PER_TOKEN)
        .saturating_add(other)
}
