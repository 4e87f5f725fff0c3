//! Splitting of an input line into argument tokens.
//!
//! The grammar is deliberately flat: tokens are maximal runs of non-separator
//! characters. There is no quoting and no escaping, so `"a b"` is two tokens.

/// Characters that separate tokens. Runs of them collapse into one separator.
const SEPARATORS: &[char] = &[' ', '\t', '\n', '\r'];

/// Split `line` into at most `max_tokens` non-empty tokens.
///
/// The tokens borrow from `line`, which is left untouched. Tokens past the limit
/// are dropped rather than rejected.
pub fn tokenize(line: &str, max_tokens: usize) -> Vec<&str> {
    let tokens: Vec<&str> = line
        .split(SEPARATORS)
        .filter(|token| !token.is_empty())
        .take(max_tokens)
        .collect();
    tracing::trace!(?tokens, "tokenized line");
    tokens
}
