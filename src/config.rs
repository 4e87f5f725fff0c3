/// Tunable limits of the interpreter.
///
/// The defaults reproduce the fixed buffer sizes of the classic `mini-shell`:
/// a 100-byte input line, at most 10 tokens, 20 remembered commands and a pager
/// that stops every 10 lines. They are soft limits; the backing containers grow
/// dynamically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Prompt printed before every line read.
    pub prompt: String,
    /// Number of input lines kept by the `history` builtin.
    pub history_capacity: usize,
    /// Maximum number of tokens (command name included) kept from one line.
    pub max_tokens: usize,
    /// Maximum length of one input line in bytes; the rest is discarded.
    pub max_line_bytes: usize,
    /// Lines printed by `more` between two `--More--` prompts.
    pub page_lines: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: "mini-shell$ ".to_string(),
            history_capacity: 20,
            max_tokens: 10,
            max_line_bytes: 100,
            page_lines: 10,
        }
    }
}

impl ShellConfig {
    /// Cut `line` down to [`ShellConfig::max_line_bytes`] without splitting a char.
    pub fn truncate_line<'a>(&self, line: &'a str) -> &'a str {
        if line.len() <= self.max_line_bytes {
            return line;
        }
        let mut end = self.max_line_bytes;
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        &line[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_limits() {
        let cfg = ShellConfig::default();
        assert_eq!(cfg.history_capacity, 20);
        assert_eq!(cfg.max_tokens, 10);
        assert_eq!(cfg.max_line_bytes, 100);
        assert_eq!(cfg.page_lines, 10);
    }

    #[test]
    fn truncate_line_respects_char_boundaries() {
        let cfg = ShellConfig {
            max_line_bytes: 4,
            ..ShellConfig::default()
        };
        assert_eq!(cfg.truncate_line("abc"), "abc");
        assert_eq!(cfg.truncate_line("abcdef"), "abcd");
        // 'é' takes two bytes, so byte 4 falls inside it
        assert_eq!(cfg.truncate_line("abcé"), "abc");
    }
}
