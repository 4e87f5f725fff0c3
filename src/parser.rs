use crate::error::ShellError;

/// The pipe token. It only counts when it stands alone between separators.
pub const PIPE: &str = "|";

/// The shape of one tokenized input line.
#[derive(Debug, PartialEq, Eq)]
pub enum Invocation<'a> {
    /// Blank line; nothing runs.
    Empty,
    /// A command name followed by its arguments.
    Simple { name: &'a str, args: &'a [&'a str] },
    /// `first | second`, both sides non-empty.
    Pipeline {
        first: &'a [&'a str],
        second: &'a [&'a str],
    },
}

/// Classify a token sequence.
///
/// A single `|` token splits the line into a two-stage pipeline. Anything beyond
/// two stages, or a `|` with an empty side, is rejected.
pub fn classify<'a>(tokens: &'a [&'a str]) -> Result<Invocation<'a>, ShellError> {
    let mut pipes = tokens.iter().enumerate().filter(|(_, t)| **t == PIPE);
    match (pipes.next(), pipes.next()) {
        (None, _) => Ok(match tokens.split_first() {
            None => Invocation::Empty,
            Some((name, args)) => Invocation::Simple { name: *name, args },
        }),
        (Some((at, _)), None) => {
            let (first, second) = (&tokens[..at], &tokens[at + 1..]);
            if first.is_empty() || second.is_empty() {
                return Err(ShellError::UnsupportedPipeline);
            }
            Ok(Invocation::Pipeline { first, second })
        }
        (Some(_), Some(_)) => Err(ShellError::UnsupportedPipeline),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tokens_are_empty_invocation() {
        assert_eq!(classify(&[]).unwrap(), Invocation::Empty);
    }

    #[test]
    fn simple_command_keeps_arguments() {
        let tokens = ["cmp", "a", "b"];
        assert_eq!(
            classify(&tokens).unwrap(),
            Invocation::Simple {
                name: "cmp",
                args: &["a", "b"]
            }
        );
    }

    #[test]
    fn single_pipe_splits_two_stages() {
        let tokens = ["ls", "-l", "|", "wc", "-l"];
        assert_eq!(
            classify(&tokens).unwrap(),
            Invocation::Pipeline {
                first: &["ls", "-l"],
                second: &["wc", "-l"]
            }
        );
    }

    #[test]
    fn glued_pipe_is_an_ordinary_token() {
        let tokens = ["ls|wc"];
        assert_eq!(
            classify(&tokens).unwrap(),
            Invocation::Simple {
                name: "ls|wc",
                args: &[]
            }
        );
    }

    #[test]
    fn three_stages_are_rejected() {
        let tokens = ["a", "|", "b", "|", "c"];
        assert!(matches!(
            classify(&tokens),
            Err(ShellError::UnsupportedPipeline)
        ));
    }

    #[test]
    fn dangling_pipe_is_rejected() {
        assert!(classify(&["ls", "|"]).is_err());
        assert!(classify(&["|", "wc"]).is_err());
    }
}
