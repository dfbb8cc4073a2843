//! Lexing of raw arguments into tokens.
//!
//! The tokenizer only classifies arguments by shape. Whether a word is a
//! command or a value, and which parameter a short character belongs to,
//! is decided later by the resolver and binder.
//!
//! # Examples
//!
//! ```
//! use command_tree_core::{ParserSettings, Token, Tokenizer};
//!
//! let tokens = Tokenizer::new(&ParserSettings::default())
//!     .tokenize(&["add", "--name=x", "-vf", "--", "-y"])
//!     .unwrap();
//!
//! assert_eq!(
//!     tokens,
//!     vec![
//!         Token::CommandWord("add".into()),
//!         Token::LongOption { name: "name".into(), value: Some("x".into()) },
//!         Token::ShortOptionGroup { chars: "vf".into(), value: None },
//!         Token::RemainderMarker,
//!         Token::PositionalValue("-y".into()),
//!     ]
//! );
//! ```

use std::fmt;

use tracing::debug;

use crate::error::ParseError;
use crate::types::ParserSettings;

/// One classified argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Bare word: a command name or a value.
    CommandWord(String),
    /// `--name` or `--name=value`.
    LongOption { name: String, value: Option<String> },
    /// `-abc` or `-n=value`; the inline value belongs to the last character.
    ShortOptionGroup { chars: String, value: Option<String> },
    /// Argument after `--`, taken verbatim.
    PositionalValue(String),
    /// The `--` separator.
    RemainderMarker,
}

impl Token {
    /// The argument as it appeared on the command line.
    pub fn raw(&self) -> String {
        self.to_string()
    }

    /// Returns the text of a short group that reads as a negative number.
    pub fn negative_number(&self) -> Option<String> {
        match self {
            Self::ShortOptionGroup { chars, value: None } => {
                let candidate = format!("-{chars}");
                let numeric = chars.starts_with(|c: char| c.is_ascii_digit() || c == '.')
                    && candidate.parse::<f64>().is_ok();
                numeric.then_some(candidate)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CommandWord(text) | Self::PositionalValue(text) => f.write_str(text),
            Self::LongOption { name, value } => match value {
                Some(value) => write!(f, "--{name}={value}"),
                None => write!(f, "--{name}"),
            },
            Self::ShortOptionGroup { chars, value } => match value {
                Some(value) => write!(f, "-{chars}={value}"),
                None => write!(f, "-{chars}"),
            },
            Self::RemainderMarker => f.write_str("--"),
        }
    }
}

/// Splits raw arguments into [`Token`]s.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    strict: bool,
}

impl Tokenizer {
    pub fn new(settings: &ParserSettings) -> Self {
        Self {
            strict: settings.strict_parsing,
        }
    }

    /// Tokenizes `args` (program name excluded).
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MalformedToken`] for an option with an empty or
    /// invalid name, unless strict parsing is disabled.
    pub fn tokenize<S: AsRef<str>>(&self, args: &[S]) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::with_capacity(args.len());
        let mut remainder = false;

        for arg in args {
            let arg = arg.as_ref();
            if remainder {
                tokens.push(Token::PositionalValue(arg.to_string()));
                continue;
            }
            if arg == "--" {
                remainder = true;
                tokens.push(Token::RemainderMarker);
                continue;
            }

            let token = match classify(arg) {
                Some(token) => token,
                None if self.strict => {
                    return Err(ParseError::MalformedToken {
                        token: arg.to_string(),
                    });
                }
                None => {
                    debug!(token = arg, "malformed token kept as word");
                    Token::CommandWord(arg.to_string())
                }
            };
            tokens.push(token);
        }

        debug!(count = tokens.len(), "tokenized arguments");
        Ok(tokens)
    }
}

fn split_inline(body: &str) -> (&str, Option<String>) {
    match body.split_once('=') {
        Some((name, value)) => (name, Some(value.to_string())),
        None => (body, None),
    }
}

fn classify(arg: &str) -> Option<Token> {
    if let Some(body) = arg.strip_prefix("--") {
        let (name, value) = split_inline(body);
        if name.is_empty() || name.starts_with('-') || name.chars().any(char::is_whitespace) {
            return None;
        }
        return Some(Token::LongOption {
            name: name.to_string(),
            value,
        });
    }

    match arg.strip_prefix('-') {
        Some("") | None => Some(Token::CommandWord(arg.to_string())),
        Some(body) => {
            let (chars, value) = split_inline(body);
            if chars.is_empty() {
                return None;
            }
            Some(Token::ShortOptionGroup {
                chars: chars.to_string(),
                value,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(args: &[&str]) -> Result<Vec<Token>, ParseError> {
        Tokenizer::new(&ParserSettings::default()).tokenize(args)
    }

    #[test]
    fn test_single_dash_is_a_word() {
        assert_eq!(tokenize(&["-"]).unwrap(), vec![Token::CommandWord("-".into())]);
    }

    #[test]
    fn test_short_group_inline_value() {
        assert_eq!(
            tokenize(&["-n=5"]).unwrap(),
            vec![Token::ShortOptionGroup {
                chars: "n".into(),
                value: Some("5".into())
            }]
        );
    }

    #[test]
    fn test_empty_inline_value_is_kept() {
        assert_eq!(
            tokenize(&["--name="]).unwrap(),
            vec![Token::LongOption {
                name: "name".into(),
                value: Some(String::new())
            }]
        );
    }

    #[test]
    fn test_malformed_tokens_rejected_when_strict() {
        for raw in ["--=x", "--=", "-=x", "---x"] {
            let err = tokenize(&[raw]).unwrap_err();
            assert_eq!(
                err,
                ParseError::MalformedToken {
                    token: raw.to_string()
                }
            );
        }
    }

    #[test]
    fn test_malformed_tokens_kept_when_lenient() {
        let settings = ParserSettings {
            strict_parsing: false,
            ..ParserSettings::default()
        };
        let tokens = Tokenizer::new(&settings).tokenize(&["---x"]).unwrap();
        assert_eq!(tokens, vec![Token::CommandWord("---x".into())]);
    }

    #[test]
    fn test_everything_after_marker_is_positional() {
        let tokens = tokenize(&["--", "--", "-v", "run"]).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::RemainderMarker,
                Token::PositionalValue("--".into()),
                Token::PositionalValue("-v".into()),
                Token::PositionalValue("run".into()),
            ]
        );
    }

    #[test]
    fn test_negative_number_detection() {
        let tokens = tokenize(&["-5", "-1.5", "-v", "-5=x"]).unwrap();
        let numbers: Vec<Option<String>> = tokens.iter().map(Token::negative_number).collect();
        assert_eq!(
            numbers,
            vec![Some("-5".into()), Some("-1.5".into()), None, None]
        );
    }

    #[test]
    fn test_raw_round_trips_shape() {
        for raw in ["--name=x", "-abc", "word", "--flag"] {
            assert_eq!(tokenize(&[raw]).unwrap()[0].raw(), raw);
        }
    }
}
