//! Message matching expressions.
//!
//! ```text
//! expr  := or
//! or    := and ("or" and)*
//! and   := unary ("and" unary)*
//! unary := "not" unary | "(" expr ")" | term
//! term  := [field] D regex D [flags]
//! ```
//!
//! `D` is any character other than a letter, digit, `_`, parenthesis or
//! whitespace; inside the regex it may be escaped as `\D`. `field` is one of
//! `msgctxt`, `msgid`, `msgstr` or `comment`; without it a term matches if
//! any of them does. The only flag is `i`, for case-insensitive matching.

use std::fmt;

use ascribe_core::Message;
use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Maximum nesting of parentheses and negations.
const MAX_NESTING: usize = 32;

/// Why an expression failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatcherError {
    /// Nothing but whitespace.
    #[error("matching expression cannot be empty")]
    Empty,
    /// Unrecognized field name.
    #[error("unknown field '{name}' at {position}")]
    UnknownField {
        /// The name.
        name: String,
        /// Byte offset.
        position: usize,
    },
    /// A term's closing delimiter is missing.
    #[error("unterminated pattern at {position}")]
    Unterminated {
        /// Byte offset of the opening delimiter.
        position: usize,
    },
    /// Unrecognized flag after a pattern.
    #[error("unknown flag '{flag}' at {position}")]
    UnknownFlag {
        /// The flag.
        flag: char,
        /// Byte offset.
        position: usize,
    },
    /// The pattern is not a valid regex.
    #[error("invalid pattern at {position}: {reason}")]
    Regex {
        /// Byte offset.
        position: usize,
        /// Regex diagnostic.
        reason: String,
    },
    /// Something other than what the grammar allows here.
    #[error("unexpected {found} at {position}, expected {expected}")]
    Unexpected {
        /// What was expected.
        expected: &'static str,
        /// What was found.
        found: String,
        /// Byte offset.
        position: usize,
    },
    /// Parentheses or negations nested too deeply.
    #[error("expression nesting exceeds {MAX_NESTING} at {position}")]
    TooDeep {
        /// Byte offset.
        position: usize,
    },
}

/// Message part a term looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchField {
    /// Context.
    Msgctxt,
    /// Original text, singular and plural.
    Msgid,
    /// Every translation variant.
    Msgstr,
    /// Translator comments.
    Comment,
}

impl MatchField {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "msgctxt" => Some(Self::Msgctxt),
            "msgid" => Some(Self::Msgid),
            "msgstr" => Some(Self::Msgstr),
            "comment" => Some(Self::Comment),
            _ => None,
        }
    }

    fn texts(self, msg: &Message) -> Vec<&str> {
        match self {
            Self::Msgctxt => msg.msgctxt.as_deref().into_iter().collect(),
            Self::Msgid => std::iter::once(msg.msgid.as_str())
                .chain(msg.msgid_plural.as_deref())
                .collect(),
            Self::Msgstr => msg.msgstr.iter().map(String::as_str).collect(),
            Self::Comment => msg.manual_comment.iter().map(String::as_str).collect(),
        }
    }
}

/// Compiled expression.
#[derive(Clone, Debug)]
pub enum Matcher {
    /// One regex over one or all fields.
    Term {
        /// Field to look at, `None` for all.
        field: Option<MatchField>,
        /// Compiled pattern.
        regex: Regex,
    },
    /// Negation.
    Not(Box<Matcher>),
    /// All must match.
    And(Vec<Matcher>),
    /// Any must match.
    Or(Vec<Matcher>),
}

impl Matcher {
    /// Compile an expression.
    pub fn parse(input: &str) -> Result<Self, MatcherError> {
        let tokens = lex(input)?;
        if tokens.len() == 1 {
            return Err(MatcherError::Empty);
        }
        let mut parser = Parser {
            tokens,
            index: 0,
            depth: 0,
        };
        let expr = parser.parse_or()?;
        let rest = parser.current();
        if rest.token != Token::Eof {
            return Err(MatcherError::Unexpected {
                expected: "end of expression",
                found: rest.token.to_string(),
                position: rest.position,
            });
        }
        Ok(expr)
    }

    /// Whether `msg` matches.
    pub fn is_match(&self, msg: &Message) -> bool {
        match self {
            Self::Term { field, regex } => {
                let fields = match field {
                    Some(f) => vec![*f],
                    None => vec![MatchField::Msgctxt, MatchField::Msgid, MatchField::Msgstr, MatchField::Comment],
                };
                fields
                    .into_iter()
                    .flat_map(|f| f.texts(msg))
                    .any(|text| regex.is_match(text))
            }
            Self::Not(inner) => !inner.is_match(msg),
            Self::And(parts) => parts.iter().all(|p| p.is_match(msg)),
            Self::Or(parts) => parts.iter().any(|p| p.is_match(msg)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lexer
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
enum Token {
    Term(Option<MatchField>, Regex),
    And,
    Or,
    Not,
    LParen,
    RParen,
    Eof,
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Term(_, re) => write!(f, "pattern '{}'", re.as_str()),
            Self::And => f.write_str("'and'"),
            Self::Or => f.write_str("'or'"),
            Self::Not => f.write_str("'not'"),
            Self::LParen => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
            Self::Eof => f.write_str("end of expression"),
        }
    }
}

#[derive(Clone, Debug)]
struct Spanned {
    token: Token,
    position: usize,
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_delimiter(c: char) -> bool {
    !is_word(c) && !c.is_whitespace() && c != '(' && c != ')'
}

fn lex(input: &str) -> Result<Vec<Spanned>, MatcherError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() {
            let _ = chars.next();
            continue;
        }
        if c == '(' || c == ')' {
            let _ = chars.next();
            let token = if c == '(' { Token::LParen } else { Token::RParen };
            tokens.push(Spanned { token, position: pos });
            continue;
        }

        let mut word_end = pos;
        while let Some(&(i, w)) = chars.peek() {
            if !is_word(w) {
                break;
            }
            word_end = i + w.len_utf8();
            let _ = chars.next();
        }
        let word = &input[pos..word_end];
        let next = chars.peek().map(|&(_, n)| n);

        let field = if next.is_some_and(is_delimiter) {
            if word.is_empty() {
                None
            } else {
                Some(MatchField::from_name(word).ok_or_else(|| MatcherError::UnknownField {
                    name: word.to_owned(),
                    position: pos,
                })?)
            }
        } else {
            let token = match word {
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                other => {
                    return Err(MatcherError::Unexpected {
                        expected: "pattern or operator",
                        found: format!("'{other}'"),
                        position: pos,
                    });
                }
            };
            tokens.push(Spanned { token, position: pos });
            continue;
        };

        let Some((open, delim)) = chars.next() else {
            return Err(MatcherError::Unterminated { position: pos });
        };
        let mut pattern = String::new();
        let mut closed = false;
        while let Some((_, ch)) = chars.next() {
            if ch == '\\' && chars.peek().is_some_and(|&(_, n)| n == delim) {
                pattern.push(delim);
                let _ = chars.next();
            } else if ch == delim {
                closed = true;
                break;
            } else {
                pattern.push(ch);
            }
        }
        if !closed {
            return Err(MatcherError::Unterminated { position: open });
        }

        let mut case_insensitive = false;
        while let Some(&(i, flag)) = chars.peek() {
            if !is_word(flag) {
                break;
            }
            if flag != 'i' {
                return Err(MatcherError::UnknownFlag { flag, position: i });
            }
            case_insensitive = true;
            let _ = chars.next();
        }

        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| MatcherError::Regex {
                position: open,
                reason: e.to_string(),
            })?;
        tokens.push(Spanned {
            token: Token::Term(field, regex),
            position: pos,
        });
    }

    tokens.push(Spanned {
        token: Token::Eof,
        position: input.len(),
    });
    Ok(tokens)
}

// ─────────────────────────────────────────────────────────────────────────────
// Parser
// ─────────────────────────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<Spanned>,
    index: usize,
    depth: usize,
}

impl Parser {
    fn current(&self) -> &Spanned {
        let last = self.tokens.len() - 1;
        &self.tokens[self.index.min(last)]
    }

    fn matches(&mut self, token: &Token) -> bool {
        if &self.current().token == token {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn descend(&mut self) -> Result<(), MatcherError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(MatcherError::TooDeep {
                position: self.current().position,
            });
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Matcher, MatcherError> {
        let mut parts = vec![self.parse_and()?];
        while self.matches(&Token::Or) {
            parts.push(self.parse_and()?);
        }
        Ok(if parts.len() == 1 { parts.remove(0) } else { Matcher::Or(parts) })
    }

    fn parse_and(&mut self) -> Result<Matcher, MatcherError> {
        let mut parts = vec![self.parse_unary()?];
        while self.matches(&Token::And) {
            parts.push(self.parse_unary()?);
        }
        Ok(if parts.len() == 1 { parts.remove(0) } else { Matcher::And(parts) })
    }

    fn parse_unary(&mut self) -> Result<Matcher, MatcherError> {
        if self.matches(&Token::Not) {
            self.descend()?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Matcher::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Matcher, MatcherError> {
        let Spanned { token, position } = self.current().clone();
        match token {
            Token::Term(field, regex) => {
                self.index += 1;
                Ok(Matcher::Term { field, regex })
            }
            Token::LParen => {
                self.index += 1;
                self.descend()?;
                let expr = self.parse_or()?;
                if !self.matches(&Token::RParen) {
                    return Err(MatcherError::Unexpected {
                        expected: "')'",
                        found: self.current().token.to_string(),
                        position: self.current().position,
                    });
                }
                self.depth -= 1;
                Ok(expr)
            }
            other => Err(MatcherError::Unexpected {
                expected: "pattern or '('",
                found: other.to_string(),
                position,
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
