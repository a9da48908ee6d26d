//! Reasons a string is not a literal

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::lexer::{LexError, Token};

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Why the literal reconstructor rejected its input
///
/// None of these are fatal: the concatenator recovers from every variant by
/// keeping the joined text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LiteralError {
    #[error("syntax error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },

    #[error("name '{name}' is not a literal")]
    Name { name: String, span: Span },

    #[error("operator '{op}' is not allowed in a literal")]
    Operator { op: String, span: Span },

    #[error("unexpected indentation")]
    Indentation { span: Span },

    #[error("invalid token at {span:?}: {message}")]
    Lexical { span: Span, message: String },

    #[error("integer literal out of range")]
    IntegerRange { span: Span },

    #[error("empty input")]
    Empty,

    #[error("input of {len} bytes exceeds the limit of {limit}")]
    TooLong { len: usize, limit: usize },

    #[error("nesting exceeds the limit of {limit}")]
    TooDeep { span: Span, limit: usize },
}

impl LiteralError {
    pub(crate) fn from_lex(err: LexError, span: Span) -> Self {
        match err {
            LexError::IntegerTooLarge => LiteralError::IntegerRange { span },
            other => LiteralError::Lexical {
                span,
                message: other.message().to_string(),
            },
        }
    }

    /// Get the source span if available
    pub fn span(&self) -> Option<&Span> {
        match self {
            Self::Syntax { span, .. }
            | Self::Name { span, .. }
            | Self::Operator { span, .. }
            | Self::Indentation { span }
            | Self::Lexical { span, .. }
            | Self::IntegerRange { span }
            | Self::TooDeep { span, .. } => Some(span),
            Self::Empty | Self::TooLong { .. } => None,
        }
    }

    /// Resource bounds rather than malformed syntax
    pub fn is_resource_limit(&self) -> bool {
        matches!(self, Self::TooLong { .. } | Self::TooDeep { .. })
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let span = self.span().cloned().unwrap_or(0..source.len());
        let note = match self {
            Self::Syntax { expected, .. } if !expected.is_empty() => {
                format!("{}\nExpected: {}", self, expected.join(", "))
            }
            _ => self.to_string(),
        };

        let mut buf = Vec::new();
        let _ = Report::build(ReportKind::Error, filename, span.start)
            .with_message("not a literal")
            .with_label(
                Label::new((filename, span))
                    .with_message(note)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for LiteralError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::RichReason;

        let span = err.span().into_range();

        match err.found() {
            Some(Token::Ident(name)) => {
                return LiteralError::Name {
                    name: name.clone(),
                    span,
                }
            }
            Some(Token::Operator(op)) => {
                return LiteralError::Operator {
                    op: op.clone(),
                    span,
                }
            }
            Some(Token::Plus) | Some(Token::Minus) => {
                let op = if matches!(err.found(), Some(Token::Plus)) { "+" } else { "-" };
                return LiteralError::Operator {
                    op: op.to_string(),
                    span,
                };
            }
            _ => {}
        }

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => match found {
                Some(tok) => format!("unexpected {}", format_token(tok)),
                None => "unexpected end of input".to_string(),
            },
            RichReason::Custom(msg) => msg.to_string(),
            #[allow(unreachable_patterns)]
            _ => "invalid literal".to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                _ => None,
            })
            .collect();

        LiteralError::Syntax {
            span,
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::True => "'True'".to_string(),
        Token::False => "'False'".to_string(),
        Token::Null => "'None'".to_string(),
        Token::BracketOpen => "'['".to_string(),
        Token::BracketClose => "']'".to_string(),
        Token::ParenOpen => "'('".to_string(),
        Token::ParenClose => "')'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Plus => "'+'".to_string(),
        Token::Minus => "'-'".to_string(),
        Token::Newline => "newline".to_string(),
        Token::Int(n) => format!("integer {}", n),
        Token::Float(f) => format!("float {}", f),
        Token::Str(s) if s.bytes => "byte string".to_string(),
        Token::Str(_) => "string".to_string(),
        Token::Ident(s) => format!("name '{}'", s),
        Token::Operator(s) => format!("operator '{}'", s),
        Token::Comment | Token::Continuation => format!("{:?}", tok),
    }
}
