//! Lexer for literal text using logos

use logos::{Lexer, Logos};

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Lexical failures, reported by token callbacks
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LexError {
    #[default]
    UnexpectedCharacter,
    LeadingZeros,
    IntegerTooLarge,
    UnterminatedString,
    NonAsciiBytes,
    InvalidEscape,
}

impl LexError {
    pub fn message(&self) -> &'static str {
        match self {
            LexError::UnexpectedCharacter => "unexpected character",
            LexError::LeadingZeros => "leading zeros in decimal integer literals are not permitted",
            LexError::IntegerTooLarge => "integer literal out of range",
            LexError::UnterminatedString => "unterminated string literal",
            LexError::NonAsciiBytes => "bytes can only contain ASCII literal characters",
            LexError::InvalidEscape => "invalid escape sequence",
        }
    }
}

/// A decoded string or byte-string literal
///
/// Byte strings keep one `char` per byte (all below U+0100) until the
/// grammar turns them into a `Vec<u8>`.
#[derive(Debug, Clone, PartialEq)]
pub struct StrLit {
    pub bytes: bool,
    pub value: String,
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\x0c]+")]
pub enum Token {
    // Keywords
    #[token("True")]
    True,
    #[token("False")]
    False,
    #[token("None")]
    Null,

    // Delimiters
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token(",")]
    Comma,

    // Signs are the only operators a literal may contain
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,

    #[regex(r"\r\n?|\n")]
    Newline,

    #[regex(r"[0-9](_?[0-9])*", decimal_int)]
    #[regex(r"0[xX](_?[0-9a-fA-F])+", |lex| radix_int(lex, 16))]
    #[regex(r"0[oO](_?[0-7])+", |lex| radix_int(lex, 8))]
    #[regex(r"0[bB](_?[01])+", |lex| radix_int(lex, 2))]
    Int(u64),

    #[regex(r"[0-9](_?[0-9])*\.([0-9](_?[0-9])*)?([eE][+-]?[0-9](_?[0-9])*)?", float)]
    #[regex(r"\.[0-9](_?[0-9])*([eE][+-]?[0-9](_?[0-9])*)?", float)]
    #[regex(r"[0-9](_?[0-9])*[eE][+-]?[0-9](_?[0-9])*", float)]
    Float(f64),

    // Only the prefix and opening quote are matched; the callback scans the body
    #[regex(r#"([rRuUbB]|[rR][bB]|[bB][rR])?['"]"#, string)]
    Str(StrLit),

    // Rejected by the grammar, lexed so errors can name them
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"[*/%@&|^~<>=!.:;{}]+", |lex| lex.slice().to_string())]
    Operator(String),

    // Comments and line continuations (skip)
    #[regex(r"#[^\r\n]*", logos::skip)]
    Comment,

    #[regex(r"\\(\r\n?|\n)", logos::skip)]
    Continuation,
}

fn decimal_int(lex: &mut Lexer<Token>) -> Result<u64, LexError> {
    let digits = lex.slice().replace('_', "");
    if digits.len() > 1 && digits.starts_with('0') && digits.bytes().any(|b| b != b'0') {
        return Err(LexError::LeadingZeros);
    }
    digits.parse().map_err(|_| LexError::IntegerTooLarge)
}

fn radix_int(lex: &mut Lexer<Token>, radix: u32) -> Result<u64, LexError> {
    let digits = lex.slice()[2..].replace('_', "");
    u64::from_str_radix(&digits, radix).map_err(|_| LexError::IntegerTooLarge)
}

fn float(lex: &mut Lexer<Token>) -> Option<f64> {
    lex.slice().replace('_', "").parse().ok()
}

fn string(lex: &mut Lexer<Token>) -> Result<StrLit, LexError> {
    let opening = lex.slice();
    let quote = opening.chars().last().ok_or(LexError::UnexpectedCharacter)?;
    let prefix = opening[..opening.len() - 1].to_ascii_lowercase();
    let raw = prefix.contains('r');
    let bytes = prefix.contains('b');

    let rest = lex.remainder();
    let closing: String = std::iter::repeat(quote).take(3).collect();
    let triple = rest.starts_with(&closing[..2]);
    let body_start = if triple { 2 } else { 0 };
    let body = &rest[body_start..];

    let mut value = String::new();
    let mut chars = body.char_indices().peekable();
    let consumed = loop {
        let Some((i, c)) = chars.next() else {
            return Err(LexError::UnterminatedString);
        };
        if bytes && !c.is_ascii() {
            return Err(LexError::NonAsciiBytes);
        }
        match c {
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    return Err(LexError::UnterminatedString);
                };
                if bytes && !escaped.is_ascii() {
                    return Err(LexError::NonAsciiBytes);
                }
                if raw {
                    value.push('\\');
                    value.push(escaped);
                } else {
                    unescape(escaped, &mut chars, bytes, &mut value)?;
                }
            }
            '\n' | '\r' if !triple => return Err(LexError::UnterminatedString),
            '\r' => {
                chars.next_if(|(_, c)| *c == '\n');
                value.push('\n');
            }
            c if c == quote => {
                if !triple {
                    break body_start + i + 1;
                }
                if body[i..].starts_with(&closing) {
                    break body_start + i + 3;
                }
                value.push(c);
            }
            c => value.push(c),
        }
    };

    lex.bump(consumed);
    Ok(StrLit { bytes, value })
}

fn unescape(
    escaped: char,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    bytes: bool,
    out: &mut String,
) -> Result<(), LexError> {
    let simple = match escaped {
        '\n' => return Ok(()),
        '\r' => {
            chars.next_if(|(_, c)| *c == '\n');
            return Ok(());
        }
        '\\' => '\\',
        '\'' => '\'',
        '"' => '"',
        'a' => '\x07',
        'b' => '\x08',
        'f' => '\x0c',
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'v' => '\x0b',
        '0'..='7' => {
            let mut code = escaped.to_digit(8).unwrap_or(0);
            for _ in 0..2 {
                match chars.next_if(|(_, c)| matches!(c, '0'..='7')) {
                    Some((_, d)) => code = code * 8 + d.to_digit(8).unwrap_or(0),
                    None => break,
                }
            }
            if bytes && code > 0xff {
                return Err(LexError::InvalidEscape);
            }
            char::from_u32(code).ok_or(LexError::InvalidEscape)?
        }
        'x' => hex_escape(chars, 2)?,
        'u' if !bytes => hex_escape(chars, 4)?,
        'U' if !bytes => hex_escape(chars, 8)?,
        // Named escapes need the Unicode name table
        'N' if !bytes => return Err(LexError::InvalidEscape),
        other => {
            out.push('\\');
            other
        }
    };
    out.push(simple);
    Ok(())
}

fn hex_escape(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    width: usize,
) -> Result<char, LexError> {
    let mut code = 0u32;
    for _ in 0..width {
        let (_, c) = chars
            .next_if(|(_, c)| c.is_ascii_hexdigit())
            .ok_or(LexError::InvalidEscape)?;
        code = code * 16 + c.to_digit(16).unwrap_or(0);
    }
    char::from_u32(code).ok_or(LexError::InvalidEscape)
}

/// Lex input string into tokens with spans, stopping at the first error
pub fn lex(input: &str) -> Result<Vec<(Token, Span)>, crate::LiteralError> {
    let mut lexer = Token::lexer(input);
    let mut tokens = Vec::new();
    while let Some(tok) = lexer.next() {
        let span = lexer.span();
        match tok {
            Ok(t) => tokens.push((t, span)),
            Err(e) => return Err(crate::LiteralError::from_lex(e, span)),
        }
    }
    Ok(tokens)
}
