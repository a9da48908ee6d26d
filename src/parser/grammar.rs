//! Literal grammar using chumsky
//!
//! Builds a [`Value`] straight from tokens. Nothing here evaluates: a token
//! that is not part of a literal (a name, an operator other than a leading
//! sign) fails the parse.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::config::LiteralLimits;
use crate::parser::lexer::{self, Span, StrLit, Token};
use crate::value::Value;
use crate::LiteralError;

#[derive(Debug, Clone)]
enum Number {
    Int(u64),
    Float(f64),
}

/// Parse `input` as a single literal value
pub fn parse_literal(input: &str, limits: &LiteralLimits) -> Result<Value, LiteralError> {
    if input.len() > limits.max_len {
        return Err(LiteralError::TooLong {
            len: input.len(),
            limit: limits.max_len,
        });
    }

    let tokens = arrange_lines(lexer::lex(input)?, input, limits)?;
    if tokens.is_empty() {
        return Err(LiteralError::Empty);
    }

    let len = input.len();

    // Turn the token list into a stream that chumsky can use
    let token_stream = Stream::from_iter(tokens.into_iter().map(|(tok, span)| (tok, span.into())))
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    literal_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| {
            errs.into_iter()
                .next()
                .map(LiteralError::from)
                .unwrap_or(LiteralError::Empty)
        })
}

/// Apply the line rules a literal must follow before parsing
///
/// Newlines inside brackets are dropped, as are blank lines before and after
/// the value. A newline left between two top-level tokens fails the parse.
/// The first token must start its line, and bracket nesting is bounded so
/// the recursive grammar never runs deep.
fn arrange_lines(
    tokens: Vec<(Token, Span)>,
    input: &str,
    limits: &LiteralLimits,
) -> Result<Vec<(Token, Span)>, LiteralError> {
    let mut depth = 0usize;
    let mut out: Vec<(Token, Span)> = Vec::with_capacity(tokens.len());

    for (tok, span) in tokens {
        match tok {
            Token::BracketOpen | Token::ParenOpen => {
                depth += 1;
                if depth > limits.max_depth {
                    return Err(LiteralError::TooDeep {
                        span,
                        limit: limits.max_depth,
                    });
                }
            }
            Token::BracketClose | Token::ParenClose => depth = depth.saturating_sub(1),
            Token::Newline if depth > 0 || out.is_empty() => continue,
            _ => {}
        }
        out.push((tok, span));
    }

    while matches!(out.last(), Some((Token::Newline, _))) {
        out.pop();
    }

    if let Some((_, span)) = out.first() {
        let line_start = input[..span.start]
            .rfind(|c: char| c == '\n' || c == '\r')
            .map_or(0, |i| i + 1);
        if line_start < span.start {
            return Err(LiteralError::Indentation {
                span: line_start..span.start,
            });
        }
    }

    Ok(out)
}

fn signed_number(negative: bool, number: Number) -> Option<Value> {
    match number {
        Number::Int(magnitude) => {
            let value = if negative {
                -(magnitude as i128)
            } else {
                magnitude as i128
            };
            i64::try_from(value).ok().map(Value::Integer)
        }
        Number::Float(f) => Some(Value::Float(if negative { -f } else { f })),
    }
}

/// Adjacent string literals concatenate; bytes and text cannot mix
fn join_strings(parts: Vec<StrLit>) -> Result<Value, &'static str> {
    let bytes = parts.first().map_or(false, |p| p.bytes);
    if parts.iter().any(|p| p.bytes != bytes) {
        return Err("cannot mix bytes and nonbytes literals");
    }
    let joined: String = parts.into_iter().map(|p| p.value).collect();
    if bytes {
        Ok(Value::Bytes(joined.chars().map(|c| c as u8).collect()))
    } else {
        Ok(Value::String(joined))
    }
}

/// `first` alone, or a tuple when a comma followed it
fn single_or_tuple(first: Value, rest: Option<Vec<Value>>) -> Value {
    match rest {
        None => first,
        Some(rest) => Value::Tuple(std::iter::once(first).chain(rest).collect()),
    }
}

fn literal_parser<'a, I>() -> impl Parser<'a, I, Value, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let value = recursive(|value| {
        let number = select! {
            Token::Int(n) => Number::Int(n),
            Token::Float(f) => Number::Float(f),
        };

        let sign = choice((just(Token::Minus).to(true), just(Token::Plus).to(false)));

        // Parentheses vanish around a number, so `-(1)` is still a signed literal
        let wrapped_number = recursive(|wrapped| {
            number
                .clone()
                .or(wrapped.delimited_by(just(Token::ParenOpen), just(Token::ParenClose)))
        });

        // A single sign in front of a number
        let signed = sign
            .clone()
            .or_not()
            .then(number)
            .or(sign.then(wrapped_number).map(|(sign, n)| (Some(sign), n)))
            .try_map(|(sign, n), span| {
                signed_number(sign == Some(true), n)
                    .ok_or_else(|| Rich::custom(span, "integer literal out of range"))
            });

        let strings = select! { Token::Str(s) => s }
            .repeated()
            .at_least(1)
            .collect::<Vec<_>>()
            .try_map(|parts, span| join_strings(parts).map_err(|msg| Rich::custom(span, msg)));

        let keyword = select! {
            Token::True => Value::Boolean(true),
            Token::False => Value::Boolean(false),
            Token::Null => Value::Null,
        };

        let list = value
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
            .map(Value::Sequence);

        let empty_tuple = just(Token::ParenOpen)
            .then(just(Token::ParenClose))
            .to(Value::Tuple(Vec::new()));

        // `(a)` is just `a`; `(a,)` and `(a, b)` are tuples
        let group = value
            .clone()
            .then(
                just(Token::Comma)
                    .ignore_then(
                        value
                            .clone()
                            .separated_by(just(Token::Comma))
                            .allow_trailing()
                            .collect::<Vec<_>>(),
                    )
                    .or_not(),
            )
            .map(|(first, rest)| single_or_tuple(first, rest))
            .delimited_by(just(Token::ParenOpen), just(Token::ParenClose));

        choice((signed, strings, keyword, list, empty_tuple, group)).boxed()
    });

    // A bare comma-separated list at the top level is a tuple
    value
        .clone()
        .then(
            just(Token::Comma)
                .ignore_then(
                    value
                        .separated_by(just(Token::Comma))
                        .allow_trailing()
                        .collect::<Vec<_>>(),
                )
                .or_not(),
        )
        .map(|(first, rest)| single_or_tuple(first, rest))
        .then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> Result<Value, LiteralError> {
        parse_literal(input, &LiteralLimits::default())
    }

    fn ok(input: &str) -> Value {
        parse(input).expect("Should parse")
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(ok("1234"), Value::Integer(1234));
        assert_eq!(ok("0.0007"), Value::Float(0.0007));
        assert_eq!(ok("True"), Value::Boolean(true));
        assert_eq!(ok("None"), Value::Null);
        assert_eq!(ok("'Jinja'"), Value::from("Jinja"));
        assert_eq!(ok("b'bytes'"), Value::Bytes(b"bytes".to_vec()));
    }

    #[test]
    fn test_parse_signed_numbers() {
        assert_eq!(ok("-3"), Value::Integer(-3));
        assert_eq!(ok("+2.5"), Value::Float(2.5));
        assert_eq!(ok("-9223372036854775808"), Value::Integer(i64::MIN));
        assert!(parse("9223372036854775808").is_err());
        assert!(parse("--1").is_err());
    }

    #[test]
    fn test_sign_before_parenthesized_number() {
        assert_eq!(ok("-(1)"), Value::Integer(-1));
        assert_eq!(ok("+((2.5))"), Value::Float(2.5));
        assert_eq!(
            ok("[-(3), 4]"),
            Value::Sequence(vec![Value::Integer(-3), Value::Integer(4)])
        );
        assert!(parse("-(-1)").is_err());
        assert!(parse("-(1,)").is_err());
        assert!(parse("-('a')").is_err());
    }

    #[test]
    fn test_carriage_return_line_endings() {
        assert_eq!(ok("True\r"), Value::Boolean(true));
        assert_eq!(ok("\r\n[1,\r2]\r\n"), Value::from(vec![1i64, 2]));
        assert!(matches!(
            parse("1\r  2"),
            Err(LiteralError::Syntax { .. })
        ));
        assert!(matches!(
            parse("\r  1"),
            Err(LiteralError::Indentation { .. })
        ));
    }

    #[test]
    fn test_parse_sequences() {
        assert_eq!(
            ok("[1, 'a', [None]]"),
            Value::Sequence(vec![
                Value::Integer(1),
                Value::from("a"),
                Value::Sequence(vec![Value::Null]),
            ])
        );
        assert_eq!(ok("[]"), Value::Sequence(vec![]));
        assert_eq!(ok("[1,]"), Value::Sequence(vec![Value::Integer(1)]));
    }

    #[test]
    fn test_parse_tuples() {
        assert_eq!(ok("()"), Value::Tuple(vec![]));
        assert_eq!(ok("(1)"), Value::Integer(1));
        assert_eq!(ok("(1,)"), Value::Tuple(vec![Value::Integer(1)]));
        assert_eq!(
            ok("1, 2"),
            Value::Tuple(vec![Value::Integer(1), Value::Integer(2)])
        );
        assert_eq!(ok("1,"), Value::Tuple(vec![Value::Integer(1)]));
    }

    #[test]
    fn test_parse_bare_tuple_of_strings() {
        assert_eq!(
            ok("'1', 'data', '2', b'bytes'"),
            Value::Tuple(vec![
                Value::from("1"),
                Value::from("data"),
                Value::from("2"),
                Value::Bytes(b"bytes".to_vec()),
            ])
        );
    }

    #[test]
    fn test_adjacent_strings_concatenate() {
        assert_eq!(ok("'a' \"b\""), Value::from("ab"));
        assert!(parse("'a' b'b'").is_err());
    }

    #[test]
    fn test_multiline_inside_brackets() {
        assert_eq!(
            ok("[1,\n  2]  # two\n"),
            Value::Sequence(vec![Value::Integer(1), Value::Integer(2)])
        );
        assert!(parse("1\n2").is_err());
    }

    #[test]
    fn test_leading_whitespace_rejected() {
        assert!(matches!(
            parse(" True"),
            Err(LiteralError::Indentation { .. })
        ));
        assert_eq!(ok("True  "), Value::Boolean(true));
        assert_eq!(ok("\nTrue"), Value::Boolean(true));
    }

    #[test]
    fn test_names_rejected() {
        assert!(matches!(
            parse("[a, 1]"),
            Err(LiteralError::Name { ref name, .. }) if name == "a"
        ));
        assert!(matches!(parse("abcd"), Err(LiteralError::Name { .. })));
    }

    #[test]
    fn test_operators_rejected() {
        assert!(matches!(
            parse("['a', 'b'] + ['c', 'd']"),
            Err(LiteralError::Operator { .. })
        ));
        assert!(parse("1 * 2").is_err());
        assert!(parse("{1: 2}").is_err());
        assert!(parse("f'x'").is_err());
        assert!(parse("1j").is_err());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse(""), Err(LiteralError::Empty));
        assert_eq!(parse("  # nothing"), Err(LiteralError::Empty));
    }

    #[test]
    fn test_length_limit() {
        let limits = LiteralLimits::new().with_max_len(4);
        assert!(matches!(
            parse_literal("12345", &limits),
            Err(LiteralError::TooLong { len: 5, limit: 4 })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let limits = LiteralLimits::new().with_max_depth(3);
        assert_eq!(
            parse_literal("[[[1]]]", &limits).unwrap(),
            Value::Sequence(vec![Value::Sequence(vec![Value::Sequence(vec![
                Value::Integer(1)
            ])])])
        );
        assert!(matches!(
            parse_literal("[[[[1]]]]", &limits),
            Err(LiteralError::TooDeep { limit: 3, .. })
        ));
    }

    #[test]
    fn test_deep_nesting_does_not_overflow() {
        let input = format!("{}{}", "[".repeat(10_000), "]".repeat(10_000));
        assert!(matches!(parse(&input), Err(LiteralError::TooDeep { .. })));
    }
}
