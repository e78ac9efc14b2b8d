use winnow::ascii::multispace0;
use winnow::combinator::{alt, opt};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{literal, one_of, take_while};

use crate::ast::BinOp;

// ---------------------------------------------------------------------------
// Whitespace & terminators
// ---------------------------------------------------------------------------

/// Skip leading whitespace.
pub fn ws_skip(input: &mut &str) {
    let _: ModalResult<&str> = multispace0.parse_next(input);
}

/// Characters that may start an operator.
pub const OPERATOR_CHARS: &[char] = &['+', '-', '*', '/', '%', '<', '>', '=', '!', '&', '|'];

/// True when an operand may end at this point: end of input, whitespace, or
/// the start of an operator.
pub fn at_terminator(rest: &str) -> bool {
    match rest.chars().next() {
        None => true,
        Some(c) => c.is_whitespace() || OPERATOR_CHARS.contains(&c),
    }
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

pub fn ident<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    // First character must be alphabetic or underscore (not digit).
    if !input.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_').parse_next(input)
}

/// True for `[A-Za-z0-9_]+`.
pub fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// True for dot-separated words such as `a.b_c.d`.
pub fn is_field_path(s: &str) -> bool {
    s.split('.').all(is_word)
}

/// Consume a run of `!` and return its length.
pub fn bang_run(input: &mut &str) -> ModalResult<usize> {
    take_while(0.., '!')
        .map(|s: &str| s.len())
        .parse_next(input)
}

/// Match an exact keyword that must be followed by a terminator.
pub fn keyword<'a>(word: &'static str) -> impl FnMut(&mut &'a str) -> ModalResult<()> {
    move |input: &mut &'a str| {
        let saved = *input;
        literal(word).parse_next(input)?;
        if !at_terminator(input) {
            *input = saved;
            return Err(ErrMode::Backtrack(ContextError::new()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Number literal
// ---------------------------------------------------------------------------

/// Parse `[+-]?digits(.digits)?` as a float.
pub fn number_literal(input: &mut &str) -> ModalResult<f64> {
    let saved = *input;
    let sign = opt(one_of(['+', '-'])).parse_next(input)?;
    let integer_part = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let frac_part = opt(('.', take_while(1.., |c: char| c.is_ascii_digit())))
        .parse_next(input)?
        .map(|(_, digits): (char, &str)| digits);

    let mut text = String::with_capacity(saved.len() - input.len());
    if sign == Some('-') {
        text.push('-');
    }
    text.push_str(integer_part);
    if let Some(frac) = frac_part {
        text.push('.');
        text.push_str(frac);
    }
    text.parse::<f64>().map_err(|_| {
        *input = saved;
        ErrMode::Backtrack(ContextError::new())
    })
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// Parse one binary operator, two-character forms first.
pub fn operator(input: &mut &str) -> ModalResult<BinOp> {
    alt((
        literal("==").value(BinOp::Eq),
        literal("!=").value(BinOp::Ne),
        literal("<=").value(BinOp::Le),
        literal(">=").value(BinOp::Ge),
        literal("&&").value(BinOp::And),
        literal("||").value(BinOp::Or),
        literal("<").value(BinOp::Lt),
        literal(">").value(BinOp::Gt),
        literal("+").value(BinOp::Add),
        literal("-").value(BinOp::Sub),
        literal("*").value(BinOp::Mul),
        literal("/").value(BinOp::Div),
        literal("%").value(BinOp::Mod),
    ))
    .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers() {
        let mut input = "12.5+1";
        assert_eq!(number_literal(&mut input).unwrap(), 12.5);
        assert_eq!(input, "+1");

        let mut input = "-3";
        assert_eq!(number_literal(&mut input).unwrap(), -3.0);

        let mut input = "7.";
        assert_eq!(number_literal(&mut input).unwrap(), 7.0);
        assert_eq!(input, ".");

        let mut input = "x";
        assert!(number_literal(&mut input).is_err());
    }

    #[test]
    fn operators_prefer_two_chars() {
        let mut input = "<=1";
        assert_eq!(operator(&mut input).unwrap(), BinOp::Le);
        assert_eq!(input, "1");

        let mut input = "<1";
        assert_eq!(operator(&mut input).unwrap(), BinOp::Lt);

        let mut input = "!x";
        assert!(operator(&mut input).is_err());
    }

    #[test]
    fn keyword_needs_terminator() {
        let mut input = "true&&x";
        assert!(keyword("true")(&mut input).is_ok());
        assert_eq!(input, "&&x");

        let mut input = "trueish";
        assert!(keyword("true")(&mut input).is_err());
        assert_eq!(input, "trueish");
    }

    #[test]
    fn paths() {
        assert!(is_field_path("a.b_c.d1"));
        assert!(!is_field_path("a..b"));
        assert!(!is_field_path(".a"));
        assert!(!is_field_path("a b"));
    }
}
