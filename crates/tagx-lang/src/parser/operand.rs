//! Operand readers.
//!
//! Every reader either consumes one operand from the front of the input and
//! returns its node, or reports no match with the input left untouched so the
//! next reader can try. Errors are reserved for input that is recognisably an
//! operand of that reader's kind but malformed inside.

use regex::Regex;

use crate::ast::{Func, Node, Selector, SelectorKind};
use crate::error::{CompileError, near};
use crate::functions::lookup;
use crate::parse_utils::{at_terminator, bang_run, ident, is_field_path, keyword, number_literal};
use crate::scan::{scan_paired, split_top_level};

use super::parse_node;

type ReadResult = Result<Option<Node>, CompileError>;
type Reader = fn(&mut &str) -> ReadResult;

/// Tried in order; groups come first so `(x)` is never taken for a path.
const READERS: &[Reader] = &[
    read_group,
    read_call,
    read_string,
    read_number,
    read_bool,
    read_nil,
    read_selector,
];

pub(super) fn read_operand(input: &mut &str) -> Result<Node, CompileError> {
    for reader in READERS {
        if let Some(node) = reader(input)? {
            return Ok(node);
        }
    }
    Err(no_operand(input))
}

fn no_operand(input: &str) -> CompileError {
    let body = input.trim_start_matches('!');
    let mut probe = body;
    let unmatched = match body.chars().next() {
        Some('(') => scan_paired(&mut probe, '(', ')').is_none().then_some('('),
        Some('\'') => scan_paired(&mut probe, '\'', '\'').is_none().then_some('\''),
        _ => None,
    };
    match unmatched {
        Some(open) => CompileError::UnmatchedBracket {
            open,
            near: near(input),
        },
        None => CompileError::ExpectedOperand { near: near(input) },
    }
}

fn odd(bangs: usize) -> bool {
    bangs % 2 == 1
}

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

fn read_group(input: &mut &str) -> ReadResult {
    let mut rest = *input;
    let bangs = bang_run(&mut rest).unwrap_or(0);
    let Some(content) = scan_paired(&mut rest, '(', ')') else {
        return Ok(None);
    };
    // `(path)$` is a selector.
    if rest.starts_with('$') {
        return Ok(None);
    }
    let inner = parse_node(&content)?;
    *input = rest;
    Ok(Some(Node::Group {
        negate: odd(bangs),
        inner: Box::new(inner),
    }))
}

// ---------------------------------------------------------------------------
// Function calls
// ---------------------------------------------------------------------------

fn read_call(input: &mut &str) -> ReadResult {
    let mut rest = *input;
    let bangs = bang_run(&mut rest).unwrap_or(0);
    let Ok(name) = ident(&mut rest) else {
        return Ok(None);
    };
    if !rest.starts_with('(') {
        return Ok(None);
    }
    let Some(content) = scan_paired(&mut rest, '(', ')') else {
        return Err(CompileError::UnmatchedBracket {
            open: '(',
            near: near(input),
        });
    };
    let pieces = split_top_level(&content);
    if pieces.iter().any(|p| p.is_empty()) {
        return Err(CompileError::ExpectedOperand {
            near: near(&content),
        });
    }
    let func = build_func(name, &pieces)?;
    *input = rest;
    Ok(Some(Node::Call {
        negate: odd(bangs),
        func,
    }))
}

fn build_func(name: &str, args: &[&str]) -> Result<Func, CompileError> {
    let func = match name {
        "len" => {
            arity(name, args, 0, Some(1), "0 or 1")?;
            Func::Len(Box::new(arg_or_current(args.first())?))
        }
        "regexp" => {
            arity(name, args, 1, Some(2), "1 or 2")?;
            let pattern = string_literal(args[0]).ok_or(CompileError::LiteralRequired {
                func: "regexp",
            })?;
            let pattern = Regex::new(&pattern).map_err(|e| CompileError::InvalidRegex {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
            Func::Regexp {
                pattern,
                subject: Box::new(arg_or_current(args.get(1))?),
            }
        }
        "sprintf" => {
            arity(name, args, 1, None, "at least 1")?;
            Func::Sprintf {
                format: Box::new(parse_node(args[0])?),
                args: parse_all(&args[1..])?,
            }
        }
        "in" => {
            arity(name, args, 1, None, "at least 1")?;
            Func::In {
                subject: Box::new(parse_node(args[0])?),
                candidates: parse_all(&args[1..])?,
            }
        }
        "range" => {
            arity(name, args, 2, Some(2), "2")?;
            Func::Range {
                subject: Box::new(parse_node(args[0])?),
                body: Box::new(parse_node(args[1])?),
            }
        }
        _ => {
            let predicate = lookup(name).ok_or_else(|| CompileError::UnknownFunction {
                name: name.to_string(),
            })?;
            arity(name, args, 0, Some(1), "0 or 1")?;
            Func::Custom {
                name: name.to_string(),
                predicate,
                arg: Box::new(arg_or_current(args.first())?),
            }
        }
    };
    Ok(func)
}

fn arity(
    func: &str,
    args: &[&str],
    min: usize,
    max: Option<usize>,
    expected: &'static str,
) -> Result<(), CompileError> {
    let got = args.len();
    if got < min || max.is_some_and(|max| got > max) {
        return Err(CompileError::Arity {
            func: func.to_string(),
            expected,
            got,
        });
    }
    Ok(())
}

fn arg_or_current(arg: Option<&&str>) -> Result<Node, CompileError> {
    match arg {
        Some(src) => parse_node(src),
        None => Ok(Node::current()),
    }
}

fn parse_all(args: &[&str]) -> Result<Vec<Node>, CompileError> {
    args.iter().map(|a| parse_node(a)).collect()
}

/// The content of `src` when it is exactly one quoted string.
fn string_literal(src: &str) -> Option<String> {
    let mut rest = src.trim();
    let content = scan_paired(&mut rest, '\'', '\'')?;
    rest.trim().is_empty().then_some(content)
}

// ---------------------------------------------------------------------------
// Literals
// ---------------------------------------------------------------------------

fn read_string(input: &mut &str) -> ReadResult {
    Ok(scan_paired(input, '\'', '\'').map(Node::Str))
}

fn read_number(input: &mut &str) -> ReadResult {
    let mut rest = *input;
    match number_literal(&mut rest) {
        Ok(n) if at_terminator(rest) => {
            *input = rest;
            Ok(Some(Node::Number(n)))
        }
        _ => Ok(None),
    }
}

fn read_bool(input: &mut &str) -> ReadResult {
    let mut rest = *input;
    let bangs = bang_run(&mut rest).unwrap_or(0);
    let value = if keyword("true")(&mut rest).is_ok() {
        true
    } else if keyword("false")(&mut rest).is_ok() {
        false
    } else {
        return Ok(None);
    };
    *input = rest;
    Ok(Some(Node::Bool(value != odd(bangs))))
}

fn read_nil(input: &mut &str) -> ReadResult {
    Ok(keyword("nil")(input).ok().map(|_| Node::Nil))
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

fn read_selector(input: &mut &str) -> ReadResult {
    let mut rest = *input;

    let path = if rest.starts_with('(') {
        match scan_paired(&mut rest, '(', ')') {
            Some(p) if p.is_empty() => None,
            Some(p) if is_field_path(&p) => Some(p),
            _ => return Ok(None),
        }
    } else {
        None
    };

    let Some(after) = rest.strip_prefix('$') else {
        return Ok(None);
    };
    rest = after;

    let kind = match rest.chars().next() {
        Some(c @ ('k' | 'v')) if ends_selector_head(&rest[1..]) => {
            rest = &rest[1..];
            if c == 'k' {
                SelectorKind::Key
            } else {
                SelectorKind::Value
            }
        }
        _ => SelectorKind::Field,
    };
    if path.is_some() && kind != SelectorKind::Field {
        return Ok(None);
    }

    let mut subscripts = Vec::new();
    while rest.starts_with('[') {
        let Some(content) = scan_paired(&mut rest, '[', ']') else {
            return Ok(None);
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        subscripts.push(parse_node(&content)?);
    }

    if !at_terminator(rest) {
        return Ok(None);
    }
    *input = rest;
    Ok(Some(Node::Selector(Selector {
        path,
        slot: 0,
        kind,
        subscripts,
    })))
}

fn ends_selector_head(rest: &str) -> bool {
    rest.starts_with('[') || at_terminator(rest)
}
