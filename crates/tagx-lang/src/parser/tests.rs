use super::*;
use crate::ast::SelectorKind;

fn tree(src: &str) -> String {
    parse_expression(src)
        .unwrap_or_else(|e| panic!("parse {src:?}: {e}"))
        .to_string()
}

fn err(src: &str) -> CompileError {
    match parse_expression(src) {
        Ok(expr) => panic!("expected error for {src:?}, got {expr}"),
        Err(e) => e,
    }
}

// ---------------------------------------------------------------------------
// Precedence correction
// ---------------------------------------------------------------------------

#[test]
fn left_associative_chain() {
    assert_eq!(tree("1+7+2"), "(+ (+ 1 7) 2)");
    assert_eq!(tree("8-4-2"), "(- (- 8 4) 2)");
}

#[test]
fn multiplication_binds_tighter() {
    assert_eq!(tree("2+3*4"), "(+ 2 (* 3 4))");
    assert_eq!(tree("2*3+4"), "(+ (* 2 3) 4)");
    assert_eq!(tree("1+2*3-4"), "(- (+ 1 (* 2 3)) 4)");
}

#[test]
fn rotation_cascades_across_levels() {
    assert_eq!(tree("1==2+3*4"), "(== 1 (+ 2 (* 3 4)))");
    assert_eq!(
        tree("true||false&&1<2"),
        "(|| true (&& false (< 1 2)))"
    );
    assert_eq!(tree("$>1&&$<5"), "(&& (> $ 1) (< $ 5))");
}

#[test]
fn groups_keep_their_shape() {
    assert_eq!(tree("(2+3)*4"), "(* (group (+ 2 3)) 4)");
    assert_eq!(tree("!(1<2)"), "!(group (< 1 2))");
    assert_eq!(tree("!!(1<2)"), "(group (< 1 2))");
}

#[test]
fn whitespace_between_tokens() {
    assert_eq!(tree("  1 +   2 * 3 "), "(+ 1 (* 2 3))");
}

// ---------------------------------------------------------------------------
// Operands
// ---------------------------------------------------------------------------

#[test]
fn literals() {
    assert_eq!(tree("'a'+'b'"), "(+ 'a' 'b')");
    assert_eq!(tree(r"'it\'s'"), r"'it\'s'");
    assert_eq!(tree("-2.5"), "-2.5");
    assert_eq!(tree("!true"), "false");
    assert_eq!(tree("!!false"), "false");
    assert_eq!(tree("nil"), "nil");
    assert_eq!(tree("1-1"), "(- 1 1)");
}

#[test]
fn keywords_need_terminators() {
    assert!(matches!(err("truex"), CompileError::ExpectedOperand { .. }));
    assert!(matches!(err("1.5.3"), CompileError::ExpectedOperand { .. }));
}

#[test]
fn selectors() {
    assert_eq!(tree("$"), "$");
    assert_eq!(tree("(a.b)$"), "(a.b)$");
    assert_eq!(tree("()$"), "$");
    assert_eq!(tree("$['len']"), "$['len']");
    assert_eq!(tree("$[0][1+1]"), "$[0][(+ 1 1)]");
    assert_eq!(tree("$k+$v[0]"), "(+ $k $v[0])");

    let expr = parse_expression("(a.b)$[(c)$]==(a.b)$").unwrap();
    assert_eq!(expr.field_paths(), vec!["a.b", "c"]);

    let mut slots = Vec::new();
    expr.root().walk_selectors(&mut |sel| {
        if let Some(path) = sel.path.as_deref() {
            slots.push((path, sel.slot));
        }
    });
    assert_eq!(slots, vec![("a.b", 0), ("c", 1), ("a.b", 0)]);

    let Node::BinOp { left, .. } = expr.root() else {
        panic!("expected comparison, got {expr}");
    };
    let Node::Selector(sel) = left.as_ref() else {
        panic!("expected selector, got {left}");
    };
    assert_eq!(sel.path.as_deref(), Some("a.b"));
    assert_eq!(sel.kind, SelectorKind::Field);
    assert_eq!(sel.subscripts.len(), 1);
}

#[test]
fn malformed_selectors_fail_whole() {
    assert!(matches!(err("$[]"), CompileError::ExpectedOperand { .. }));
    assert!(matches!(err("$[1"), CompileError::ExpectedOperand { .. }));
    assert!(matches!(err("(a)$k"), CompileError::ExpectedOperand { .. }));
    assert!(matches!(err("(a b)$"), CompileError::ExpectedOperand { .. }));
    assert!(matches!(err("$x"), CompileError::ExpectedOperand { .. }));
}

#[test]
fn functions() {
    assert_eq!(tree("len($)"), "(len $)");
    assert_eq!(tree("len()"), "(len $)");
    assert_eq!(tree("regexp('^a+$')"), "(regexp /^a+$/ $)");
    assert_eq!(tree(r"regexp('^\d+$', (x)$)"), r"(regexp /^\d+$/ (x)$)");
    assert_eq!(tree("sprintf('%d-%s', 1, 'a')"), "(sprintf '%d-%s' 1 'a')");
    assert_eq!(tree("in($, 1, 2)"), "(in $ 1 2)");
    assert_eq!(tree("range($, $v>0)"), "(range $ (> $v 0))");
    assert_eq!(tree("!len($)==1"), "(== !(len $) 1)");
    assert_eq!(tree("len('a,b')+1"), "(+ (len 'a,b') 1)");
}

#[test]
fn registered_functions_bind_at_parse_time() {
    assert_eq!(
        err("parser_probe_fn($)"),
        CompileError::UnknownFunction {
            name: "parser_probe_fn".into()
        }
    );
    crate::register_function("parser_probe_fn", |d: &crate::Datum<'_>| !d.is_nil(), false)
        .unwrap();
    assert_eq!(tree("parser_probe_fn()"), "(parser_probe_fn $)");
    assert_eq!(tree("!parser_probe_fn((a)$)"), "!(parser_probe_fn (a)$)");
}

#[test]
fn function_errors() {
    assert!(matches!(
        err("len(1, 2)"),
        CompileError::Arity { got: 2, .. }
    ));
    assert!(matches!(err("range($)"), CompileError::Arity { .. }));
    assert!(matches!(err("sprintf()"), CompileError::Arity { got: 0, .. }));
    assert_eq!(
        err("regexp($)"),
        CompileError::LiteralRequired { func: "regexp" }
    );
    assert!(matches!(err("regexp('(')"), CompileError::InvalidRegex { .. }));
    assert!(matches!(err("in($,)"), CompileError::ExpectedOperand { .. }));
    assert!(matches!(
        err("len($"),
        CompileError::UnmatchedBracket { open: '(', .. }
    ));
}

// ---------------------------------------------------------------------------
// Syntax errors
// ---------------------------------------------------------------------------

#[test]
fn syntax_errors() {
    assert_eq!(err(""), CompileError::Empty);
    assert_eq!(err("   "), CompileError::Empty);
    assert_eq!(err("1+"), CompileError::UnexpectedEnd { op: "+" });
    assert_eq!(err("1 &&  "), CompileError::UnexpectedEnd { op: "&&" });
    assert!(matches!(err("1 2"), CompileError::TrailingInput { .. }));
    assert!(matches!(err("(1)(2)"), CompileError::TrailingInput { .. }));
    assert!(matches!(
        err("(1+2"),
        CompileError::UnmatchedBracket { open: '(', .. }
    ));
    assert!(matches!(
        err("'abc"),
        CompileError::UnmatchedBracket { open: '\'', .. }
    ));
    assert!(matches!(err("1 + *"), CompileError::ExpectedOperand { .. }));
    assert!(matches!(err("()"), CompileError::Empty));
}

// ---------------------------------------------------------------------------
// Annotations
// ---------------------------------------------------------------------------

#[test]
fn annotation_blocks() {
    let exprs = parse_annotation("{@:$>1} {msg:'too small'}").unwrap();
    assert_eq!(exprs.len(), 2);
    assert_eq!(exprs[0].name, None);
    assert_eq!(exprs[0].display_name(), DEFAULT_NAME);
    assert_eq!(exprs[0].expr.to_string(), "(> $ 1)");
    assert_eq!(exprs[1].name.as_deref(), Some("msg"));
    assert_eq!(exprs[1].expr.source(), "'too small'");
}

#[test]
fn unbraced_annotation_is_default() {
    let exprs = parse_annotation(" len($)>0 ").unwrap();
    assert_eq!(exprs.len(), 1);
    assert_eq!(exprs[0].name, None);
    assert!(parse_annotation("").unwrap().is_empty());
}

#[test]
fn braces_inside_quotes_do_not_close_blocks() {
    let exprs = parse_annotation(r"{code:regexp('^\d{3}$')}").unwrap();
    assert_eq!(exprs[0].expr.to_string(), r"(regexp /^\d{3}$/ $)");
}

#[test]
fn annotation_errors() {
    assert_eq!(
        parse_annotation("{a:1}{a:2}").unwrap_err(),
        CompileError::DuplicateName { name: "a".into() }
    );
    assert_eq!(
        parse_annotation("{@:1}{@:2}").unwrap_err(),
        CompileError::DuplicateName { name: "@".into() }
    );
    assert!(matches!(
        parse_annotation("{a 1}").unwrap_err(),
        CompileError::InvalidName { .. }
    ));
    assert!(matches!(
        parse_annotation("{a-b:1}").unwrap_err(),
        CompileError::InvalidName { .. }
    ));
    assert!(matches!(
        parse_annotation("{a:1} x").unwrap_err(),
        CompileError::TrailingInput { .. }
    ));
    assert!(matches!(
        parse_annotation("{a:1").unwrap_err(),
        CompileError::UnmatchedBracket { open: '{', .. }
    ));
    assert!(matches!(
        parse_annotation("{a:}").unwrap_err(),
        CompileError::Empty
    ));
}

#[test]
fn reparse_is_deterministic() {
    let src = "{@:len($)>=2&&$!='ab'}{x:sprintf('%v', (a)$[$k])}";
    let first: Vec<String> = parse_annotation(src)
        .unwrap()
        .iter()
        .map(|e| e.expr.to_string())
        .collect();
    let second: Vec<String> = parse_annotation(src)
        .unwrap()
        .iter()
        .map(|e| e.expr.to_string())
        .collect();
    assert_eq!(first, second);
}
