use std::collections::{BTreeMap, HashMap};

use super::*;
use crate::parser::parse_expression;
use crate::value::AsDatum;

fn eval_with(src: &str, current: Datum<'_>) -> Value {
    let expr = parse_expression(src).unwrap_or_else(|e| panic!("parse {src:?}: {e}"));
    expr.eval_value(&CurrentScope(current))
}

fn eval(src: &str) -> Value {
    eval_with(src, Datum::Nil)
}

fn number(src: &str) -> f64 {
    match eval(src) {
        Value::Number(n) => n,
        other => panic!("{src:?} evaluated to {other:?}"),
    }
}

/// A scope with named sibling fields.
struct Fields<'a> {
    current: Datum<'a>,
    named: Vec<(&'static str, Datum<'a>)>,
}

impl Scope for Fields<'_> {
    fn field(&self, path: Option<&str>) -> Datum<'_> {
        match path {
            None => self.current.clone(),
            Some(path) => self
                .named
                .iter()
                .find(|(name, _)| *name == path)
                .map_or(Datum::Nil, |(_, d)| d.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

#[test]
fn addition_chains() {
    assert_eq!(number("1+7+2"), 10.0);
    assert!((number("1+7+2.2") - 10.2).abs() < 1e-9);
    assert_eq!(eval("'a'+'b'+'c'"), Value::from("abc"));
}

#[test]
fn precedence_is_respected() {
    assert_eq!(number("2+3*4"), 14.0);
    assert_eq!(number("(2+3)*4"), 20.0);
    assert_eq!(number("10-4/2*3"), 4.0);
    assert_eq!(number("7%4+1"), 4.0);
}

#[test]
fn division_by_zero_is_nan() {
    assert!(number("5/0").is_nan());
    assert!(number("5%0").is_nan());
    assert!(number("5%0.5").is_nan());
}

#[test]
fn plus_with_mixed_operands_yields_right() {
    assert_eq!(eval("1+'a'"), Value::from("a"));
    assert_eq!(eval("'a'+1"), Value::Number(1.0));
    assert_eq!(eval("true+nil"), Value::Nil);
}

#[test]
fn other_arithmetic_coerces() {
    assert_eq!(number("'6'*2"), 12.0);
    assert_eq!(number("true-false"), 1.0);
    assert_eq!(number("'x'-1"), -1.0);
}

// ---------------------------------------------------------------------------
// Comparison and logic
// ---------------------------------------------------------------------------

#[test]
fn comparisons_need_matching_types() {
    assert_eq!(eval("'b'>'a'"), Value::Bool(true));
    assert_eq!(eval("2>=2"), Value::Bool(true));
    assert_eq!(eval("1<'2'"), Value::Bool(false));
    assert_eq!(eval("nil<1"), Value::Bool(false));
}

#[test]
fn equality() {
    assert_eq!(eval("1=='1'"), Value::Bool(false));
    assert_eq!(eval("1!='1'"), Value::Bool(true));
    assert_eq!(eval("true==true"), Value::Bool(true));
    assert_eq!(eval("nil==nil"), Value::Bool(true));
    assert_eq!(eval("$==nil"), Value::Bool(true));
    assert_eq!(eval("0/0==0/0"), Value::Bool(false));
}

#[test]
fn truthiness() {
    assert_eq!(eval("0&&true"), Value::Bool(false));
    assert_eq!(eval("''||true"), Value::Bool(true));
    assert_eq!(eval("nil&&true"), Value::Bool(false));
    assert_eq!(eval("(missing)$&&true"), Value::Bool(false));
    assert_eq!(eval("'x'&&2"), Value::Bool(true));
    assert_eq!(eval("0||''"), Value::Bool(false));
}

#[test]
fn negation_applies_to_booleans_only() {
    assert_eq!(eval("!(1<2)"), Value::Bool(false));
    assert_eq!(eval("!(1+1)"), Value::Number(2.0));
    assert_eq!(eval("!len('ab')"), Value::Number(2.0));
}

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

#[test]
fn sequence_subscripts() {
    let v = vec![10_i32, 20, 30];
    let cur = || v.as_datum();
    assert_eq!(eval_with("$[1]", cur()), Value::Number(20.0));
    assert_eq!(eval_with("$[1.9]", cur()), Value::Number(20.0));
    assert_eq!(eval_with("$[-1]", cur()), Value::Nil);
    assert_eq!(eval_with("$[5]", cur()), Value::Nil);
    assert_eq!(eval_with("$['x']", cur()), Value::Nil);
    assert_eq!(eval_with("$[len($)-1]", cur()), Value::Number(30.0));
    assert_eq!(eval_with("$", cur()), Value::Nil);
}

#[test]
fn nested_subscripts() {
    let v = vec![vec!["a".to_string()], vec!["b".to_string(), "c".to_string()]];
    assert_eq!(eval_with("$[1][1]", v.as_datum()), Value::from("c"));
    assert_eq!(eval_with("$[0][1]", v.as_datum()), Value::Nil);
    assert_eq!(eval_with("$[0][0][0]", v.as_datum()), Value::Nil);
}

#[test]
fn mapping_subscript_matches_len() {
    let mut m = HashMap::new();
    m.insert("len".to_string(), 2_i64);
    m.insert("other".to_string(), 9_i64);
    assert_eq!(eval_with("len($)==$['len']", m.as_datum()), Value::Bool(true));

    m.insert("third".to_string(), 1_i64);
    assert_eq!(eval_with("len($)==$['len']", m.as_datum()), Value::Bool(false));
}

#[test]
fn integer_keyed_mapping() {
    let mut m = BTreeMap::new();
    m.insert(3_u32, "three".to_string());
    assert_eq!(eval_with("$[1+2]", m.as_datum()), Value::from("three"));
    assert_eq!(eval_with("$['3']", m.as_datum()), Value::Nil);
}

#[test]
fn sibling_fields() {
    let tags = vec!["x".to_string(), "y".to_string()];
    let scope = Fields {
        current: Datum::Number(1.0),
        named: vec![
            ("a", Datum::Number(2.0)),
            ("b.c", Datum::Number(3.0)),
            ("tags", tags.as_datum()),
        ],
    };
    let eval = |src: &str| parse_expression(src).unwrap().eval_value(&scope);
    assert_eq!(eval("$+(a)$*(b.c)$"), Value::Number(7.0));
    assert_eq!(eval("(tags)$[$]"), Value::from("y"));
    assert_eq!(eval("(nope)$==nil"), Value::Bool(true));
}

/// Answers `(path)$` by slot only.
struct Slots(Vec<f64>);

impl Scope for Slots {
    fn field(&self, _path: Option<&str>) -> Datum<'_> {
        Datum::Nil
    }

    fn field_at(&self, slot: usize, _path: &str) -> Datum<'_> {
        self.0.as_slice().get(slot).map_or(Datum::Nil, |n| Datum::Number(*n))
    }
}

#[test]
fn field_references_go_through_slots() {
    let scope = Slots(vec![10.0, 3.0]);
    let expr = parse_expression("(x)$-(y)$*2+(x)$").unwrap();
    assert_eq!(expr.eval_value(&scope), Value::Number(14.0));
    // Slots follow first appearance, not names.
    let expr = parse_expression("(y)$-(x)$").unwrap();
    assert_eq!(expr.eval_value(&scope), Value::Number(7.0));
}

#[test]
fn key_and_value_outside_range_are_nil() {
    assert_eq!(eval("$k"), Value::Nil);
    assert_eq!(eval("$v==nil"), Value::Bool(true));
}

// ---------------------------------------------------------------------------
// Built-ins
// ---------------------------------------------------------------------------

#[test]
fn len_counts_characters() {
    assert_eq!(eval_with("len($)", Datum::str("héllo世")), Value::Number(6.0));
    assert_eq!(eval_with("len($)", Datum::str("")), Value::Number(0.0));
    assert_eq!(eval_with("len($)", Datum::Number(12.0)), Value::Nil);
    assert_eq!(eval_with("len($)", Datum::Bool(true)), Value::Nil);
    assert_eq!(eval_with("len()", Datum::Nil), Value::Nil);
}

#[test]
fn regexp_matches_text_only() {
    assert_eq!(eval_with("regexp('^a.c$')", Datum::str("abc")), Value::Bool(true));
    assert_eq!(eval_with("regexp('^a.c$', 'xyz')", Datum::Nil), Value::Bool(false));
    assert_eq!(eval_with("regexp('^a')", Datum::Number(5.0)), Value::Nil);
    assert_eq!(eval_with("!regexp('^x')", Datum::str("abc")), Value::Bool(true));
}

#[test]
fn sprintf_formats_arguments() {
    assert_eq!(
        eval_with("sprintf('%s-%d', $, 7)", Datum::str("x")),
        Value::from("x-7")
    );
    assert_eq!(eval("sprintf('%v')"), Value::from("%!v(MISSING)"));
    assert_eq!(eval("sprintf(1)"), Value::Nil);
    assert_eq!(
        eval("len(sprintf('%999999999999999d', 1))"),
        Value::Number(13.0)
    );
}

#[test]
fn in_compares_with_equality() {
    assert_eq!(eval_with("in($, 1, 2, 3)", Datum::Number(2.0)), Value::Bool(true));
    assert_eq!(eval_with("in($, '2')", Datum::Number(2.0)), Value::Bool(false));
    assert_eq!(eval_with("in($)", Datum::Number(2.0)), Value::Bool(false));
    assert_eq!(eval_with("!in($, nil)", Datum::Nil), Value::Bool(false));
}

#[test]
fn range_over_sequences() {
    let v = vec![6_i32, 7, 8];
    assert_eq!(eval_with("range($, $v>5)", v.as_datum()), Value::Bool(true));
    assert_eq!(eval_with("range($, $k<2)", v.as_datum()), Value::Bool(false));
    assert_eq!(
        eval_with("range($, $v==$[$k])", v.as_datum()),
        Value::Bool(true)
    );
    let empty: Vec<i32> = Vec::new();
    assert_eq!(eval_with("range($, false)", empty.as_datum()), Value::Bool(true));
    assert_eq!(eval_with("range($, true)", Datum::str("abc")), Value::Nil);
}

#[test]
fn range_over_mappings() {
    let mut m = BTreeMap::new();
    m.insert("a".to_string(), vec![1_i32]);
    m.insert("bb".to_string(), vec![2_i32, 3]);
    assert_eq!(
        eval_with("range($, len($k)==len($v))", m.as_datum()),
        Value::Bool(true)
    );
    assert_eq!(
        eval_with("range($, range($v, $v>1))", m.as_datum()),
        Value::Bool(false)
    );
}

#[test]
fn registered_predicate() {
    crate::register_function(
        "eval_is_even",
        |d: &Datum<'_>| d.as_number().is_some_and(|n| n % 2.0 == 0.0),
        false,
    )
    .unwrap();
    assert_eq!(eval_with("eval_is_even()", Datum::Number(4.0)), Value::Bool(true));
    assert_eq!(eval_with("!eval_is_even($+1)", Datum::Number(4.0)), Value::Bool(true));
    assert_eq!(eval_with("eval_is_even('4')", Datum::Nil), Value::Bool(false));
}

// ---------------------------------------------------------------------------
// Views and determinism
// ---------------------------------------------------------------------------

#[test]
fn eval_keeps_collection_views() {
    let v = vec![1_i32, 2];
    let expr = parse_expression("$").unwrap();
    let scope = CurrentScope(v.as_datum());
    match expr.eval(&scope) {
        Datum::Seq(seq) => assert_eq!(seq.len(), 2),
        other => panic!("expected sequence, got {other:?}"),
    }
}

#[test]
fn reparsed_expressions_agree() {
    let src = "len($)>=2&&$[0]!=$[1]||sprintf('%v', $[0])=='x'";
    let v = vec!["x".to_string(), "y".to_string()];
    let a = parse_expression(src).unwrap();
    let b = parse_expression(src).unwrap();
    let scope = CurrentScope(v.as_datum());
    assert_eq!(a.eval_value(&scope), b.eval_value(&scope));
    assert_eq!(a.eval_value(&scope), Value::Bool(true));
}
