//! Tree-walking evaluator.
//!
//! Evaluation never fails: type mismatches, missing fields and unaddressable
//! subscripts all degrade to `Nil`, `false` or NaN.

mod builtins;
mod ops;
mod sprintf;

#[cfg(test)]
mod tests;

use crate::ast::{Expression, Node, Selector, SelectorKind};
use crate::value::{Datum, Mapping, Sequence, Value};

pub use ops::truthy;
pub use sprintf::sprintf;

/// Field access for an expression being evaluated.
pub trait Scope {
    /// Live value of the field behind `(path)$`; `None` is the field owning
    /// the expression. Unknown paths yield `Nil`.
    fn field(&self, path: Option<&str>) -> Datum<'_>;

    /// Field behind `(path)$` where `slot` is the selector's position in
    /// [`Expression::field_paths`]. Scopes that resolved paths up front
    /// index by `slot`; the default looks `path` up.
    fn field_at(&self, _slot: usize, path: &str) -> Datum<'_> {
        self.field(Some(path))
    }
}

/// A scope holding only the current value `$`; every `(path)$` is `Nil`.
pub struct CurrentScope<'a>(pub Datum<'a>);

impl Scope for CurrentScope<'_> {
    fn field(&self, path: Option<&str>) -> Datum<'_> {
        match path {
            None => self.0.clone(),
            Some(_) => Datum::Nil,
        }
    }
}

/// Evaluation context: the scope plus the element bound by `range()`.
struct Frame<'a> {
    scope: &'a dyn Scope,
    element: Option<(Datum<'a>, Datum<'a>)>,
}

impl Expression {
    /// Evaluate against `scope`, keeping collections and records as views.
    pub fn eval<'a>(&'a self, scope: &'a dyn Scope) -> Datum<'a> {
        let frame = Frame {
            scope,
            element: None,
        };
        eval_node(self.root(), &frame)
    }

    /// Evaluate against `scope` and project the result onto a [`Value`].
    pub fn eval_value(&self, scope: &dyn Scope) -> Value {
        self.eval(scope).into_value()
    }
}

fn eval_node<'a>(node: &'a Node, frame: &Frame<'a>) -> Datum<'a> {
    match node {
        Node::Nil => Datum::Nil,
        Node::Bool(b) => Datum::Bool(*b),
        Node::Number(n) => Datum::Number(*n),
        Node::Str(s) => Datum::str(s),
        Node::Selector(sel) => eval_selector(sel, frame),
        Node::Group { negate, inner } => negate_bool(eval_node(inner, frame), *negate),
        Node::BinOp { op, left, right } => {
            let lv = eval_node(left, frame);
            let rv = eval_node(right, frame);
            ops::eval_binop(*op, lv, rv)
        }
        Node::Call { negate, func } => negate_bool(builtins::eval_call(func, frame), *negate),
    }
}

/// `!` prefixes flip booleans and pass every other value through.
fn negate_bool(value: Datum<'_>, negate: bool) -> Datum<'_> {
    match value {
        Datum::Bool(b) if negate => Datum::Bool(!b),
        other => other,
    }
}

fn eval_selector<'a>(sel: &'a Selector, frame: &Frame<'a>) -> Datum<'a> {
    let mut current = match sel.kind {
        SelectorKind::Field => match sel.path.as_deref() {
            Some(path) => frame.scope.field_at(sel.slot, path),
            None => frame.scope.field(None),
        },
        SelectorKind::Key => frame
            .element
            .as_ref()
            .map_or(Datum::Nil, |(k, _)| k.clone()),
        SelectorKind::Value => frame
            .element
            .as_ref()
            .map_or(Datum::Nil, |(_, v)| v.clone()),
    };
    for sub in &sel.subscripts {
        let key = eval_node(sub, frame);
        current = index(&current, &key);
        if current.is_nil() {
            break;
        }
    }
    current
}

/// `target[key]`: numbers index sequences, any key probes mappings.
fn index<'a>(target: &Datum<'a>, key: &Datum<'_>) -> Datum<'a> {
    match target {
        Datum::Seq(seq) => {
            let seq: &'a dyn Sequence = *seq;
            match key.as_number().map(f64::trunc) {
                Some(n) if n >= 0.0 && n < seq.len() as f64 => {
                    seq.get(n as usize).unwrap_or(Datum::Nil)
                }
                _ => Datum::Nil,
            }
        }
        Datum::Map(map) => {
            let map: &'a dyn Mapping = *map;
            map.get(key).unwrap_or(Datum::Nil)
        }
        _ => Datum::Nil,
    }
}
