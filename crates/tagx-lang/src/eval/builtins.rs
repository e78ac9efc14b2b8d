use crate::ast::{Func, Node};
use crate::value::{Datum, Mapping, Sequence};

use super::ops::{truthy, values_equal};
use super::sprintf::sprintf;
use super::{Frame, eval_node};

pub(super) fn eval_call<'a>(func: &'a Func, frame: &Frame<'a>) -> Datum<'a> {
    match func {
        Func::Len(arg) => eval_len(&eval_node(arg, frame)),
        Func::Regexp { pattern, subject } => match eval_node(subject, frame) {
            Datum::Str(s) => Datum::Bool(pattern.is_match(&s)),
            _ => Datum::Nil,
        },
        Func::Sprintf { format, args } => {
            let Datum::Str(format) = eval_node(format, frame) else {
                return Datum::Nil;
            };
            let args: Vec<Datum<'a>> = args.iter().map(|a| eval_node(a, frame)).collect();
            Datum::owned_str(sprintf(&format, &args))
        }
        Func::In {
            subject,
            candidates,
        } => {
            let target = eval_node(subject, frame);
            let found = candidates
                .iter()
                .map(|c| eval_node(c, frame))
                .fold(false, |found, c| found || values_equal(&target, &c));
            Datum::Bool(found)
        }
        Func::Range { subject, body } => eval_range(&eval_node(subject, frame), body, frame),
        Func::Custom { predicate, arg, .. } => Datum::Bool(predicate.call(&eval_node(arg, frame))),
    }
}

/// Character count for strings, element count for collections.
fn eval_len<'a>(value: &Datum<'_>) -> Datum<'a> {
    match value {
        Datum::Str(s) => Datum::Number(s.chars().count() as f64),
        Datum::Seq(seq) => Datum::Number(seq.len() as f64),
        Datum::Map(map) => Datum::Number(map.len() as f64),
        Datum::Nil | Datum::Bool(_) | Datum::Number(_) | Datum::Record(_) => Datum::Nil,
    }
}

/// Run `body` once per element with `$k`/`$v` bound; true iff every run is
/// truthy. Every element is visited even after a falsy result.
fn eval_range<'a>(target: &Datum<'a>, body: &'a Node, frame: &Frame<'a>) -> Datum<'a> {
    let elements: Vec<(Datum<'a>, Datum<'a>)> = match target {
        Datum::Seq(seq) => {
            let seq: &'a dyn Sequence = *seq;
            (0..seq.len())
                .map(|i| (Datum::Number(i as f64), seq.get(i).unwrap_or(Datum::Nil)))
                .collect()
        }
        Datum::Map(map) => {
            let map: &'a dyn Mapping = *map;
            map.entries()
        }
        _ => return Datum::Nil,
    };
    let all = elements.into_iter().fold(true, |all, element| {
        let inner = Frame {
            scope: frame.scope,
            element: Some(element),
        };
        truthy(&eval_node(body, &inner)) && all
    });
    Datum::Bool(all)
}
