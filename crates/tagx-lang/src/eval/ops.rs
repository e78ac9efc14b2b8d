use crate::ast::BinOp;
use crate::value::Datum;

/// Truthiness used by `&&`, `||`, `range()` and rule checks.
///
/// Numbers are truthy when nonzero, strings when nonempty, booleans are
/// themselves; `Nil`, collections and records are falsy.
pub fn truthy(value: &Datum<'_>) -> bool {
    match value {
        Datum::Bool(b) => *b,
        Datum::Number(n) => *n != 0.0,
        Datum::Str(s) => !s.is_empty(),
        Datum::Nil | Datum::Seq(_) | Datum::Map(_) | Datum::Record(_) => false,
    }
}

pub(super) fn eval_binop<'a>(op: BinOp, lv: Datum<'a>, rv: Datum<'a>) -> Datum<'a> {
    match op {
        BinOp::Add => eval_add(lv, rv),
        BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
            Datum::Number(eval_arithmetic(op, to_number(&lv), to_number(&rv)))
        }
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => Datum::Bool(compare(op, &lv, &rv)),
        BinOp::Eq => Datum::Bool(values_equal(&lv, &rv)),
        BinOp::Ne => Datum::Bool(!values_equal(&lv, &rv)),
        // Both sides are already evaluated; no lazy skipping.
        BinOp::And => Datum::Bool(truthy(&lv) && truthy(&rv)),
        BinOp::Or => Datum::Bool(truthy(&lv) || truthy(&rv)),
    }
}

/// Numbers add, strings concatenate; any other pairing yields the right
/// operand unchanged.
fn eval_add<'a>(lv: Datum<'a>, rv: Datum<'a>) -> Datum<'a> {
    match (lv, rv) {
        (Datum::Number(a), Datum::Number(b)) => Datum::Number(a + b),
        (Datum::Str(a), Datum::Str(b)) => {
            let mut joined = a.into_owned();
            joined.push_str(&b);
            Datum::owned_str(joined)
        }
        (_, rv) => rv,
    }
}

/// Coerce an operand of `- * / %`.
fn to_number(value: &Datum<'_>) -> f64 {
    match value {
        Datum::Number(n) => *n,
        Datum::Bool(b) => f64::from(u8::from(*b)),
        Datum::Str(s) => s.trim().parse().unwrap_or(0.0),
        Datum::Nil | Datum::Seq(_) | Datum::Map(_) | Datum::Record(_) => 0.0,
    }
}

/// Division and remainder by zero produce NaN; remainder works on the
/// truncated integer parts.
fn eval_arithmetic(op: BinOp, lv: f64, rv: f64) -> f64 {
    match op {
        BinOp::Sub => lv - rv,
        BinOp::Mul => lv * rv,
        BinOp::Div => {
            if rv == 0.0 {
                return f64::NAN;
            }
            lv / rv
        }
        BinOp::Mod => {
            let (a, b) = (lv as i64, rv as i64);
            if b == 0 {
                return f64::NAN;
            }
            a.wrapping_rem(b) as f64
        }
        _ => f64::NAN,
    }
}

/// Ordering is defined for two numbers or two strings only.
fn compare(op: BinOp, lv: &Datum<'_>, rv: &Datum<'_>) -> bool {
    let ord = match (lv, rv) {
        (Datum::Number(a), Datum::Number(b)) => a.partial_cmp(b),
        (Datum::Str(a), Datum::Str(b)) => Some(a.cmp(b)),
        _ => None,
    };
    let Some(ord) = ord else {
        return false;
    };
    match op {
        BinOp::Lt => ord.is_lt(),
        BinOp::Le => ord.is_le(),
        BinOp::Gt => ord.is_gt(),
        BinOp::Ge => ord.is_ge(),
        _ => false,
    }
}

/// `==` semantics, also used by `in()`.
pub(super) fn values_equal(lv: &Datum<'_>, rv: &Datum<'_>) -> bool {
    match (lv, rv) {
        (Datum::Number(a), Datum::Number(b)) => a == b,
        (Datum::Str(a), Datum::Str(b)) => a == b,
        (Datum::Bool(a), Datum::Bool(b)) => a == b,
        (Datum::Nil, Datum::Nil) => true,
        _ => false,
    }
}
