//! `sprintf()` formatting with printf-style verbs.
//!
//! Supported: `%v %s %d %f %t %q %x %%`, with optional `-`/`0` flags, width
//! and `.precision`. A verb without an argument renders as `%!v(MISSING)`;
//! a verb that does not fit its argument renders as `%!d(string=abc)`.
//! Surplus arguments are ignored. Widths and precisions above one million
//! render `%!(BADWIDTH)` / `%!(BADPREC)` and are dropped.

use std::fmt::Write;

use crate::value::Datum;

const MAX_WIDTH: usize = 1_000_000;

#[derive(Default)]
struct Spec {
    left: bool,
    zero: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

pub fn sprintf(format: &str, args: &[Datum<'_>]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut args = args.iter();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let mut spec = Spec::default();
        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => spec.left = true,
                '0' => spec.zero = true,
                _ => break,
            }
            chars.next();
        }
        spec.width = take_digits(&mut chars);
        if chars.peek() == Some(&'.') {
            chars.next();
            spec.precision = Some(take_digits(&mut chars).unwrap_or(0));
        }
        if spec.width.is_some_and(|w| w > MAX_WIDTH) {
            out.push_str("%!(BADWIDTH)");
            spec.width = None;
        }
        if spec.precision.is_some_and(|p| p > MAX_WIDTH) {
            out.push_str("%!(BADPREC)");
            spec.precision = None;
        }
        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        match args.next() {
            Some(arg) => {
                let text = format_verb(verb, &spec, arg);
                pad(&mut out, &text, &spec, is_numeric_verb(verb, arg));
            }
            None => {
                let _ = write!(out, "%!{verb}(MISSING)");
            }
        }
    }
    out
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut value: Option<usize> = None;
    while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
        value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(d as usize));
        chars.next();
    }
    value
}

fn format_verb(verb: char, spec: &Spec, arg: &Datum<'_>) -> String {
    match (verb, arg) {
        ('v', _) => default_format(arg),
        ('s', Datum::Str(s)) => match spec.precision {
            Some(p) => s.chars().take(p).collect(),
            None => s.to_string(),
        },
        ('s', _) => default_format(arg),
        ('d', Datum::Number(n)) if n.is_finite() => format!("{}", n.trunc() as i64),
        ('f', Datum::Number(n)) => format!("{:.*}", spec.precision.unwrap_or(6), n),
        ('t', Datum::Bool(b)) => b.to_string(),
        ('q', Datum::Str(s)) => format!("{:?}", &**s),
        ('x', Datum::Number(n)) if n.is_finite() => {
            let n = n.trunc() as i64;
            if n < 0 {
                format!("-{:x}", n.unsigned_abs())
            } else {
                format!("{n:x}")
            }
        }
        ('x', Datum::Str(s)) => s.bytes().fold(String::new(), |mut acc, b| {
            let _ = write!(acc, "{b:02x}");
            acc
        }),
        _ => bad_verb(verb, arg),
    }
}

/// Rendering used by `%v`: scalars plainly, sequences as `[a b]`, mappings as
/// `map[k:v]`.
fn default_format(arg: &Datum<'_>) -> String {
    match arg {
        Datum::Nil => "<nil>".to_string(),
        Datum::Bool(b) => b.to_string(),
        Datum::Number(n) => n.to_string(),
        Datum::Str(s) => s.to_string(),
        Datum::Seq(seq) => {
            let items: Vec<String> = (0..seq.len())
                .map(|i| default_format(&seq.get(i).unwrap_or(Datum::Nil)))
                .collect();
            format!("[{}]", items.join(" "))
        }
        Datum::Map(map) => {
            let items: Vec<String> = map
                .entries()
                .iter()
                .map(|(k, v)| format!("{}:{}", default_format(k), default_format(v)))
                .collect();
            format!("map[{}]", items.join(" "))
        }
        Datum::Record(_) => "{...}".to_string(),
    }
}

fn bad_verb(verb: char, arg: &Datum<'_>) -> String {
    let kind = match arg {
        Datum::Nil => return format!("%!{verb}(<nil>)"),
        Datum::Bool(_) => "bool",
        Datum::Number(_) => "float64",
        Datum::Str(_) => "string",
        Datum::Seq(_) => "slice",
        Datum::Map(_) => "map",
        Datum::Record(_) => "struct",
    };
    format!("%!{verb}({kind}={})", default_format(arg))
}

fn is_numeric_verb(verb: char, arg: &Datum<'_>) -> bool {
    matches!(verb, 'd' | 'f' | 'x' | 'v') && matches!(arg, Datum::Number(_))
}

fn pad(out: &mut String, text: &str, spec: &Spec, numeric: bool) {
    let len = text.chars().count();
    let fill = spec.width.unwrap_or(0).saturating_sub(len);
    if fill == 0 {
        out.push_str(text);
    } else if spec.left {
        out.push_str(text);
        out.extend(std::iter::repeat_n(' ', fill));
    } else if spec.zero && numeric {
        let (sign, digits) = match text.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", text),
        };
        out.push_str(sign);
        out.extend(std::iter::repeat_n('0', fill));
        out.push_str(digits);
    } else {
        out.extend(std::iter::repeat_n(' ', fill));
        out.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(format: &str, args: &[Datum<'_>]) -> String {
        sprintf(format, args)
    }

    #[test]
    fn basic_verbs() {
        assert_eq!(
            fmt(
                "%s is %d years, %.2f%%",
                &[Datum::str("ann"), Datum::Number(30.9), Datum::Number(1.5)]
            ),
            "ann is 30 years, 1.50%"
        );
        assert_eq!(fmt("%v|%v|%v", &[Datum::Number(2.0), Datum::Nil, Datum::Bool(true)]), "2|<nil>|true");
        assert_eq!(fmt("%q", &[Datum::str("a\"b")]), r#""a\"b""#);
        assert_eq!(fmt("%x %x", &[Datum::Number(255.0), Datum::str("hi")]), "ff 6869");
        assert_eq!(fmt("%f", &[Datum::Number(1.0)]), "1.000000");
    }

    #[test]
    fn width_and_flags() {
        assert_eq!(fmt("[%5d]", &[Datum::Number(42.0)]), "[   42]");
        assert_eq!(fmt("[%-5s]", &[Datum::str("ab")]), "[ab   ]");
        assert_eq!(fmt("[%05d]", &[Datum::Number(-42.0)]), "[-0042]");
        assert_eq!(fmt("[%.1s]", &[Datum::str("xyz")]), "[x]");
    }

    #[test]
    fn oversized_width_and_precision_are_rejected() {
        assert_eq!(
            fmt("%999999999999999d", &[Datum::Number(1.0)]),
            "%!(BADWIDTH)1"
        );
        assert_eq!(
            fmt("%.99999999999f", &[Datum::Number(1.5)]),
            "%!(BADPREC)1.500000"
        );
        assert_eq!(
            fmt("%-99999999999999999999999s|", &[Datum::str("a")]),
            "%!(BADWIDTH)a|"
        );
        assert_eq!(fmt("%1000000d", &[Datum::Number(1.0)]).len(), 1_000_000);
    }

    #[test]
    fn missing_and_mismatched_arguments() {
        assert_eq!(fmt("%d and %s", &[Datum::Number(1.0)]), "1 and %!s(MISSING)");
        assert_eq!(fmt("%d", &[Datum::str("abc")]), "%!d(string=abc)");
        assert_eq!(fmt("%t", &[Datum::Nil]), "%!t(<nil>)");
        assert_eq!(fmt("no verbs", &[Datum::Number(1.0)]), "no verbs");
        assert_eq!(fmt("tail %", &[]), "tail %!(NOVERB)");
    }

    #[test]
    fn collections_use_default_format() {
        let items = vec![1_i32, 2, 3];
        assert_eq!(fmt("%v", &[Datum::Seq(&items)]), "[1 2 3]");
        assert_eq!(fmt("%s", &[Datum::str("é")]), "é");
    }
}
