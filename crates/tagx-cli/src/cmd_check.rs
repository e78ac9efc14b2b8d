use std::process;

use anyhow::Result;

use tagx_lang::{NamedExpr, parse_annotation};

pub fn run(annotations: &[String]) -> Result<()> {
    let mut failed = 0usize;

    for src in annotations {
        match parse_annotation(src) {
            Ok(exprs) => {
                println!("{src}");
                for line in describe(&exprs) {
                    println!("  {line}");
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("{src}\n  error: {e}");
            }
        }
    }

    if failed > 0 {
        eprintln!("\n{failed} annotation(s) rejected");
        process::exit(1);
    }

    Ok(())
}

/// One line per expression: name, tree and referenced field paths.
fn describe(exprs: &[NamedExpr]) -> Vec<String> {
    exprs
        .iter()
        .map(|n| {
            let paths = n.expr.field_paths();
            if paths.is_empty() {
                format!("{}: {}", n.display_name(), n.expr)
            } else {
                format!("{}: {}  fields={}", n.display_name(), n.expr, paths.join(","))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_each_expression() {
        let exprs = parse_annotation("{@:1+2*3}{msg:(a.b)$}").unwrap();
        let lines = describe(&exprs);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "@: (+ 1 (* 2 3))");
        assert!(lines[1].starts_with("msg: "));
        assert!(lines[1].ends_with("fields=a.b"));
    }
}
