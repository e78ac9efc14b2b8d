use std::path::PathBuf;

use anyhow::Result;
use serde_json::Value as Json;

use tagx_lang::{AsDatum, Datum, Scope, parse_expression};

/// `$` is the whole document; `(a.b)$` walks object keys from the root.
pub(crate) struct JsonScope<'a>(pub &'a Json);

impl Scope for JsonScope<'_> {
    fn field(&self, path: Option<&str>) -> Datum<'_> {
        let Some(path) = path else {
            return self.0.as_datum();
        };
        path.split('.')
            .try_fold(self.0, |node, key| node.get(key))
            .map_or(Datum::Nil, AsDatum::as_datum)
    }
}

pub fn run(expr: &str, json: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let text = match (json, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?,
        (None, None) => "null".to_string(),
    };
    let doc: Json =
        serde_json::from_str(&text).map_err(|e| anyhow::anyhow!("invalid JSON document: {e}"))?;

    let expression = parse_expression(expr).map_err(|e| anyhow::anyhow!("parse error: {e}"))?;
    tracing::debug!(domain = "cli", tree = %expression, "expression parsed");

    let value = expression.eval_value(&JsonScope(&doc));
    println!("{value}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagx_lang::Value;

    fn eval(expr: &str, doc: &str) -> Value {
        let doc: Json = serde_json::from_str(doc).unwrap();
        parse_expression(expr).unwrap().eval_value(&JsonScope(&doc))
    }

    #[test]
    fn dollar_is_the_document() {
        assert_eq!(eval("len($)", r#"[1, 2, 3]"#), Value::Number(3.0));
        assert_eq!(eval("$['a']+1", r#"{"a": 2}"#), Value::Number(3.0));
    }

    #[test]
    fn paths_walk_object_keys() {
        let doc = r#"{"user": {"name": "ann", "age": 20}}"#;
        assert_eq!(eval("(user.age)$>=18", doc), Value::Bool(true));
        assert_eq!(eval("len((user.name)$)", doc), Value::Number(3.0));
        assert_eq!(eval("(user.nope)$==nil", doc), Value::Bool(true));
    }

    #[test]
    fn range_over_json_array() {
        let doc = r#"{"tags": ["a", "bb", ""]}"#;
        assert_eq!(eval("range((tags)$, len($v)>0)", doc), Value::Bool(false));
        assert_eq!(eval("range((tags)$, $k<3)", doc), Value::Bool(true));
    }
}
