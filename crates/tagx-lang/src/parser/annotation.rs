use crate::ast::Expression;
use crate::error::{CompileError, near};
use crate::parse_utils::{is_word, ws_skip};
use crate::scan::scan_paired;

use super::parse_expression;

/// Block name of a field's default expression.
pub const DEFAULT_NAME: &str = "@";

/// One expression declared by an annotation.
#[derive(Debug, Clone)]
pub struct NamedExpr {
    /// `None` for the default expression.
    pub name: Option<String>,
    pub expr: Expression,
}

impl NamedExpr {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_NAME)
    }
}

/// Parse a field annotation: either `{name:expr}{name2:expr2}...` blocks or
/// a single unbraced default expression. Blank input declares nothing.
pub fn parse_annotation(src: &str) -> Result<Vec<NamedExpr>, CompileError> {
    let mut input = src;
    ws_skip(&mut input);
    if input.is_empty() {
        return Ok(Vec::new());
    }
    if !input.starts_with('{') {
        return Ok(vec![NamedExpr {
            name: None,
            expr: parse_expression(input.trim_end())?,
        }]);
    }

    let mut exprs: Vec<NamedExpr> = Vec::new();
    loop {
        ws_skip(&mut input);
        if input.is_empty() {
            return Ok(exprs);
        }
        if !input.starts_with('{') {
            return Err(CompileError::TrailingInput { rest: near(input) });
        }
        let Some(block) = scan_paired(&mut input, '{', '}') else {
            return Err(CompileError::UnmatchedBracket {
                open: '{',
                near: near(input),
            });
        };
        let named = parse_block(&block)?;
        if exprs.iter().any(|e| e.name == named.name) {
            return Err(CompileError::DuplicateName {
                name: named.display_name().to_string(),
            });
        }
        exprs.push(named);
    }
}

fn parse_block(block: &str) -> Result<NamedExpr, CompileError> {
    let invalid = || CompileError::InvalidName {
        block: near(block),
    };
    let (name, body) = block.split_once(':').ok_or_else(invalid)?;
    let name = name.trim();
    let name = if name == DEFAULT_NAME {
        None
    } else if is_word(name) {
        Some(name.to_string())
    } else {
        return Err(invalid());
    };
    Ok(NamedExpr {
        name,
        expr: parse_expression(body.trim())?,
    })
}
