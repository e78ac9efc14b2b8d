mod annotation;
mod operand;
mod precedence;

#[cfg(test)]
mod tests;

use crate::ast::{Expression, Node};
use crate::error::{CompileError, near};
use crate::parse_utils::{operator, ws_skip};

pub use annotation::{DEFAULT_NAME, NamedExpr, parse_annotation};

/// Parse one expression (no `{name:...}` blocks).
pub fn parse_expression(src: &str) -> Result<Expression, CompileError> {
    let root = parse_node(src)?;
    Ok(Expression::new(src, root))
}

/// Parse a full expression and correct operator precedence.
///
/// Used for the top level as well as for group contents, subscripts and
/// function arguments, each of which arrives as its own string.
pub(crate) fn parse_node(src: &str) -> Result<Node, CompileError> {
    let mut input = src;
    ws_skip(&mut input);
    if input.is_empty() {
        return Err(CompileError::Empty);
    }
    let lexical = parse_chain(&mut input)?;
    Ok(precedence::correct(lexical))
}

/// Read `operand (operator operand)*` into a tree that follows lexical order:
/// every new operator takes the tree built so far as its left operand.
fn parse_chain(input: &mut &str) -> Result<Node, CompileError> {
    let mut tree = operand::read_operand(input)?;
    loop {
        ws_skip(input);
        if input.is_empty() {
            return Ok(tree);
        }
        let Ok(op) = operator(input) else {
            return Err(CompileError::TrailingInput { rest: near(input) });
        };
        ws_skip(input);
        if input.is_empty() {
            return Err(CompileError::UnexpectedEnd { op: op.symbol() });
        }
        let right = operand::read_operand(input)?;
        tree = Node::BinOp {
            op,
            left: Box::new(tree),
            right: Box::new(right),
        };
    }
}
