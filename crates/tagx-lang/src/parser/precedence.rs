use crate::ast::{BinOp, Node};

/// Rebalance a lexically-ordered operator chain into precedence order.
///
/// Children are fixed first. A node that binds tighter than its left child
/// rotates below it: the left child takes the node's place, the node takes
/// the left child's right operand as its new left operand, and the node
/// becomes the left child's right operand. The demoted node is re-checked
/// against its new left operand, so violations cascade. Equal priorities
/// never rotate, keeping left associativity.
pub(super) fn correct(node: Node) -> Node {
    match node {
        Node::BinOp { op, left, right } => {
            let left = correct(*left);
            rotate(op, left, *right)
        }
        other => other,
    }
}

fn rotate(op: BinOp, left: Node, right: Node) -> Node {
    match left {
        Node::BinOp {
            op: inner,
            left: inner_left,
            right: inner_right,
        } if op.priority() > inner.priority() => {
            let demoted = rotate(op, *inner_right, right);
            Node::BinOp {
                op: inner,
                left: inner_left,
                right: Box::new(demoted),
            }
        }
        left => Node::BinOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
    }
}
