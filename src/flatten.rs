use crate::ast::{AstNode, NodeKind};

/// One node per atomic clause, in the order the clauses were written.
///
/// A lone equality group such as `1, 2, 3` is one clause. Inside a longer
/// list each value is its own clause, so
/// `(1,100],500,600,(800,900],[2000,)` flattens to five nodes.
pub fn flatten(node: &AstNode) -> Vec<AstNode> {
    if node.is_equality_group() {
        return vec![node.clone()];
    }
    let mut out = Vec::new();
    collect(node, &mut out);
    out
}

fn collect(node: &AstNode, out: &mut Vec<AstNode>) {
    match &node.kind {
        NodeKind::Composite { children } => {
            for child in children {
                collect(child, out);
            }
        }
        _ => out.push(node.clone()),
    }
}
