use crate::engines::generation::codec;
use crate::error::ParseError;
use crate::functions::PrimitiveSet;
use crate::types::AstNode;
use std::fmt;

/// An expression tree. Variation never edits one in place: every operator
/// builds a fresh value, so offspring share no nodes with their parents.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprTree {
    pub root: AstNode,
}

impl ExprTree {
    pub fn new(root: AstNode) -> Self {
        Self { root }
    }

    /// Reads canonical prefix text, checked against `pset`.
    pub fn parse(text: &str, pset: &PrimitiveSet) -> Result<Self, ParseError> {
        codec::parse(text, pset)
    }

    pub fn as_node(&self) -> &AstNode {
        &self.root
    }

    pub fn height(&self) -> usize {
        self.root.height()
    }

    pub fn size(&self) -> usize {
        self.root.size()
    }

    /// Canonical prefix text; the deduplication and cache key.
    pub fn render(&self) -> String {
        codec::render(&self.root)
    }

    /// Node at `index` in pre-order (root is 0).
    pub fn subtree(&self, index: usize) -> Option<&AstNode> {
        let mut counter = 0;
        find(&self.root, index, &mut counter)
    }

    /// Copy of this tree with the subtree at pre-order `index` replaced.
    pub fn with_subtree(&self, index: usize, replacement: &AstNode) -> ExprTree {
        let mut counter = 0;
        ExprTree::new(replace(&self.root, index, &mut counter, replacement))
    }
}

impl fmt::Display for ExprTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn find<'a>(node: &'a AstNode, target: usize, counter: &mut usize) -> Option<&'a AstNode> {
    if *counter == target {
        return Some(node);
    }
    *counter += 1;

    if let AstNode::Call { args, .. } = node {
        for arg in args {
            if let Some(found) = find(arg, target, counter) {
                return Some(found);
            }
        }
    }
    None
}

fn replace(node: &AstNode, target: usize, counter: &mut usize, replacement: &AstNode) -> AstNode {
    if *counter == target {
        *counter += node.size();
        return replacement.clone();
    }
    *counter += 1;

    match node {
        AstNode::Call { function, args } => AstNode::Call {
            function: function.clone(),
            args: args
                .iter()
                .map(|arg| replace(arg, target, counter, replacement))
                .collect(),
        },
        terminal => terminal.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExprTree {
        // add(x1, mul(x2, 1))
        ExprTree::new(AstNode::call(
            "add",
            vec![
                AstNode::var("x1"),
                AstNode::call("mul", vec![AstNode::var("x2"), AstNode::int(1)]),
            ],
        ))
    }

    #[test]
    fn test_preorder_indexing() {
        let tree = sample();
        assert_eq!(tree.size(), 5);
        assert_eq!(tree.subtree(1), Some(&AstNode::var("x1")));
        assert_eq!(tree.subtree(3), Some(&AstNode::var("x2")));
        assert_eq!(tree.subtree(4), Some(&AstNode::int(1)));
        assert_eq!(tree.subtree(5), None);
    }

    #[test]
    fn test_with_subtree_leaves_original_untouched() {
        let tree = sample();
        let patched = tree.with_subtree(2, &AstNode::var("x1"));
        assert_eq!(patched.render(), "add(x1, x1)");
        assert_eq!(tree.render(), "add(x1, mul(x2, 1))");

        let root_swap = tree.with_subtree(0, &AstNode::int(-1));
        assert_eq!(root_swap.render(), "-1");
    }
}
