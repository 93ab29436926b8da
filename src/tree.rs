// ABOUTME: AST/ST tree nodes with depth and parent bookkeeping, plus the dump flattener

use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub type NodeRef = Rc<RefCell<TreeNode>>;

/// A node of the abstract (or standardized) syntax tree. Interior nodes
/// carry grammar tags like `let` or `gamma`; leaves carry their payload
/// in the tag itself, e.g. `<IDENTIFIER:x>` or `<INTEGER:42>`.
#[derive(Debug)]
pub struct TreeNode {
    pub tag: String,
    pub depth: usize,
    pub parent: Option<Weak<RefCell<TreeNode>>>,
    pub children: Vec<NodeRef>,
}

impl TreeNode {
    /// A fresh leaf with no parent and depth 0
    pub fn new(tag: impl Into<String>) -> NodeRef {
        Rc::new(RefCell::new(TreeNode {
            tag: tag.into(),
            depth: 0,
            parent: None,
            children: Vec::new(),
        }))
    }

    /// An interior node adopting `children`; their parent links are set,
    /// depths are fixed up by the next `resync`
    pub fn with_children(tag: impl Into<String>, children: Vec<NodeRef>) -> NodeRef {
        let node = TreeNode::new(tag);
        for child in &children {
            child.borrow_mut().parent = Some(Rc::downgrade(&node));
        }
        node.borrow_mut().children = children;
        node
    }
}

/// Point `child`'s parent link at `parent`
pub fn set_parent(child: &NodeRef, parent: &NodeRef) {
    child.borrow_mut().parent = Some(Rc::downgrade(parent));
}

/// Re-establish `depth(child) == depth(parent) + 1` and parent links for
/// the whole subtree rooted at `node`
pub fn resync(node: &NodeRef, depth: usize) {
    node.borrow_mut().depth = depth;
    let children = node.borrow().children.clone();
    for child in children {
        child.borrow_mut().parent = Some(Rc::downgrade(node));
        resync(&child, depth + 1);
    }
}

/// Deep copy of a subtree; the copy's parent link is unset
pub fn clone_subtree(node: &NodeRef) -> NodeRef {
    let inner = node.borrow();
    let children = inner.children.iter().map(clone_subtree).collect();
    let copy = TreeNode::with_children(inner.tag.clone(), children);
    copy.borrow_mut().depth = inner.depth;
    copy
}

/// Flatten a tree to its dump form: one `<dots><tag>` line per node in
/// pre-order, with as many dots as the node is deep
pub fn flatten(root: &NodeRef) -> Vec<String> {
    let mut lines = Vec::new();
    flatten_into(root, 0, &mut lines);
    lines
}

fn flatten_into(node: &NodeRef, depth: usize, lines: &mut Vec<String>) {
    let inner = node.borrow();
    lines.push(format!("{}{}", ".".repeat(depth), inner.tag));
    for child in &inner.children {
        flatten_into(child, depth + 1, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_children_sets_parents() {
        let x = TreeNode::new("<IDENTIFIER:x>");
        let five = TreeNode::new("<INTEGER:5>");
        let eq = TreeNode::with_children("=", vec![x.clone(), five]);

        let parent = x.borrow().parent.as_ref().unwrap().upgrade().unwrap();
        assert_eq!(parent.borrow().tag, "=");
        assert_eq!(eq.borrow().children.len(), 2);
    }

    #[test]
    fn test_resync_fixes_depths() {
        let leaf = TreeNode::new("<INTEGER:1>");
        let mid = TreeNode::with_children("neg", vec![leaf.clone()]);
        let root = TreeNode::with_children("gamma", vec![mid.clone()]);

        resync(&root, 0);
        assert_eq!(root.borrow().depth, 0);
        assert_eq!(mid.borrow().depth, 1);
        assert_eq!(leaf.borrow().depth, 2);
    }

    #[test]
    fn test_flatten_pre_order_with_dots() {
        let x = TreeNode::new("<IDENTIFIER:x>");
        let five = TreeNode::new("<INTEGER:5>");
        let eq = TreeNode::with_children("=", vec![x, five]);
        let p = TreeNode::new("<IDENTIFIER:x>");
        let root = TreeNode::with_children("let", vec![eq, p]);

        assert_eq!(
            flatten(&root),
            vec![
                "let",
                ".=",
                "..<IDENTIFIER:x>",
                "..<INTEGER:5>",
                ".<IDENTIFIER:x>",
            ]
        );
    }

    #[test]
    fn test_clone_subtree_is_deep() {
        let leaf = TreeNode::new("<INTEGER:1>");
        let root = TreeNode::with_children("neg", vec![leaf]);
        let copy = clone_subtree(&root);

        root.borrow_mut().children.clear();
        assert_eq!(copy.borrow().children.len(), 1);
        assert_eq!(flatten(&copy), vec!["neg", ".<INTEGER:1>"]);
    }
}
