// ABOUTME: Bottom-up tree rewrites turning the AST into the standardized tree

use log::debug;

use crate::error::RpalError;
use crate::tree::{self, NodeRef, TreeNode};

/// Standardize the tree rooted at `root` in place. Children are always
/// rewritten before their parent, so every rule sees standardized
/// subtrees. Depths and parent links are re-synced afterwards.
///
/// After this pass the tree contains no `let`, `where`, `function_form`,
/// `within`, `and`, `rec`, or `@` nodes, and every `lambda` has exactly
/// one binder and one body.
pub fn standardize(root: &NodeRef) -> Result<(), RpalError> {
    standardize_node(root)?;
    tree::resync(root, 0);
    debug!("standardized tree has {} nodes", tree::flatten(root).len());
    Ok(())
}

fn standardize_node(node: &NodeRef) -> Result<(), RpalError> {
    let children = node.borrow().children.clone();
    for child in &children {
        standardize_node(child)?;
    }

    let tag = node.borrow().tag.clone();
    match tag.as_str() {
        "let" => rewrite_let(node),
        "where" => rewrite_where(node),
        "function_form" => rewrite_function_form(node),
        "lambda" => rewrite_lambda(node),
        "within" => rewrite_within(node),
        "@" => rewrite_at(node),
        "and" => rewrite_and(node),
        "rec" => rewrite_rec(node),
        _ => Ok(()),
    }
}

// ------------------------------------------------------------------
// Shape checks
// ------------------------------------------------------------------

fn child(node: &NodeRef, index: usize, tag: &str) -> Result<NodeRef, RpalError> {
    node.borrow()
        .children
        .get(index)
        .cloned()
        .ok_or_else(|| RpalError::malformed_tree(tag, format!("missing child {}", index)))
}

/// The node must be an `=` with a name part and a value part
fn check_binding(node: &NodeRef, context: &str) -> Result<(), RpalError> {
    let inner = node.borrow();
    if inner.tag != "=" || inner.children.len() != 2 {
        return Err(RpalError::malformed_tree(
            context,
            format!("expected an '=' binding, found '{}'", inner.tag),
        ));
    }
    Ok(())
}

/// Spin up a right-nested chain of unary lambdas over `params`, with
/// `body` at the innermost position
fn lambda_chain(params: &[NodeRef], body: NodeRef) -> NodeRef {
    let mut current = body;
    for param in params.iter().rev() {
        current = TreeNode::with_children("lambda", vec![param.clone(), current]);
    }
    current
}

// ------------------------------------------------------------------
// Rewrite rules
// ------------------------------------------------------------------

// let(=(X, E), P)  ->  gamma(lambda(X, P), E)
fn rewrite_let(node: &NodeRef) -> Result<(), RpalError> {
    let eq = child(node, 0, "let")?;
    let p = child(node, 1, "let")?;
    check_binding(&eq, "let")?;

    let e = child(&eq, 1, "let")?;
    {
        let mut eq_mut = eq.borrow_mut();
        eq_mut.tag = "lambda".to_string();
        eq_mut.children[1] = p.clone();
    }
    tree::set_parent(&p, &eq);
    {
        let mut node_mut = node.borrow_mut();
        node_mut.tag = "gamma".to_string();
        node_mut.children[1] = e.clone();
    }
    tree::set_parent(&e, node);
    Ok(())
}

// where(P, =(X, E))  ->  let(=(X, E), P), which then rewrites as a let
fn rewrite_where(node: &NodeRef) -> Result<(), RpalError> {
    {
        let mut inner = node.borrow_mut();
        if inner.children.len() != 2 {
            return Err(RpalError::malformed_tree("where", "expected two children"));
        }
        inner.children.swap(0, 1);
        inner.tag = "let".to_string();
    }
    rewrite_let(node)
}

// function_form(P, V1..Vk, E)  ->  =(P, lambda(V1, ... lambda(Vk, E)))
fn rewrite_function_form(node: &NodeRef) -> Result<(), RpalError> {
    let children = node.borrow().children.clone();
    if children.len() < 3 {
        return Err(RpalError::malformed_tree(
            "function_form",
            "expected a name, at least one binder, and a body",
        ));
    }
    let name = children[0].clone();
    let body = children[children.len() - 1].clone();
    let chain = lambda_chain(&children[1..children.len() - 1], body);

    tree::set_parent(&chain, node);
    let mut node_mut = node.borrow_mut();
    node_mut.tag = "=".to_string();
    node_mut.children = vec![name, chain];
    Ok(())
}

// lambda(V1..Vk, E) with k > 1  ->  lambda(V1, lambda(V2, ... lambda(Vk, E)))
fn rewrite_lambda(node: &NodeRef) -> Result<(), RpalError> {
    let children = node.borrow().children.clone();
    if children.len() <= 2 {
        return Ok(());
    }
    let body = children[children.len() - 1].clone();
    let chain = lambda_chain(&children[1..children.len() - 1], body);

    tree::set_parent(&chain, node);
    node.borrow_mut().children = vec![children[0].clone(), chain];
    Ok(())
}

// within(=(X1, E1), =(X2, E2))  ->  =(X2, gamma(lambda(X1, E2), E1))
fn rewrite_within(node: &NodeRef) -> Result<(), RpalError> {
    let eq1 = child(node, 0, "within")?;
    let eq2 = child(node, 1, "within")?;
    check_binding(&eq1, "within")?;
    check_binding(&eq2, "within")?;

    let x1 = child(&eq1, 0, "within")?;
    let e1 = child(&eq1, 1, "within")?;
    let x2 = child(&eq2, 0, "within")?;
    let e2 = child(&eq2, 1, "within")?;

    let lambda = TreeNode::with_children("lambda", vec![x1, e2]);
    let gamma = TreeNode::with_children("gamma", vec![lambda, e1]);

    tree::set_parent(&gamma, node);
    tree::set_parent(&x2, node);
    let mut node_mut = node.borrow_mut();
    node_mut.tag = "=".to_string();
    node_mut.children = vec![x2, gamma];
    Ok(())
}

// @(E1, N, E2)  ->  gamma(gamma(N, E1), E2)
fn rewrite_at(node: &NodeRef) -> Result<(), RpalError> {
    let e1 = child(node, 0, "@")?;
    let n = child(node, 1, "@")?;
    let e2 = child(node, 2, "@")?;

    let inner = TreeNode::with_children("gamma", vec![n, e1]);

    tree::set_parent(&inner, node);
    tree::set_parent(&e2, node);
    let mut node_mut = node.borrow_mut();
    node_mut.tag = "gamma".to_string();
    node_mut.children = vec![inner, e2];
    Ok(())
}

// and(=(X1, E1), ..., =(Xk, Ek))  ->  =(,(X1..Xk), tau(E1..Ek))
fn rewrite_and(node: &NodeRef) -> Result<(), RpalError> {
    let bindings = node.borrow().children.clone();
    let mut names = Vec::with_capacity(bindings.len());
    let mut values = Vec::with_capacity(bindings.len());
    for binding in &bindings {
        check_binding(binding, "and")?;
        names.push(child(binding, 0, "and")?);
        values.push(child(binding, 1, "and")?);
    }

    let comma = TreeNode::with_children(",", names);
    let tau = TreeNode::with_children("tau", values);

    tree::set_parent(&comma, node);
    tree::set_parent(&tau, node);
    let mut node_mut = node.borrow_mut();
    node_mut.tag = "=".to_string();
    node_mut.children = vec![comma, tau];
    Ok(())
}

// rec(=(X, E))  ->  =(X, gamma(<Y*>, lambda(X, E)))
fn rewrite_rec(node: &NodeRef) -> Result<(), RpalError> {
    let eq = child(node, 0, "rec")?;
    check_binding(&eq, "rec")?;

    let x = child(&eq, 0, "rec")?;
    let e = child(&eq, 1, "rec")?;
    let x_copy = tree::clone_subtree(&x);

    let lambda = TreeNode::with_children("lambda", vec![x, e]);
    let gamma = TreeNode::with_children("gamma", vec![TreeNode::new("<Y*>"), lambda]);

    tree::set_parent(&gamma, node);
    tree::set_parent(&x_copy, node);
    let mut node_mut = node.borrow_mut();
    node_mut.tag = "=".to_string();
    node_mut.children = vec![x_copy, gamma];
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::SyntaxParser;
    use crate::tree::flatten;

    fn standardized(source: &str) -> Vec<String> {
        let root = SyntaxParser::parse(tokenize(source).unwrap()).unwrap();
        standardize(&root).unwrap();
        flatten(&root)
    }

    #[test]
    fn test_let_becomes_gamma_lambda() {
        assert_eq!(
            standardized("let x = 5 in x + 3"),
            vec![
                "gamma",
                ".lambda",
                "..<IDENTIFIER:x>",
                "..+",
                "...<IDENTIFIER:x>",
                "...<INTEGER:3>",
                ".<INTEGER:5>",
            ]
        );
    }

    #[test]
    fn test_where_rewrites_like_let() {
        assert_eq!(standardized("x + 3 where x = 5"), standardized("let x = 5 in x + 3"));
    }

    #[test]
    fn test_function_form_spins_lambda_chain() {
        // The chain is right-nested: lambda(a, lambda(b, +))
        assert_eq!(
            standardized("let add a b = a + b in add"),
            vec![
                "gamma",
                ".lambda",
                "..<IDENTIFIER:add>",
                "..<IDENTIFIER:add>",
                ".lambda",
                "..<IDENTIFIER:a>",
                "..lambda",
                "...<IDENTIFIER:b>",
                "...+",
                "....<IDENTIFIER:a>",
                "....<IDENTIFIER:b>",
            ]
        );
    }

    #[test]
    fn test_multi_parameter_fn_unnests() {
        assert_eq!(
            standardized("fn x y. x"),
            vec![
                "lambda",
                ".<IDENTIFIER:x>",
                ".lambda",
                "..<IDENTIFIER:y>",
                "..<IDENTIFIER:x>",
            ]
        );
    }

    #[test]
    fn test_within_builds_nested_binding() {
        assert_eq!(
            standardized("let x = 1 within y = x in y"),
            vec![
                "gamma",
                ".lambda",
                "..<IDENTIFIER:y>",
                "..<IDENTIFIER:y>",
                ".gamma",
                "..lambda",
                "...<IDENTIFIER:x>",
                "...<IDENTIFIER:x>",
                "..<INTEGER:1>",
            ]
        );
    }

    #[test]
    fn test_at_becomes_nested_gamma() {
        assert_eq!(
            standardized("1 @ add 2"),
            vec![
                "gamma",
                ".gamma",
                "..<IDENTIFIER:add>",
                "..<INTEGER:1>",
                ".<INTEGER:2>",
            ]
        );
    }

    #[test]
    fn test_and_pairs_comma_with_tau() {
        assert_eq!(
            standardized("let x = 1 and y = 2 in x"),
            vec![
                "gamma",
                ".lambda",
                "..,",
                "...<IDENTIFIER:x>",
                "...<IDENTIFIER:y>",
                "..<IDENTIFIER:x>",
                ".tau",
                "..<INTEGER:1>",
                "..<INTEGER:2>",
            ]
        );
    }

    #[test]
    fn test_rec_introduces_ystar() {
        assert_eq!(
            standardized("let rec f n = n in f"),
            vec![
                "gamma",
                ".lambda",
                "..<IDENTIFIER:f>",
                "..<IDENTIFIER:f>",
                ".gamma",
                "..<Y*>",
                "..lambda",
                "...<IDENTIFIER:f>",
                "...lambda",
                "....<IDENTIFIER:n>",
                "....<IDENTIFIER:n>",
            ]
        );
    }

    #[test]
    fn test_standardizing_twice_is_identity() {
        let root = SyntaxParser::parse(
            tokenize("let rec fact n = n eq 0 -> 1 | n * fact (n - 1) in fact 5").unwrap(),
        )
        .unwrap();
        standardize(&root).unwrap();
        let once = flatten(&root);
        standardize(&root).unwrap();
        assert_eq!(flatten(&root), once);
    }

    #[test]
    fn test_no_sugar_tags_survive() {
        let source =
            "let x = 1 and y = 2 within z = x + y in (fn a b. a @ add b) z 4 where add p q = p + q";
        let lines = standardized(source);
        for line in &lines {
            let tag = line.trim_start_matches('.');
            assert!(
                !matches!(tag, "let" | "where" | "function_form" | "within" | "and" | "rec" | "@"),
                "sugar tag '{}' survived standardization",
                tag
            );
        }
    }

    #[test]
    fn test_lambdas_end_up_unary() {
        let root =
            SyntaxParser::parse(tokenize("let f a b c = a + b + c in f 1 2 3").unwrap()).unwrap();
        standardize(&root).unwrap();
        fn check(node: &NodeRef) {
            let inner = node.borrow();
            if inner.tag == "lambda" {
                assert_eq!(inner.children.len(), 2);
            }
            for c in &inner.children {
                check(c);
            }
        }
        check(&root);
    }

    #[test]
    fn test_depths_hold_after_rewrites() {
        let root = SyntaxParser::parse(
            tokenize("let x = 1 within y = x in y + 1 where q = 9").unwrap(),
        )
        .unwrap();
        standardize(&root).unwrap();
        fn check(node: &NodeRef) {
            let depth = node.borrow().depth;
            for child in &node.borrow().children {
                assert_eq!(child.borrow().depth, depth + 1);
                check(child);
            }
        }
        assert_eq!(root.borrow().depth, 0);
        check(&root);
    }

    #[test]
    fn test_conditionals_are_left_alone() {
        let lines = standardized("true -> 1 | 2");
        assert_eq!(lines[0], "->");
    }
}
