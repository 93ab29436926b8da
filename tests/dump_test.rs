// ABOUTME: Golden tests for the AST and standardized-tree dump formats

use rpal::{ast_dump, st_dump};

#[test]
fn test_ast_dump_of_let() {
    assert_eq!(
        ast_dump("let x = 5 in x + 3").unwrap(),
        vec![
            "let",
            ".=",
            "..<IDENTIFIER:x>",
            "..<INTEGER:5>",
            ".+",
            "..<IDENTIFIER:x>",
            "..<INTEGER:3>",
        ]
    );
}

#[test]
fn test_ast_dump_spells_function_form() {
    let lines = ast_dump("let sq x = x * x in sq 3").unwrap();
    assert_eq!(lines[1], ".function_form");
}

#[test]
fn test_ast_dump_literal_formats() {
    let lines = ast_dump("('hi', true, false, nil, dummy, 42)").unwrap();
    assert_eq!(
        lines,
        vec![
            "tau",
            ".<STRING:'hi'>",
            ".<TRUE_VALUE:true>",
            ".<FALSE_VALUE:false>",
            ".<NIL:nil>",
            ".<DUMMY:dummy>",
            ".<INTEGER:42>",
        ]
    );
}

#[test]
fn test_st_dump_of_let() {
    assert_eq!(
        st_dump("let x = 5 in x + 3").unwrap(),
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
fn test_st_dump_of_rec_contains_ystar() {
    let lines = st_dump("let rec f n = n in f 1").unwrap();
    assert!(lines.iter().any(|line| line.trim_start_matches('.') == "<Y*>"));
}

#[test]
fn test_st_dump_keeps_conditionals() {
    let lines = st_dump("true -> 1 | 2").unwrap();
    assert_eq!(lines[0], "->");
}

#[test]
fn test_st_dump_has_no_sugar_tags() {
    let source = "let x = 1 and y = 2 within z = x + y in (z + a where rec a = 4) @ add 1";
    let lines = st_dump(source).unwrap();
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
fn test_dump_depth_never_jumps_down_the_page() {
    // A child is exactly one level deeper than its parent, so depth can
    // increase only by one from one line to the next
    let lines = ast_dump("let rec fact n = n eq 0 -> 1 | n * fact (n - 1) in fact 5").unwrap();
    let depths: Vec<usize> = lines
        .iter()
        .map(|line| line.chars().take_while(|c| *c == '.').count())
        .collect();
    assert_eq!(depths[0], 0);
    for pair in depths.windows(2) {
        assert!(pair[1] <= pair[0] + 1);
    }
}

#[test]
fn test_ast_and_st_dumps_agree_on_leaves() {
    // Standardization moves leaves around but never reformats them
    let source = "let x = 'abc' in x";
    let ast_leaves: Vec<String> = ast_dump(source)
        .unwrap()
        .into_iter()
        .map(|l| l.trim_start_matches('.').to_string())
        .filter(|t| t.starts_with('<'))
        .collect();
    let st_leaves: Vec<String> = st_dump(source)
        .unwrap()
        .into_iter()
        .map(|l| l.trim_start_matches('.').to_string())
        .filter(|t| t.starts_with('<'))
        .collect();
    for leaf in &ast_leaves {
        assert!(st_leaves.contains(leaf), "leaf {} vanished", leaf);
    }
}
