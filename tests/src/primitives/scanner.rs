use solcloak_core::block::find_block_end;
use solcloak_core::scanner::{code_words, in_comment_or_string};
use solcloak_core::slots::collect_slots;
use solcloak_utils::errors::ScanError;

#[test]
fn test_block_end_ignores_braces_in_trivia() {
    let src = "function f() {\n    s = \"}\"; // }\n    /* { */ t = '{';\n}\ncontract After {}";
    let open = src.find('{').unwrap();
    let end = find_block_end(src, open).unwrap();
    assert_eq!(&src[end..end + 2], "}\n");
    assert!(src[end + 1..].starts_with("\ncontract After"));
}

#[test]
fn test_block_end_errors() {
    assert_eq!(find_block_end("x {", 0), Err(ScanError::NotAnOpenBrace(0)));
    assert_eq!(
        find_block_end("{ { }", 0),
        Err(ScanError::BlockUnresolved(0))
    );
    // a comment swallowing the closing brace leaves the block open
    assert_eq!(
        find_block_end("{ /* } */", 0),
        Err(ScanError::BlockUnresolved(0))
    );
}

#[test]
fn test_trivia_classification() {
    let src = "a = \"x;y\"; // z;\nb;";
    let in_string = src.find("x;y").unwrap() + 1;
    let in_comment = src.find("z;").unwrap() + 1;
    assert!(in_comment_or_string(src, in_string));
    assert!(in_comment_or_string(src, in_comment));
    assert!(!in_comment_or_string(src, src.len() - 1));

    let words: Vec<&str> = code_words(src, 0, src.len()).into_iter().map(|(_, w)| w).collect();
    assert_eq!(words, ["a", "b"]);
}

#[test]
fn test_scenario_body_slots() {
    // `{ x = x + 1; }`: after `{`, after `;`, before `}`
    let src = "function f() { x = x + 1; }";
    let open = src.find('{').unwrap();
    let offsets: Vec<usize> = collect_slots(src, open).iter().map(|s| s.offset).collect();
    let after_semicolon = src.find(';').unwrap() + 1;
    assert_eq!(offsets, [open + 2, after_semicolon, src.len() - 1]);
}

#[test]
fn test_slots_skip_nested_blocks_and_multiline_expressions() {
    let src = "{\n    if (a) {\n        b();\n    }\n    total = first\n        + second;\n    c();\n}";
    let slots = collect_slots(src, 0);
    let offsets: Vec<usize> = slots.iter().map(|s| s.offset).collect();

    assert!(!offsets.contains(&(src.find("b();").unwrap() + 4)));
    assert!(!offsets.contains(&src.find("+ second").unwrap()));
    assert!(offsets.contains(&src.find("c();").unwrap()));
    assert!(slots.iter().all(|s| s.offset <= src.len() - 1));
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));
}
