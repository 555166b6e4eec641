use crate::fixtures::{parses, run_pass, TOKEN};
use solcloak_transform::string_literal::{encode, StringConcat, StringLiteralEncoding};
use solcloak_transform::PassConfig;

#[test]
fn test_scenario_hello() {
    let pass = StringLiteralEncoding::new(PassConfig::new(1.0), StringConcat::Plus);
    let result = run_pass(&pass, "function f() { s = \"Hello\"; }", 0);
    assert_eq!(
        result.buffer.as_str(),
        "function f() { s = 'H'+'e'+'l'+'l'+'o'; }"
    );
}

#[test]
fn test_string_concat_style() {
    assert_eq!(
        encode("ab", StringConcat::StringConcat),
        "string.concat('a', 'b')"
    );
    assert_eq!(encode("", StringConcat::StringConcat), "\"\"");
}

#[test]
fn test_token_literals_are_encoded_and_imports_kept() {
    let src = format!("import \"./Base.sol\";\n{TOKEN}");
    let pass = StringLiteralEncoding::new(PassConfig::new(1.0), StringConcat::StringConcat);
    let result = run_pass(&pass, &src, 0);
    let out = result.buffer.as_str();

    // "Token", "zero amount", "insufficient"
    assert_eq!(result.stats["encoded"], 3);
    assert!(out.starts_with("import \"./Base.sol\";\n"));
    assert!(!out.contains("\"zero amount\""));
    assert!(out.contains(
        "string.concat('i', 'n', 's', 'u', 'f', 'f', 'i', 'c', 'i', 'e', 'n', 't')"
    ));
    assert!(parses(out));
}

#[test]
fn test_escapes_round_trip_per_character() {
    let pass = StringLiteralEncoding::new(PassConfig::new(1.0), StringConcat::Plus);
    let result = run_pass(&pass, r#"function f() { s = "it's\n\"ok\""; }"#, 0);
    assert_eq!(
        result.buffer.as_str(),
        r#"function f() { s = 'i'+'t'+'\''+'s'+'\n'+'"'+'o'+'k'+'"'; }"#
    );
}

#[test]
fn test_single_character_and_special_literals_are_left_alone() {
    let src = "function f() { a = \"x\"; b = unicode\"h\u{e9}llo\"; c = hex\"00ff\"; d = \"\"; }";
    let pass = StringLiteralEncoding::new(PassConfig::new(1.0), StringConcat::Plus);
    let result = run_pass(&pass, src, 0);
    assert!(!result.changed);
    assert_eq!(result.buffer.as_str(), src);
}
