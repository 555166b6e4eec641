use crate::fixtures::{parses, run_pass, TOKEN};
use solcloak_analysis::metrics::collect_metrics;
use solcloak_transform::dead_code::DeadCodeInjection;
use solcloak_transform::PassConfig;

const TEMPLATE_PREFIXES: &[&str] = &[
    "uint256 v_",
    "if (",
    "for (uint256 v_",
    "assert(",
    "bytes32 v_",
    "bool v_",
];

fn is_template_line(line: &str) -> bool {
    let line = line.trim();
    TEMPLATE_PREFIXES.iter().any(|p| line.starts_with(p))
}

#[test]
fn test_scenario_single_insertion_into_one_statement_body() {
    let src = "function f() { x = x + 1; }";
    let pass = DeadCodeInjection::new(PassConfig::new(1.0));
    for seed in 0..16 {
        let result = run_pass(&pass, src, seed);
        let out = result.buffer.as_str();
        assert!(result.changed);
        assert_eq!(result.stats["inserted"], 1);

        let inserted: Vec<&str> = out.lines().filter(|l| is_template_line(l)).collect();
        assert_eq!(inserted.len(), 1, "seed {seed}: {out}");
        assert_eq!(out.lines().count(), 3);
        assert!(out.contains("x = x + 1;"));

        let before = collect_metrics(src);
        let after = collect_metrics(out);
        let added = collect_metrics(inserted[0]);
        assert_eq!(after.braces.net(), before.braces.net());
        assert_eq!(after.braces.open, before.braces.open + added.braces.open);
        assert_eq!(after.parens.open, before.parens.open + added.parens.open);
        assert!(parses(out), "seed {seed}: {out}");
    }
}

#[test]
fn test_one_insertion_per_body() {
    let pass = DeadCodeInjection::new(PassConfig::new(1.0));
    let result = run_pass(&pass, TOKEN, 3);
    // three functions and one modifier
    assert_eq!(result.stats["bodies"], 4);
    assert_eq!(result.stats["inserted"], 4);
    assert_eq!(
        result.buffer.as_str().lines().count(),
        TOKEN.lines().count() + 4
    );
    assert!(parses(result.buffer.as_str()));
}

#[test]
fn test_inserted_lines_follow_indentation() {
    let pass = DeadCodeInjection::new(PassConfig::new(1.0));
    let result = run_pass(&pass, TOKEN, 11);
    for line in result.buffer.as_str().lines().filter(|l| is_template_line(l)) {
        assert!(
            line.starts_with("        ") && !line.starts_with("         "),
            "unexpected indentation: {line:?}"
        );
    }
}

#[test]
fn test_insertions_never_detach_else_or_do_while() {
    let bodies = [
        "contract C { function f(bool c) public { if (c) a(); else b(); } }",
        "contract C { function f(bool c) public { if (c) a(); else if (!c) b(); else d(); } }",
        "contract C { function f(uint x) public { do x = x - 1; while (x > 3); a(); } }",
        "contract C { function f(uint x) public { do { x = x - 1; } while (x > 3); } }",
    ];
    let pass = DeadCodeInjection::new(PassConfig::new(1.0));
    for src in bodies {
        for seed in 0..32 {
            let result = run_pass(&pass, src, seed);
            let out = result.buffer.as_str();
            assert_eq!(result.stats["inserted"], 1, "seed {seed}: {out}");
            assert!(parses(out), "seed {seed}: {out}");
        }
    }
}
