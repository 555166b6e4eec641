use crate::fixtures::{parses, run_pass, TOKEN};
use solcloak_analysis::metrics::{balance_preserved, collect_metrics};
use solcloak_transform::control_flow::ControlFlowWrapping;
use solcloak_transform::templates::{CONTRADICTIONS, TAUTOLOGIES};
use solcloak_transform::PassConfig;

#[test]
fn test_every_expression_statement_is_wrapped() {
    let pass = ControlFlowWrapping::new(PassConfig::new(1.0));
    let result = run_pass(&pass, TOKEN, 5);
    let out = result.buffer.as_str();

    // mint: 2, transfer: 3; `emit`, `return` and declarations are not expression statements
    assert_eq!(result.stats["candidates"], 5);
    assert_eq!(result.stats["wrapped"], 5);
    assert_eq!(out.matches("} else {").count(), 5);
    // modifier bodies are left alone
    assert!(out.contains("require(amount > 0, \"zero amount\");\n        _;"));
    assert!(balance_preserved(&collect_metrics(TOKEN), &collect_metrics(out)));
    assert!(parses(out));
}

#[test]
fn test_wrapped_statement_keeps_its_text_and_indentation() {
    let src = "contract C {\n    function f(uint256 x) public {\n        x = x + 1;\n    }\n}\n";
    let pass = ControlFlowWrapping::new(PassConfig::new(1.0));
    let out = run_pass(&pass, src, 9).buffer.as_str().to_string();
    let lines: Vec<&str> = out.lines().collect();

    assert!(lines[2].starts_with("        if (") && lines[2].ends_with(") {"));
    assert_eq!(lines[3], "            x = x + 1;");
    assert_eq!(lines[4], "        } else {");
    assert!(lines[5].starts_with("            "));
    assert_eq!(lines[6], "        }");
    assert_eq!(lines[7], "    }");
}

#[test]
fn test_loop_headers_are_not_split() {
    let src = "function f() {\n    for (i = 0; i < 3; i++) {\n        total += i;\n    }\n}";
    let pass = ControlFlowWrapping::new(PassConfig::new(1.0));
    let result = run_pass(&pass, src, 2);
    assert_eq!(result.stats["wrapped"], 1);
    assert!(result.buffer.as_str().contains("for (i = 0; i < 3; i++) {"));
    assert!(parses(result.buffer.as_str()));
}

#[test]
fn test_condition_catalogs_hold() {
    for a in 1..=60u64 {
        for b in 1..=60u64 {
            for identity in TAUTOLOGIES {
                assert!(identity.holds(a, b), "{}", identity.render(a, b));
            }
            for identity in CONTRADICTIONS {
                assert!(!identity.holds(a, b), "{}", identity.render(a, b));
            }
        }
    }
}
