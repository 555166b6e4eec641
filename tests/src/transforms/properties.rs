use crate::fixtures::{run_pass, TOKEN};
use solcloak_analysis::metrics::{balance_preserved, collect_metrics};
use solcloak_transform::arithmetic::{ArithmeticConfig, ArithmeticEncoding};
use solcloak_transform::control_flow::ControlFlowWrapping;
use solcloak_transform::dead_code::DeadCodeInjection;
use solcloak_transform::registry::RenameConfig;
use solcloak_transform::rename::IdentifierRenaming;
use solcloak_transform::string_literal::{StringConcat, StringLiteralEncoding};
use solcloak_transform::{PassConfig, Transform};

/// Every pass at `density`.
fn passes(density: f64) -> Vec<Box<dyn Transform>> {
    let config = PassConfig::new(density);
    vec![
        Box::new(DeadCodeInjection::new(config)),
        Box::new(ControlFlowWrapping::new(config)),
        Box::new(StringLiteralEncoding::new(config, StringConcat::Plus)),
        Box::new(IdentifierRenaming::new(config, RenameConfig::default())),
        Box::new(ArithmeticEncoding::new(config, ArithmeticConfig::default())),
    ]
}

#[test]
fn test_zero_density_is_identity() {
    for pass in passes(0.0) {
        let result = run_pass(pass.as_ref(), TOKEN, 17);
        assert!(!result.changed, "{} changed the source", pass.name());
        assert_eq!(result.buffer.as_str(), TOKEN);
    }
}

#[test]
fn test_fixed_seed_is_reproducible() {
    for pass in &passes(1.0) {
        let first = run_pass(pass.as_ref(), TOKEN, 1234);
        let second = run_pass(pass.as_ref(), TOKEN, 1234);
        assert!(first.changed, "{} found nothing to do", pass.name());
        assert_eq!(first.buffer.as_str(), second.buffer.as_str(), "{}", pass.name());
        assert_eq!(first.stats, second.stats);
    }
}

#[test]
fn test_different_seeds_diverge() {
    let pass = DeadCodeInjection::new(PassConfig::new(1.0));
    let outputs: std::collections::HashSet<String> = (0..8)
        .map(|seed| run_pass(&pass, TOKEN, seed).buffer.as_str().to_string())
        .collect();
    assert!(outputs.len() > 1);
}

#[test]
fn test_structure_is_preserved_at_every_density() {
    for density in [0.25, 0.5, 0.75, 1.0] {
        for seed in 0..4 {
            for pass in passes(density) {
                let result = run_pass(pass.as_ref(), TOKEN, seed);
                let before = collect_metrics(TOKEN);
                let after = collect_metrics(result.buffer.as_str());
                assert!(
                    balance_preserved(&before, &after),
                    "{} at density {density}, seed {seed}",
                    pass.name()
                );
            }
        }
    }
}

#[test]
fn test_out_of_range_density_is_rejected() {
    for density in [-0.1, 1.5, f64::NAN] {
        for pass in passes(density) {
            let mut ctx = crate::fixtures::context(TOKEN, 0);
            assert!(pass.apply(&mut ctx).is_err(), "{} accepted {density}", pass.name());
        }
    }
}
