use crate::fixtures::{context, init_tracing, parses, TOKEN};
use rand::rngs::StdRng;
use rand::SeedableRng;
use solcloak_transform::registry::{is_reserved, RenameConfig, RenameRegistry};
use solcloak_transform::rename::IdentifierRenaming;
use solcloak_transform::Transform;
use std::collections::HashSet;

#[test]
fn test_scenario_foo_bar() {
    init_tracing();
    let src = "function foo() {} function bar() { foo(); }";
    let mut ctx = context(src, 42);
    let result = IdentifierRenaming::default().apply(&mut ctx).unwrap();
    let foo = ctx.registry.get("foo").unwrap();
    let bar = ctx.registry.get("bar").unwrap();

    assert_ne!(foo, bar);
    assert_eq!(
        result.buffer.as_str(),
        format!("function {foo}() {{}} function {bar}() {{ {foo}(); }}")
    );
}

#[test]
fn test_token_is_renamed_consistently() {
    init_tracing();
    let mut ctx = context(TOKEN, 8);
    let result = IdentifierRenaming::default().apply(&mut ctx).unwrap();
    let out = result.buffer.as_str();

    for gone in ["contract Token", "function mint", "onlyPositive", "totalSupply", "balances"] {
        assert!(!out.contains(gone), "`{gone}` survived");
    }
    // `transfer` and `name` double as built-in members and keep their names
    for kept in ["function transfer(", "string public name", "msg.sender", "require(", "emit ", "returns (bool)", "address(0)", "_;"] {
        assert!(out.contains(kept), "`{kept}` was lost");
    }

    // every use of `amount` resolves to the same alias; the one inside "zero amount" stays
    let amount = ctx.registry.get("amount").unwrap();
    assert_eq!(out.matches(amount).count(), TOKEN.matches("amount").count() - 1);
    assert_eq!(out.matches("amount").count(), 1);
    assert!(parses(out));
}

#[test]
fn test_registry_is_injective_and_memoized() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut registry = RenameRegistry::new(&RenameConfig::default());
    let names: Vec<String> = (0..2_000).map(|i| format!("name{i}")).collect();

    let aliases: Vec<String> = names
        .iter()
        .map(|n| registry.lookup_or_create(n, &mut rng))
        .collect();
    let distinct: HashSet<&String> = aliases.iter().collect();
    assert_eq!(distinct.len(), names.len());
    assert!(aliases.iter().all(|a| a.starts_with("obf_")));

    for (name, alias) in names.iter().zip(&aliases) {
        assert_eq!(&registry.lookup_or_create(name, &mut rng), alias);
    }
    assert_eq!(registry.len(), names.len());
}

#[test]
fn test_reserved_and_preserved_names_are_never_aliased() {
    init_tracing();
    let src = "contract Keep {\n    uint256 stored;\n    function send(uint256 amount) public { stored = amount + block.number; }\n}";
    let mut ctx = context(src, 1).with_registry(RenameRegistry::new(&RenameConfig {
        preserve: vec!["Keep".into()],
        ..RenameConfig::default()
    }));
    let result = IdentifierRenaming::default().apply(&mut ctx).unwrap();
    let out = result.buffer.as_str();

    assert!(out.starts_with("contract Keep {"));
    assert!(out.contains("block.number"));
    assert!(out.contains("function send("));
    for key in ctx.registry.aliases().keys() {
        assert!(!is_reserved(key), "reserved `{key}` was aliased");
        assert_ne!(key, "Keep");
    }
    assert!(ctx.registry.get("stored").is_some());
}
