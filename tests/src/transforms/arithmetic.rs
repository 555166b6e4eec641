use crate::fixtures::{parses, run_pass, TOKEN};
use num_bigint::BigUint;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use solcloak_core::source::SourceBuffer;
use solcloak_core::syntax::{NativeParser, NodeKind, SyntaxProvider};
use solcloak_transform::arithmetic::{ArithmeticConfig, ArithmeticEncoding};
use solcloak_transform::bitwise::{BitwiseLibrary, BitwiseOp};
use solcloak_transform::PassConfig;

fn encoding() -> ArithmeticEncoding {
    ArithmeticEncoding::new(PassConfig::new(1.0), ArithmeticConfig::default())
}

#[test]
fn test_scenario_a_plus_b() {
    let result = run_pass(&encoding(), "function f() { c = a + b; }", 0);
    let out = result.buffer.as_str();
    assert!(out.starts_with("function f() { c = (Lib.bitwiseAdd(a, b)); }"));
    assert_eq!(out.matches("library Lib {").count(), 1);
}

#[test]
fn test_library_is_appended_once_for_many_sites() {
    let result = run_pass(&encoding(), TOKEN, 0);
    let out = result.buffer.as_str();

    // four in mint/transfer, `/`, `%` and `*` in share; `amount > 0` is a comparison
    assert_eq!(result.stats["rewritten"], 7);
    assert_eq!(out.matches("library Lib {").count(), 1);
    assert!(out.contains("(Lib.bitwiseDivide(amount, parts))"));
    assert!(out.contains("(Lib.bitwiseModulo(amount, parts))"));
    assert!(out.contains("(Lib.bitwiseMultiply(each, parts))"));
    assert!(parses(out));
}

#[test]
fn test_custom_library_name_and_width() {
    let pass = ArithmeticEncoding::new(
        PassConfig::new(1.0),
        ArithmeticConfig {
            library_name: "Ops".into(),
            width: 64,
        },
    );
    let out = run_pass(&pass, "function f(uint64 a) pure returns (uint64) { return a - 1; }", 0)
        .buffer
        .as_str()
        .to_string();
    assert!(out.contains("return (Ops.bitwiseSubtract(a, 1));"));
    assert!(out.contains("library Ops {"));
    assert!(out.contains("function bitwiseAdd(uint64 x, uint64 y)"));
}

#[test]
fn test_rendered_library_uses_no_arithmetic_operator() {
    for width in [8, 64, 256] {
        let text = BitwiseLibrary::new("Lib", width).render();
        let tree = NativeParser.parse(&SourceBuffer::new(text)).unwrap();
        let arithmetic = tree
            .walk()
            .filter(|n| {
                matches!(&n.kind, NodeKind::BinaryOperation { operator } if BitwiseOp::from_operator(operator).is_some())
            })
            .count();
        assert_eq!(arithmetic, 0, "width {width}");
    }
}

#[test]
fn test_helpers_match_wrapping_arithmetic_at_64_bits() {
    let mut rng = StdRng::seed_from_u64(64);
    for _ in 0..500 {
        let a: u64 = rng.random();
        // small divisors exercise long quotients
        let b: u64 = if rng.random_bool(0.5) { rng.random() } else { rng.random_range(0..16) };
        let eval = |op: BitwiseOp| op.evaluate(&BigUint::from(a), &BigUint::from(b), 64);

        assert_eq!(eval(BitwiseOp::Add), Some(BigUint::from(a.wrapping_add(b))));
        assert_eq!(eval(BitwiseOp::Subtract), Some(BigUint::from(a.wrapping_sub(b))));
        assert_eq!(eval(BitwiseOp::Multiply), Some(BigUint::from(a.wrapping_mul(b))));
        assert_eq!(eval(BitwiseOp::Divide), a.checked_div(b).map(BigUint::from));
        assert_eq!(eval(BitwiseOp::Modulo), a.checked_rem(b).map(BigUint::from));
    }
}

#[test]
fn test_helpers_match_modular_arithmetic_at_256_bits() {
    let mut rng = StdRng::seed_from_u64(256);
    let modulus = BigUint::from(1u8) << 256u32;
    for _ in 0..50 {
        let a = BigUint::from_bytes_be(&rng.random::<[u8; 32]>());
        let b = BigUint::from_bytes_be(&rng.random::<[u8; 32]>()) >> rng.random_range(0..256u32);
        let eval = |op: BitwiseOp| op.evaluate(&a, &b, 256);

        assert_eq!(eval(BitwiseOp::Add), Some((&a + &b) % &modulus));
        assert_eq!(eval(BitwiseOp::Subtract), Some((&a + &modulus - &b) % &modulus));
        assert_eq!(eval(BitwiseOp::Multiply), Some((&a * &b) % &modulus));
        if b.bits() == 0 {
            assert_eq!(eval(BitwiseOp::Divide), None);
        } else {
            assert_eq!(eval(BitwiseOp::Divide), Some(&a / &b));
            assert_eq!(eval(BitwiseOp::Modulo), Some(&a % &b));
        }
    }
}
