//! Snippet catalogs: inert statements and constant conditions.
//!
//! Every snippet is a single line with balanced delimiters. Local names and
//! constants are drawn from the caller's generator so output stays
//! reproducible under a fixed seed.

use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};

/// Fresh local name, unlikely to clash with anything in the file.
fn local<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("v_{}", hex::encode(rng.random::<[u8; 4]>()))
}

/// Operands for conditions; small enough that no identity overflows.
fn operands<R: Rng + ?Sized>(rng: &mut R) -> (u64, u64) {
    (rng.random_range(1..=997), rng.random_range(1..=997))
}

type DeadCode = fn(&mut dyn RngCore) -> String;

const DEAD_CODE: &[DeadCode] = &[
    // unused local
    |rng| {
        let v = local(rng);
        format!("uint256 {v} = {};", rng.random_range(0..=u32::MAX))
    },
    // impossible branch
    |rng| {
        let (a, b) = operands(rng);
        let v = local(rng);
        format!("if ({} > {}) {{ uint256 {v} = {a}; }}", a.min(b), a.max(b) + 1)
    },
    // zero-iteration loop
    |rng| {
        let v = local(rng);
        let n = rng.random_range(1..=64u32);
        format!("for (uint256 {v} = {n}; {v} < {n}; {v}++) {{ }}")
    },
    // assertion that cannot fail
    |rng| {
        let (a, b) = operands(rng);
        format!("assert({} != {});", a, a.max(b) + 1)
    },
    // unused hash
    |rng| {
        let v = local(rng);
        format!(
            "bytes32 {v} = keccak256(abi.encodePacked(uint256({})));",
            rng.random::<u32>()
        )
    },
    // unused comparison
    |rng| {
        let (a, b) = operands(rng);
        let v = local(rng);
        format!("bool {v} = {a} == {b};")
    },
];

/// A random inert statement.
pub fn dead_code(rng: &mut dyn RngCore) -> String {
    match DEAD_CODE.choose(rng) {
        Some(template) => template(rng),
        None => ";".to_string(),
    }
}

/// Number of distinct dead-code shapes.
pub const fn dead_code_shapes() -> usize {
    DEAD_CODE.len()
}

/// An arithmetic identity over two positive operands.
#[derive(Clone, Copy)]
pub struct Identity {
    render: fn(u64, u64) -> String,
    eval: fn(u64, u64) -> bool,
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("example", &(self.render)(3, 5))
            .finish()
    }
}

impl Identity {
    pub fn render(&self, a: u64, b: u64) -> String {
        (self.render)(a, b)
    }

    /// Truth value of the rendered condition, computed natively.
    pub fn holds(&self, a: u64, b: u64) -> bool {
        (self.eval)(a, b)
    }
}

/// Conditions that are true for every positive operand pair.
pub const TAUTOLOGIES: &[Identity] = &[
    Identity {
        render: |a, b| format!("({a} * {b}) % {b} == 0"),
        eval: |a, b| (a * b) % b == 0,
    },
    Identity {
        render: |a, b| format!("({a} + {b}) > {a}"),
        eval: |a, b| (a + b) > a,
    },
    Identity {
        render: |a, _| format!("({a} ^ {a}) == 0"),
        eval: |a, _| (a ^ a) == 0,
    },
    Identity {
        render: |a, b| format!("({a} | {b}) >= {a}"),
        eval: |a, b| (a | b) >= a,
    },
    Identity {
        render: |a, b| format!("({a} & {b}) <= {b}"),
        eval: |a, b| (a & b) <= b,
    },
    Identity {
        render: |a, _| format!("({a} * 2) % 2 == 0"),
        eval: |a, _| (a * 2) % 2 == 0,
    },
];

/// Conditions that are false for every positive operand pair.
pub const CONTRADICTIONS: &[Identity] = &[
    Identity {
        render: |a, b| format!("({a} * {b}) % {b} == 1"),
        eval: |a, b| (a * b) % b == 1,
    },
    Identity {
        render: |a, b| format!("({a} + {b}) < {a}"),
        eval: |a, b| (a + b) < a,
    },
    Identity {
        render: |a, _| format!("({a} ^ {a}) != 0"),
        eval: |a, _| (a ^ a) != 0,
    },
    Identity {
        render: |a, b| format!("({a} & {b}) > {b}"),
        eval: |a, b| (a & b) > b,
    },
    Identity {
        render: |a, _| format!("({a} * 2) % 2 == 1"),
        eval: |a, _| (a * 2) % 2 == 1,
    },
];

/// A condition that always evaluates true: a tautology, or a negated
/// contradiction, with equal probability.
pub fn opaque_true<R: Rng + ?Sized>(rng: &mut R) -> String {
    let (a, b) = operands(rng);
    let negate = rng.random_bool(0.5);
    let catalog = if negate { CONTRADICTIONS } else { TAUTOLOGIES };
    let idx = rng.random_range(0..catalog.len());
    let text = catalog[idx].render(a, b);
    if negate {
        format!("!({text})")
    } else {
        text
    }
}
