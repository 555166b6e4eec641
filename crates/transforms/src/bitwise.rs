//! Solidity helpers that compute `+ - * / %` with bitwise primitives only.
//!
//! [`BitwiseLibrary::render`] emits the library appended to rewritten files.
//! [`BitwiseOp::evaluate`] runs the same algorithms step by step over
//! [`BigUint`] so their wraparound behavior can be checked at any width.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// An arithmetic operator the library emulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitwiseOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BitwiseOp {
    pub const ALL: [Self; 5] = [
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Divide,
        Self::Modulo,
    ];

    pub fn from_operator(op: &str) -> Option<Self> {
        match op {
            "+" => Some(Self::Add),
            "-" => Some(Self::Subtract),
            "*" => Some(Self::Multiply),
            "/" => Some(Self::Divide),
            "%" => Some(Self::Modulo),
            _ => None,
        }
    }

    pub const fn helper_name(self) -> &'static str {
        match self {
            Self::Add => "bitwiseAdd",
            Self::Subtract => "bitwiseSubtract",
            Self::Multiply => "bitwiseMultiply",
            Self::Divide => "bitwiseDivide",
            Self::Modulo => "bitwiseModulo",
        }
    }

    /// Whether a zero right operand makes the operation revert.
    pub const fn divides(self) -> bool {
        matches!(self, Self::Divide | Self::Modulo)
    }

    /// Result of the emitted helper for `x op y` on `width`-bit words.
    ///
    /// Operands are reduced modulo `2^width` first. Returns `None` where the
    /// helper reverts (division or modulo by zero).
    pub fn evaluate(self, x: &BigUint, y: &BigUint, width: u32) -> Option<BigUint> {
        let mask = mask(width);
        let x = x & &mask;
        let y = y & &mask;
        match self {
            Self::Add => Some(add(x, y, &mask)),
            Self::Subtract => Some(subtract(x, &y, &mask)),
            Self::Multiply => Some(multiply(x, y, &mask)),
            Self::Divide => long_division(&x, &y, width, &mask).map(|(q, _)| q),
            Self::Modulo => long_division(&x, &y, width, &mask).map(|(_, r)| r),
        }
    }
}

fn mask(width: u32) -> BigUint {
    (BigUint::from(1u8) << width) - 1u8
}

fn is_zero(v: &BigUint) -> bool {
    v.bits() == 0
}

// while (y != 0) { carry = (x & y) << 1; x = x ^ y; y = carry; }
fn add(mut x: BigUint, mut y: BigUint, mask: &BigUint) -> BigUint {
    while !is_zero(&y) {
        let carry = ((&x & &y) << 1u32) & mask;
        x ^= &y;
        y = carry;
    }
    x
}

// add(x, add(~y, 1))
fn subtract(x: BigUint, y: &BigUint, mask: &BigUint) -> BigUint {
    let not_y = mask ^ y;
    let negated = add(not_y, BigUint::from(1u8), mask);
    add(x, negated, mask)
}

fn multiply(mut x: BigUint, mut y: BigUint, mask: &BigUint) -> BigUint {
    let one = BigUint::from(1u8);
    let mut result = BigUint::default();
    while !is_zero(&y) {
        if !is_zero(&(&y & &one)) {
            result = add(result, x.clone(), mask);
        }
        x = (x << 1u32) & mask;
        y >>= 1u32;
    }
    result
}

// Restoring division, one bit per step from the top. `overflow` catches the
// bit shifted out of the remainder, in which case it certainly exceeds y.
fn long_division(
    x: &BigUint,
    y: &BigUint,
    width: u32,
    mask: &BigUint,
) -> Option<(BigUint, BigUint)> {
    if is_zero(y) {
        return None;
    }
    let top = BigUint::from(1u8) << (width - 1);
    let mut quotient = BigUint::default();
    let mut remainder = BigUint::default();
    let mut bit = top.clone();
    while !is_zero(&bit) {
        let overflow = !is_zero(&(&remainder & &top));
        remainder = (remainder << 1u32) & mask;
        if !is_zero(&(x & &bit)) {
            remainder |= BigUint::from(1u8);
        }
        if overflow || remainder >= *y {
            remainder = subtract(remainder, y, mask);
            quotient |= &bit;
        }
        bit >>= 1u32;
    }
    Some((quotient, remainder))
}

/// The generated helper library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitwiseLibrary {
    pub name: String,
    /// Operand width in bits; a multiple of 8 in `8..=256`.
    pub width: u32,
}

impl Default for BitwiseLibrary {
    fn default() -> Self {
        Self {
            name: "Lib".to_string(),
            width: 256,
        }
    }
}

impl BitwiseLibrary {
    pub fn new(name: impl Into<String>, width: u32) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }

    /// Solidity source of the library.
    ///
    /// The text uses no `+ - * / %` operator, so rewriting a file that already
    /// contains it leaves the library untouched.
    pub fn render(&self) -> String {
        let t = format!("uint{}", self.width);
        let top = self.width.saturating_sub(1);
        let mut out = String::new();
        let _ = writeln!(out, "library {} {{", self.name);
        let _ = write!(
            out,
            r#"    function bitwiseAdd({t} x, {t} y) internal pure returns ({t}) {{
        while (y != 0) {{
            {t} carry = (x & y) << 1;
            x = x ^ y;
            y = carry;
        }}
        return x;
    }}

    function bitwiseSubtract({t} x, {t} y) internal pure returns ({t}) {{
        return bitwiseAdd(x, bitwiseAdd(~y, 1));
    }}

    function bitwiseMultiply({t} x, {t} y) internal pure returns ({t}) {{
        {t} result = 0;
        while (y != 0) {{
            if ((y & 1) != 0) {{
                result = bitwiseAdd(result, x);
            }}
            x = x << 1;
            y = y >> 1;
        }}
        return result;
    }}

    function bitwiseDivMod({t} x, {t} y) private pure returns ({t} quotient, {t} remainder) {{
        require(y != 0, "division by zero");
        {t} top = {t}(1) << {top};
        {t} bit = top;
        while (bit != 0) {{
            bool overflow = (remainder & top) != 0;
            remainder = remainder << 1;
            if ((x & bit) != 0) {{
                remainder = remainder | 1;
            }}
            if (overflow || remainder >= y) {{
                remainder = bitwiseSubtract(remainder, y);
                quotient = quotient | bit;
            }}
            bit = bit >> 1;
        }}
    }}

    function bitwiseDivide({t} x, {t} y) internal pure returns ({t}) {{
        ({t} quotient, ) = bitwiseDivMod(x, y);
        return quotient;
    }}

    function bitwiseModulo({t} x, {t} y) internal pure returns ({t}) {{
        (, {t} remainder) = bitwiseDivMod(x, y);
        return remainder;
    }}
"#
        );
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn big(v: u128) -> BigUint {
        BigUint::from(v)
    }

    #[test]
    fn exhaustive_eight_bit_laws() {
        for a in 0u32..256 {
            for b in 0u32..256 {
                let (x, y) = (big(a.into()), big(b.into()));
                let eval = |op: BitwiseOp| op.evaluate(&x, &y, 8).map(|v| v.to_u32_digits());
                let digits = |v: u32| big(v.into()).to_u32_digits();
                assert_eq!(eval(BitwiseOp::Add), Some(digits((a + b) % 256)));
                assert_eq!(eval(BitwiseOp::Subtract), Some(digits((a + 256 - b) % 256)));
                assert_eq!(eval(BitwiseOp::Multiply), Some(digits((a * b) % 256)));
                if b == 0 {
                    assert_eq!(eval(BitwiseOp::Divide), None);
                    assert_eq!(eval(BitwiseOp::Modulo), None);
                } else {
                    assert_eq!(eval(BitwiseOp::Divide), Some(digits(a / b)));
                    assert_eq!(eval(BitwiseOp::Modulo), Some(digits(a % b)));
                }
            }
        }
    }

    #[test]
    fn random_sixty_four_bit_laws() {
        let mut rng = StdRng::seed_from_u64(64);
        for _ in 0..500 {
            let a: u64 = rng.random();
            let b: u64 = rng.random::<u64>() >> rng.random_range(0..64);
            let (x, y) = (big(a.into()), big(b.into()));
            let eval = |op: BitwiseOp| op.evaluate(&x, &y, 64);
            assert_eq!(eval(BitwiseOp::Add), Some(big(a.wrapping_add(b).into())));
            assert_eq!(eval(BitwiseOp::Subtract), Some(big(a.wrapping_sub(b).into())));
            assert_eq!(eval(BitwiseOp::Multiply), Some(big(a.wrapping_mul(b).into())));
            if b != 0 {
                assert_eq!(eval(BitwiseOp::Divide), Some(big((a / b).into())));
                assert_eq!(eval(BitwiseOp::Modulo), Some(big((a % b).into())));
            }
        }
    }

    #[test]
    fn random_full_width_laws() {
        let mut rng = StdRng::seed_from_u64(256);
        let modulus = BigUint::from(1u8) << 256u32;
        for _ in 0..40 {
            let x = BigUint::from_bytes_be(&rng.random::<[u8; 32]>());
            let y = BigUint::from_bytes_be(&rng.random::<[u8; 16]>()) + 1u8;
            let eval = |op: BitwiseOp| op.evaluate(&x, &y, 256);
            assert_eq!(eval(BitwiseOp::Add), Some((&x + &y) % &modulus));
            assert_eq!(eval(BitwiseOp::Subtract), Some((&x + &modulus - &y) % &modulus));
            assert_eq!(eval(BitwiseOp::Multiply), Some((&x * &y) % &modulus));
            assert_eq!(eval(BitwiseOp::Divide), Some(&x / &y));
            assert_eq!(eval(BitwiseOp::Modulo), Some(&x % &y));
        }
    }

    #[test]
    fn library_text_avoids_arithmetic_operators() {
        let text = BitwiseLibrary::default().render();
        assert!(text.starts_with("library Lib {"));
        for op in BitwiseOp::ALL {
            assert!(text.contains(&format!("function {}(", op.helper_name())));
        }
        let code: String = text
            .lines()
            .filter(|l| !l.contains("require("))
            .collect::<Vec<_>>()
            .join("\n");
        for forbidden in ['+', '-', '*', '/', '%'] {
            assert!(!code.contains(forbidden), "found {forbidden}");
        }
        assert!(text.contains("uint256(1) << 255"));
        let narrow = BitwiseLibrary::new("Ops", 8).render();
        assert!(narrow.contains("uint8(1) << 7"));
    }

    #[test]
    fn operators_map_to_helpers() {
        assert_eq!(BitwiseOp::from_operator("%"), Some(BitwiseOp::Modulo));
        assert_eq!(BitwiseOp::from_operator("**"), None);
        assert!(BitwiseOp::Divide.divides());
        assert!(!BitwiseOp::Add.divides());
    }
}
