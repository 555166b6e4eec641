//! Cross-crate tests for the Solcloak workspace.

#[cfg(test)]
mod pipeline;
#[cfg(test)]
mod primitives;
#[cfg(test)]
mod transforms;

/// Fixtures shared by the test modules.
#[cfg(test)]
pub(crate) mod fixtures {
    use solcloak_core::source::SourceBuffer;
    use solcloak_core::syntax::{NativeParser, SyntaxProvider};
    use solcloak_transform::{PassResult, PipelineContext, Transform};
    use std::sync::{Arc, Once};

    pub(crate) const TOKEN: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.20;

contract Token {
    mapping(address => uint256) public balances;
    uint256 public totalSupply;
    string public name = "Token";

    event Transfer(address indexed from, address indexed to, uint256 amount);

    modifier onlyPositive(uint256 amount) {
        require(amount > 0, "zero amount");
        _;
    }

    function mint(address to, uint256 amount) public onlyPositive(amount) {
        balances[to] = balances[to] + amount;
        totalSupply = totalSupply + amount;
        emit Transfer(address(0), to, amount);
    }

    function transfer(address to, uint256 amount) public returns (bool) {
        require(balances[msg.sender] >= amount, "insufficient");
        balances[msg.sender] = balances[msg.sender] - amount;
        balances[to] = balances[to] + amount;
        emit Transfer(msg.sender, to, amount);
        return true;
    }

    function share(uint256 amount, uint256 parts) public pure returns (uint256, uint256) {
        uint256 each = amount / parts;
        uint256 rest = amount % parts;
        return (each * parts, rest);
    }
}
"#;

    static TRACING: Once = Once::new();

    /// Installs a test subscriber once per process.
    pub(crate) fn init_tracing() {
        TRACING.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_max_level(tracing::Level::DEBUG)
                .with_test_writer()
                .try_init();
        });
    }

    pub(crate) fn context(src: &str, seed: u64) -> PipelineContext {
        PipelineContext::new("test.sol", SourceBuffer::new(src), Arc::new(NativeParser), seed)
    }

    /// Runs `pass` once over `src` with the native parser.
    pub(crate) fn run_pass(pass: &dyn Transform, src: &str, seed: u64) -> PassResult {
        init_tracing();
        let mut ctx = context(src, seed);
        pass.apply(&mut ctx)
            .unwrap_or_else(|e| panic!("{} failed: {e}", pass.name()))
    }

    /// Whether the native parser accepts `src`.
    pub(crate) fn parses(src: &str) -> bool {
        NativeParser.parse(&SourceBuffer::new(src)).is_ok()
    }
}
