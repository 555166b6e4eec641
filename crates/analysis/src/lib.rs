//! Size and delimiter metrics used to judge pass output.

pub mod metrics;
