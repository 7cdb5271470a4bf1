//! Reusable R1CS gadgets
//!
//! Shared building blocks for the policy circuits:
//! - `range_check`: bit decomposition bounding a value to `[0, 2^n)`
//! - `comparison`: `a >= b` / `a > b` over bounded operands
//! - `poseidon`: sponge parameters, native hash and in-circuit hash

pub mod comparison;
pub mod poseidon;
pub mod range_check;

pub use comparison::{enforce_gt, enforce_gte};
pub use poseidon::{poseidon_config, PoseidonHasher};
pub use range_check::{decompose, enforce_range};
