//! Reusable gadgets for PLONKish circuits
//!
//! - `RangeCheckChip`: range checks by limb lookups into a fixed table
//! - `ComparisonChip`: `>=` / `>` built on the range check

pub mod comparison;
pub mod range_check;

pub use comparison::{ComparisonChip, ComparisonConfig, ComparisonInstruction};
pub use range_check::{RangeCheckChip, RangeCheckConfig, RangeCheckInstruction};
