//! Lookup-based range checks over Pasta `Fp` (PSE Halo2)
//!
//! The membership counterpart of the bit-decomposition gadgets used by the
//! Groth16 circuits: a value is bounded by looking its limbs up in a fixed
//! table instead of witnessing every bit.
//!
//! # Example
//! ```ignore
//! // 64-bit range check with 8-bit limbs
//! let config = RangeCheckChip::<Fp, 8, 8>::configure(meta, limb, acc);
//! let chip = RangeCheckChip::construct(config);
//! chip.load_table(layouter.namespace(|| "table"))?;
//! chip.check(layouter.namespace(|| "check"), value_cell)?;
//! ```

pub mod gadgets;

pub use gadgets::{
    ComparisonChip, ComparisonConfig, ComparisonInstruction, RangeCheckChip, RangeCheckConfig,
    RangeCheckInstruction,
};

pub use halo2_proofs::{
    circuit::{Layouter, SimpleFloorPlanner, Value},
    plonk::{Circuit, ConstraintSystem, Error},
};

pub use pasta_curves::Fp;

/// Limb width used for 64-bit amounts
pub const LIMB_BITS: usize = 8;

/// Limbs per 64-bit amount
pub const NUM_LIMBS: usize = 8;

/// 64-bit range check chip
pub type AmountRangeCheck = RangeCheckChip<Fp, LIMB_BITS, NUM_LIMBS>;

/// 64-bit comparison chip
pub type AmountComparison = ComparisonChip<Fp, LIMB_BITS, NUM_LIMBS>;
