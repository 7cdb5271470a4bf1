//! Range Check Gadget using Lookup Tables
//!
//! Proves `value ∈ [0, 2^(LIMB_BITS·NUM_LIMBS))` by table membership:
//! the value is split into `NUM_LIMBS` limbs, each limb is looked up in a
//! table holding `[0, 2^LIMB_BITS)`, and a running sum rebuilds the value
//! most-significant limb first:
//!
//! ```text
//! row | limb      | acc
//! ----+-----------+---------------------------------
//!  0  | l_{n-1}   | l_{n-1}
//!  1  | l_{n-2}   | acc_0 · 2^LIMB_BITS + l_{n-2}
//! ... | ...       | ...
//! n-1 | l_0       | acc_{n-2} · 2^LIMB_BITS + l_0   == value (copy constraint)
//! ```
//!
//! `NUM_LIMBS = 1` is the pure single-lookup check. A 64-bit check uses
//! 8-bit limbs: 8 lookups against a 256-row table.

use ff::PrimeField;
use halo2_proofs::{
    circuit::{AssignedCell, Layouter, Value},
    plonk::{Advice, Column, ConstraintSystem, Error, Expression, Selector, TableColumn},
    poly::Rotation,
};
use std::marker::PhantomData;

/// Configuration for the range check chip
#[derive(Debug, Clone)]
pub struct RangeCheckConfig<F: PrimeField, const LIMB_BITS: usize, const NUM_LIMBS: usize> {
    /// Advice column holding one limb per row
    pub limb: Column<Advice>,
    /// Advice column holding the running sum
    pub acc: Column<Advice>,
    /// Enables the limb lookup
    pub q_lookup: Selector,
    /// First row: acc == limb
    pub q_first: Selector,
    /// Other rows: acc == acc_prev · 2^LIMB_BITS + limb
    pub q_running: Selector,
    /// Table column containing `[0, 2^LIMB_BITS)`
    pub table: TableColumn,
    _marker: PhantomData<F>,
}

/// Instructions for the range check chip
pub trait RangeCheckInstruction<F: PrimeField> {
    /// Check that `value` lies in `[0, 2^RANGE_BITS)`
    fn check(&self, layouter: impl Layouter<F>, value: AssignedCell<F, F>) -> Result<(), Error>;
}

/// Range check chip using lookup tables
#[derive(Debug, Clone)]
pub struct RangeCheckChip<F: PrimeField, const LIMB_BITS: usize, const NUM_LIMBS: usize> {
    config: RangeCheckConfig<F, LIMB_BITS, NUM_LIMBS>,
}

impl<F: PrimeField, const LIMB_BITS: usize, const NUM_LIMBS: usize> RangeCheckChip<F, LIMB_BITS, NUM_LIMBS> {
    /// Total number of bits covered
    pub const RANGE_BITS: usize = LIMB_BITS * NUM_LIMBS;

    pub fn construct(config: RangeCheckConfig<F, LIMB_BITS, NUM_LIMBS>) -> Self {
        Self { config }
    }

    /// Configure the lookup and running-sum gates.
    ///
    /// `acc` gets equality enabled so the final sum can be tied to the
    /// checked cell.
    pub fn configure(
        meta: &mut ConstraintSystem<F>,
        limb: Column<Advice>,
        acc: Column<Advice>,
    ) -> RangeCheckConfig<F, LIMB_BITS, NUM_LIMBS> {
        assert!(LIMB_BITS > 0 && LIMB_BITS < 64, "limb width must fit in a u64");
        assert!(NUM_LIMBS > 0, "need at least one limb");
        assert!(
            Self::RANGE_BITS < F::NUM_BITS as usize,
            "range of {} bits would wrap the field",
            Self::RANGE_BITS
        );

        meta.enable_equality(acc);

        let q_lookup = meta.complex_selector();
        let q_first = meta.selector();
        let q_running = meta.selector();
        let table = meta.lookup_table_column();

        meta.lookup("limb in table", |meta| {
            let q = meta.query_selector(q_lookup);
            let l = meta.query_advice(limb, Rotation::cur());

            // disabled rows look up 0, which is always in the table
            vec![(q * l, table)]
        });

        meta.create_gate("first limb", |meta| {
            let q = meta.query_selector(q_first);
            let l = meta.query_advice(limb, Rotation::cur());
            let a = meta.query_advice(acc, Rotation::cur());

            vec![q * (a - l)]
        });

        meta.create_gate("running sum", |meta| {
            let q = meta.query_selector(q_running);
            let l = meta.query_advice(limb, Rotation::cur());
            let a = meta.query_advice(acc, Rotation::cur());
            let a_prev = meta.query_advice(acc, Rotation::prev());
            let shift = Expression::Constant(F::from(1u64 << LIMB_BITS));

            vec![q * (a - (a_prev * shift + l))]
        });

        RangeCheckConfig {
            limb,
            acc,
            q_lookup,
            q_first,
            q_running,
            table,
            _marker: PhantomData,
        }
    }

    /// Load the lookup table with values `[0, 2^LIMB_BITS)`
    pub fn load_table(&self, mut layouter: impl Layouter<F>) -> Result<(), Error> {
        let table_size = 1usize << LIMB_BITS;

        layouter.assign_table(
            || "limb table",
            |mut table| {
                for i in 0..table_size {
                    table.assign_cell(
                        || format!("table[{}]", i),
                        self.config.table,
                        i,
                        || Value::known(F::from(i as u64)),
                    )?;
                }
                Ok(())
            },
        )
    }

    /// Split the low `RANGE_BITS` bits of `value` into limbs, most
    /// significant first. Higher bits are dropped, so an out-of-range
    /// value yields limbs that do not sum back to it.
    fn limbs(value: &F) -> Vec<F> {
        let repr = value.to_repr();
        let bytes = repr.as_ref();
        let bit = |i: usize| -> u64 {
            bytes
                .get(i / 8)
                .map(|byte| ((byte >> (i % 8)) & 1) as u64)
                .unwrap_or(0)
        };

        (0..NUM_LIMBS)
            .rev()
            .map(|limb| {
                let base = limb * LIMB_BITS;
                let mut acc = 0u64;
                for b in (0..LIMB_BITS).rev() {
                    acc = (acc << 1) | bit(base + b);
                }
                F::from(acc)
            })
            .collect()
    }
}

impl<F: PrimeField, const LIMB_BITS: usize, const NUM_LIMBS: usize> RangeCheckInstruction<F>
    for RangeCheckChip<F, LIMB_BITS, NUM_LIMBS>
{
    fn check(&self, mut layouter: impl Layouter<F>, value: AssignedCell<F, F>) -> Result<(), Error> {
        let config = &self.config;
        let shift = F::from(1u64 << LIMB_BITS);

        layouter.assign_region(
            || "range check",
            |mut region| {
                let limbs: Value<Vec<F>> = value.value().map(|v| Self::limbs(v));

                let mut acc_value: Value<F> = Value::known(F::ZERO);
                let mut acc_cell = None;

                for row in 0..NUM_LIMBS {
                    config.q_lookup.enable(&mut region, row)?;
                    if row == 0 {
                        config.q_first.enable(&mut region, row)?;
                    } else {
                        config.q_running.enable(&mut region, row)?;
                    }

                    let limb_value = limbs.as_ref().map(|limbs| limbs[row]);
                    region.assign_advice(|| format!("limb {}", row), config.limb, row, || limb_value)?;

                    acc_value = acc_value.zip(limb_value).map(|(acc, limb)| acc * shift + limb);
                    acc_cell = Some(region.assign_advice(
                        || format!("acc {}", row),
                        config.acc,
                        row,
                        || acc_value,
                    )?);
                }

                match acc_cell {
                    Some(acc) => region.constrain_equal(acc.cell(), value.cell()),
                    None => Err(Error::Synthesis),
                }
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halo2_proofs::{circuit::SimpleFloorPlanner, dev::MockProver, plonk::Circuit};
    use pasta_curves::Fp;

    #[derive(Debug, Clone)]
    struct TestConfig<const LIMB_BITS: usize, const NUM_LIMBS: usize> {
        input: Column<Advice>,
        range: RangeCheckConfig<Fp, LIMB_BITS, NUM_LIMBS>,
    }

    #[derive(Clone)]
    struct RangeCheckTestCircuit<const LIMB_BITS: usize, const NUM_LIMBS: usize> {
        value: Value<Fp>,
    }

    impl<const LIMB_BITS: usize, const NUM_LIMBS: usize> Default for RangeCheckTestCircuit<LIMB_BITS, NUM_LIMBS> {
        fn default() -> Self {
            Self {
                value: Value::unknown(),
            }
        }
    }

    impl<const LIMB_BITS: usize, const NUM_LIMBS: usize> Circuit<Fp> for RangeCheckTestCircuit<LIMB_BITS, NUM_LIMBS> {
        type Config = TestConfig<LIMB_BITS, NUM_LIMBS>;
        type FloorPlanner = SimpleFloorPlanner;

        fn without_witnesses(&self) -> Self {
            Self::default()
        }

        fn configure(meta: &mut ConstraintSystem<Fp>) -> Self::Config {
            let input = meta.advice_column();
            let limb = meta.advice_column();
            let acc = meta.advice_column();
            meta.enable_equality(input);

            TestConfig {
                input,
                range: RangeCheckChip::<Fp, LIMB_BITS, NUM_LIMBS>::configure(meta, limb, acc),
            }
        }

        fn synthesize(&self, config: Self::Config, mut layouter: impl Layouter<Fp>) -> Result<(), Error> {
            let chip = RangeCheckChip::<Fp, LIMB_BITS, NUM_LIMBS>::construct(config.range.clone());
            chip.load_table(layouter.namespace(|| "load table"))?;

            let value_cell = layouter.assign_region(
                || "assign value",
                |mut region| region.assign_advice(|| "value", config.input, 0, || self.value),
            )?;

            chip.check(layouter.namespace(|| "range check"), value_cell)
        }
    }

    fn run<const LIMB_BITS: usize, const NUM_LIMBS: usize>(k: u32, value: Fp) -> bool {
        let circuit = RangeCheckTestCircuit::<LIMB_BITS, NUM_LIMBS> {
            value: Value::known(value),
        };
        let prover = MockProver::run(k, &circuit, vec![]).unwrap();
        prover.verify().is_ok()
    }

    #[test]
    fn test_single_lookup_valid() {
        for value in [0u64, 1, 127, 255] {
            assert!(run::<8, 1>(9, Fp::from(value)), "failed for value {}", value);
        }
    }

    #[test]
    fn test_single_lookup_invalid() {
        assert!(!run::<8, 1>(9, Fp::from(256u64)));
    }

    #[test]
    fn test_64_bit_valid() {
        for value in [0u64, 1, 256, 0xdead_beef, u64::MAX] {
            assert!(run::<8, 8>(9, Fp::from(value)), "failed for value {}", value);
        }
    }

    #[test]
    fn test_64_bit_invalid() {
        assert!(!run::<8, 8>(9, Fp::from_u128(1u128 << 64)));
        assert!(!run::<8, 8>(9, -Fp::from(1u64)));
    }

    #[test]
    fn test_limbs_most_significant_first() {
        let limbs = RangeCheckChip::<Fp, 8, 4>::limbs(&Fp::from(0x0102_0304u64));
        assert_eq!(
            limbs,
            vec![Fp::from(1u64), Fp::from(2u64), Fp::from(3u64), Fp::from(4u64)]
        );
    }
}
