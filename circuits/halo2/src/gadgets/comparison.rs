//! Comparison Gadget for Greater-Than-Or-Equal
//!
//! Proves `a >= b` by showing `a - b` lies in `[0, 2^RANGE_BITS)` with the
//! lookup range check.
//!
//! # Strategy
//! 1. Compute diff = a - b (strict variant: a - b - 1)
//! 2. Range check diff with limb lookups
//! 3. If a >= b, diff is small and in range
//! 4. If a < b, diff wraps to p - (b - a), which has high bits set
//!
//! # Important Constraint
//! Both a and b MUST be in `[0, 2^RANGE_BITS)` already; otherwise a wrapped
//! difference could also land in range.

use ff::PrimeField;
use halo2_proofs::{
    circuit::{AssignedCell, Layouter},
    plonk::{Advice, Column, ConstraintSystem, Error, Expression, Selector},
    poly::Rotation,
};
use std::marker::PhantomData;

use super::range_check::{RangeCheckChip, RangeCheckConfig, RangeCheckInstruction};

/// Configuration for comparison chip
#[derive(Debug, Clone)]
pub struct ComparisonConfig<F: PrimeField, const LIMB_BITS: usize, const NUM_LIMBS: usize> {
    pub a: Column<Advice>,
    pub b: Column<Advice>,
    pub diff: Column<Advice>,
    /// diff == a - b
    pub q_gte: Selector,
    /// diff == a - b - 1
    pub q_gt: Selector,
    pub range_check: RangeCheckConfig<F, LIMB_BITS, NUM_LIMBS>,
    _marker: PhantomData<F>,
}

/// Instructions for comparison operations
pub trait ComparisonInstruction<F: PrimeField> {
    /// Prove that a >= b
    fn gte(&self, layouter: impl Layouter<F>, a: AssignedCell<F, F>, b: AssignedCell<F, F>) -> Result<(), Error>;

    /// Prove that a > b (strictly greater)
    fn gt(&self, layouter: impl Layouter<F>, a: AssignedCell<F, F>, b: AssignedCell<F, F>) -> Result<(), Error>;
}

/// Comparison chip for >= and > operations
#[derive(Debug, Clone)]
pub struct ComparisonChip<F: PrimeField, const LIMB_BITS: usize, const NUM_LIMBS: usize> {
    config: ComparisonConfig<F, LIMB_BITS, NUM_LIMBS>,
}

impl<F: PrimeField, const LIMB_BITS: usize, const NUM_LIMBS: usize> ComparisonChip<F, LIMB_BITS, NUM_LIMBS> {
    pub fn construct(config: ComparisonConfig<F, LIMB_BITS, NUM_LIMBS>) -> Self {
        Self { config }
    }

    /// Configure the comparison chip on top of a range check over `limb`/`acc`.
    pub fn configure(
        meta: &mut ConstraintSystem<F>,
        a: Column<Advice>,
        b: Column<Advice>,
        diff: Column<Advice>,
        limb: Column<Advice>,
        acc: Column<Advice>,
    ) -> ComparisonConfig<F, LIMB_BITS, NUM_LIMBS> {
        meta.enable_equality(a);
        meta.enable_equality(b);
        meta.enable_equality(diff);

        let q_gte = meta.selector();
        let q_gt = meta.selector();

        let range_check = RangeCheckChip::<F, LIMB_BITS, NUM_LIMBS>::configure(meta, limb, acc);

        meta.create_gate("comparison", |meta| {
            let q_gte = meta.query_selector(q_gte);
            let q_gt = meta.query_selector(q_gt);
            let a = meta.query_advice(a, Rotation::cur());
            let b = meta.query_advice(b, Rotation::cur());
            let diff = meta.query_advice(diff, Rotation::cur());
            let one = Expression::Constant(F::ONE);

            vec![
                q_gte * (diff.clone() - a.clone() + b.clone()),
                q_gt * (diff - a + b + one),
            ]
        });

        ComparisonConfig {
            a,
            b,
            diff,
            q_gte,
            q_gt,
            range_check,
            _marker: PhantomData,
        }
    }

    /// Load the range check lookup table
    pub fn load_table(&self, layouter: impl Layouter<F>) -> Result<(), Error> {
        RangeCheckChip::<F, LIMB_BITS, NUM_LIMBS>::construct(self.config.range_check.clone()).load_table(layouter)
    }

    fn compare(
        &self,
        mut layouter: impl Layouter<F>,
        a: AssignedCell<F, F>,
        b: AssignedCell<F, F>,
        strict: bool,
    ) -> Result<(), Error> {
        let diff_cell = layouter.assign_region(
            || if strict { "comparison: a > b" } else { "comparison: a >= b" },
            |mut region| {
                if strict {
                    self.config.q_gt.enable(&mut region, 0)?;
                } else {
                    self.config.q_gte.enable(&mut region, 0)?;
                }

                a.copy_advice(|| "a", &mut region, self.config.a, 0)?;
                b.copy_advice(|| "b", &mut region, self.config.b, 0)?;

                let diff_value = a.value().zip(b.value()).map(|(a, b)| {
                    if strict {
                        *a - *b - F::ONE
                    } else {
                        *a - *b
                    }
                });

                region.assign_advice(|| "diff", self.config.diff, 0, || diff_value)
            },
        )?;

        let range_chip = RangeCheckChip::<F, LIMB_BITS, NUM_LIMBS>::construct(self.config.range_check.clone());
        range_chip.check(layouter.namespace(|| "range check diff"), diff_cell)
    }
}

impl<F: PrimeField, const LIMB_BITS: usize, const NUM_LIMBS: usize> ComparisonInstruction<F>
    for ComparisonChip<F, LIMB_BITS, NUM_LIMBS>
{
    fn gte(&self, layouter: impl Layouter<F>, a: AssignedCell<F, F>, b: AssignedCell<F, F>) -> Result<(), Error> {
        self.compare(layouter, a, b, false)
    }

    fn gt(&self, layouter: impl Layouter<F>, a: AssignedCell<F, F>, b: AssignedCell<F, F>) -> Result<(), Error> {
        self.compare(layouter, a, b, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use halo2_proofs::{
        circuit::{SimpleFloorPlanner, Value},
        dev::MockProver,
        plonk::Circuit,
    };
    use pasta_curves::Fp;

    #[derive(Clone)]
    struct ComparisonTestCircuit<const STRICT: bool> {
        a: Value<Fp>,
        b: Value<Fp>,
    }

    impl<const STRICT: bool> Default for ComparisonTestCircuit<STRICT> {
        fn default() -> Self {
            Self {
                a: Value::unknown(),
                b: Value::unknown(),
            }
        }
    }

    impl<const STRICT: bool> Circuit<Fp> for ComparisonTestCircuit<STRICT> {
        type Config = ComparisonConfig<Fp, 8, 8>;
        type FloorPlanner = SimpleFloorPlanner;

        fn without_witnesses(&self) -> Self {
            Self::default()
        }

        fn configure(meta: &mut ConstraintSystem<Fp>) -> Self::Config {
            let a = meta.advice_column();
            let b = meta.advice_column();
            let diff = meta.advice_column();
            let limb = meta.advice_column();
            let acc = meta.advice_column();

            ComparisonChip::<Fp, 8, 8>::configure(meta, a, b, diff, limb, acc)
        }

        fn synthesize(&self, config: Self::Config, mut layouter: impl Layouter<Fp>) -> Result<(), Error> {
            let chip = ComparisonChip::<Fp, 8, 8>::construct(config.clone());
            chip.load_table(layouter.namespace(|| "load table"))?;

            let (a_cell, b_cell) = layouter.assign_region(
                || "assign inputs",
                |mut region| {
                    let a = region.assign_advice(|| "a", config.a, 0, || self.a)?;
                    let b = region.assign_advice(|| "b", config.b, 0, || self.b)?;
                    Ok((a, b))
                },
            )?;

            if STRICT {
                chip.gt(layouter.namespace(|| "a > b"), a_cell, b_cell)
            } else {
                chip.gte(layouter.namespace(|| "a >= b"), a_cell, b_cell)
            }
        }
    }

    fn run<const STRICT: bool>(a: u64, b: u64) -> bool {
        let circuit = ComparisonTestCircuit::<STRICT> {
            a: Value::known(Fp::from(a)),
            b: Value::known(Fp::from(b)),
        };
        let prover = MockProver::run(10, &circuit, vec![]).unwrap();
        prover.verify().is_ok()
    }

    #[test]
    fn test_comparison_gte_valid() {
        for (a, b) in [(100u64, 50u64), (100, 100), (u64::MAX, 0), (u64::MAX, u64::MAX)] {
            assert!(run::<false>(a, b), "failed for a={}, b={}", a, b);
        }
    }

    #[test]
    fn test_comparison_gte_invalid() {
        assert!(!run::<false>(99, 100));
        assert!(!run::<false>(0, u64::MAX));
    }

    #[test]
    fn test_comparison_gt() {
        assert!(run::<true>(101, 100));
        assert!(!run::<true>(100, 100));
        assert!(!run::<true>(0, 1));
    }
}
