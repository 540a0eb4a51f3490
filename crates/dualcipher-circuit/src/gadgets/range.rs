//! Canonical range check
//!
//! Proves that a circuit-field wire, read as an integer, lies in `[0, r - 1]`
//! where `r` is the scalar modulus of the hosted group.
//!
//! Layout (one row per bit, most significant bit first, plus a final row):
//!
//! | bit | z        | equal    | less     | bound_bit |
//! |-----|----------|----------|----------|-----------|
//! | b_0 | 0        | 1        | 0        | c_0       |
//! | b_1 | z_1      | e_1      | l_1      | c_1       |
//! | ... | ...      | ...      | ...      | ...       |
//! |     | z_n = v  | e_n      | l_n      |           |
//!
//! Per step: `z' = 2z + b`, `l' = l + e·(1 - b)·c`, `e' = e·[b == c]`.
//! The final row asserts `e + l = 1`, i.e. `v == r - 1` or `v < r - 1`.

use crate::field::{msb_bits, Base, SCALAR_BOUND};
use ff::Field;
use halo2_proofs::{
    circuit::{AssignedCell, Chip, Layouter, Value},
    plonk::{Advice, Column, ConstraintSystem, Error, Expression, Fixed, Selector},
    poly::Rotation,
};

#[derive(Clone, Debug)]
pub struct RangeCheckConfig {
    bit: Column<Advice>,
    z: Column<Advice>,
    equal: Column<Advice>,
    less: Column<Advice>,
    bound_bit: Column<Fixed>,
    s_step: Selector,
    s_final: Selector,
}

#[derive(Clone, Debug)]
pub struct RangeCheckChip {
    config: RangeCheckConfig,
}

impl Chip<Base> for RangeCheckChip {
    type Config = RangeCheckConfig;
    type Loaded = ();

    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn loaded(&self) -> &Self::Loaded {
        &()
    }
}

impl RangeCheckChip {
    pub fn construct(config: RangeCheckConfig) -> Self {
        Self { config }
    }

    /// Rows used by one range check.
    pub fn rows() -> usize {
        SCALAR_BOUND.num_bits() + 1
    }

    pub fn configure(
        meta: &mut ConstraintSystem<Base>,
        advice: [Column<Advice>; 4],
        bound_bit: Column<Fixed>,
    ) -> RangeCheckConfig {
        for col in &advice {
            meta.enable_equality(*col);
        }
        let [bit, z, equal, less] = advice;

        let s_step = meta.selector();
        let s_final = meta.selector();

        meta.create_gate("range step", |meta| {
            let s = meta.query_selector(s_step);
            let b = meta.query_advice(bit, Rotation::cur());
            let c = meta.query_fixed(bound_bit);
            let z_cur = meta.query_advice(z, Rotation::cur());
            let z_next = meta.query_advice(z, Rotation::next());
            let eq_cur = meta.query_advice(equal, Rotation::cur());
            let eq_next = meta.query_advice(equal, Rotation::next());
            let lt_cur = meta.query_advice(less, Rotation::cur());
            let lt_next = meta.query_advice(less, Rotation::next());

            let one = Expression::Constant(Base::ONE);
            let bit_below_bound = (one.clone() - b.clone()) * c.clone();
            let bit_matches_bound =
                c.clone() * b.clone() + (one.clone() - c) * (one.clone() - b.clone());

            vec![
                s.clone() * b.clone() * (one - b.clone()),
                s.clone() * (z_next - (z_cur.clone() + z_cur + b)),
                s.clone() * (lt_next - (lt_cur + eq_cur.clone() * bit_below_bound)),
                s * (eq_next - eq_cur * bit_matches_bound),
            ]
        });

        meta.create_gate("range final", |meta| {
            let s = meta.query_selector(s_final);
            let eq = meta.query_advice(equal, Rotation::cur());
            let lt = meta.query_advice(less, Rotation::cur());
            let one = Expression::Constant(Base::ONE);

            vec![
                s.clone() * eq.clone() * (one.clone() - eq.clone()),
                s.clone() * lt.clone() * (one.clone() - lt.clone()),
                s * (eq + lt - one),
            ]
        });

        RangeCheckConfig { bit, z, equal, less, bound_bit, s_step, s_final }
    }

    /// Constrains `value <= r - 1` and returns its boolean decomposition,
    /// most significant bit first.
    pub fn range_check(
        &self,
        mut layouter: impl Layouter<Base>,
        value: &AssignedCell<Base, Base>,
    ) -> Result<Vec<AssignedCell<Base, Base>>, Error> {
        let config = &self.config;
        let bound = &*SCALAR_BOUND;
        let nbits = bound.num_bits();

        layouter.assign_region(
            || "canonical range check",
            |mut region| {
                let bits = value.value().map(|v| msb_bits(v, nbits));

                let mut z = region.assign_advice_from_constant(|| "z_0", config.z, 0, Base::ZERO)?;
                let mut equal =
                    region.assign_advice_from_constant(|| "equal_0", config.equal, 0, Base::ONE)?;
                let mut less =
                    region.assign_advice_from_constant(|| "less_0", config.less, 0, Base::ZERO)?;

                let mut bit_cells = Vec::with_capacity(nbits);
                for (i, bound_bit) in bound.bits().iter().enumerate() {
                    config.s_step.enable(&mut region, i)?;

                    let c = if *bound_bit { Base::ONE } else { Base::ZERO };
                    region.assign_fixed(
                        || format!("bound_bit_{}", i),
                        config.bound_bit,
                        i,
                        || Value::known(c),
                    )?;

                    let b = bits.as_ref().map(|bits| if bits[i] { Base::ONE } else { Base::ZERO });
                    let bit = region.assign_advice(|| format!("bit_{}", i), config.bit, i, || b)?;

                    let z_next = z.value().copied().zip(b).map(|(z, b)| z.double() + b);
                    let less_next = less
                        .value()
                        .copied()
                        .zip(equal.value().copied())
                        .zip(b)
                        .map(|((lt, eq), b)| lt + eq * (Base::ONE - b) * c);
                    let equal_next = equal
                        .value()
                        .copied()
                        .zip(b)
                        .map(|(eq, b)| eq * (c * b + (Base::ONE - c) * (Base::ONE - b)));

                    z = region.assign_advice(
                        || format!("z_{}", i + 1),
                        config.z,
                        i + 1,
                        || z_next,
                    )?;
                    less = region.assign_advice(
                        || format!("less_{}", i + 1),
                        config.less,
                        i + 1,
                        || less_next,
                    )?;
                    equal = region.assign_advice(
                        || format!("equal_{}", i + 1),
                        config.equal,
                        i + 1,
                        || equal_next,
                    )?;

                    bit_cells.push(bit);
                }

                config.s_final.enable(&mut region, nbits)?;
                region.constrain_equal(z.cell(), value.cell())?;

                Ok(bit_cells)
            },
        )
    }
}
