//! Vesta group arithmetic over the Vesta base field
//!
//! Points are affine `(x, y)` pairs of circuit-field cells, with the identity
//! encoded as `(0, 0)`. No Vesta point has `x = 0` since 5 is a non-residue
//! in `Fq`, so the encoding is unambiguous.
//!
//! All arithmetic goes through a single complete-addition gate which handles
//! distinct points, doubling, inverses and the identity on either side:
//!
//! | x_p | y_p | x_q | y_q | lambda | alpha | beta | gamma | delta |
//! |-----|-----|-----|-----|--------|-------|------|-------|-------|
//! | x_p | y_p | x_q | y_q | λ      | α     | β    | γ     | δ     |
//! | x_r | y_r |     |     |        |       |      |       |       |
//!
//! The scalar multiplications are double-and-add chains over a
//! most-significant-first bit decomposition produced by the range check.

use crate::field::{affine_xy, Base, SCALAR_BOUND};
use ff::Field;
use group::{Curve, Group};
use halo2_proofs::{
    arithmetic::CurveAffine,
    circuit::{AssignedCell, Chip, Layouter, Region, Value},
    plonk::{Advice, Column, ConstraintSystem, Error, Expression, Fixed, Instance, Selector},
    poly::Rotation,
};
use halo2curves::pasta::{vesta, EqAffine};
use once_cell::sync::Lazy;

/// `2^i · G` for every bit position of a canonical scalar, `i = 0` first.
pub static GENERATOR_MULTIPLES: Lazy<Vec<(Base, Base)>> = Lazy::new(|| {
    let mut acc = vesta::Point::generator();
    (0..SCALAR_BOUND.num_bits())
        .map(|_| {
            let xy = affine_xy(&acc.to_affine());
            acc = acc.double();
            xy
        })
        .collect()
});

/// An assigned curve point.
#[derive(Clone, Debug)]
pub struct EccPoint {
    x: AssignedCell<Base, Base>,
    y: AssignedCell<Base, Base>,
}

impl EccPoint {
    pub fn x(&self) -> &AssignedCell<Base, Base> {
        &self.x
    }

    pub fn y(&self) -> &AssignedCell<Base, Base> {
        &self.y
    }

    pub fn value(&self) -> Value<(Base, Base)> {
        self.x.value().copied().zip(self.y.value().copied())
    }
}

#[derive(Clone, Debug)]
pub struct EccConfig {
    x_p: Column<Advice>,
    y_p: Column<Advice>,
    x_q: Column<Advice>,
    y_q: Column<Advice>,
    lambda: Column<Advice>,
    alpha: Column<Advice>,
    beta: Column<Advice>,
    gamma: Column<Advice>,
    delta: Column<Advice>,
    bit: Column<Advice>,
    x_b: Column<Advice>,
    y_b: Column<Advice>,
    fixed_x: Column<Fixed>,
    fixed_y: Column<Fixed>,
    s_add: Selector,
    s_double: Selector,
    s_var_select: Selector,
    s_fixed_select: Selector,
    s_point: Selector,
}

#[derive(Clone, Debug)]
pub struct EccChip {
    config: EccConfig,
}

impl Chip<Base> for EccChip {
    type Config = EccConfig;
    type Loaded = ();

    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn loaded(&self) -> &Self::Loaded {
        &()
    }
}

/// Auxiliary values of one complete addition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct AddWitness {
    lambda: Base,
    alpha: Base,
    beta: Base,
    gamma: Base,
    delta: Base,
    r: (Base, Base),
}

fn inv0(x: Base) -> Base {
    x.invert().unwrap_or(Base::ZERO)
}

fn is_identity(p: (Base, Base)) -> bool {
    p.0.is_zero_vartime() && p.1.is_zero_vartime()
}

fn add_witness(p: (Base, Base), q: (Base, Base)) -> AddWitness {
    let (x_p, y_p) = p;
    let (x_q, y_q) = q;

    let lambda = if x_q != x_p {
        (y_q - y_p) * inv0(x_q - x_p)
    } else {
        x_p.square() * Base::from(3) * inv0(y_p.double())
    };

    let r = if is_identity(p) {
        q
    } else if is_identity(q) {
        p
    } else if x_p == x_q && (y_p + y_q).is_zero_vartime() {
        (Base::ZERO, Base::ZERO)
    } else {
        let x_r = lambda.square() - x_p - x_q;
        let y_r = lambda * (x_p - x_r) - y_p;
        (x_r, y_r)
    };

    AddWitness {
        lambda,
        alpha: inv0(x_q - x_p),
        beta: inv0(x_p),
        gamma: inv0(x_q),
        delta: if x_q == x_p { inv0(y_q + y_p) } else { Base::ZERO },
        r,
    }
}

/// Affine sum under the `(0, 0)`-is-identity encoding.
pub fn add_affine(p: (Base, Base), q: (Base, Base)) -> (Base, Base) {
    add_witness(p, q).r
}

impl EccChip {
    pub fn construct(config: EccConfig) -> Self {
        Self { config }
    }

    /// Rows used by a variable-base multiplication over `bits` bits.
    pub fn variable_base_rows(bits: usize) -> usize {
        2 * bits + 1
    }

    /// Rows used by a fixed-base multiplication over `bits` bits.
    pub fn fixed_base_rows(bits: usize) -> usize {
        bits + 1
    }

    pub fn configure(
        meta: &mut ConstraintSystem<Base>,
        advice: [Column<Advice>; 12],
        table: [Column<Fixed>; 2],
    ) -> EccConfig {
        for col in &advice {
            meta.enable_equality(*col);
        }
        let [x_p, y_p, x_q, y_q, lambda, alpha, beta, gamma, delta, bit, x_b, y_b] = advice;
        let [fixed_x, fixed_y] = table;

        let s_add = meta.selector();
        let s_double = meta.selector();
        let s_var_select = meta.selector();
        let s_fixed_select = meta.selector();
        let s_point = meta.selector();

        meta.create_gate("complete addition", |meta| {
            let s = meta.query_selector(s_add);
            let x_r = meta.query_advice(x_p, Rotation::next());
            let y_r = meta.query_advice(y_p, Rotation::next());
            let x_p = meta.query_advice(x_p, Rotation::cur());
            let y_p = meta.query_advice(y_p, Rotation::cur());
            let x_q = meta.query_advice(x_q, Rotation::cur());
            let y_q = meta.query_advice(y_q, Rotation::cur());
            let lambda = meta.query_advice(lambda, Rotation::cur());
            let alpha = meta.query_advice(alpha, Rotation::cur());
            let beta = meta.query_advice(beta, Rotation::cur());
            let gamma = meta.query_advice(gamma, Rotation::cur());
            let delta = meta.query_advice(delta, Rotation::cur());

            let one = Expression::Constant(Base::ONE);
            let dif_x = x_q.clone() - x_p.clone();
            let dif_y = y_q.clone() - y_p.clone();
            let sum_y = y_q.clone() + y_p.clone();

            let if_alpha = dif_x.clone() * alpha;
            let if_beta = x_p.clone() * beta;
            let if_gamma = x_q.clone() * gamma;
            let if_delta = sum_y.clone() * delta;

            // (x_q - x_p)·((x_q - x_p)·λ - (y_q - y_p))
            let poly1 = dif_x.clone() * (dif_x.clone() * lambda.clone() - dif_y);

            // (1 - (x_q - x_p)·α)·(2·y_p·λ - 3·x_p²)
            let poly2 = (one.clone() - if_alpha.clone())
                * (y_p.clone() * lambda.clone() * Base::from(2)
                    - x_p.clone() * x_p.clone() * Base::from(3));

            let nonexceptional_x =
                lambda.clone() * lambda.clone() - x_p.clone() - x_q.clone() - x_r.clone();
            let nonexceptional_y =
                lambda * (x_p.clone() - x_r.clone()) - y_p.clone() - y_r.clone();
            let x_check = x_p.clone() * x_q.clone() * dif_x;
            let y_check = x_p.clone() * x_q.clone() * sum_y;

            let poly3a = x_check.clone() * nonexceptional_x.clone();
            let poly3b = x_check * nonexceptional_y.clone();
            let poly3c = y_check.clone() * nonexceptional_x;
            let poly3d = y_check * nonexceptional_y;

            // p = O  =>  r = q
            let poly4a = (one.clone() - if_beta.clone()) * (x_r.clone() - x_q);
            let poly4b = (one.clone() - if_beta) * (y_r.clone() - y_q);

            // q = O  =>  r = p
            let poly5a = (one.clone() - if_gamma.clone()) * (x_r.clone() - x_p);
            let poly5b = (one.clone() - if_gamma) * (y_r.clone() - y_p);

            // q = -p  =>  r = O
            let poly6a = (one.clone() - if_alpha.clone() - if_delta.clone()) * x_r;
            let poly6b = (one - if_alpha - if_delta) * y_r;

            [
                poly1, poly2, poly3a, poly3b, poly3c, poly3d, poly4a, poly4b, poly5a, poly5b,
                poly6a, poly6b,
            ]
            .into_iter()
            .map(|poly| s.clone() * poly)
            .collect::<Vec<_>>()
        });

        meta.create_gate("double", |meta| {
            let s = meta.query_selector(s_double);
            let x_p = meta.query_advice(x_p, Rotation::cur());
            let y_p = meta.query_advice(y_p, Rotation::cur());
            let x_q = meta.query_advice(x_q, Rotation::cur());
            let y_q = meta.query_advice(y_q, Rotation::cur());

            vec![s.clone() * (x_q - x_p), s * (y_q - y_p)]
        });

        meta.create_gate("variable-base select", |meta| {
            let s = meta.query_selector(s_var_select);
            let bit = meta.query_advice(bit, Rotation::cur());
            let x_b = meta.query_advice(x_b, Rotation::cur());
            let y_b = meta.query_advice(y_b, Rotation::cur());
            let x_q = meta.query_advice(x_q, Rotation::cur());
            let y_q = meta.query_advice(y_q, Rotation::cur());
            let one = Expression::Constant(Base::ONE);

            vec![
                s.clone() * bit.clone() * (one - bit.clone()),
                s.clone() * (x_q - bit.clone() * x_b),
                s * (y_q - bit * y_b),
            ]
        });

        meta.create_gate("fixed-base select", |meta| {
            let s = meta.query_selector(s_fixed_select);
            let bit = meta.query_advice(bit, Rotation::cur());
            let x_g = meta.query_fixed(fixed_x);
            let y_g = meta.query_fixed(fixed_y);
            let x_q = meta.query_advice(x_q, Rotation::cur());
            let y_q = meta.query_advice(y_q, Rotation::cur());
            let one = Expression::Constant(Base::ONE);

            vec![
                s.clone() * bit.clone() * (one - bit.clone()),
                s.clone() * (x_q - bit.clone() * x_g),
                s * (y_q - bit * y_g),
            ]
        });

        meta.create_gate("point on curve", |meta| {
            let s = meta.query_selector(s_point);
            let x = meta.query_advice(x_p, Rotation::cur());
            let y = meta.query_advice(y_p, Rotation::cur());

            // y² = x³ + b, or (x, y) = (0, 0)
            let curve_eqn = y.clone() * y.clone()
                - x.clone() * x.clone() * x.clone()
                - Expression::Constant(EqAffine::b());

            vec![s.clone() * x * curve_eqn.clone(), s * y * curve_eqn]
        });

        EccConfig {
            x_p,
            y_p,
            x_q,
            y_q,
            lambda,
            alpha,
            beta,
            gamma,
            delta,
            bit,
            x_b,
            y_b,
            fixed_x,
            fixed_y,
            s_add,
            s_double,
            s_var_select,
            s_fixed_select,
            s_point,
        }
    }

    /// Fills the auxiliary columns of one addition row. The caller assigns
    /// `p` and `q` at `offset` and places the returned sum at `offset + 1`.
    fn assign_add(
        &self,
        region: &mut Region<'_, Base>,
        offset: usize,
        p: Value<(Base, Base)>,
        q: Value<(Base, Base)>,
    ) -> Result<Value<(Base, Base)>, Error> {
        let config = &self.config;
        config.s_add.enable(region, offset)?;

        let witness = p.zip(q).map(|(p, q)| add_witness(p, q));
        region.assign_advice(|| "lambda", config.lambda, offset, || witness.map(|w| w.lambda))?;
        region.assign_advice(|| "alpha", config.alpha, offset, || witness.map(|w| w.alpha))?;
        region.assign_advice(|| "beta", config.beta, offset, || witness.map(|w| w.beta))?;
        region.assign_advice(|| "gamma", config.gamma, offset, || witness.map(|w| w.gamma))?;
        region.assign_advice(|| "delta", config.delta, offset, || witness.map(|w| w.delta))?;

        Ok(witness.map(|w| w.r))
    }

    fn assign_q(
        &self,
        region: &mut Region<'_, Base>,
        offset: usize,
        q: Value<(Base, Base)>,
    ) -> Result<(), Error> {
        region.assign_advice(|| "x_q", self.config.x_q, offset, || q.map(|q| q.0))?;
        region.assign_advice(|| "y_q", self.config.y_q, offset, || q.map(|q| q.1))?;
        Ok(())
    }

    fn assign_p(
        &self,
        region: &mut Region<'_, Base>,
        offset: usize,
        p: Value<(Base, Base)>,
    ) -> Result<EccPoint, Error> {
        let x = region.assign_advice(|| "x_p", self.config.x_p, offset, || p.map(|p| p.0))?;
        let y = region.assign_advice(|| "y_p", self.config.y_p, offset, || p.map(|p| p.1))?;
        Ok(EccPoint { x, y })
    }

    /// Loads a public point from two consecutive instance rows and checks
    /// that it lies on the curve.
    pub fn witness_public_point(
        &self,
        mut layouter: impl Layouter<Base>,
        instance: Column<Instance>,
        row: usize,
    ) -> Result<EccPoint, Error> {
        let config = &self.config;
        layouter.assign_region(
            || "load public point",
            |mut region| {
                config.s_point.enable(&mut region, 0)?;
                let x = region.assign_advice_from_instance(|| "x", instance, row, config.x_p, 0)?;
                let y =
                    region.assign_advice_from_instance(|| "y", instance, row + 1, config.y_p, 0)?;
                Ok(EccPoint { x, y })
            },
        )
    }

    /// Binds a point to two consecutive instance rows.
    pub fn expose_public(
        &self,
        mut layouter: impl Layouter<Base>,
        point: &EccPoint,
        instance: Column<Instance>,
        row: usize,
    ) -> Result<(), Error> {
        layouter.constrain_instance(point.x.cell(), instance, row)?;
        layouter.constrain_instance(point.y.cell(), instance, row + 1)
    }

    pub fn add(
        &self,
        mut layouter: impl Layouter<Base>,
        a: &EccPoint,
        b: &EccPoint,
    ) -> Result<EccPoint, Error> {
        let config = &self.config;
        layouter.assign_region(
            || "point addition",
            |mut region| {
                a.x.copy_advice(|| "x_p", &mut region, config.x_p, 0)?;
                a.y.copy_advice(|| "y_p", &mut region, config.y_p, 0)?;
                b.x.copy_advice(|| "x_q", &mut region, config.x_q, 0)?;
                b.y.copy_advice(|| "y_q", &mut region, config.y_q, 0)?;

                let r = self.assign_add(&mut region, 0, a.value(), b.value())?;
                self.assign_p(&mut region, 1, r)
            },
        )
    }

    /// `[k]base` for `k` given as boolean cells, most significant bit first.
    pub fn variable_base_mul(
        &self,
        mut layouter: impl Layouter<Base>,
        base: &EccPoint,
        bits: &[AssignedCell<Base, Base>],
    ) -> Result<EccPoint, Error> {
        let config = &self.config;
        layouter.assign_region(
            || "variable-base scalar mul",
            |mut region| {
                let x = region.assign_advice_from_constant(|| "acc x", config.x_p, 0, Base::ZERO)?;
                let y = region.assign_advice_from_constant(|| "acc y", config.y_p, 0, Base::ZERO)?;
                let mut acc_cells = EccPoint { x, y };
                let mut acc = Value::known((Base::ZERO, Base::ZERO));
                let mut offset = 0;

                for (i, bit) in bits.iter().enumerate() {
                    config.s_double.enable(&mut region, offset)?;
                    self.assign_q(&mut region, offset, acc)?;
                    let doubled = self.assign_add(&mut region, offset, acc, acc)?;
                    offset += 1;
                    self.assign_p(&mut region, offset, doubled)?;

                    config.s_var_select.enable(&mut region, offset)?;
                    let b =
                        bit.copy_advice(|| format!("bit_{}", i), &mut region, config.bit, offset)?;
                    base.x.copy_advice(|| "x_b", &mut region, config.x_b, offset)?;
                    base.y.copy_advice(|| "y_b", &mut region, config.y_b, offset)?;

                    let selected = b
                        .value()
                        .copied()
                        .zip(base.value())
                        .map(|(b, (x, y))| (x * b, y * b));
                    self.assign_q(&mut region, offset, selected)?;
                    acc = self.assign_add(&mut region, offset, doubled, selected)?;
                    offset += 1;
                    acc_cells = self.assign_p(&mut region, offset, acc)?;
                }

                Ok(acc_cells)
            },
        )
    }

    /// `[k]G` for the fixed generator `G`, `k` given most significant bit first.
    pub fn fixed_base_mul(
        &self,
        mut layouter: impl Layouter<Base>,
        bits: &[AssignedCell<Base, Base>],
    ) -> Result<EccPoint, Error> {
        let config = &self.config;
        let table = &*GENERATOR_MULTIPLES;
        if bits.len() > table.len() {
            return Err(Error::Synthesis);
        }

        layouter.assign_region(
            || "fixed-base scalar mul",
            |mut region| {
                let x = region.assign_advice_from_constant(|| "acc x", config.x_p, 0, Base::ZERO)?;
                let y = region.assign_advice_from_constant(|| "acc y", config.y_p, 0, Base::ZERO)?;
                let mut acc_cells = EccPoint { x, y };
                let mut acc = Value::known((Base::ZERO, Base::ZERO));

                let n = bits.len();
                for (i, bit) in bits.iter().enumerate() {
                    let (x_g, y_g) = table[n - 1 - i];

                    config.s_fixed_select.enable(&mut region, i)?;
                    region.assign_fixed(|| "x_g", config.fixed_x, i, || Value::known(x_g))?;
                    region.assign_fixed(|| "y_g", config.fixed_y, i, || Value::known(y_g))?;

                    let b = bit.copy_advice(|| format!("bit_{}", i), &mut region, config.bit, i)?;
                    let selected = b.value().map(|b| (x_g * b, y_g * b));
                    self.assign_q(&mut region, i, selected)?;

                    acc = self.assign_add(&mut region, i, acc, selected)?;
                    acc_cells = self.assign_p(&mut region, i + 1, acc)?;
                }

                Ok(acc_cells)
            },
        )
    }
}
