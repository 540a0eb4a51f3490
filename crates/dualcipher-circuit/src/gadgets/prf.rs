//! Keyed pseudo-random function over the circuit field
//!
//! `PRF(key, i) = Poseidon(key, i)` with the P128Pow5T3 parameters and a
//! constant-length-2 sponge domain. Each evaluation starts from a fresh
//! sponge, so outputs depend only on `(key, i)`.

use crate::field::Base;
use halo2_gadgets::poseidon::{
    primitives::{self as poseidon, ConstantLength, P128Pow5T3},
    Hash, Pow5Chip, Pow5Config,
};
use halo2_proofs::{
    circuit::{AssignedCell, Chip, Layouter},
    plonk::{Advice, Column, ConstraintSystem, Error, Fixed},
};

const WIDTH: usize = 3;
const RATE: usize = 2;

/// Upper bound on the rows used by one in-circuit evaluation.
pub const PRF_ROWS: usize = 64;

/// Host-side evaluation.
pub fn prf(key: Base, index: u64) -> Base {
    poseidon::Hash::<_, P128Pow5T3, ConstantLength<2>, WIDTH, RATE>::init()
        .hash([key, Base::from(index)])
}

#[derive(Clone, Debug)]
pub struct PrfConfig {
    poseidon: Pow5Config<Base, WIDTH, RATE>,
    message: [Column<Advice>; 2],
}

#[derive(Clone, Debug)]
pub struct PrfChip {
    config: PrfConfig,
}

impl Chip<Base> for PrfChip {
    type Config = PrfConfig;
    type Loaded = ();

    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn loaded(&self) -> &Self::Loaded {
        &()
    }
}

impl PrfChip {
    pub fn construct(config: PrfConfig) -> Self {
        Self { config }
    }

    pub fn configure(
        meta: &mut ConstraintSystem<Base>,
        state: [Column<Advice>; WIDTH],
        partial_sbox: Column<Advice>,
        rc_a: [Column<Fixed>; WIDTH],
        rc_b: [Column<Fixed>; WIDTH],
    ) -> PrfConfig {
        let poseidon = Pow5Chip::configure::<P128Pow5T3>(meta, state, partial_sbox, rc_a, rc_b);
        PrfConfig { poseidon, message: [state[0], state[1]] }
    }

    /// `PRF(key, index)` with the index fixed at synthesis time.
    pub fn evaluate(
        &self,
        mut layouter: impl Layouter<Base>,
        key: &AssignedCell<Base, Base>,
        index: u64,
    ) -> Result<AssignedCell<Base, Base>, Error> {
        let config = &self.config;

        let message = layouter.assign_region(
            || "load prf message",
            |mut region| {
                let key = key.copy_advice(|| "key", &mut region, config.message[0], 0)?;
                let index = region.assign_advice_from_constant(
                    || "index",
                    config.message[1],
                    0,
                    Base::from(index),
                )?;
                Ok([key, index])
            },
        )?;

        let hasher = Hash::<_, _, P128Pow5T3, ConstantLength<2>, WIDTH, RATE>::init(
            Pow5Chip::construct(config.poseidon.clone()),
            layouter.namespace(|| "prf init"),
        )?;
        hasher.hash(layouter.namespace(|| "prf hash"), message)
    }
}
