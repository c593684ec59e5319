//! Policy contract and the linear controller genome evolved by the engine.

use crate::model::{ControlIntent, Lateral, Longitudinal};
use crate::sensor::Observation;
use anyhow::Result;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Raw two-channel control signal produced by a policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    pub throttle: f64,
    pub turn: f64,
}

impl Steering {
    /// Decode the signal into discrete impulses.
    ///
    /// Thresholds sit at +/-0.5 with a dead zone in between; the two channels
    /// are decoded independently. A non-finite channel is treated as neutral
    /// rather than failing the agent's tick.
    pub fn to_intent(self) -> ControlIntent {
        let throttle = if self.throttle.is_finite() {
            self.throttle
        } else {
            0.0
        };
        let turn = if self.turn.is_finite() { self.turn } else { 0.0 };

        ControlIntent {
            longitudinal: if throttle > 0.5 {
                Longitudinal::Accelerate
            } else if throttle < -0.5 {
                Longitudinal::Decelerate
            } else {
                Longitudinal::Coast
            },
            lateral: if turn > 0.5 {
                Lateral::Left
            } else if turn < -0.5 {
                Lateral::Right
            } else {
                Lateral::Straight
            },
        }
    }
}

/// External decision function mapping an observation to a control signal.
pub trait Policy {
    fn decide(&self, obs: &Observation) -> Steering;
}

const N_INPUTS: usize = 7;

/// Controller genome: one bias plus one weight per observation component for
/// each output channel, squashed through tanh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    throttle_weights: [f64; N_INPUTS + 1],
    turn_weights: [f64; N_INPUTS + 1],
}

impl Genome {
    /// Sample a fresh genome with small uniform weights.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut sample = || std::array::from_fn(|_| rng.random_range(-1.0..1.0));
        Self {
            throttle_weights: sample(),
            turn_weights: sample(),
        }
    }

    /// Perturb every weight with Gaussian noise of the given deviation.
    pub fn mutate<R: Rng>(&mut self, rng: &mut R, std_dev: f64) -> Result<()> {
        let noise = Normal::new(0.0, std_dev)?;
        for w in self
            .throttle_weights
            .iter_mut()
            .chain(self.turn_weights.iter_mut())
        {
            *w += noise.sample(rng);
        }
        Ok(())
    }
}

fn activate(weights: &[f64; N_INPUTS + 1], inputs: &[f64; N_INPUTS]) -> f64 {
    let mut sum = weights[N_INPUTS];
    for (w, v) in weights.iter().zip(inputs.iter()) {
        sum += w * v;
    }
    sum.tanh()
}

impl Policy for Genome {
    fn decide(&self, obs: &Observation) -> Steering {
        let inputs = obs.as_array();
        Steering {
            throttle: activate(&self.throttle_weights, &inputs),
            turn: activate(&self.turn_weights, &inputs),
        }
    }
}
