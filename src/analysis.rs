use crate::config::Config;
use crate::engine::GenerationRecord;
use crate::stats::{Accumulator, Extremes};
use anyhow::{Context, Result};
use rmp_serde::decode;
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

pub trait Obs {
    fn update(&mut self, record: &GenerationRecord) -> Result<()>;
    fn report(&self) -> serde_json::Value;
}

pub struct Fitness {
    mean: Accumulator,
    best: Extremes,
}

impl Fitness {
    pub fn new() -> Self {
        Self {
            mean: Accumulator::new(),
            best: Extremes::new(),
        }
    }
}

impl Obs for Fitness {
    fn update(&mut self, record: &GenerationRecord) -> Result<()> {
        self.mean.add(record.mean_fitness);
        self.best.add(record.best_fitness);
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({
            "mean_fitness": self.mean.report(),
            "best_fitness": self.best.report(),
        })
    }
}

pub struct SuccessRate {
    n_pol: usize,
    rate: Accumulator,
}

impl SuccessRate {
    pub fn new(cfg: &Config) -> Self {
        Self {
            n_pol: cfg.search.n_pol,
            rate: Accumulator::new(),
        }
    }
}

impl Obs for SuccessRate {
    fn update(&mut self, record: &GenerationRecord) -> Result<()> {
        self.rate
            .add(record.n_succeeded as f64 / self.n_pol as f64);
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "success_rate": self.rate.report() })
    }
}

pub struct Outcomes {
    n_succeeded: usize,
    n_out_of_bounds: usize,
    n_timeout: usize,
}

impl Outcomes {
    pub fn new() -> Self {
        Self {
            n_succeeded: 0,
            n_out_of_bounds: 0,
            n_timeout: 0,
        }
    }
}

impl Obs for Outcomes {
    fn update(&mut self, record: &GenerationRecord) -> Result<()> {
        self.n_succeeded += record.n_succeeded;
        self.n_out_of_bounds += record.n_out_of_bounds;
        self.n_timeout += record.n_timeout;
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "outcomes": {
            "succeeded": self.n_succeeded,
            "out_of_bounds": self.n_out_of_bounds,
            "timeout": self.n_timeout,
        }})
    }
}

pub struct GoalApproach {
    closest: Extremes,
}

impl GoalApproach {
    pub fn new() -> Self {
        Self {
            closest: Extremes::new(),
        }
    }
}

impl Obs for GoalApproach {
    fn update(&mut self, record: &GenerationRecord) -> Result<()> {
        self.closest.add(record.closest_goal_dist);
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "closest_goal_dist": self.closest.report() })
    }
}

pub struct Analyzer {
    cfg: Config,
    obs_ptr_vec: Vec<Box<dyn Obs>>,
}

impl Analyzer {
    pub fn new(cfg: Config) -> Self {
        let mut obs_ptr_vec: Vec<Box<dyn Obs>> = Vec::new();
        obs_ptr_vec.push(Box::new(Fitness::new()));
        obs_ptr_vec.push(Box::new(SuccessRate::new(&cfg)));
        obs_ptr_vec.push(Box::new(Outcomes::new()));
        obs_ptr_vec.push(Box::new(GoalApproach::new()));
        Self { cfg, obs_ptr_vec }
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);

        for _ in 0..self.cfg.output.generations_per_file {
            let record = decode::from_read(&mut reader).context("failed to read record")?;
            for obs in &mut self.obs_ptr_vec {
                obs.update(&record).context("failed to update observable")?;
            }
        }
        Ok(())
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let writer = BufWriter::new(file);

        let reports: Vec<_> = self.obs_ptr_vec.iter().map(|obs| obs.report()).collect();
        serde_json::to_writer_pretty(writer, &reports)?;
        Ok(())
    }
}
