use crate::arena::{GoalRegion, TrackMask};
use crate::config::Config;
use crate::evaluator::{Outcome, PolicyRecord, evaluate_generation};
use crate::policy::Genome;
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Summary of one evaluated generation, written to trajectory files.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation_idx: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    /// Closest approach to the goal across the whole population, in pixels.
    pub closest_goal_dist: f64,
    pub n_succeeded: usize,
    pub n_out_of_bounds: usize,
    pub n_timeout: usize,
}

/// Search engine.
///
/// Holds the configuration, current population of controller genomes, and
/// random number generator, and provides methods to initialize, run, save,
/// and load searches. Evaluation itself is deterministic; randomness enters
/// only through population initialization and mutation.
#[derive(Serialize, Deserialize)]
pub struct Engine {
    cfg: Config,
    population: Vec<Genome>,
    generation_idx: usize,
    rng: ChaCha12Rng,
}

impl Engine {
    /// Create a new `Engine` with the given configuration and a random
    /// initial population.
    pub fn generate_initial_condition(cfg: Config) -> Result<Self> {
        let mut rng = match cfg.search.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng()?,
        };

        let population = (0..cfg.search.n_pol)
            .map(|_| Genome::random(&mut rng))
            .collect();

        Ok(Self {
            cfg,
            population,
            generation_idx: 0,
            rng,
        })
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    /// Evaluate and evolve the population for one file's worth of
    /// generations, streaming one record per generation to a binary file.
    pub fn perform_search<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        // The arena is immutable for the whole run.
        let arena = &self.cfg.arena;
        let track = TrackMask::rasterize(
            arena.width,
            arena.height,
            &arena.track_path,
            arena.track_half_width,
        );
        let goal = GoalRegion::new(
            arena.goal_x,
            arena.goal_y,
            arena.goal_width,
            arena.goal_height,
        );

        let n_gens = self.cfg.output.generations_per_file;
        for i_gen in 0..n_gens {
            let mut records: Vec<PolicyRecord> = self
                .population
                .iter()
                .enumerate()
                .map(|(id, genome)| PolicyRecord::new(id, Box::new(genome.clone())))
                .collect();

            evaluate_generation(
                &mut records,
                &track,
                &goal,
                &self.cfg.arena,
                &self.cfg.vehicle,
                &self.cfg.evaluation,
                &mut || false,
            );

            let record = self.summarize_generation(&records);
            encode::write(&mut writer, &record).context("failed to serialize record")?;

            self.evolve_population(&records)
                .context("failed to evolve population")?;
            self.generation_idx += 1;

            let progress = 100.0 * (i_gen + 1) as f64 / n_gens as f64;
            log::info!("completed {progress:06.2}%");
        }

        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }

    /// Save a checkpoint of the entire engine state.
    ///
    /// Can be used to resume the search later.
    pub fn save_checkpoint<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &self).context("failed to serialize engine")?;
        Ok(())
    }

    /// Load a previously saved engine checkpoint.
    pub fn load_checkpoint<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let engine = decode::from_read(&mut reader).context("failed to deserialize engine")?;
        Ok(engine)
    }

    fn summarize_generation(&self, records: &[PolicyRecord]) -> GenerationRecord {
        let mut record = GenerationRecord {
            generation_idx: self.generation_idx,
            best_fitness: f64::NEG_INFINITY,
            mean_fitness: 0.0,
            closest_goal_dist: f64::INFINITY,
            n_succeeded: 0,
            n_out_of_bounds: 0,
            n_timeout: 0,
        };

        for rec in records {
            record.best_fitness = record.best_fitness.max(rec.fitness);
            record.mean_fitness += rec.fitness / records.len() as f64;
            record.closest_goal_dist = record.closest_goal_dist.min(rec.closest_goal_dist);
            match rec.outcome {
                Some(Outcome::Succeeded) => record.n_succeeded += 1,
                Some(Outcome::OutOfBounds) => record.n_out_of_bounds += 1,
                Some(Outcome::Timeout) | None => record.n_timeout += 1,
            }
        }

        record
    }

    fn evolve_population(&mut self, records: &[PolicyRecord]) -> Result<()> {
        // Rank by fitness; the goal-reach reward is sparse, so break ties by
        // closest approach to the goal.
        let mut ranked: Vec<&PolicyRecord> = records.iter().collect();
        ranked.sort_by(|a, b| {
            b.fitness
                .partial_cmp(&a.fitness)
                .unwrap_or(Ordering::Equal)
                .then(
                    a.closest_goal_dist
                        .partial_cmp(&b.closest_goal_dist)
                        .unwrap_or(Ordering::Equal),
                )
        });

        let n_pol = self.cfg.search.n_pol;
        let parent_pool = (n_pol / 2).max(1);

        let mut population = Vec::with_capacity(n_pol);
        for rec in ranked.iter().take(self.cfg.search.n_elite) {
            population.push(self.population[rec.id].clone());
        }
        while population.len() < n_pol {
            let parent = &ranked[self.rng.random_range(0..parent_pool)];
            let mut child = self.population[parent.id].clone();
            child.mutate(&mut self.rng, self.cfg.search.std_dev_mut)?;
            population.push(child);
        }

        self.population = population;
        Ok(())
    }
}
