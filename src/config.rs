use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Search configuration parameters.
///
/// Loaded from a TOML file and validated before use. See
/// [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub arena: ArenaConfig,
    pub vehicle: VehicleConfig,
    pub evaluation: EvaluationConfig,
    pub search: SearchConfig,
    pub output: OutputConfig,
}

/// Play area, track geometry and goal region.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Play area width in pixels.
    pub width: usize,
    /// Play area height in pixels.
    pub height: usize,

    /// Track waypoints, in order, as `[x, y]` pairs.
    pub track_path: Vec<(f64, f64)>,
    /// Half-width of the stroked track, in pixels.
    pub track_half_width: f64,

    /// Goal region top-left corner.
    pub goal_x: f64,
    pub goal_y: f64,
    /// Goal region size in pixels.
    pub goal_width: usize,
    pub goal_height: usize,
}

/// Vehicle footprint, spawn pose and handling.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct VehicleConfig {
    /// Footprint size in pixels, drawn facing up.
    pub width: usize,
    pub height: usize,

    /// Spawn pose shared by every agent of a generation.
    pub spawn_x: f64,
    pub spawn_y: f64,
    pub spawn_tilt: f64,

    /// Turn impulse magnitude, degrees per tick.
    pub turn_rate: f64,

    /// Speed limits applied from the on-track status each tick.
    pub speed_on_track: f64,
    pub speed_off_track: f64,
}

/// Per-generation evaluation budget and reward.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Tick budget per generation.
    pub max_ticks: u32,
    /// Fixed bonus awarded on reaching the goal, on top of the
    /// time-remaining bonus.
    pub goal_bonus: f64,
}

/// Population search parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Population size.
    pub n_pol: usize,
    /// Genomes carried over unchanged each generation.
    pub n_elite: usize,
    /// Standard deviation of mutation noise.
    pub std_dev_mut: f64,
    /// Fixed RNG seed; seeded from the OS when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of generation records written per trajectory file.
    pub generations_per_file: usize,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized, or if the
    /// configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let arena = &self.arena;
        check_num(arena.width, 1..10_000).context("invalid play area width")?;
        check_num(arena.height, 1..10_000).context("invalid play area height")?;
        check_num(arena.track_path.len(), 2..1_000).context("invalid number of track waypoints")?;
        check_num(arena.track_half_width, 1.0..1_000.0).context("invalid track half-width")?;
        check_num(arena.goal_x, 0.0..arena.width as f64).context("invalid goal x")?;
        check_num(arena.goal_y, 0.0..arena.height as f64).context("invalid goal y")?;
        check_num(arena.goal_width, 1..arena.width).context("invalid goal width")?;
        check_num(arena.goal_height, 1..arena.height).context("invalid goal height")?;

        let vehicle = &self.vehicle;
        check_num(vehicle.width, 1..arena.width).context("invalid vehicle width")?;
        check_num(vehicle.height, 1..arena.height).context("invalid vehicle height")?;
        check_num(vehicle.spawn_x, 0.0..arena.width as f64).context("invalid spawn x")?;
        check_num(vehicle.spawn_y, 0.0..arena.height as f64).context("invalid spawn y")?;
        check_num(vehicle.spawn_tilt, 0.0..360.0).context("invalid spawn tilt")?;
        check_num(vehicle.turn_rate, 0.0..90.0).context("invalid turn rate")?;
        check_num(vehicle.speed_on_track, 0.0..1_000.0).context("invalid on-track speed")?;
        check_num(vehicle.speed_off_track, 0.0..1_000.0).context("invalid off-track speed")?;

        check_num(self.evaluation.max_ticks, 1..1_000_000).context("invalid tick budget")?;
        check_num(self.evaluation.goal_bonus, 0.0..1_000_000.0).context("invalid goal bonus")?;

        let search = &self.search;
        check_num(search.n_pol, 1..100_000).context("invalid population size")?;
        check_num(search.n_elite, 0..search.n_pol + 1).context("invalid elite count")?;
        check_num(search.std_dev_mut, 0.0..10.0).context("invalid mutation standard deviation")?;

        check_num(self.output.generations_per_file, 1..10_000)
            .context("invalid number of generations per file")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}
