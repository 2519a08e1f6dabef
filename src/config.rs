//! Run parameters for the pollen storm simulation.
//!
//! Defaults describe the standard run: four million grains released from a
//! 200 x 200 grid at height 240, 3000 unit time steps, and a trend fit over the
//! last 1000 steps. Everything is validated once, before any particle is
//! allocated, so the kernel itself can assume a consistent configuration.

use crate::error::{Error, Result};
use log::{debug, warn};

// ===================================================================================
// Default Constants
// ===================================================================================

/// Must be a perfect square (particles are laid out on a square grid).
pub const DEFAULT_NUM_PARTICLES: usize = 4_000_000;
pub const DEFAULT_MAX_TIME: usize = 3000;
pub const DEFAULT_WINDOW_LEN: usize = 1000;
pub const DEFAULT_FALL_RATE: f64 = 0.0005;
pub const DEFAULT_STORM_FORCE: f64 = 0.0008;
/// Keeps the vertical deceleration finite at the storm eye.
pub const DEFAULT_EPSILON: f64 = 1.0e-6;
pub const DEFAULT_BOX_WIDTH: f64 = 200.0;
pub const DEFAULT_INITIAL_HEIGHT: f64 = 240.0;
/// Horizontal distances are divided by this before entering the force model.
pub const RADIAL_NORMALIZATION: f64 = 200.0;
pub const DEFAULT_PROGRESS_INTERVAL: usize = 50;

/// Particles handed to one rayon task in the parallel integration step.
pub const PARALLEL_CHUNK_LEN: usize = 1024;

/// Environment variable holding the desired worker thread count.
pub const THREADS_ENV_VAR: &str = "POLLEN_THREADS";
/// Consulted only when [`THREADS_ENV_VAR`] is unset.
pub const LEGACY_THREADS_ENV_VAR: &str = "OMP_NUM_THREADS";

// ===================================================================================
// Simulation Parameters
// ===================================================================================

/// How the per-step loops are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    /// Chunked rayon loops and parallel reductions.
    #[default]
    Parallel,
    /// Plain index-order loops on the calling thread.
    Serial,
}

/// Fixed 2D centre of the storm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StormEye {
    pub x: f64,
    pub y: f64,
}

impl StormEye {
    pub const ORIGIN: StormEye = StormEye { x: 0.0, y: 0.0 };
}

/// Constants of the storm force model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StormParams {
    pub eye: StormEye,
    pub storm_force: f64,
    pub fall_rate: f64,
    pub epsilon: f64,
}

impl Default for StormParams {
    fn default() -> Self {
        StormParams {
            eye: StormEye::ORIGIN,
            storm_force: DEFAULT_STORM_FORCE,
            fall_rate: DEFAULT_FALL_RATE,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

/// Everything a run needs, fixed for its whole duration.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub num_particles: usize,
    /// Number of unit time steps; the clock runs over `0..max_time`.
    pub max_time: usize,
    /// Number of trailing steps sampled for the trend fit.
    pub window_len: usize,
    pub box_width: f64,
    pub initial_height: f64,
    pub storm: StormParams,
    pub progress_interval: usize,
    pub execution: Execution,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            num_particles: DEFAULT_NUM_PARTICLES,
            max_time: DEFAULT_MAX_TIME,
            window_len: DEFAULT_WINDOW_LEN,
            box_width: DEFAULT_BOX_WIDTH,
            initial_height: DEFAULT_INITIAL_HEIGHT,
            storm: StormParams::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            execution: Execution::Parallel,
        }
    }
}

impl SimulationParams {
    /// Check every invariant the kernel relies on.
    ///
    /// Errors:
    /// - `Error::InvalidConfiguration` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        grid_side(self.num_particles)?;
        if self.max_time == 0 {
            return Err(Error::InvalidConfiguration("max_time must be >= 1".into()));
        }
        if self.window_len == 0 || self.window_len > self.max_time {
            return Err(Error::InvalidConfiguration(format!(
                "window_len must lie in 1..={} (got {})",
                self.max_time, self.window_len
            )));
        }
        if self.progress_interval == 0 {
            return Err(Error::InvalidConfiguration(
                "progress_interval must be >= 1".into(),
            ));
        }
        if !self.box_width.is_finite() || self.box_width <= 0.0 {
            return Err(Error::InvalidConfiguration(
                "box_width must be finite and > 0".into(),
            ));
        }
        if !self.initial_height.is_finite() {
            return Err(Error::InvalidConfiguration(
                "initial_height must be finite".into(),
            ));
        }
        let s = &self.storm;
        let finite = [s.eye.x, s.eye.y, s.storm_force, s.fall_rate, s.epsilon]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(Error::InvalidConfiguration(
                "storm constants must be finite".into(),
            ));
        }
        if s.epsilon <= 0.0 {
            return Err(Error::InvalidConfiguration("epsilon must be > 0".into()));
        }
        Ok(())
    }

    /// First time step recorded into the sample window.
    #[inline]
    pub fn window_start(&self) -> usize {
        self.max_time - self.window_len
    }
}

/// Side length of the square particle grid.
///
/// Errors:
/// - `Error::InvalidConfiguration` if `n` is zero or not a perfect square.
pub fn grid_side(n: usize) -> Result<usize> {
    let side = n.isqrt();
    if n == 0 || side * side != n {
        return Err(Error::InvalidConfiguration(format!(
            "particle count {n} must be a non-zero perfect square"
        )));
    }
    Ok(side)
}

// ===================================================================================
// Thread count
// ===================================================================================

/// Where the resolved thread count came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadSource {
    Cli,
    Env,
    Default,
}

/// Worker thread count for the rayon pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadCount {
    pub threads: usize,
    pub source: ThreadSource,
    /// Set when a supplied value was rejected and the default was used instead.
    pub fallback: Option<String>,
}

impl ThreadCount {
    /// Resolve from a CLI value, then the first environment variable in
    /// `env` that is set, then the platform core count. A set but unusable
    /// variable is not skipped; it falls straight back to the default.
    /// Never fails.
    pub fn resolve(cli: Option<usize>, env: &[(&str, Option<&str>)]) -> Self {
        let mut rejected = Vec::new();

        match cli {
            Some(n) if n > 0 => {
                return ThreadCount { threads: n, source: ThreadSource::Cli, fallback: None };
            }
            Some(n) => rejected.push(format!("--threads {n} is not a positive count")),
            None => {}
        }

        match env.iter().find_map(|&(name, value)| value.map(|v| (name, v.trim()))) {
            Some((name, raw)) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => {
                    return ThreadCount {
                        threads: n,
                        source: ThreadSource::Env,
                        fallback: (!rejected.is_empty()).then(|| rejected.join("; ")),
                    };
                }
                _ => rejected.push(format!("{name}={raw:?} is not a positive count")),
            },
            None => {
                let names: Vec<&str> = env.iter().map(|&(name, _)| name).collect();
                rejected.push(format!("{} not set", names.join(" / ")));
            }
        }

        let threads = default_threads();
        debug!("falling back to {threads} threads");
        ThreadCount {
            threads,
            source: ThreadSource::Default,
            fallback: Some(rejected.join("; ")),
        }
    }

    /// Same as [`ThreadCount::resolve`], reading [`THREADS_ENV_VAR`] and then
    /// [`LEGACY_THREADS_ENV_VAR`], and logging any fallback.
    pub fn from_env(cli: Option<usize>) -> Self {
        let primary = std::env::var(THREADS_ENV_VAR).ok();
        let legacy = std::env::var(LEGACY_THREADS_ENV_VAR).ok();
        let resolved = Self::resolve(
            cli,
            &[
                (THREADS_ENV_VAR, primary.as_deref()),
                (LEGACY_THREADS_ENV_VAR, legacy.as_deref()),
            ],
        );
        if let Some(reason) = &resolved.fallback {
            warn!("{reason}; using {} threads", resolved.threads);
        }
        resolved
    }
}

/// Physical core count, never zero.
pub fn default_threads() -> usize {
    num_cpus::get_physical().max(1)
}
