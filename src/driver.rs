//! Simulation driver: owns the particle store and runs the fixed-length loop.
//!
//! Every step is integrate, then census, then (inside the trailing window)
//! record a sample. Steps never overlap; only the work inside a step runs in
//! parallel. The run always goes to `max_time`, even after every grain has
//! landed.

use crate::census::ground_count;
use crate::config::SimulationParams;
use crate::error::Result;
use crate::fit::{LinearFit, SampleWindow, linear_fit};
use crate::integrate::integrate;
use crate::particles::ParticleStore;
use log::{debug, info};
use std::time::{Duration, Instant};

/// Progress report emitted every `progress_interval` steps and on the last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub timestep: usize,
    pub ground_count: usize,
}

/// Wall-clock breakdown of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timings {
    pub initialise: Duration,
    /// Time stepping plus the final fit.
    pub total: Duration,
    pub fit: Duration,
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub num_particles: usize,
    pub max_time: usize,
    pub final_ground_count: usize,
    pub samples: SampleWindow,
    pub fit: LinearFit,
    pub timings: Timings,
}

/// Owns all run state.
#[derive(Debug)]
pub struct Simulation {
    params: SimulationParams,
    particles: ParticleStore,
    samples: SampleWindow,
    /// Next time step to execute.
    timestep: usize,
    ground_count: usize,
    init_time: Duration,
}

impl Simulation {
    /// Validate `params` and lay out the particles.
    ///
    /// Errors:
    /// - `Error::InvalidConfiguration` on any rejected parameter; no particle
    ///   state is created in that case.
    pub fn new(params: SimulationParams) -> Result<Self> {
        let started = Instant::now();
        params.validate()?;
        let particles = ParticleStore::initialize(&params)?;
        let samples = SampleWindow::with_capacity(params.window_len);
        let init_time = started.elapsed();
        info!(
            "initialised {} particles in {:.3?} ({:?} execution)",
            particles.len(),
            init_time,
            params.execution
        );
        Ok(Self {
            params,
            particles,
            samples,
            timestep: 0,
            ground_count: 0,
            init_time,
        })
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn particles(&self) -> &ParticleStore {
        &self.particles
    }

    pub fn samples(&self) -> &SampleWindow {
        &self.samples
    }

    /// Next time step to execute; equals `max_time` once the run is complete.
    pub fn timestep(&self) -> usize {
        self.timestep
    }

    /// Ground count from the most recent census (0 before the first step).
    pub fn ground_count(&self) -> usize {
        self.ground_count
    }

    pub fn is_finished(&self) -> bool {
        self.timestep >= self.params.max_time
    }

    /// Execute one time step. Returns `None` once the run is complete,
    /// otherwise the step just executed and its ground count.
    pub fn step(&mut self) -> Result<Option<Progress>> {
        if self.is_finished() {
            return Ok(None);
        }
        let t = self.timestep;
        let execution = self.params.execution;

        integrate(&mut self.particles, &self.params.storm, execution);
        self.ground_count = ground_count(&self.particles, execution);

        if t >= self.params.window_start() {
            self.samples.record(t, self.ground_count)?;
        }
        self.timestep += 1;
        Ok(Some(Progress { timestep: t, ground_count: self.ground_count }))
    }

    /// True when `timestep` should be reported to the operator.
    pub fn is_progress_step(&self, timestep: usize) -> bool {
        timestep % self.params.progress_interval == 0 || timestep + 1 == self.params.max_time
    }

    /// Run the remaining steps, then fit the sample window.
    ///
    /// `on_progress` is called on every reporting step.
    pub fn run<F>(&mut self, mut on_progress: F) -> Result<RunSummary>
    where
        F: FnMut(Progress),
    {
        let started = Instant::now();
        while let Some(progress) = self.step()? {
            if self.is_progress_step(progress.timestep) {
                debug!("step {} done", progress.timestep);
                on_progress(progress);
            }
        }

        let fit_started = Instant::now();
        let fit = linear_fit(&self.samples, self.params.execution);
        let fit_time = fit_started.elapsed();
        let total = started.elapsed();
        info!(
            "{} steps finished in {:.3?}, fit over {} samples in {:.3?}",
            self.params.max_time,
            total,
            self.samples.len(),
            fit_time
        );

        Ok(RunSummary {
            num_particles: self.particles.len(),
            max_time: self.params.max_time,
            final_ground_count: self.ground_count,
            samples: self.samples.clone(),
            fit,
            timings: Timings { initialise: self.init_time, total, fit: fit_time },
        })
    }
}
