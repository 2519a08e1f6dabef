//! Particle Store: per-grain position and velocity in a **Structure of Arrays**
//! layout, which keeps each component contiguous for chunked and SIMD updates.

use crate::config::{SimulationParams, grid_side};
use crate::error::Result;
use log::debug;

/// Initial horizontal speed along x for every grain.
pub const INITIAL_VX: f64 = 0.001;
/// Magnitude of the initial y speed; even indices get `+`, odd indices `-`.
pub const INITIAL_VY: f64 = 0.001;
/// Initial vertical speed of every tenth grain (index divisible by 10).
pub const INITIAL_VZ_TENTH: f64 = 1.0;
/// Initial vertical speed of all other grains.
pub const INITIAL_VZ: f64 = 2.0;

/// State of all grains. Index `i` across the six arrays is particle `i`.
///
/// Grains with `z <= 0` have landed; they stay in the arrays and are never
/// updated again.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParticleStore {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Height above ground.
    pub z: Vec<f64>,
    pub vx: Vec<f64>,
    pub vy: Vec<f64>,
    pub vz: Vec<f64>,
}

impl ParticleStore {
    /// Constructs a zeroed store for `n` particles.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            x: vec![0.0; n],
            y: vec![0.0; n],
            z: vec![0.0; n],
            vx: vec![0.0; n],
            vy: vec![0.0; n],
            vz: vec![0.0; n],
        }
    }

    /// Lay out `params.num_particles` grains on a uniform square grid of width
    /// `params.box_width` centred on the origin, all at `params.initial_height`.
    ///
    /// Row and column come from the linear index (`row = i / side`,
    /// `col = i % side`); spacing is `box_width / side`, so the grid covers
    /// `[-w/2, w/2 - spacing]` on both axes. Velocities follow a fixed
    /// parity rule, so two runs with the same parameters are identical.
    ///
    /// Errors:
    /// - `Error::InvalidConfiguration` if the particle count is not a perfect square.
    pub fn initialize(params: &SimulationParams) -> Result<Self> {
        let n = params.num_particles;
        let side = grid_side(n)?;
        let sep = params.box_width / side as f64;
        let half = 0.5 * params.box_width;
        debug!("initialising {n} particles on a {side}x{side} grid (spacing {sep})");

        let mut store = Self::with_capacity(n);
        for i in 0..n {
            let row = i / side;
            let col = i % side;
            store.x[i] = -half + sep * col as f64;
            store.y[i] = -half + sep * row as f64;
            store.z[i] = params.initial_height;
            store.vx[i] = INITIAL_VX;
            store.vy[i] = if i % 2 == 0 { INITIAL_VY } else { -INITIAL_VY };
            store.vz[i] = if i % 10 == 0 { INITIAL_VZ_TENTH } else { INITIAL_VZ };
        }
        Ok(store)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.z.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    /// True when all six columns have the same length.
    pub fn columns_consistent(&self) -> bool {
        let n = self.z.len();
        [&self.x, &self.y, &self.vx, &self.vy, &self.vz]
            .iter()
            .all(|c| c.len() == n)
    }

    /// True once particle `i` has reached or passed the ground plane.
    #[inline]
    pub fn is_landed(&self, i: usize) -> bool {
        self.z[i] <= 0.0
    }

    /// Full state of particle `i` as `[x, y, z, vx, vy, vz]`.
    pub fn state(&self, i: usize) -> [f64; 6] {
        [self.x[i], self.y[i], self.z[i], self.vx[i], self.vy[i], self.vz[i]]
    }
}
