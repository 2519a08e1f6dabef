//! Sample window and least-squares trend line.
//!
//! The fit uses the closed-form normal equations over the window means:
//!
//! ```text
//! m = (E[xy] - E[x]E[y]) / (E[x^2] - E[x]^2)
//! c = (E[x^2]E[y] - E[xy]E[x]) / (E[x^2] - E[x]^2)
//! ```
//!
//! If every x in the window is the same, the denominator is zero and the
//! result is non-finite (NaN or infinity). That is reported as-is rather than
//! patched over; see [`LinearFit::is_degenerate`].
//!
//! The parallel reduction combines per-task partial sums in an unspecified
//! order, so its result can differ from the serial one in the last few bits.

use crate::config::Execution;
use crate::error::{Error, Result};
use rayon::prelude::*;
use std::fmt;
use std::ops::Add;

// ===================================================================================
// Sample Window
// ===================================================================================

/// Fixed-capacity, append-only sequence of `(time, ground count)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleWindow {
    times: Vec<f64>,
    counts: Vec<f64>,
    capacity: usize,
}

impl SampleWindow {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            times: Vec::with_capacity(capacity),
            counts: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a full window from parallel slices (mainly for tests and benches).
    pub fn from_pairs(times: &[f64], counts: &[f64]) -> Result<Self> {
        if times.len() != counts.len() {
            return Err(Error::InvalidConfiguration(format!(
                "sample slices differ in length ({} vs {})",
                times.len(),
                counts.len()
            )));
        }
        Ok(Self {
            times: times.to_vec(),
            counts: counts.to_vec(),
            capacity: times.len(),
        })
    }

    /// Append a sample at the next free slot.
    ///
    /// Errors:
    /// - `Error::SampleWindowFull` once `capacity` samples are stored.
    pub fn record(&mut self, time: usize, ground_count: usize) -> Result<()> {
        if self.is_full() {
            return Err(Error::SampleWindowFull { capacity: self.capacity });
        }
        self.times.push(time as f64);
        self.counts.push(ground_count as f64);
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.times.len() >= self.capacity
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }
}

// ===================================================================================
// Linear Fit
// ===================================================================================

/// Running sums for the normal equations.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sums {
    pub xy: f64,
    pub x: f64,
    pub y: f64,
    pub x2: f64,
}

impl Sums {
    #[inline]
    fn with_point(self, x: f64, y: f64) -> Self {
        Sums {
            xy: self.xy + x * y,
            x: self.x + x,
            y: self.y + y,
            x2: self.x2 + x * x,
        }
    }
}

impl Add for Sums {
    type Output = Sums;

    fn add(self, rhs: Sums) -> Sums {
        Sums {
            xy: self.xy + rhs.xy,
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            x2: self.x2 + rhs.x2,
        }
    }
}

/// Slope and intercept of `y = m x + c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// True when the window had no spread in x and the fit is non-finite.
    pub fn is_degenerate(&self) -> bool {
        !(self.slope.is_finite() && self.intercept.is_finite())
    }

    fn from_sums(sums: Sums, n: usize) -> Self {
        let n = n as f64;
        let mean_xy = sums.xy / n;
        let mean_x = sums.x / n;
        let mean_y = sums.y / n;
        let mean_x2 = sums.x2 / n;
        let denom = mean_x2 - mean_x * mean_x;
        LinearFit {
            slope: (mean_xy - mean_x * mean_y) / denom,
            intercept: (mean_x2 * mean_y - mean_xy * mean_x) / denom,
        }
    }
}

impl fmt::Display for LinearFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "y = {:.6} x + {:.6}", self.slope, self.intercept)
    }
}

pub fn linear_fit(window: &SampleWindow, execution: Execution) -> LinearFit {
    match execution {
        Execution::Parallel => linear_fit_parallel(window),
        Execution::Serial => linear_fit_serial(window),
    }
}

pub fn linear_fit_serial(window: &SampleWindow) -> LinearFit {
    let sums = window
        .times
        .iter()
        .zip(&window.counts)
        .fold(Sums::default(), |acc, (&x, &y)| acc.with_point(x, y));
    LinearFit::from_sums(sums, window.len())
}

/// Per-task partial sums merged with `Sums + Sums`.
pub fn linear_fit_parallel(window: &SampleWindow) -> LinearFit {
    let sums = window
        .times
        .par_iter()
        .zip(window.counts.par_iter())
        .fold(Sums::default, |acc, (&x, &y)| acc.with_point(x, y))
        .reduce(Sums::default, |a, b| a + b);
    LinearFit::from_sums(sums, window.len())
}
