#![cfg_attr(feature = "simd", feature(portable_simd))]

//! Pollen storm: a data-parallel fall simulation of grains under gravity and a
//! radial storm, with a least-squares trend over the ground-arrival curve.

pub mod census;
pub mod config;
pub mod driver;
pub mod error;
pub mod fit;
pub mod integrate;
pub mod particles;
pub mod storm;

pub use config::{Execution, SimulationParams, StormEye, StormParams, ThreadCount, ThreadSource};
pub use driver::{Progress, RunSummary, Simulation, Timings};
pub use error::{Error, Result};
pub use fit::{LinearFit, SampleWindow};
pub use particles::ParticleStore;
