//! Integration step: explicit forward Euler with unit time step.
//!
//! Each airborne grain reads only its own state and the fixed storm constants,
//! so the particle range is split into independent chunks with no
//! communication between them. Landed grains (`z <= 0`) are skipped and stay
//! bit-for-bit unchanged.

use crate::config::{Execution, PARALLEL_CHUNK_LEN, StormParams};
use crate::particles::ParticleStore;
use crate::storm::storm_kick;
use rayon::prelude::*;

/// Mutable views of the six component arrays over the same index range.
type Columns<'a> = (
    &'a mut [f64],
    &'a mut [f64],
    &'a mut [f64],
    &'a mut [f64],
    &'a mut [f64],
    &'a mut [f64],
);

/// Advance every airborne grain by one time step.
pub fn integrate(store: &mut ParticleStore, storm: &StormParams, execution: Execution) {
    match execution {
        Execution::Parallel => integrate_parallel(store, storm),
        Execution::Serial => integrate_serial(store, storm),
    }
}

/// Index-order update on the calling thread.
///
/// Panics if the store's columns differ in length.
pub fn integrate_serial(store: &mut ParticleStore, storm: &StormParams) {
    assert!(store.columns_consistent(), "particle store column lengths differ");
    let ParticleStore { x, y, z, vx, vy, vz } = store;
    advance_columns(
        storm,
        (
            x.as_mut_slice(),
            y.as_mut_slice(),
            z.as_mut_slice(),
            vx.as_mut_slice(),
            vy.as_mut_slice(),
            vz.as_mut_slice(),
        ),
    );
}

/// Chunked update on the rayon pool.
///
/// Panics if the store's columns differ in length.
pub fn integrate_parallel(store: &mut ParticleStore, storm: &StormParams) {
    assert!(store.columns_consistent(), "particle store column lengths differ");
    let ParticleStore { x, y, z, vx, vy, vz } = store;
    (
        x.par_chunks_mut(PARALLEL_CHUNK_LEN),
        y.par_chunks_mut(PARALLEL_CHUNK_LEN),
        z.par_chunks_mut(PARALLEL_CHUNK_LEN),
        vx.par_chunks_mut(PARALLEL_CHUNK_LEN),
        vy.par_chunks_mut(PARALLEL_CHUNK_LEN),
        vz.par_chunks_mut(PARALLEL_CHUNK_LEN),
    )
        .into_par_iter()
        .for_each(|cols| {
            #[cfg(feature = "simd")]
            simd::advance_columns_simd(storm, cols);
            #[cfg(not(feature = "simd"))]
            advance_columns(storm, cols);
        });
}

fn advance_columns(storm: &StormParams, cols: Columns<'_>) {
    let (x, y, z, vx, vy, vz) = cols;
    for i in 0..z.len() {
        if z[i] <= 0.0 {
            continue;
        }
        let kick = storm_kick(storm, x[i], y[i]);
        vx[i] += kick.horizontal;
        vy[i] += kick.horizontal;
        vz[i] += kick.vertical;

        x[i] += vx[i];
        y[i] += vy[i];
        z[i] += vz[i];
    }
}

/// Portable SIMD for updating four grains per batch; the tail goes through the
/// scalar path.
#[cfg(feature = "simd")]
mod simd {
    use super::{Columns, advance_columns};
    use crate::config::{RADIAL_NORMALIZATION, StormParams};
    use std::simd::cmp::SimdPartialOrd;
    use std::simd::num::SimdFloat;
    use std::simd::{Select, StdFloat, f64x4};

    const LANES: usize = 4;

    pub(super) fn advance_columns_simd(storm: &StormParams, cols: Columns<'_>) {
        let (x, y, z, vx, vy, vz) = cols;
        let n = z.len();
        let body = n - n % LANES;

        let zero = f64x4::splat(0.0);
        let eye_x = f64x4::splat(storm.eye.x);
        let eye_y = f64x4::splat(storm.eye.y);
        let norm = f64x4::splat(RADIAL_NORMALIZATION);
        let force = f64x4::splat(storm.storm_force);
        let neg_fall = f64x4::splat(-storm.fall_rate);
        let eps = f64x4::splat(storm.epsilon);

        for start in (0..body).step_by(LANES) {
            let end = start + LANES;
            let zs = f64x4::from_slice(&z[start..end]);
            let airborne = zs.simd_gt(zero);
            if !airborne.any() {
                continue;
            }
            let xs = f64x4::from_slice(&x[start..end]);
            let ys = f64x4::from_slice(&y[start..end]);
            let vxs = f64x4::from_slice(&vx[start..end]);
            let vys = f64x4::from_slice(&vy[start..end]);
            let vzs = f64x4::from_slice(&vz[start..end]);

            let dx = (eye_x - xs).abs();
            let dy = (eye_y - ys).abs();
            let r = (dx * dx + dy * dy).sqrt() / norm;

            let vx_new = vxs + force * r;
            let vy_new = vys + force * r;
            let vz_new = vzs + neg_fall / (r * r + eps);

            airborne.select(xs + vx_new, xs).copy_to_slice(&mut x[start..end]);
            airborne.select(ys + vy_new, ys).copy_to_slice(&mut y[start..end]);
            airborne.select(zs + vz_new, zs).copy_to_slice(&mut z[start..end]);
            airborne.select(vx_new, vxs).copy_to_slice(&mut vx[start..end]);
            airborne.select(vy_new, vys).copy_to_slice(&mut vy[start..end]);
            airborne.select(vz_new, vzs).copy_to_slice(&mut vz[start..end]);
        }

        // leftover
        advance_columns(
            storm,
            (
                &mut x[body..],
                &mut y[body..],
                &mut z[body..],
                &mut vx[body..],
                &mut vy[body..],
                &mut vz[body..],
            ),
        );
    }
}
