use pollen_storm::error::{Error, Result};
use pollen_storm::fit::{linear_fit_parallel, linear_fit_serial};
use pollen_storm::{Execution, ParticleStore, SampleWindow, Simulation, SimulationParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn params(n: usize, max_time: usize, window_len: usize, execution: Execution) -> SimulationParams {
    SimulationParams {
        num_particles: n,
        max_time,
        window_len,
        execution,
        ..Default::default()
    }
}

/// 100 grains, 50 steps, fit over the last 10: the census never drops and the
/// trend line is finite.
#[test]
fn end_to_end_small_run() -> Result<()> {
    let mut sim = Simulation::new(params(100, 50, 10, Execution::Parallel))?;
    let mut counts = Vec::new();
    while let Some(p) = sim.step()? {
        counts.push(p.ground_count);
    }
    assert_eq!(counts.len(), 50);
    assert!(counts.windows(2).all(|w| w[0] <= w[1]), "ground count decreased: {counts:?}");
    assert!(counts[49] >= counts[0]);

    let samples = sim.samples();
    assert_eq!(samples.len(), 10);
    assert_eq!(samples.times().first(), Some(&40.0));
    assert_eq!(samples.times().last(), Some(&49.0));

    let fit = linear_fit_parallel(samples);
    assert!(!fit.is_degenerate(), "fit = {fit:?}");
    assert!(!fit.slope.is_nan() && !fit.intercept.is_nan());
    Ok(())
}

#[test]
fn run_summary_matches_stepwise_state() -> Result<()> {
    let mut sim = Simulation::new(params(100, 50, 10, Execution::Parallel))?;
    let mut reported = Vec::new();
    let summary = sim.run(|p| reported.push(p.timestep))?;
    assert_eq!(reported, vec![0, 49]);
    assert_eq!(summary.num_particles, 100);
    assert_eq!(summary.max_time, 50);
    assert_eq!(summary.final_ground_count, sim.ground_count());
    assert_eq!(summary.samples.counts().last().copied(), Some(summary.final_ground_count as f64));
    assert!(summary.timings.total >= summary.timings.fit);
    Ok(())
}

#[test]
fn ground_count_never_decreases() -> Result<()> {
    let mut sim = Simulation::new(params(400, 300, 50, Execution::Parallel))?;
    let mut last = 0;
    while let Some(p) = sim.step()? {
        assert!(p.ground_count >= last, "step {}: {} < {}", p.timestep, p.ground_count, last);
        last = p.ground_count;
    }
    assert!(last > 0);
    Ok(())
}

#[test]
fn parallel_and_serial_agree_on_ground_counts() -> Result<()> {
    let mut par = Simulation::new(params(2500, 200, 20, Execution::Parallel))?;
    let mut ser = Simulation::new(params(2500, 200, 20, Execution::Serial))?;
    loop {
        match (par.step()?, ser.step()?) {
            (Some(a), Some(b)) => {
                assert_eq!(a.timestep, b.timestep);
                assert!(
                    a.ground_count.abs_diff(b.ground_count) <= 1,
                    "step {}: parallel {} vs serial {}",
                    a.timestep,
                    a.ground_count,
                    b.ground_count
                );
            }
            (None, None) => break,
            other => panic!("runs diverged in length: {other:?}"),
        }
    }
    Ok(())
}

#[test]
fn landed_particles_stay_put() -> Result<()> {
    let mut sim = Simulation::new(params(400, 200, 10, Execution::Parallel))?;
    let mut frozen: Vec<Option<[f64; 6]>> = vec![None; 400];
    while sim.step()?.is_some() {
        let store = sim.particles();
        for (i, slot) in frozen.iter_mut().enumerate() {
            if let Some(state) = slot {
                assert_eq!(store.state(i), *state, "particle {i} moved after landing");
            } else if store.is_landed(i) {
                *slot = Some(store.state(i));
            }
        }
    }
    assert!(frozen.iter().any(Option::is_some));
    Ok(())
}

#[test]
fn initial_grid_spans_domain() -> Result<()> {
    let p = params(2500, 10, 5, Execution::Serial);
    let store = ParticleStore::initialize(&p)?;
    let side = 50;
    let sep = 200.0 / side as f64;
    for i in 0..store.len() {
        assert_eq!(store.z[i], 240.0);
        let col = (i % side) as f64;
        let row = (i / side) as f64;
        assert!((store.x[i] - (-100.0 + sep * col)).abs() < 1e-12);
        assert!((store.y[i] - (-100.0 + sep * row)).abs() < 1e-12);
        assert!(store.x[i] >= -100.0 && store.x[i] < 100.0);
        assert!(store.y[i] >= -100.0 && store.y[i] < 100.0);
    }
    Ok(())
}

#[test]
fn smallest_grid_uses_corners() -> Result<()> {
    let sim = Simulation::new(params(4, 10, 5, Execution::Parallel))?;
    let s = sim.particles();
    assert_eq!(s.x, vec![-100.0, 0.0, -100.0, 0.0]);
    assert_eq!(s.y, vec![-100.0, -100.0, 0.0, 0.0]);
    assert_eq!(sim.timestep(), 0);
    Ok(())
}

#[test]
fn non_square_count_is_invalid() {
    match Simulation::new(params(5, 10, 5, Execution::Parallel)) {
        Err(Error::InvalidConfiguration(msg)) => assert!(msg.contains('5')),
        other => panic!("expected InvalidConfiguration, got {other:?}"),
    }
}

#[test]
fn fit_recovers_line_through_window() -> Result<()> {
    let xs: Vec<f64> = (2000..3000).map(f64::from).collect();
    let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 5.0).collect();
    let w = SampleWindow::from_pairs(&xs, &ys)?;
    let fit = linear_fit_serial(&w);
    assert!((fit.slope - 2.0).abs() < 1e-9, "slope {}", fit.slope);
    assert!((fit.intercept - 5.0).abs() < 1e-6, "intercept {}", fit.intercept);
    Ok(())
}

#[test]
fn fit_matches_across_execution_modes_on_random_lines() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..20 {
        let m: f64 = rng.random_range(-50.0..50.0);
        let c: f64 = rng.random_range(-1000.0..1000.0);
        let n: usize = rng.random_range(2..500);
        let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| m * x + c).collect();
        let w = SampleWindow::from_pairs(&xs, &ys)?;

        let ser = linear_fit_serial(&w);
        let par = linear_fit_parallel(&w);
        assert!((ser.slope - m).abs() < 1e-9 * m.abs().max(1.0), "m={m} got {}", ser.slope);
        assert!((ser.intercept - c).abs() < 1e-6 * c.abs().max(1.0), "c={c} got {}", ser.intercept);
        assert!((ser.slope - par.slope).abs() < 1e-9 * m.abs().max(1.0));
        assert!((ser.intercept - par.intercept).abs() < 1e-6 * c.abs().max(1.0));
    }
    Ok(())
}
