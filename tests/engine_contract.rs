//! End-to-end checks of the public engine API: config file round-trips,
//! tier fallback behavior, and the frozen-after-halt contract.

use burnsim_engine::config::SimulationConfig;
use burnsim_engine::simulation::{BurnSimulation, RunState};
use burnsim_engine::timeline::MAX_STEPS;

fn run(config: SimulationConfig) -> BurnSimulation {
    let mut sim = BurnSimulation::new(config);
    sim.run();
    sim
}

#[test]
fn config_survives_a_toml_round_trip() {
    let mut config = SimulationConfig::default();
    config.tiers.inflammation_signal_speed = "Mid".to_string();
    config.energy.allotment_per_step = 500.0;

    // Unique per process so concurrent test invocations do not race.
    let path = std::env::temp_dir().join(format!(
        "burnsim_roundtrip_test_{}.toml",
        std::process::id()
    ));
    std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();
    let loaded = SimulationConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.tiers.inflammation_signal_speed, "Mid");
    assert_eq!(loaded.energy.allotment_per_step, 500.0);

    // The loaded file drives the exact same run as the in-memory original.
    let a = run(config);
    let b = run(loaded);
    assert_eq!(a.timeline(), b.timeline());
}

#[test]
fn unrecognized_tier_names_fall_back_to_documented_magnitudes() {
    let mut odd = SimulationConfig::default();
    odd.tiers.inflammation_signal_speed = "Turbo".to_string();
    odd.tiers.m1_m2_switch_threshold = "Mystery".to_string();
    odd.tiers.pr_cytokine_production_rate = "".to_string();
    odd.tiers.m1_macrophage_activation_rate = "strong".to_string(); // wrong case

    // With default magnitudes, every fallback coincides with
    // Fast / Low / Strong / Strong.
    let baseline = SimulationConfig::default();

    let a = run(odd);
    let b = run(baseline);
    assert_eq!(a.run_state(), b.run_state());
    for t in 0..MAX_STEPS {
        let (ra, rb) = (a.timeline().record(t), b.timeline().record(t));
        assert_eq!(ra.skin_integrity, rb.skin_integrity, "diverged at T{t}");
        assert_eq!(ra.bacteria_total_count, rb.bacteria_total_count);
        assert_eq!(ra.energy_remaining, rb.energy_remaining);
    }
}

#[test]
fn mid_signal_speed_adds_one_step_of_latency() {
    let mut config = SimulationConfig::default();
    config.tiers.inflammation_signal_speed = "Mid".to_string();
    let sim = run(config);
    let tl = sim.timeline();

    assert_eq!(tl[2].pi_arrived, 0.0);
    assert_eq!(tl[3].pi_arrived, tl[1].pi_total_production);
}

#[test]
fn halted_run_exposes_only_computed_snapshots() {
    let mut config = SimulationConfig::default();
    config.energy.allotment_per_step = 0.0;
    let sim = run(config);

    let halt_step = match sim.run_state() {
        RunState::HaltedByDepletion(t) => t,
        other => panic!("expected a depletion halt, got {other:?}"),
    };
    assert_eq!(sim.last_valid_step(), halt_step - 1);

    // The snapshot at the halt step reports the depletion itself; everything
    // past it is untouched initialization state.
    let at_halt = sim.snapshot_at(halt_step);
    assert!(at_halt.energy_depleted);
    assert_eq!(at_halt.energy_remaining, 0.0);
    for t in (halt_step + 1)..MAX_STEPS {
        let later = sim.snapshot_at(t);
        assert!(!later.energy_depleted);
        assert_eq!(later.total_energy, 0.0);
        assert_eq!(later.skin_integrity, 0.0);
    }
}

#[test]
fn snapshots_agree_with_the_timeline() {
    let sim = run(SimulationConfig::default());
    for t in 0..=sim.last_valid_step() {
        let snap = sim.snapshot_at(t);
        let record = sim.timeline().record(t);
        assert_eq!(snap.step as usize, t);
        assert_eq!(snap.skin_integrity, record.skin_integrity);
        assert_eq!(snap.bacteria_total_count, record.bacteria_total_count);
        assert_eq!(snap.pi_in_blood_vessel, record.pi_left_in_blood_vessel);
        assert_eq!(snap.energy_remaining, record.energy_remaining);
    }
}
