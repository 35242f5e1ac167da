use anyhow::Result;
use burnsim_engine::config::SimulationConfig;
use burnsim_engine::simulation::{BurnSimulation, RunState, Snapshot};
use burnsim_engine::timeline::LAST_STEP;
use log::{error, info, warn};
use rand::seq::IndexedRandom;
use std::fs::File;
use std::io::Write;

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting burn-response simulation engine...");

    // --- Load Configuration ---
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let mut config = SimulationConfig::load(&config_path)?;

    // Draw the four tier selections at random when asked to, the way the
    // interactive frontend shuffles them per session.
    if config.tiers.randomize {
        randomize_tiers(&mut config);
        info!(
            "Randomized tiers: speed={} threshold={} pr={} m1={}",
            config.tiers.inflammation_signal_speed,
            config.tiers.m1_m2_switch_threshold,
            config.tiers.pr_cytokine_production_rate,
            config.tiers.m1_macrophage_activation_rate
        );
    }

    // --- Run Simulation ---
    let mut sim = BurnSimulation::new(config);
    sim.run();

    let last_step = sim.last_valid_step();
    let final_snapshot = sim.snapshot_at(last_step);

    let reached_t30 = sim.run_state() == RunState::Completed;
    let skin_healed = final_snapshot.skin_integrity >= 0.99;
    let bacteria_eradicated = final_snapshot.bacteria_total_count <= 0.5;
    let is_win = reached_t30 && skin_healed && bacteria_eradicated;

    match sim.run_state() {
        RunState::Completed => info!("Simulation completed T0..T{LAST_STEP}."),
        RunState::HaltedByDepletion(t) => {
            warn!("Energy depleted at T{t}; last valid step is T{last_step}.")
        }
        RunState::Initialized => unreachable!("run() was invoked"),
    }
    info!(
        "Final state at T{}: skin={:.4} bacteria={:.2} energy={:.0} -> {}",
        last_step,
        final_snapshot.skin_integrity,
        final_snapshot.bacteria_total_count,
        final_snapshot.energy_remaining,
        if is_win { "WIN" } else { "FAIL" }
    );

    // --- Save Recorded Data ---
    if sim.config().output.save_snapshots {
        let snapshots: Vec<Snapshot> = (0..=last_step).map(|t| sim.snapshot_at(t)).collect();
        let output_format = sim.config().output.format.as_deref().unwrap_or("json");
        let base_filename = sim.config().output.base_filename.clone();

        match output_format {
            "json" => save_snapshots_json(&base_filename, &snapshots),
            "bincode" => {
                // Binary format (much more compact)
                let filename = format!("{}_snapshots.bin", base_filename);
                match File::create(&filename) {
                    Ok(file) => match bincode::serialize_into(file, &snapshots) {
                        Ok(_) => info!("Snapshots saved to {} (binary format)", filename),
                        Err(e) => error!("Error serializing snapshots to bincode: {}", e),
                    },
                    Err(e) => error!("Error creating snapshot file '{}': {}", filename, e),
                }
            }
            "messagepack" => {
                // MessagePack format (compact and cross-platform)
                let filename = format!("{}_snapshots.msgpack", base_filename);
                match &mut File::create(&filename) {
                    Ok(file) => match rmp_serde::encode::write(file, &snapshots) {
                        Ok(_) => info!("Snapshots saved to {} (MessagePack format)", filename),
                        Err(e) => error!("Error serializing snapshots to MessagePack: {}", e),
                    },
                    Err(e) => error!("Error creating snapshot file '{}': {}", filename, e),
                }
            }
            _ => {
                error!("Unknown output format: {}. Using JSON instead.", output_format);
                save_snapshots_json(&base_filename, &snapshots);
            }
        }
    } else {
        info!("Skipping snapshot output as per config (save_snapshots is false).");
    }

    // Save the per-step timeline table if requested (separate from snapshots)
    if sim.config().output.save_timeline_csv {
        let filename = format!("{}_timeline.csv", sim.config().output.base_filename);
        match csv::Writer::from_path(&filename) {
            Ok(mut writer) => {
                writer.write_record([
                    "step",
                    "skin_integrity",
                    "graft_state",
                    "bacteria_total",
                    "neutrophils_in_burn_site",
                    "dead_neutrophils",
                    "m1_in_burn_site",
                    "m2_in_burn_site",
                    "pi_in_transit",
                    "pi_in_blood_vessel",
                    "pr_for_healing",
                    "inflammation",
                    "total_energy",
                    "energy_remaining",
                    "depleted",
                ])?;
                for t in 0..=last_step {
                    let r = sim.timeline().record(t);
                    writer.write_record([
                        format!("T{}", t),
                        format!("{:.4}", r.skin_integrity),
                        r.skin_graft_state.map_or(String::new(), |g| g.to_string()),
                        format!("{:.2}", r.bacteria_total_count),
                        format!("{}", r.neutrophils_in_burn_site),
                        format!("{}", r.dead_neutrophils_before_eaten),
                        format!("{}", r.m1_in_burn_site),
                        format!("{}", r.m2_in_burn_site),
                        format!("{}", r.pi_in_transit),
                        format!("{}", r.pi_left_in_blood_vessel),
                        format!("{:.2}", r.pr_used_for_healing),
                        r.inflammation_intensity.to_string(),
                        format!("{:.0}", r.total_energy),
                        format!("{:.0}", r.energy_remaining),
                        if r.energy_depleted { "YES" } else { "NO" }.to_string(),
                    ])?;
                }
                writer.flush()?;
                info!("Timeline saved to {}", filename);
            }
            Err(e) => error!("Error saving CSV file '{}': {}", filename, e),
        }
    }

    info!("Simulation Complete.");
    Ok(())
}

fn save_snapshots_json(base_filename: &str, snapshots: &[Snapshot]) {
    let filename = format!("{}_snapshots.json", base_filename);
    match File::create(&filename) {
        Ok(mut file) => match serde_json::to_string(snapshots) {
            Ok(json_string) => {
                if let Err(e) = file.write_all(json_string.as_bytes()) {
                    error!("Error writing snapshot JSON to file '{}': {}", filename, e);
                } else {
                    info!("Snapshots saved to {}", filename);
                }
            }
            Err(e) => error!("Error serializing snapshots to JSON: {}", e),
        },
        Err(e) => error!("Error creating snapshot file '{}': {}", filename, e),
    }
}

fn randomize_tiers(config: &mut SimulationConfig) {
    let mut rng = rand::rng();
    config.tiers.inflammation_signal_speed =
        pick(&["Fast", "Mid", "Slow"], &mut rng);
    config.tiers.m1_m2_switch_threshold =
        pick(&["Low", "Medium-Low", "Medium-High", "High"], &mut rng);
    config.tiers.pr_cytokine_production_rate = pick(&["Strong", "Weak"], &mut rng);
    config.tiers.m1_macrophage_activation_rate = pick(&["Strong", "Weak"], &mut rng);
}

fn pick(options: &[&str], rng: &mut rand::rngs::ThreadRng) -> String {
    options
        .choose(rng)
        .map(|s| s.to_string())
        .unwrap_or_default()
}
