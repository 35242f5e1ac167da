use anyhow::{Context, Result};
use burnsim_engine::config::SimulationConfig;
use burnsim_engine::simulation::{BurnSimulation, RunState};
use clap::Parser;
use indicatif::ParallelProgressIterator;
use log::info;
use rayon::prelude::*;
use std::path::PathBuf;

const SIGNAL_SPEEDS: [&str; 3] = ["Slow", "Mid", "Fast"];
const SWITCH_THRESHOLDS: [&str; 4] = ["Low", "Medium-Low", "Medium-High", "High"];
const PR_RATES: [&str; 2] = ["Strong", "Weak"];
const M1_RATES: [&str; 2] = ["Strong", "Weak"];

/// Command-line arguments for the tier sweep harness
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional path to a config.toml overriding the fixed parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output CSV file path
    #[arg(short, long, default_value = "sweep_results.csv")]
    output: PathBuf,
}

/// One categorical tier selection out of the 48 possible combinations.
#[derive(Debug, Clone, Copy)]
struct TierCombo {
    test_num: usize,
    signal_speed: &'static str,
    switch_threshold: &'static str,
    pr_rate: &'static str,
    m1_rate: &'static str,
}

/// Outcome of one simulation run under a tier combination.
#[derive(Debug, Clone, PartialEq)]
struct SweepOutcome {
    combo_label: String,
    test_num: usize,
    last_step: usize,
    final_skin: f64,
    final_bacteria: f64,
    final_energy: f64,
    energy_depleted: bool,
    depleted_at: Option<usize>,
    skin_healed: bool,
    bacteria_eradicated: bool,
    is_winner: bool,
    failure_reason: String,
}

fn all_combos() -> Vec<TierCombo> {
    let mut combos = Vec::new();
    let mut test_num = 1;
    for signal_speed in SIGNAL_SPEEDS {
        for switch_threshold in SWITCH_THRESHOLDS {
            for pr_rate in PR_RATES {
                for m1_rate in M1_RATES {
                    combos.push(TierCombo {
                        test_num,
                        signal_speed,
                        switch_threshold,
                        pr_rate,
                        m1_rate,
                    });
                    test_num += 1;
                }
            }
        }
    }
    combos
}

fn run_combo(base: &SimulationConfig, combo: TierCombo) -> SweepOutcome {
    let mut config = base.clone();
    config.tiers.inflammation_signal_speed = combo.signal_speed.to_string();
    config.tiers.m1_m2_switch_threshold = combo.switch_threshold.to_string();
    config.tiers.pr_cytokine_production_rate = combo.pr_rate.to_string();
    config.tiers.m1_macrophage_activation_rate = combo.m1_rate.to_string();

    let mut sim = BurnSimulation::new(config);
    sim.run();

    let (energy_depleted, depleted_at) = match sim.run_state() {
        RunState::HaltedByDepletion(t) => (true, Some(t)),
        _ => (false, None),
    };
    // Report the depletion step itself when the run halted, matching the
    // "stopped at" column of the QA report.
    let last_step = depleted_at.unwrap_or_else(|| sim.last_valid_step());
    let snapshot = sim.snapshot_at(last_step);

    let skin_healed = snapshot.skin_integrity >= 0.99;
    let bacteria_eradicated = snapshot.bacteria_total_count <= 0.5;
    let reached_t30 = !energy_depleted && last_step == 30;
    let is_winner = reached_t30 && skin_healed && bacteria_eradicated;

    let failure_reason = if is_winner {
        String::new()
    } else if let Some(t) = depleted_at {
        format!("Energy depleted at T{t}")
    } else if !skin_healed && !bacteria_eradicated {
        "Skin not healed AND Bacteria not eradicated".to_string()
    } else if !skin_healed {
        "Skin not healed".to_string()
    } else {
        "Bacteria not eradicated".to_string()
    };

    SweepOutcome {
        combo_label: format!(
            "{}/{}/{}/{}",
            combo.signal_speed, combo.switch_threshold, combo.pr_rate, combo.m1_rate
        ),
        test_num: combo.test_num,
        last_step,
        final_skin: snapshot.skin_integrity,
        final_bacteria: snapshot.bacteria_total_count,
        final_energy: snapshot.energy_remaining,
        energy_depleted,
        depleted_at,
        skin_healed,
        bacteria_eradicated,
        is_winner,
        failure_reason,
    }
}

fn write_csv(path: &PathBuf, results: &[SweepOutcome]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating result table '{}'", path.display()))?;
    writer.write_record([
        "Test #",
        "Combination",
        "Stopped At",
        "Final Skin",
        "Final Bacteria",
        "Final Energy",
        "Energy Depleted?",
        "Skin Healed?",
        "Bacteria Eradicated?",
        "Result",
        "Failure Reason",
    ])?;
    for r in results {
        writer.write_record([
            r.test_num.to_string(),
            r.combo_label.clone(),
            format!("T{}", r.last_step),
            format!("{:.4}", r.final_skin),
            format!("{:.2}", r.final_bacteria),
            format!("{:.0}", r.final_energy),
            if r.energy_depleted { "YES" } else { "NO" }.to_string(),
            if r.skin_healed { "YES" } else { "NO" }.to_string(),
            if r.bacteria_eradicated { "YES" } else { "NO" }.to_string(),
            if r.is_winner { "WIN" } else { "FAIL" }.to_string(),
            r.failure_reason.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_summary(results: &[SweepOutcome]) {
    let winners: Vec<_> = results.iter().filter(|r| r.is_winner).collect();
    let depletions = results.iter().filter(|r| r.energy_depleted).count();
    let skin_failures = results
        .iter()
        .filter(|r| !r.is_winner && !r.energy_depleted && !r.skin_healed)
        .count();
    let bacteria_failures = results
        .iter()
        .filter(|r| !r.is_winner && !r.energy_depleted && r.skin_healed && !r.bacteria_eradicated)
        .count();

    println!("{}", "=".repeat(72));
    println!("TIER SWEEP SUMMARY");
    println!("{}", "=".repeat(72));
    println!("Total combinations:   {}", results.len());
    println!(
        "Winning combinations: {} ({:.1}%)",
        winners.len(),
        winners.len() as f64 / results.len() as f64 * 100.0
    );
    println!("Failure breakdown:");
    println!("  - Energy depleted:    {}", depletions);
    println!("  - Skin not healed:    {}", skin_failures);
    println!("  - Bacteria remaining: {}", bacteria_failures);

    if !winners.is_empty() {
        println!();
        println!("Winning combinations:");
        for w in winners {
            println!(
                "  #{:02} {} | skin {:.4} | bacteria {:.2} | energy {:.0}",
                w.test_num, w.combo_label, w.final_skin, w.final_bacteria, w.final_energy
            );
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let base = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };

    let combos = all_combos();
    info!(
        "Sweeping {} tier combinations on {} threads...",
        combos.len(),
        rayon::current_num_threads()
    );

    // Instances share nothing, so the sweep parallelizes freely.
    let results: Vec<SweepOutcome> = combos
        .par_iter()
        .progress_count(combos.len() as u64)
        .map(|&combo| run_combo(&base, combo))
        .collect();

    write_csv(&args.output, &results)?;
    info!("Result table written to {}", args.output.display());

    print_summary(&results);
    Ok(())
}
