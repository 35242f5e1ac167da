use crate::sim_params::SimParams;
use serde::{Deserialize, Serialize};

/// Timeline length: records T0 through T30 inclusive.
pub const MAX_STEPS: usize = 31;
/// Index of the final computable step.
pub const LAST_STEP: usize = 30;

/// Skin graft viability relative to the integrity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraftState {
    Low,
    High,
}

/// Inflammation severity classified from the total PI signal count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InflammationIntensity {
    #[default]
    None,
    Moderate,
    Severe,
}

impl std::fmt::Display for GraftState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraftState::Low => write!(f, "Low"),
            GraftState::High => write!(f, "High"),
        }
    }
}

impl std::fmt::Display for InflammationIntensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InflammationIntensity::None => write!(f, "None"),
            InflammationIntensity::Moderate => write!(f, "Moderate"),
            InflammationIntensity::Severe => write!(f, "Severe"),
        }
    }
}

/// Every quantity computed for one timestep. A record is written exactly
/// once by the step calculator and is read-only afterwards; records past a
/// depletion halt keep these default values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimestepRecord {
    // Skin / tissue
    pub skin_integrity: f64,
    pub skin_graft_state: Option<GraftState>,
    pub base_repair_rate: f64,
    pub bacteria_damage: f64,
    pub pr_boost: f64,
    pub actual_repair_rate: f64,

    // Bacteria
    pub bacteria_inflow: f64,
    pub bacteria_reproduced: f64,
    pub bacteria_removed_by_neutrophils: f64,
    pub bacteria_removed_by_macrophages: f64,
    pub bacteria_net_flow: f64,
    pub bacteria_total_count: f64,

    // Neutrophils
    pub neutrophils_activated: f64,
    pub neutrophils_in_transit: f64,
    pub neutrophils_arrived: f64,
    pub neutrophils_expired: f64,
    pub neutrophils_in_burn_site: f64,
    pub dead_neutrophils_before_eaten: f64,
    pub neutrophils_total_count: f64,
    pub neutrophil_energy: f64,

    // Macrophages
    pub m1_activated: f64,
    pub m1_in_transit: f64,
    pub m1_arrived: f64,
    pub m1_before_transform: f64,
    pub dead_neutrophils_eaten_by_m1: f64,
    pub m1_transformed_to_m2: f64,
    /// M1 population in the burn site after this step's M1 -> M2 switch.
    pub m1_in_burn_site: f64,
    pub remaining_dead_neutrophils_eaten: f64,
    pub m2_in_burn_site: f64,
    pub m1_expired: f64,
    pub m2_expired: f64,
    pub macrophages_total_count: f64,
    pub macrophage_energy: f64,

    // Pro-inflammatory (PI) cytokines
    pub pi_produced_by_burn_site: f64,
    pub pi_produced_by_neutrophils: f64,
    pub pi_produced_by_m1: f64,
    /// Fraction of cell-sourced PI production cancelled by PR, in [0, 1].
    pub pi_inhibition: f64,
    pub pi_total_production: f64,
    pub pi_in_transit: f64,
    pub pi_arrived: f64,
    /// Reservoir content before this step's activation spending.
    pub pi_before_use: f64,
    pub pi_used_for_neutrophil_activation: f64,
    pub pi_used_for_m1_activation: f64,
    /// Cumulative PI ever arrived in the blood vessel.
    pub pi_total_arrived: f64,
    /// Cumulative PI scheduled to have left the reservoir by now.
    pub pi_scheduled_expiry: f64,
    /// Cumulative PI actually consumed or expired so far.
    pub pi_accounted_consumption: f64,
    pub pi_expired: f64,
    pub pi_left_in_blood_vessel: f64,
    pub pi_total_count: f64,

    // Pro-repair (PR) cytokines
    pub pr_produced: f64,
    pub pr_used_for_soothing: f64,
    pub pr_used_for_healing: f64,

    // Inflammation classification
    pub inflammation_intensity: InflammationIntensity,
    /// Configured signal-speed tier while PI mass is in transit, else None.
    pub inflammation_signal_visual: Option<String>,

    // Energy
    pub inflammation_energy: f64,
    pub total_energy: f64,
    pub available_energy: f64,
    pub energy_remaining: f64,
    pub energy_depleted: bool,
}

/// Fixed-length, time-indexed table of per-step records. Allocated once at
/// construction with T0 seeded; the step calculator fills T1..=T30 in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    records: Vec<TimestepRecord>,
}

impl Timeline {
    /// Allocates all records and seeds T0 from the parameter set.
    pub fn new(params: &SimParams) -> Self {
        let mut records = vec![TimestepRecord::default(); MAX_STEPS];

        let t0 = &mut records[0];
        t0.skin_integrity = params.initial_skin_barrier_integrity;
        // All flow and count fields stay at zero. The pool starts with one
        // allotment already available; nothing is charged at T0.
        t0.available_energy = params.energy_allotment_per_step;
        t0.energy_remaining = params.energy_allotment_per_step;
        t0.total_energy = 0.0;
        t0.energy_depleted = false;

        Timeline { records }
    }

    pub fn record(&self, t: usize) -> &TimestepRecord {
        &self.records[t]
    }

    pub(crate) fn record_mut(&mut self, t: usize) -> &mut TimestepRecord {
        &mut self.records[t]
    }

    pub fn records(&self) -> &[TimestepRecord] {
        &self.records
    }

    /// Resolves a delayed lookup: the record index `delay` steps before `t`,
    /// or `None` while the delay has not yet elapsed. Delays are kept as
    /// floats (they come straight from the parameter set); the effective
    /// index is floored like the source spreadsheet formulas.
    pub fn lookback(t: usize, delay: f64) -> Option<usize> {
        if (t as f64) >= delay {
            Some((t as f64 - delay).floor() as usize)
        } else {
            None
        }
    }

    /// Value of `field` at `delay` steps before `t`; 0 while the delay has
    /// not elapsed. No signal or cell arrives before its migration delay.
    pub fn delayed<F>(&self, t: usize, delay: f64, field: F) -> f64
    where
        F: Fn(&TimestepRecord) -> f64,
    {
        match Self::lookback(t, delay) {
            Some(idx) => field(&self.records[idx]),
            None => 0.0,
        }
    }
}

impl std::ops::Index<usize> for Timeline {
    type Output = TimestepRecord;

    fn index(&self, t: usize) -> &TimestepRecord {
        &self.records[t]
    }
}
