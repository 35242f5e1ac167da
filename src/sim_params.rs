use serde::{Deserialize, Serialize};

// Documented default magnitudes behind each tier option. Unrecognized tier
// selections silently resolve to the per-tier default rather than erroring;
// callers rely on that fallback.
pub const DEFAULT_SIGNAL_SPEED_FAST_STEPS: f64 = 1.0;
pub const DEFAULT_SIGNAL_SPEED_MID_STEPS: f64 = 2.0;
pub const DEFAULT_SIGNAL_SPEED_SLOW_STEPS: f64 = 3.0;
pub const DEFAULT_SWITCH_THRESHOLD_LOW: f64 = 10.0;
pub const DEFAULT_SWITCH_THRESHOLD_MEDIUM_LOW: f64 = 20.0;
pub const DEFAULT_SWITCH_THRESHOLD_MEDIUM_HIGH: f64 = 30.0;
pub const DEFAULT_SWITCH_THRESHOLD_HIGH: f64 = 40.0;
pub const DEFAULT_PR_PRODUCTION_STRONG: f64 = 40.0;
pub const DEFAULT_PR_PRODUCTION_WEAK: f64 = 20.0;
pub const DEFAULT_M1_ACTIVATION_STRONG: f64 = 25.0;
pub const DEFAULT_M1_ACTIVATION_WEAK: f64 = 50.0;

/// Simulation parameters derived from the configuration, used frequently during step calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // Tissue
    pub initial_skin_barrier_integrity: f64,
    pub skin_integrity_threshold: f64,
    pub base_repair_high: f64,
    pub base_repair_low: f64,
    pub bacteria_damage_threshold: f64,
    pub bacterial_damage_modifier: f64,
    pub pr_boost_modifier: f64,

    // Bacteria
    pub bacterial_inflow_high: f64, // inflow while integrity is above the threshold
    pub bacterial_inflow_low: f64,  // inflow while integrity is below the threshold
    pub bacteria_reproduction_rate: f64,
    pub bacteria_removal_rate_neutrophils: f64,
    pub bacteria_removal_rate_macrophages: f64,

    // Neutrophils
    pub inactive_neutrophils_per_step: f64,
    pub neutrophil_migration_steps: f64,
    pub neutrophil_expiration_steps: f64,
    pub neutrophil_activation_cost: f64,
    pub neutrophil_energy_cost: f64,

    // Macrophages
    pub inactive_m1_per_step: f64,
    pub m1_migration_steps: f64,
    pub macrophage_expiration_steps: f64,
    pub macrophage_energy_cost: f64,

    // Cytokines
    pub pi_production_burn_site_high: f64,
    pub pi_production_burn_site_low: f64,
    pub pi_production_neutrophils: f64,
    pub pi_production_m1: f64,
    pub pi_expiration_steps: f64,
    pub inflammation_intensity_threshold: f64,
    pub inflammation_energy_cost: f64,

    // Energy pool
    pub energy_allotment_per_step: f64,

    // Categorical tier selections (raw strings; resolved on demand)
    pub inflammation_signal_speed: String,
    pub m1_m2_switch_threshold: String,
    pub pr_cytokine_production_rate: String,
    pub m1_macrophage_activation_rate: String,

    // Magnitudes behind each tier option
    pub signal_speed_fast_steps: f64,
    pub signal_speed_mid_steps: f64,
    pub signal_speed_slow_steps: f64,
    pub switch_threshold_low: f64,
    pub switch_threshold_medium_low: f64,
    pub switch_threshold_medium_high: f64,
    pub switch_threshold_high: f64,
    pub pr_production_strong: f64,
    pub pr_production_weak: f64,
    pub m1_activation_strong: f64,
    pub m1_activation_weak: f64,
}

impl SimParams {
    /// Number of steps a PI signal spends in transit before reaching the blood vessel.
    pub fn pi_migration_steps(&self) -> f64 {
        match self.inflammation_signal_speed.as_str() {
            "Slow" => self.signal_speed_slow_steps,
            "Mid" => self.signal_speed_mid_steps,
            "Fast" => self.signal_speed_fast_steps,
            _ => DEFAULT_SIGNAL_SPEED_FAST_STEPS,
        }
    }

    /// Dead-neutrophil debris an M1 macrophage must consume to switch to M2.
    pub fn m1_m2_switch_threshold_value(&self) -> f64 {
        match self.m1_m2_switch_threshold.as_str() {
            "Low" => self.switch_threshold_low,
            "Medium-Low" => self.switch_threshold_medium_low,
            "Medium-High" => self.switch_threshold_medium_high,
            "High" => self.switch_threshold_high,
            _ => DEFAULT_SWITCH_THRESHOLD_LOW,
        }
    }

    /// PI cost of activating one M1 macrophage.
    pub fn m1_activation_cost(&self) -> f64 {
        match self.m1_macrophage_activation_rate.as_str() {
            "Strong" => self.m1_activation_strong,
            "Weak" => self.m1_activation_weak,
            _ => DEFAULT_M1_ACTIVATION_STRONG,
        }
    }

    /// PR output per active M2 macrophage per step.
    pub fn pr_production_rate(&self) -> f64 {
        match self.pr_cytokine_production_rate.as_str() {
            "Strong" => self.pr_production_strong,
            "Weak" => self.pr_production_weak,
            _ => DEFAULT_PR_PRODUCTION_STRONG,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SimulationConfig;

    #[test]
    fn tiers_resolve_to_configured_magnitudes() {
        let mut config = SimulationConfig::default();
        config.tiers.inflammation_signal_speed = "Slow".to_string();
        config.tiers.m1_m2_switch_threshold = "Medium-High".to_string();
        config.tiers.pr_cytokine_production_rate = "Weak".to_string();
        config.tiers.m1_macrophage_activation_rate = "Weak".to_string();
        let params = config.sim_params();

        assert_eq!(params.pi_migration_steps(), 3.0);
        assert_eq!(params.m1_m2_switch_threshold_value(), 30.0);
        assert_eq!(params.pr_production_rate(), 20.0);
        assert_eq!(params.m1_activation_cost(), 50.0);
    }

    #[test]
    fn unrecognized_tier_falls_back_to_default_magnitude() {
        let mut config = SimulationConfig::default();
        config.tiers.inflammation_signal_speed = "Warp".to_string();
        config.tiers.m1_m2_switch_threshold = "Bogus".to_string();
        config.tiers.pr_cytokine_production_rate = "".to_string();
        config.tiers.m1_macrophage_activation_rate = "strong".to_string(); // case matters
        let params = config.sim_params();

        assert_eq!(params.pi_migration_steps(), 1.0);
        assert_eq!(params.m1_m2_switch_threshold_value(), 10.0);
        assert_eq!(params.pr_production_rate(), 40.0);
        assert_eq!(params.m1_activation_cost(), 25.0);
    }
}
