use crate::sim_params::{
    SimParams, DEFAULT_M1_ACTIVATION_STRONG, DEFAULT_M1_ACTIVATION_WEAK,
    DEFAULT_PR_PRODUCTION_STRONG, DEFAULT_PR_PRODUCTION_WEAK, DEFAULT_SIGNAL_SPEED_FAST_STEPS,
    DEFAULT_SIGNAL_SPEED_MID_STEPS, DEFAULT_SIGNAL_SPEED_SLOW_STEPS,
    DEFAULT_SWITCH_THRESHOLD_HIGH, DEFAULT_SWITCH_THRESHOLD_LOW,
    DEFAULT_SWITCH_THRESHOLD_MEDIUM_HIGH, DEFAULT_SWITCH_THRESHOLD_MEDIUM_LOW,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Skin barrier and repair parameters
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TissueConfig {
    pub initial_skin_barrier_integrity: f64,
    pub skin_integrity_threshold: f64,
    pub base_repair_high: f64,
    pub base_repair_low: f64,
    pub bacteria_damage_threshold: f64,
    pub bacterial_damage_modifier: f64,
    pub pr_boost_modifier: f64,
}

// Bacterial population parameters
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BacteriaConfig {
    pub inflow_high: f64,
    pub inflow_low: f64,
    pub reproduction_rate: f64,
    pub removal_rate_neutrophils: f64,
    pub removal_rate_macrophages: f64,
}

// Neutrophil lineage parameters
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NeutrophilConfig {
    pub inactive_per_step: f64,
    pub migration_steps: f64,
    pub expiration_steps: f64,
    pub activation_cost: f64,
    pub energy_cost: f64,
}

// Macrophage lineage parameters (expiration is shared between M1 and M2)
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MacrophageConfig {
    pub inactive_m1_per_step: f64,
    pub m1_migration_steps: f64,
    pub expiration_steps: f64,
    pub energy_cost: f64,
}

// Cytokine production and inflammation parameters
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CytokineConfig {
    pub pi_production_burn_site_high: f64,
    pub pi_production_burn_site_low: f64,
    pub pi_production_neutrophils: f64,
    pub pi_production_m1: f64,
    pub pi_expiration_steps: f64,
    pub inflammation_intensity_threshold: f64,
    pub inflammation_energy_cost: f64,
}

// Per-step energy budget
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct EnergyConfig {
    pub allotment_per_step: f64,
}

// Categorical tier selections. Values are free-form strings; an unrecognized
// selection resolves to the tier's documented default magnitude at runtime.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TierConfig {
    pub inflammation_signal_speed: String,
    pub m1_m2_switch_threshold: String,
    pub pr_cytokine_production_rate: String,
    pub m1_macrophage_activation_rate: String,
    /// When set, the engine binary draws the four selections at random
    /// before constructing the simulation. Never consulted by the core.
    #[serde(default)]
    pub randomize: bool,
}

// Numeric magnitudes behind each tier option. The whole section may be
// omitted; defaults match the documented magnitudes.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct TierValuesConfig {
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

impl Default for TierValuesConfig {
    fn default() -> Self {
        TierValuesConfig {
            signal_speed_fast_steps: DEFAULT_SIGNAL_SPEED_FAST_STEPS,
            signal_speed_mid_steps: DEFAULT_SIGNAL_SPEED_MID_STEPS,
            signal_speed_slow_steps: DEFAULT_SIGNAL_SPEED_SLOW_STEPS,
            switch_threshold_low: DEFAULT_SWITCH_THRESHOLD_LOW,
            switch_threshold_medium_low: DEFAULT_SWITCH_THRESHOLD_MEDIUM_LOW,
            switch_threshold_medium_high: DEFAULT_SWITCH_THRESHOLD_MEDIUM_HIGH,
            switch_threshold_high: DEFAULT_SWITCH_THRESHOLD_HIGH,
            pr_production_strong: DEFAULT_PR_PRODUCTION_STRONG,
            pr_production_weak: DEFAULT_PR_PRODUCTION_WEAK,
            m1_activation_strong: DEFAULT_M1_ACTIVATION_STRONG,
            m1_activation_weak: DEFAULT_M1_ACTIVATION_WEAK,
        }
    }
}

// Output settings for the engine binary
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_snapshots: bool,
    pub save_timeline_csv: bool,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: "burnsim".to_string(),
            save_snapshots: true,
            save_timeline_csv: false,
            format: None,
        }
    }
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub tissue: TissueConfig,
    pub bacteria: BacteriaConfig,
    pub neutrophils: NeutrophilConfig,
    pub macrophages: MacrophageConfig,
    pub cytokines: CytokineConfig,
    pub energy: EnergyConfig,
    pub tiers: TierConfig,
    #[serde(default)]
    pub tier_values: TierValuesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for SimulationConfig {
    /// The documented default parameter set for the kitchen-burn scenario.
    fn default() -> Self {
        SimulationConfig {
            tissue: TissueConfig {
                initial_skin_barrier_integrity: 0.75,
                skin_integrity_threshold: 0.85,
                base_repair_high: 0.01,
                base_repair_low: 0.005,
                bacteria_damage_threshold: 150.0,
                bacterial_damage_modifier: 5e-5,
                pr_boost_modifier: 5e-5,
            },
            bacteria: BacteriaConfig {
                inflow_high: 5.0,
                inflow_low: 20.0,
                reproduction_rate: 0.1,
                removal_rate_neutrophils: 2.0,
                removal_rate_macrophages: 3.0,
            },
            neutrophils: NeutrophilConfig {
                inactive_per_step: 5.0,
                migration_steps: 1.0,
                expiration_steps: 3.0,
                activation_cost: 1.0,
                energy_cost: 10.0,
            },
            macrophages: MacrophageConfig {
                inactive_m1_per_step: 1.0,
                m1_migration_steps: 5.0,
                expiration_steps: 15.0,
                energy_cost: 20.0,
            },
            cytokines: CytokineConfig {
                pi_production_burn_site_high: 1.0,
                pi_production_burn_site_low: 3.0,
                pi_production_neutrophils: 3.0,
                pi_production_m1: 5.0,
                pi_expiration_steps: 3.0,
                inflammation_intensity_threshold: 100.0,
                inflammation_energy_cost: 5.0,
            },
            energy: EnergyConfig {
                allotment_per_step: 470.0,
            },
            tiers: TierConfig {
                inflammation_signal_speed: "Fast".to_string(),
                m1_m2_switch_threshold: "Low".to_string(),
                pr_cytokine_production_rate: "Strong".to_string(),
                m1_macrophage_activation_rate: "Strong".to_string(),
                randomize: false,
            },
            tier_values: TierValuesConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    ///
    /// Numeric parameters are deliberately not range-checked: out-of-range
    /// or negative values propagate arithmetically, matching the engine's
    /// documented contract.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config: SimulationConfig = toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML from '{}': {}", path_ref.display(), e))?;

        Ok(config)
    }

    /// Flattens the configuration into the runtime parameter set.
    pub fn sim_params(&self) -> SimParams {
        SimParams {
            initial_skin_barrier_integrity: self.tissue.initial_skin_barrier_integrity,
            skin_integrity_threshold: self.tissue.skin_integrity_threshold,
            base_repair_high: self.tissue.base_repair_high,
            base_repair_low: self.tissue.base_repair_low,
            bacteria_damage_threshold: self.tissue.bacteria_damage_threshold,
            bacterial_damage_modifier: self.tissue.bacterial_damage_modifier,
            pr_boost_modifier: self.tissue.pr_boost_modifier,

            bacterial_inflow_high: self.bacteria.inflow_high,
            bacterial_inflow_low: self.bacteria.inflow_low,
            bacteria_reproduction_rate: self.bacteria.reproduction_rate,
            bacteria_removal_rate_neutrophils: self.bacteria.removal_rate_neutrophils,
            bacteria_removal_rate_macrophages: self.bacteria.removal_rate_macrophages,

            inactive_neutrophils_per_step: self.neutrophils.inactive_per_step,
            neutrophil_migration_steps: self.neutrophils.migration_steps,
            neutrophil_expiration_steps: self.neutrophils.expiration_steps,
            neutrophil_activation_cost: self.neutrophils.activation_cost,
            neutrophil_energy_cost: self.neutrophils.energy_cost,

            inactive_m1_per_step: self.macrophages.inactive_m1_per_step,
            m1_migration_steps: self.macrophages.m1_migration_steps,
            macrophage_expiration_steps: self.macrophages.expiration_steps,
            macrophage_energy_cost: self.macrophages.energy_cost,

            pi_production_burn_site_high: self.cytokines.pi_production_burn_site_high,
            pi_production_burn_site_low: self.cytokines.pi_production_burn_site_low,
            pi_production_neutrophils: self.cytokines.pi_production_neutrophils,
            pi_production_m1: self.cytokines.pi_production_m1,
            pi_expiration_steps: self.cytokines.pi_expiration_steps,
            inflammation_intensity_threshold: self.cytokines.inflammation_intensity_threshold,
            inflammation_energy_cost: self.cytokines.inflammation_energy_cost,

            energy_allotment_per_step: self.energy.allotment_per_step,

            inflammation_signal_speed: self.tiers.inflammation_signal_speed.clone(),
            m1_m2_switch_threshold: self.tiers.m1_m2_switch_threshold.clone(),
            pr_cytokine_production_rate: self.tiers.pr_cytokine_production_rate.clone(),
            m1_macrophage_activation_rate: self.tiers.m1_macrophage_activation_rate.clone(),

            signal_speed_fast_steps: self.tier_values.signal_speed_fast_steps,
            signal_speed_mid_steps: self.tier_values.signal_speed_mid_steps,
            signal_speed_slow_steps: self.tier_values.signal_speed_slow_steps,
            switch_threshold_low: self.tier_values.switch_threshold_low,
            switch_threshold_medium_low: self.tier_values.switch_threshold_medium_low,
            switch_threshold_medium_high: self.tier_values.switch_threshold_medium_high,
            switch_threshold_high: self.tier_values.switch_threshold_high,
            pr_production_strong: self.tier_values.pr_production_strong,
            pr_production_weak: self.tier_values.pr_production_weak,
            m1_activation_strong: self.tier_values.m1_activation_strong,
            m1_activation_weak: self.tier_values.m1_activation_weak,
        }
    }
}
