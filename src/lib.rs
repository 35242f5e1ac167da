pub mod config;
pub mod sim_params;
pub mod simulation;
pub mod timeline;

// Re-export key types for easier use by dependent crates
pub use config::{
    BacteriaConfig, CytokineConfig, EnergyConfig, MacrophageConfig, NeutrophilConfig,
    OutputConfig, SimulationConfig, TierConfig, TierValuesConfig, TissueConfig,
};
pub use sim_params::SimParams;
pub use simulation::{BurnSimulation, RunState, Snapshot};
pub use timeline::{GraftState, InflammationIntensity, Timeline, TimestepRecord, LAST_STEP, MAX_STEPS};
