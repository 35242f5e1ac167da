use crate::config::SimulationConfig;
use crate::sim_params::SimParams;
use crate::timeline::{
    GraftState, InflammationIntensity, Timeline, TimestepRecord, LAST_STEP,
};
use log::debug;
use serde::{Deserialize, Serialize};

/// The consumer-facing subset of one timestep record, returned by
/// [`BurnSimulation::snapshot_at`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub step: u32,
    pub skin_integrity: f64,
    pub bacteria_total_count: f64,
    pub total_energy: f64,
    pub neutrophils_in_burn_site: f64,
    pub dead_neutrophils_before_eaten: f64,
    pub m1_in_burn_site: f64,
    pub m2_in_burn_site: f64,
    pub pi_in_blood_vessel: f64,
    pub pr_in_burn_site: f64,
    pub inflammation_intensity: InflammationIntensity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflammation_signal_speed: Option<String>,
    pub available_energy: f64,
    pub energy_remaining: f64,
    pub energy_depleted: bool,
}

/// Progress of one simulation instance through its single-shot lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// T0 is seeded; no step has been computed yet.
    Initialized,
    /// All 30 steps computed without depleting the energy pool.
    Completed,
    /// The energy pool ran dry at the contained step; no later step was
    /// computed.
    HaltedByDepletion(usize),
}

/// One burn-injury response timeline: immutable parameters plus the
/// time-indexed record table filled in by `run()`.
///
/// Fully deterministic and single-threaded; independent instances may be
/// computed in parallel by the caller since nothing is shared.
pub struct BurnSimulation {
    config: SimulationConfig,
    params: SimParams,
    timeline: Timeline,
    run_state: RunState,
}

impl BurnSimulation {
    /// Creates a new instance, resolving parameters and seeding T0.
    pub fn new(config: SimulationConfig) -> Self {
        let params = config.sim_params();
        let timeline = Timeline::new(&params);
        Self {
            config,
            params,
            timeline,
            run_state: RunState::Initialized,
        }
    }

    /// Computes steps 1..=30 in order, stopping permanently at the first
    /// step whose energy cost exceeds the available pool. Single-shot: a
    /// second call on the same instance is a no-op.
    pub fn run(&mut self) {
        if self.run_state != RunState::Initialized {
            return;
        }
        for t in 1..=LAST_STEP {
            self.calculate_step(t);
            if self.timeline[t].energy_depleted {
                debug!("energy depleted at T{t}; halting");
                self.run_state = RunState::HaltedByDepletion(t);
                return;
            }
        }
        self.run_state = RunState::Completed;
    }

    /// Computes every field of record `t` from the records before it. The
    /// stage order matters: several later stages consume values computed
    /// earlier in the same step.
    fn calculate_step(&mut self, t: usize) {
        let p = &self.params;
        let tl = &self.timeline;
        let prev = tl.record(t - 1);

        // 1-2. Repair-rate and bacterial-inflow selection from the prior
        // integrity band. A fully healed barrier repairs nothing and admits
        // nothing.
        let (base_repair_rate, bacteria_inflow, pi_produced_by_burn_site) =
            if prev.skin_integrity < p.skin_integrity_threshold {
                (
                    p.base_repair_low,
                    p.bacterial_inflow_low,
                    p.pi_production_burn_site_low,
                )
            } else if prev.skin_integrity < 1.0 {
                (
                    p.base_repair_high,
                    p.bacterial_inflow_high,
                    p.pi_production_burn_site_high,
                )
            } else {
                (0.0, 0.0, 0.0)
            };

        // 3. Bacterial reproduction on the prior population.
        let bacteria_reproduced =
            (p.bacteria_reproduction_rate * prev.bacteria_total_count).floor();

        // 5. PI signal arrival: production from `migration delay` steps ago
        // reaches the blood vessel now.
        let pi_migration_delay = p.pi_migration_steps();
        let pi_arrived = tl.delayed(t, pi_migration_delay, |r| r.pi_total_production);

        // 6. Reservoir content before activation spending.
        let pi_before_use = prev.pi_left_in_blood_vessel + pi_arrived;

        // 7. Two-stage consumption, neutrophils first. Each stage activates
        // whole cells only and is capped by the per-step inactive pool.
        let neutrophils_activated = (pi_before_use / p.neutrophil_activation_cost)
            .floor()
            .min(p.inactive_neutrophils_per_step);
        let pi_used_for_neutrophil_activation =
            neutrophils_activated * p.neutrophil_activation_cost;

        let pi_remaining = pi_before_use - pi_used_for_neutrophil_activation;
        let m1_activation_cost = p.m1_activation_cost();
        let m1_activated = (pi_remaining / m1_activation_cost)
            .floor()
            .min(p.inactive_m1_per_step);
        let pi_used_for_m1_activation = m1_activated * m1_activation_cost;

        // 8. Cell migration and expiration via lagged pass-through queues.
        // Delays are unvalidated; a zero delay lands the lookback on the
        // current step, whose record is not written yet, so those arms read
        // the value computed earlier in this step instead.
        let neutrophils_arrived = match Timeline::lookback(t, p.neutrophil_migration_steps) {
            Some(idx) if idx == t => neutrophils_activated,
            Some(idx) => tl.record(idx).neutrophils_activated,
            None => 0.0,
        };
        let neutrophils_expired = match Timeline::lookback(t, p.neutrophil_expiration_steps) {
            Some(idx) if idx == t => neutrophils_arrived,
            Some(idx) => tl.record(idx).neutrophils_arrived,
            None => 0.0,
        };

        let neutrophils_in_transit =
            prev.neutrophils_in_transit + neutrophils_activated - neutrophils_arrived;
        let neutrophils_in_burn_site =
            prev.neutrophils_in_burn_site + neutrophils_arrived - neutrophils_expired;
        let neutrophils_total_count =
            prev.neutrophils_total_count + neutrophils_activated - neutrophils_expired;

        let m1_arrived = match Timeline::lookback(t, p.m1_migration_steps) {
            Some(idx) if idx == t => m1_activated,
            Some(idx) => tl.record(idx).m1_activated,
            None => 0.0,
        };
        // M1 expiry is settled against the pool with a one-step lag.
        let m1_before_transform = prev.m1_in_burn_site - prev.m1_expired + m1_arrived;

        // M2 expiry first: transform events one expiration window ago. The
        // cohort that was activated a full migration+expiration window ago
        // is scheduled to expire now; whatever part of it is not expiring as
        // M2 expires as M1.
        let m2_expired =
            tl.delayed(t, p.macrophage_expiration_steps, |r| r.m1_transformed_to_m2);
        let m1_total_delay = p.m1_migration_steps + p.macrophage_expiration_steps;
        let m1_expired = match Timeline::lookback(t, m1_total_delay) {
            Some(idx) if idx == t => m1_activated - m2_expired,
            Some(idx) => tl.record(idx).m1_activated - m2_expired,
            None => 0.0,
        };

        // 9. Phenotype switch, bounded by the M1 pool and by how many whole
        // threshold units of debris are available.
        let threshold_value = p.m1_m2_switch_threshold_value();
        let max_transformation =
            (prev.dead_neutrophils_before_eaten / threshold_value).floor();
        let m1_transformed_to_m2 = m1_before_transform.min(max_transformation);
        let dead_neutrophils_eaten_by_m1 = m1_transformed_to_m2 * threshold_value;
        let m1_in_burn_site = m1_before_transform - m1_transformed_to_m2;

        // 10. Cleanup-on-stagnation: surviving M1 clear residual sub-threshold
        // debris when no fresh expirations are due at the next step.
        let remaining_dead_neutrophils_eaten = if t < LAST_STEP {
            let next_expiration = match Timeline::lookback(t + 1, p.neutrophil_expiration_steps)
            {
                Some(idx) if idx < t => tl.record(idx).neutrophils_arrived,
                Some(idx) if idx == t => neutrophils_arrived,
                _ => 0.0,
            };
            if m1_in_burn_site > 0.0
                && next_expiration == 0.0
                && prev.dead_neutrophils_before_eaten < threshold_value
            {
                prev.dead_neutrophils_before_eaten
            } else {
                0.0
            }
        } else {
            0.0
        };

        let dead_neutrophils_before_eaten = (prev.dead_neutrophils_before_eaten
            + neutrophils_expired
            - dead_neutrophils_eaten_by_m1
            - remaining_dead_neutrophils_eaten)
            .max(0.0);

        let m2_in_burn_site = prev.m2_in_burn_site + m1_transformed_to_m2 - m2_expired;
        let macrophages_total_count = m1_in_burn_site + m2_in_burn_site;
        let m1_in_transit = prev.m1_in_transit + m1_activated - m1_arrived;

        // 11. Bacteria removal by the cells present this step.
        let bacteria_removed_by_neutrophils =
            p.bacteria_removal_rate_neutrophils * neutrophils_in_burn_site;
        let bacteria_removed_by_macrophages =
            p.bacteria_removal_rate_macrophages * m1_in_burn_site;
        let bacteria_net_flow = bacteria_inflow + bacteria_reproduced
            - bacteria_removed_by_neutrophils
            - bacteria_removed_by_macrophages;
        let bacteria_total_count =
            (prev.bacteria_total_count + bacteria_net_flow).max(0.0);

        // 12. Damage kicks in only above the threshold population.
        let bacteria_damage = if bacteria_total_count > p.bacteria_damage_threshold {
            p.bacterial_damage_modifier
                * (bacteria_total_count - p.bacteria_damage_threshold)
        } else {
            0.0
        };

        // 13. Cell-sourced cytokine production.
        let pi_produced_by_neutrophils =
            p.pi_production_neutrophils * neutrophils_in_burn_site;
        let pi_produced_by_m1 = p.pi_production_m1 * m1_in_burn_site;
        let pr_produced = p.pr_production_rate() * m2_in_burn_site;

        // 14. Cytokine arbitration: PR soothes cell-sourced PI one-for-one,
        // the rest accelerates healing. Inhibition scales total transported
        // PI production.
        let cell_pi_production = pi_produced_by_neutrophils + pi_produced_by_m1;
        let pr_used_for_soothing = pr_produced.min(cell_pi_production);
        let pr_used_for_healing = pr_produced - pr_used_for_soothing;
        let pi_inhibition = if cell_pi_production == 0.0 {
            0.0
        } else {
            pr_used_for_soothing / cell_pi_production
        };
        let pi_total_production = ((pi_produced_by_burn_site
            + pi_produced_by_neutrophils
            + pi_produced_by_m1)
            * (1.0 - pi_inhibition))
            .floor();
        let pi_in_transit = prev.pi_in_transit + pi_total_production - pi_arrived;

        // 15a. Repair finalization. The boost is capped so integrity cannot
        // overshoot 1.0.
        let max_repair_needed =
            (1.0 - prev.skin_integrity - base_repair_rate + bacteria_damage).max(0.0);
        let pr_boost = (p.pr_boost_modifier * pr_used_for_healing).min(max_repair_needed);
        let actual_repair_rate = base_repair_rate - bacteria_damage + pr_boost;
        let skin_integrity = (prev.skin_integrity + actual_repair_rate).min(1.0);
        let skin_graft_state = if skin_integrity >= p.skin_integrity_threshold {
            Some(GraftState::High)
        } else {
            Some(GraftState::Low)
        };

        // 15b. PI expiration via cumulative ledgers: signal scheduled to be
        // gone one expiration window after arrival, minus whatever activation
        // spending already accounted for it.
        let pi_total_arrived = prev.pi_total_arrived + pi_arrived;
        let pi_scheduled_expiry =
            tl.delayed(t, p.pi_expiration_steps, |r| r.pi_total_arrived);
        let pi_accounted_consumption = prev.pi_accounted_consumption
            + prev.pi_expired
            + pi_used_for_neutrophil_activation
            + pi_used_for_m1_activation;
        let pi_expired = if pi_scheduled_expiry > pi_accounted_consumption {
            pi_scheduled_expiry - pi_accounted_consumption
        } else {
            0.0
        };
        let pi_left_in_blood_vessel = prev.pi_left_in_blood_vessel + pi_arrived
            - pi_used_for_neutrophil_activation
            - pi_used_for_m1_activation
            - pi_expired;
        let pi_total_count = pi_in_transit + pi_left_in_blood_vessel;

        // 15c. Inflammation classification and the visible signal tier.
        let inflammation_intensity = if pi_total_count <= 0.0 {
            InflammationIntensity::None
        } else if pi_total_count < p.inflammation_intensity_threshold {
            InflammationIntensity::Moderate
        } else {
            InflammationIntensity::Severe
        };
        let inflammation_signal_visual = if pi_in_transit > 0.0 {
            Some(p.inflammation_signal_speed.clone())
        } else {
            None
        };

        // 15d. Per-step upkeep costs.
        let neutrophil_energy = p.neutrophil_energy_cost * neutrophils_total_count;
        let macrophage_energy = p.macrophage_energy_cost * macrophages_total_count;
        let inflammation_energy = p.inflammation_energy_cost * pi_total_count;
        let total_energy = neutrophil_energy + macrophage_energy + inflammation_energy;

        // 16. Energy pool settlement. The allotment tops the pool up for
        // steps 1..=29 only; step 30 runs on leftovers. Preserved exactly as
        // documented.
        let available_energy = if (1..=29).contains(&t) {
            prev.energy_remaining + p.energy_allotment_per_step
        } else {
            prev.energy_remaining
        };
        let (energy_depleted, energy_remaining) = if total_energy > available_energy {
            (true, 0.0)
        } else {
            (false, available_energy - total_energy)
        };

        *self.timeline.record_mut(t) = TimestepRecord {
            skin_integrity,
            skin_graft_state,
            base_repair_rate,
            bacteria_damage,
            pr_boost,
            actual_repair_rate,

            bacteria_inflow,
            bacteria_reproduced,
            bacteria_removed_by_neutrophils,
            bacteria_removed_by_macrophages,
            bacteria_net_flow,
            bacteria_total_count,

            neutrophils_activated,
            neutrophils_in_transit,
            neutrophils_arrived,
            neutrophils_expired,
            neutrophils_in_burn_site,
            dead_neutrophils_before_eaten,
            neutrophils_total_count,
            neutrophil_energy,

            m1_activated,
            m1_in_transit,
            m1_arrived,
            m1_before_transform,
            dead_neutrophils_eaten_by_m1,
            m1_transformed_to_m2,
            m1_in_burn_site,
            remaining_dead_neutrophils_eaten,
            m2_in_burn_site,
            m1_expired,
            m2_expired,
            macrophages_total_count,
            macrophage_energy,

            pi_produced_by_burn_site,
            pi_produced_by_neutrophils,
            pi_produced_by_m1,
            pi_inhibition,
            pi_total_production,
            pi_in_transit,
            pi_arrived,
            pi_before_use,
            pi_used_for_neutrophil_activation,
            pi_used_for_m1_activation,
            pi_total_arrived,
            pi_scheduled_expiry,
            pi_accounted_consumption,
            pi_expired,
            pi_left_in_blood_vessel,
            pi_total_count,

            pr_produced,
            pr_used_for_soothing,
            pr_used_for_healing,

            inflammation_intensity,
            inflammation_signal_visual,

            inflammation_energy,
            total_energy,
            available_energy,
            energy_remaining,
            energy_depleted,
        };
    }

    /// Read-only view of the consumer-facing fields of record `t`.
    /// `t` is assumed in range (0..=30); an out-of-range index panics.
    pub fn snapshot_at(&self, t: usize) -> Snapshot {
        let r = self.timeline.record(t);
        Snapshot {
            step: t as u32,
            skin_integrity: r.skin_integrity,
            bacteria_total_count: r.bacteria_total_count,
            total_energy: r.total_energy,
            neutrophils_in_burn_site: r.neutrophils_in_burn_site,
            dead_neutrophils_before_eaten: r.dead_neutrophils_before_eaten,
            m1_in_burn_site: r.m1_in_burn_site,
            m2_in_burn_site: r.m2_in_burn_site,
            pi_in_blood_vessel: r.pi_left_in_blood_vessel,
            pr_in_burn_site: r.pr_used_for_healing,
            inflammation_intensity: r.inflammation_intensity,
            inflammation_signal_speed: r.inflammation_signal_visual.clone(),
            available_energy: r.available_energy,
            energy_remaining: r.energy_remaining,
            energy_depleted: r.energy_depleted,
        }
    }

    /// The last step that holds valid (computed, non-depleted) values: 30
    /// after a full run, the step just before the halt otherwise.
    pub fn last_valid_step(&self) -> usize {
        match self.run_state {
            RunState::Initialized => 0,
            RunState::Completed => LAST_STEP,
            RunState::HaltedByDepletion(t) => t - 1,
        }
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::MAX_STEPS;

    fn default_sim() -> BurnSimulation {
        BurnSimulation::new(SimulationConfig::default())
    }

    #[test]
    fn first_step_trace_with_default_parameters() {
        let mut sim = default_sim();
        sim.run();
        let r = &sim.timeline()[1];

        // T0 integrity 0.75 < 0.85: low-integrity branch everywhere.
        assert_eq!(r.base_repair_rate, 0.005);
        assert_eq!(r.bacteria_inflow, 20.0);
        assert_eq!(r.pi_produced_by_burn_site, 3.0);

        // Fast signal looks back 1 step into T0's zero production, so
        // nothing can be activated yet.
        assert_eq!(r.pi_arrived, 0.0);
        assert_eq!(r.neutrophils_activated, 0.0);
        assert_eq!(r.m1_activated, 0.0);

        assert_eq!(r.bacteria_total_count, 20.0);
        assert_eq!(r.bacteria_damage, 0.0);
        assert_eq!(r.pr_boost, 0.0);
        assert_eq!(r.actual_repair_rate, 0.005);
        assert_eq!(r.skin_integrity, 0.755);
        assert_eq!(r.skin_graft_state, Some(GraftState::Low));

        // Burn-site PI is now in transit: 3 units, moderate inflammation.
        assert_eq!(r.pi_total_production, 3.0);
        assert_eq!(r.pi_in_transit, 3.0);
        assert_eq!(r.pi_left_in_blood_vessel, 0.0);
        assert_eq!(r.pi_total_count, 3.0);
        assert_eq!(r.inflammation_intensity, InflammationIntensity::Moderate);
        assert_eq!(r.inflammation_signal_visual.as_deref(), Some("Fast"));

        // Only inflammation upkeep is charged: 5 * 3 = 15 out of 470 + 470.
        assert_eq!(r.total_energy, 15.0);
        assert_eq!(r.available_energy, 940.0);
        assert_eq!(r.energy_remaining, 925.0);
        assert!(!r.energy_depleted);
    }

    #[test]
    fn second_step_activates_neutrophils_from_arrived_signal() {
        let mut sim = default_sim();
        sim.run();
        let r = &sim.timeline()[2];

        // T1's 3 units of PI production arrive after the 1-step delay and
        // fund 3 neutrophil activations at unit cost; nothing is left for
        // the 25-cost M1 activation.
        assert_eq!(r.pi_arrived, 3.0);
        assert_eq!(r.pi_before_use, 3.0);
        assert_eq!(r.neutrophils_activated, 3.0);
        assert_eq!(r.pi_used_for_neutrophil_activation, 3.0);
        assert_eq!(r.m1_activated, 0.0);

        // Activated cells are still in transit; none has arrived.
        assert_eq!(r.neutrophils_arrived, 0.0);
        assert_eq!(r.neutrophils_in_transit, 3.0);
        assert_eq!(r.neutrophils_in_burn_site, 0.0);
        assert_eq!(r.neutrophils_total_count, 3.0);

        assert_eq!(r.bacteria_reproduced, 2.0); // floor(0.1 * 20)
        assert_eq!(r.bacteria_total_count, 42.0);
        assert_eq!(r.skin_integrity, 0.76);

        assert_eq!(r.pi_total_production, 3.0);
        assert_eq!(r.pi_in_transit, 3.0);
        assert_eq!(r.pi_left_in_blood_vessel, 0.0);

        // Upkeep: 3 neutrophils (30) + 3 PI (15).
        assert_eq!(r.total_energy, 45.0);
        assert_eq!(r.energy_remaining, 1350.0);
    }

    #[test]
    fn slow_signal_delays_all_activation() {
        let mut config = SimulationConfig::default();
        config.tiers.inflammation_signal_speed = "Slow".to_string();
        let mut sim = BurnSimulation::new(config);
        sim.run();
        let tl = sim.timeline();

        // A 3-step delay means the first nonzero arrival is T1's production
        // surfacing at T4.
        for t in 1..=3 {
            assert_eq!(tl[t].pi_arrived, 0.0, "pi arrived early at T{t}");
            assert_eq!(tl[t].neutrophils_activated, 0.0);
            assert_eq!(tl[t].m1_activated, 0.0);
        }
        assert_eq!(tl[4].pi_arrived, 3.0);
        assert_eq!(tl[4].neutrophils_activated, 3.0);
    }

    #[test]
    fn zero_migration_delay_means_same_step_arrival() {
        let mut config = SimulationConfig::default();
        config.neutrophils.migration_steps = 0.0;
        let mut sim = BurnSimulation::new(config);
        sim.run();
        let tl = sim.timeline();

        // T2 activates 3 neutrophils from T1's arrived signal; with no
        // migration delay they reach the burn site the same step instead of
        // piling up in transit.
        assert_eq!(tl[2].neutrophils_activated, 3.0);
        assert_eq!(tl[2].neutrophils_arrived, 3.0);
        assert_eq!(tl[2].neutrophils_in_transit, 0.0);
        assert_eq!(tl[2].neutrophils_in_burn_site, 3.0);

        // The expiration queue keys off arrivals, so the cohort expires a
        // full expiration window after the same-step arrival.
        assert_eq!(tl[4].neutrophils_expired, 0.0);
        assert_eq!(tl[5].neutrophils_expired, 3.0);
    }

    #[test]
    fn zero_allotment_depletes_at_first_charged_step() {
        let mut config = SimulationConfig::default();
        config.energy.allotment_per_step = 0.0;
        let mut sim = BurnSimulation::new(config);
        sim.run();

        // T1 charges inflammation upkeep for the in-transit signal against
        // an empty pool.
        let r1 = &sim.timeline()[1];
        assert!(r1.total_energy > 0.0);
        assert!(r1.energy_depleted);
        assert_eq!(r1.energy_remaining, 0.0);

        assert_eq!(sim.run_state(), RunState::HaltedByDepletion(1));
        assert_eq!(sim.last_valid_step(), 0);

        // Halt-freeze: every later record keeps its initialization defaults.
        for t in 2..MAX_STEPS {
            assert_eq!(*sim.timeline().record(t), TimestepRecord::default());
        }
    }

    #[test]
    fn identical_configurations_produce_identical_timelines() {
        let mut a = default_sim();
        let mut b = default_sim();
        a.run();
        b.run();

        assert_eq!(a.timeline(), b.timeline());
        // Byte-for-byte when serialized, too.
        let ja = serde_json::to_string(a.timeline()).unwrap();
        let jb = serde_json::to_string(b.timeline()).unwrap();
        assert_eq!(ja, jb);
    }

    #[test]
    fn snapshots_are_pure_reads() {
        let mut sim = default_sim();
        sim.run();
        let before = serde_json::to_string(sim.timeline()).unwrap();

        let first = sim.snapshot_at(5);
        let second = sim.snapshot_at(5);
        assert_eq!(first, second);

        let after = serde_json::to_string(sim.timeline()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn range_invariants_hold_over_a_full_default_run() {
        let mut sim = default_sim();
        sim.run();
        let last = sim.last_valid_step();

        for t in 0..=last {
            let r = sim.timeline().record(t);
            assert!(
                (0.0..=1.0).contains(&r.skin_integrity),
                "skin integrity out of range at T{t}: {}",
                r.skin_integrity
            );
            assert!(r.bacteria_total_count >= 0.0);
            assert!(r.neutrophils_in_burn_site >= 0.0);
            assert!(r.neutrophils_total_count >= 0.0);
            assert!(r.m2_in_burn_site >= 0.0);
            assert!(r.dead_neutrophils_before_eaten >= 0.0);
            assert!(r.energy_remaining >= 0.0);
            assert!((0.0..=1.0).contains(&r.pi_inhibition));
        }
    }

    #[test]
    fn last_valid_step_matches_run_state() {
        let mut sim = default_sim();
        assert_eq!(sim.last_valid_step(), 0); // not run yet
        sim.run();
        match sim.run_state() {
            RunState::Completed => assert_eq!(sim.last_valid_step(), LAST_STEP),
            RunState::HaltedByDepletion(t) => {
                assert_eq!(sim.last_valid_step(), t - 1);
                assert!(sim.timeline()[t].energy_depleted);
                assert!(!sim.timeline()[t - 1].energy_depleted);
            }
            RunState::Initialized => unreachable!(),
        }
    }

    #[test]
    fn rerunning_a_finished_instance_is_a_no_op() {
        let mut sim = default_sim();
        sim.run();
        let state = sim.run_state();
        let frozen = serde_json::to_string(sim.timeline()).unwrap();
        sim.run();
        assert_eq!(sim.run_state(), state);
        assert_eq!(serde_json::to_string(sim.timeline()).unwrap(), frozen);
    }
}
