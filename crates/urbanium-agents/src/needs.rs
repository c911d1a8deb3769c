//! Per-tick need decay.
//!
//! Needs rise every tick and only fall through actions. Hunger, energy, and
//! social rise unconditionally. Shelter rises only while the citizen has no
//! household, income only while it has no employer. Every level is clamped
//! into `[0, 1]` by [`Needs::adjust`](urbanium_types::Needs::adjust).

use urbanium_types::{Citizen, NeedKind};

use crate::config::NeedsConfig;

/// Needs that must be answered by the emergency path, in override order.
const CRITICAL_NEEDS: [NeedKind; 3] = [NeedKind::Hunger, NeedKind::Energy, NeedKind::Shelter];

/// Result of applying one tick of need decay to a citizen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeedDecayResult {
    /// Needs that crossed the critical threshold during this decay.
    ///
    /// A need that was already critical before the tick is not repeated.
    pub newly_critical: Vec<NeedKind>,
}

/// Apply one tick of need decay to a citizen.
///
/// Also advances the unemployment counter, which the metrics and the
/// oracle prompt read.
pub fn apply_need_decay(citizen: &mut Citizen, config: &NeedsConfig) -> NeedDecayResult {
    let before = citizen.needs;

    citizen.needs.adjust(NeedKind::Hunger, config.hunger_rate);
    citizen.needs.adjust(NeedKind::Energy, config.energy_rate);
    citizen.needs.adjust(NeedKind::Social, config.social_rate);
    if !citizen.has_shelter() {
        citizen.needs.adjust(NeedKind::Shelter, config.shelter_rate);
    }
    if citizen.is_employed() {
        citizen.unemployed_ticks = 0;
    } else {
        citizen.needs.adjust(NeedKind::Income, config.income_rate);
        citizen.unemployed_ticks = citizen.unemployed_ticks.saturating_add(1);
    }

    let newly_critical = CRITICAL_NEEDS
        .iter()
        .copied()
        .filter(|&kind| {
            before.get(kind) < config.critical_threshold
                && citizen.needs.get(kind) >= config.critical_threshold
        })
        .collect();

    NeedDecayResult { newly_critical }
}

/// The first critical need in override order (hunger, energy, shelter).
pub fn first_critical_need(citizen: &Citizen, config: &NeedsConfig) -> Option<NeedKind> {
    CRITICAL_NEEDS
        .iter()
        .copied()
        .find(|&kind| citizen.needs.get(kind) >= config.critical_threshold)
}
