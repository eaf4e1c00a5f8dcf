//! Service receipt allocation for one care setting.
//!
//! Two strategies bracket the behaviour of the health system. The ideal walk
//! hands each arrival the best available service in catalog priority order,
//! depleting shared resources as it goes. The naive split ignores priority
//! and spreads the same total proportionally to raw resource availability.
//! Health worker scarcity mixes the two: no coordination without staff.

use crate::scenario::catalog::{items, ResourceCombo, Service};
use crate::scenario::formula::{clamp01, divide_or_zero};
use crate::scenario::params::ReadinessMap;
use std::collections::BTreeMap;

/// Per-service shares for one setting, in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Allocation {
    pub mixture: f64,
    pub shares: Vec<f64>,
    pub no_abortion: f64,
}

/// Remaining availability per resource item while the ideal walk depletes it.
type ReadinessState = BTreeMap<String, f64>;

pub(crate) fn allocate(services: &[Service], readiness: &ReadinessMap) -> Allocation {
    let ideal = ideal_shares(services, readiness);
    let mixture = clamp01(1.0 - clamp01(readiness.availability(items::HEALTH_WORKER)));

    let shares = if mixture <= 0.0 {
        ideal
    } else {
        // The naive split redistributes exactly what the ideal walk achieved,
        // so the mixture never changes the served total.
        let achieved: f64 = ideal.iter().sum();
        let naive = naive_shares(services, readiness, achieved);
        if mixture >= 1.0 {
            naive
        } else {
            ideal
                .iter()
                .zip(naive.iter())
                .map(|(i, n)| i + mixture * (n - i))
                .collect()
        }
    };

    let allocated: f64 = shares.iter().sum();
    Allocation {
        mixture,
        shares,
        no_abortion: (1.0 - allocated).max(0.0),
    }
}

fn initial_state(readiness: &ReadinessMap) -> ReadinessState {
    readiness
        .iter()
        .map(|(item, value)| (item.to_string(), clamp01(value)))
        .collect()
}

/// Takes as much of the combo as its scarcest item allows, then drains that
/// share from every tracked resource. Resources are shared across services,
/// so one service's consumption starves everything downstream.
fn consume_combo(combo: &ResourceCombo, state: &ReadinessState) -> (f64, ReadinessState) {
    if combo.items.is_empty() {
        return (0.0, state.clone());
    }

    let share = combo
        .items
        .iter()
        .fold(f64::INFINITY, |limit, item| {
            limit.min(state.get(*item).copied().unwrap_or(0.0))
        })
        .max(0.0);

    let next = state
        .iter()
        .map(|(item, value)| (item.clone(), (value - share).max(0.0)))
        .collect();

    (share, next)
}

fn ideal_shares(services: &[Service], readiness: &ReadinessMap) -> Vec<f64> {
    let mut state = initial_state(readiness);
    let mut shares = Vec::with_capacity(services.len());

    for service in services {
        let mut service_share = 0.0;
        for combo in &service.combos {
            let (share, next) = consume_combo(combo, &state);
            service_share += share;
            state = next;
        }
        shares.push(service_share);
    }

    shares
}

/// Best-case fraction a service could serve on its own, ignoring depletion.
fn raw_potential(service: &Service, readiness: &ReadinessMap) -> f64 {
    service
        .combos
        .iter()
        .map(|combo| {
            if combo.items.is_empty() {
                0.0
            } else {
                combo.items.iter().fold(1.0_f64, |limit, item| {
                    limit.min(clamp01(readiness.availability(item)))
                })
            }
        })
        .fold(0.0_f64, f64::max)
}

fn naive_shares(services: &[Service], readiness: &ReadinessMap, target_total: f64) -> Vec<f64> {
    let potentials: Vec<f64> = services
        .iter()
        .map(|service| raw_potential(service, readiness))
        .collect();
    let raw_total: f64 = potentials.iter().sum();

    potentials
        .iter()
        .map(|potential| divide_or_zero(potential * target_total, raw_total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::catalog::{CareSetting, ServiceCatalog};

    #[test]
    fn consume_combo_drains_every_tracked_resource() {
        let readiness = ReadinessMap::from_pairs(&[("hw", 0.9), ("miso", 0.4), ("mva", 0.7)]);
        let state = initial_state(&readiness);
        let combo = ResourceCombo {
            items: vec!["hw", "miso"],
        };

        let (share, next) = consume_combo(&combo, &state);

        assert_eq!(share, 0.4);
        assert_eq!(next.get("hw").copied(), Some(0.5));
        assert_eq!(next.get("miso").copied(), Some(0.0));
        // Untouched by the combo, drained anyway: resources are shared.
        assert!((next.get("mva").copied().unwrap_or(0.0) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn empty_combo_consumes_nothing() {
        let readiness = ReadinessMap::from_pairs(&[("hw", 0.9)]);
        let state = initial_state(&readiness);

        let (share, next) = consume_combo(&ResourceCombo { items: Vec::new() }, &state);

        assert_eq!(share, 0.0);
        assert_eq!(next, state);
    }

    #[test]
    fn missing_item_blocks_the_combo() {
        let readiness = ReadinessMap::from_pairs(&[("hw", 0.9)]);
        let state = initial_state(&readiness);
        let combo = ResourceCombo {
            items: vec!["hw", "mife"],
        };

        let (share, next) = consume_combo(&combo, &state);

        assert_eq!(share, 0.0);
        assert_eq!(next, state);
    }

    #[test]
    fn full_readiness_serves_everyone_through_the_first_service() {
        let catalog = ServiceCatalog::standard();
        let facility = catalog.setting(CareSetting::Facility);
        let readiness = ReadinessMap::from_pairs(&[
            ("hw", 1.0),
            ("mife", 1.0),
            ("miso", 1.0),
            ("mva", 1.0),
            ("surgical", 1.0),
            ("antibiotics", 1.0),
            ("cemonc", 1.0),
        ]);

        let allocation = allocate(&facility.services, &readiness);

        assert_eq!(allocation.mixture, 0.0);
        assert_eq!(allocation.shares[0], 1.0);
        assert!(allocation.shares[1..].iter().all(|share| *share == 0.0));
        assert_eq!(allocation.no_abortion, 0.0);
    }
}
