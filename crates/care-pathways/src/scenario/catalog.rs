use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource item ids shared between readiness maps and service combos.
pub mod items {
    pub const HEALTH_WORKER: &str = "hw";
    pub const MIFEPRISTONE: &str = "mife";
    pub const MISOPROSTOL: &str = "miso";
    pub const VACUUM_ASPIRATION_KIT: &str = "mva";
    pub const SURGICAL_CAPACITY: &str = "surgical";
    pub const ANTIBIOTICS: &str = "antibiotics";
    pub const COMPREHENSIVE_EMOC: &str = "cemonc";
    pub const SELF_CARE_GUIDANCE: &str = "info";
    pub const TRADITIONAL_PROVIDER: &str = "traditional";

    /// Items tracked by facility readiness sliders.
    pub const FACILITY: &[&str] = &[
        HEALTH_WORKER,
        MIFEPRISTONE,
        MISOPROSTOL,
        VACUUM_ASPIRATION_KIT,
        SURGICAL_CAPACITY,
        ANTIBIOTICS,
        COMPREHENSIVE_EMOC,
    ];

    /// Items tracked by out-of-facility readiness sliders.
    pub const OUT_OF_FACILITY: &[&str] = &[
        HEALTH_WORKER,
        MIFEPRISTONE,
        MISOPROSTOL,
        SELF_CARE_GUIDANCE,
        TRADITIONAL_PROVIDER,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareSetting {
    Facility,
    OutOfFacility,
}

impl CareSetting {
    pub const fn ordered() -> [Self; 2] {
        [Self::Facility, Self::OutOfFacility]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Facility => "Facility",
            Self::OutOfFacility => "Out of Facility",
        }
    }
}

impl fmt::Display for CareSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Facility => "facility",
            Self::OutOfFacility => "out-of-facility",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyTier {
    Safe,
    LessSafe,
    LeastSafe,
}

impl SafetyTier {
    pub const fn ordered() -> [Self; 3] {
        [Self::Safe, Self::LessSafe, Self::LeastSafe]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::LessSafe => "less_safe",
            Self::LeastSafe => "least_safe",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::LessSafe => "Less Safe",
            Self::LeastSafe => "Least Safe",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplicationSeverity {
    Moderate,
    Severe,
}

impl ComplicationSeverity {
    pub const fn ordered() -> [Self; 2] {
        [Self::Moderate, Self::Severe]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
        }
    }
}

/// Number of complication types tracked per service. Service rate vectors are
/// aligned to the catalog complication order.
pub const COMPLICATION_COUNT: usize = 6;

#[derive(Debug, Clone, Serialize)]
pub struct Complication {
    pub id: &'static str,
    pub label: &'static str,
    pub severity: ComplicationSeverity,
}

/// One set of resource items that together can deliver a service.
#[derive(Debug, Clone)]
pub struct ResourceCombo {
    pub items: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct Service {
    pub id: &'static str,
    pub label: &'static str,
    pub tier: SafetyTier,
    /// Alternative resource combinations, consumed in declared order.
    pub combos: Vec<ResourceCombo>,
    /// Per-abortion complication rates aligned to the catalog complications.
    pub complication_rates: [f64; COMPLICATION_COUNT],
}

/// Services and tracked resource items for one care setting. Service order is
/// allocation priority: reordering changes scenario results.
#[derive(Debug, Clone)]
pub struct SettingCatalog {
    pub items: Vec<&'static str>,
    pub services: Vec<Service>,
}

#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    facility: SettingCatalog,
    out_of_facility: SettingCatalog,
    complications: Vec<Complication>,
}

impl ServiceCatalog {
    /// Built-in catalog used by the application.
    pub fn standard() -> Self {
        Self {
            facility: SettingCatalog {
                items: items::FACILITY.to_vec(),
                services: standard_facility_services(),
            },
            out_of_facility: SettingCatalog {
                items: items::OUT_OF_FACILITY.to_vec(),
                services: standard_out_of_facility_services(),
            },
            complications: standard_complications(),
        }
    }

    /// Catalog from custom parts, validated up front.
    pub fn new(
        facility: SettingCatalog,
        out_of_facility: SettingCatalog,
        complications: Vec<Complication>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            facility,
            out_of_facility,
            complications,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn setting(&self, setting: CareSetting) -> &SettingCatalog {
        match setting {
            CareSetting::Facility => &self.facility,
            CareSetting::OutOfFacility => &self.out_of_facility,
        }
    }

    pub fn complications(&self) -> &[Complication] {
        &self.complications
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.complications.len() != COMPLICATION_COUNT {
            return Err(CatalogError::ComplicationCountMismatch {
                expected: COMPLICATION_COUNT,
                actual: self.complications.len(),
            });
        }
        for (index, complication) in self.complications.iter().enumerate() {
            if self.complications[..index]
                .iter()
                .any(|other| other.id == complication.id)
            {
                return Err(CatalogError::DuplicateComplicationId(complication.id));
            }
        }

        for setting in CareSetting::ordered() {
            let section = self.setting(setting);
            for (index, service) in section.services.iter().enumerate() {
                if section.services[..index]
                    .iter()
                    .any(|other| other.id == service.id)
                {
                    return Err(CatalogError::DuplicateServiceId {
                        setting,
                        service: service.id,
                    });
                }
                if service.combos.is_empty() {
                    return Err(CatalogError::MissingCombos {
                        setting,
                        service: service.id,
                    });
                }
                for combo in &service.combos {
                    if combo.items.is_empty() {
                        return Err(CatalogError::EmptyCombo {
                            setting,
                            service: service.id,
                        });
                    }
                    for item in &combo.items {
                        if !section.items.contains(item) {
                            return Err(CatalogError::UnknownResourceItem {
                                setting,
                                service: service.id,
                                item,
                            });
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("{setting} service '{service}' references unknown resource item '{item}'")]
    UnknownResourceItem {
        setting: CareSetting,
        service: &'static str,
        item: &'static str,
    },
    #[error("{setting} service '{service}' is declared more than once")]
    DuplicateServiceId {
        setting: CareSetting,
        service: &'static str,
    },
    #[error("{setting} service '{service}' has no resource combination")]
    MissingCombos {
        setting: CareSetting,
        service: &'static str,
    },
    #[error("{setting} service '{service}' declares an empty resource combination")]
    EmptyCombo {
        setting: CareSetting,
        service: &'static str,
    },
    #[error("catalog must declare exactly {expected} complications, got {actual}")]
    ComplicationCountMismatch { expected: usize, actual: usize },
    #[error("complication '{0}' is declared more than once")]
    DuplicateComplicationId(&'static str),
}

fn standard_facility_services() -> Vec<Service> {
    vec![
        Service {
            id: "facility_ma_combined",
            label: "Medication abortion (mifepristone + misoprostol)",
            tier: SafetyTier::Safe,
            combos: vec![ResourceCombo {
                items: vec![items::HEALTH_WORKER, items::MIFEPRISTONE, items::MISOPROSTOL],
            }],
            complication_rates: [0.030, 0.003, 0.001, 0.0, 0.0002, 0.0],
        },
        Service {
            id: "facility_ma_miso",
            label: "Medication abortion (misoprostol only)",
            tier: SafetyTier::Safe,
            combos: vec![ResourceCombo {
                items: vec![items::HEALTH_WORKER, items::MISOPROSTOL],
            }],
            complication_rates: [0.080, 0.005, 0.002, 0.0, 0.0004, 0.0],
        },
        Service {
            id: "facility_mva",
            label: "Manual vacuum aspiration",
            tier: SafetyTier::Safe,
            combos: vec![ResourceCombo {
                items: vec![items::HEALTH_WORKER, items::VACUUM_ASPIRATION_KIT],
            }],
            complication_rates: [0.015, 0.008, 0.002, 0.001, 0.0005, 0.0],
        },
        Service {
            id: "facility_de",
            label: "Dilatation and evacuation",
            tier: SafetyTier::Safe,
            combos: vec![ResourceCombo {
                items: vec![items::HEALTH_WORKER, items::SURGICAL_CAPACITY],
            }],
            complication_rates: [0.010, 0.010, 0.004, 0.003, 0.001, 0.0],
        },
        Service {
            id: "facility_dc",
            label: "Dilatation and sharp curettage",
            tier: SafetyTier::LessSafe,
            combos: vec![ResourceCombo {
                items: vec![items::HEALTH_WORKER, items::SURGICAL_CAPACITY],
            }],
            complication_rates: [0.040, 0.025, 0.010, 0.008, 0.004, 0.0],
        },
    ]
}

fn standard_out_of_facility_services() -> Vec<Service> {
    vec![
        Service {
            id: "oof_pharmacy_ma",
            label: "Pharmacy-sourced medication abortion",
            tier: SafetyTier::LessSafe,
            combos: vec![
                ResourceCombo {
                    items: vec![items::HEALTH_WORKER, items::MIFEPRISTONE, items::MISOPROSTOL],
                },
                ResourceCombo {
                    items: vec![items::HEALTH_WORKER, items::MISOPROSTOL],
                },
            ],
            complication_rates: [0.100, 0.010, 0.004, 0.0, 0.001, 0.0],
        },
        Service {
            id: "oof_self_miso",
            label: "Self-managed misoprostol",
            tier: SafetyTier::LessSafe,
            combos: vec![ResourceCombo {
                items: vec![items::MISOPROSTOL, items::SELF_CARE_GUIDANCE],
            }],
            complication_rates: [0.150, 0.030, 0.010, 0.0, 0.005, 0.002],
        },
        Service {
            id: "oof_traditional",
            label: "Traditional provider methods",
            tier: SafetyTier::LeastSafe,
            combos: vec![ResourceCombo {
                items: vec![items::TRADITIONAL_PROVIDER],
            }],
            complication_rates: [0.280, 0.160, 0.090, 0.110, 0.070, 0.120],
        },
    ]
}

fn standard_complications() -> Vec<Complication> {
    vec![
        Complication {
            id: "incomplete",
            label: "Incomplete abortion",
            severity: ComplicationSeverity::Moderate,
        },
        Complication {
            id: "infection",
            label: "Infection",
            severity: ComplicationSeverity::Moderate,
        },
        Complication {
            id: "hemorrhage",
            label: "Haemorrhage",
            severity: ComplicationSeverity::Severe,
        },
        Complication {
            id: "uterine_injury",
            label: "Uterine or cervical injury",
            severity: ComplicationSeverity::Severe,
        },
        Complication {
            id: "sepsis",
            label: "Sepsis",
            severity: ComplicationSeverity::Severe,
        },
        Complication {
            id: "poisoning",
            label: "Systemic toxicity or poisoning",
            severity: ComplicationSeverity::Severe,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_validates() {
        ServiceCatalog::standard()
            .validate()
            .expect("standard catalog is internally consistent");
    }

    #[test]
    fn both_settings_track_health_workers() {
        let catalog = ServiceCatalog::standard();
        for setting in CareSetting::ordered() {
            assert!(catalog
                .setting(setting)
                .items
                .contains(&items::HEALTH_WORKER));
        }
    }

    #[test]
    fn facility_priority_starts_with_the_combined_regimen() {
        let catalog = ServiceCatalog::standard();
        let facility = catalog.setting(CareSetting::Facility);
        assert_eq!(facility.services[0].id, "facility_ma_combined");
        assert_eq!(facility.services[0].tier, SafetyTier::Safe);
    }

    #[test]
    fn complication_rates_align_with_the_taxonomy() {
        let catalog = ServiceCatalog::standard();
        assert_eq!(catalog.complications().len(), COMPLICATION_COUNT);
        for setting in CareSetting::ordered() {
            for service in &catalog.setting(setting).services {
                assert_eq!(service.complication_rates.len(), COMPLICATION_COUNT);
            }
        }
    }

    #[test]
    fn unknown_combo_item_is_rejected() {
        let catalog = ServiceCatalog {
            facility: SettingCatalog {
                items: items::FACILITY.to_vec(),
                services: vec![Service {
                    id: "facility_broken",
                    label: "Broken",
                    tier: SafetyTier::Safe,
                    combos: vec![ResourceCombo {
                        items: vec![items::HEALTH_WORKER, "xray"],
                    }],
                    complication_rates: [0.0; COMPLICATION_COUNT],
                }],
            },
            out_of_facility: SettingCatalog {
                items: items::OUT_OF_FACILITY.to_vec(),
                services: standard_out_of_facility_services(),
            },
            complications: standard_complications(),
        };

        match catalog.validate() {
            Err(CatalogError::UnknownResourceItem { item, .. }) => assert_eq!(item, "xray"),
            other => panic!("expected unknown item error, got {other:?}"),
        }
    }

    #[test]
    fn empty_combo_is_rejected() {
        let catalog = ServiceCatalog::new(
            SettingCatalog {
                items: items::FACILITY.to_vec(),
                services: vec![Service {
                    id: "facility_empty",
                    label: "Empty",
                    tier: SafetyTier::Safe,
                    combos: vec![ResourceCombo { items: Vec::new() }],
                    complication_rates: [0.0; COMPLICATION_COUNT],
                }],
            },
            SettingCatalog {
                items: items::OUT_OF_FACILITY.to_vec(),
                services: standard_out_of_facility_services(),
            },
            standard_complications(),
        );

        assert!(matches!(catalog, Err(CatalogError::EmptyCombo { .. })));
    }

    #[test]
    fn duplicate_service_id_is_rejected() {
        let mut services = standard_facility_services();
        let duplicate = services[0].clone();
        services.push(duplicate);
        let catalog = ServiceCatalog::new(
            SettingCatalog {
                items: items::FACILITY.to_vec(),
                services,
            },
            SettingCatalog {
                items: items::OUT_OF_FACILITY.to_vec(),
                services: standard_out_of_facility_services(),
            },
            standard_complications(),
        );

        assert!(matches!(
            catalog,
            Err(CatalogError::DuplicateServiceId { .. })
        ));
    }
}
