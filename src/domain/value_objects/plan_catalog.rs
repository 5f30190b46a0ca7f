use serde::Serialize;

use crate::domain::value_objects::enums::plan_tiers::PlanTier;

/// Resource ceilings enforced per tier by the plan-features service.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PlanLimits {
    pub max_staff: u32,
    pub max_outlets: u32,
    pub max_products: u32,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PlanDefinition {
    pub tier: PlanTier,
    /// Monthly price in minor currency units.
    pub monthly_price_minor: i64,
    pub limits: PlanLimits,
}

/// Static plan table. Prices change by deployment, not at runtime, so the
/// catalog is built in `main` and injected wherever pricing is needed.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: Vec<PlanDefinition>,
}

impl PlanCatalog {
    pub fn new(plans: Vec<PlanDefinition>) -> Self {
        Self { plans }
    }

    pub fn find_by_tier(&self, tier: PlanTier) -> Option<&PlanDefinition> {
        self.plans.iter().find(|plan| plan.tier == tier)
    }

    pub fn monthly_price_minor(&self, tier: PlanTier) -> Option<i64> {
        self.find_by_tier(tier).map(|plan| plan.monthly_price_minor)
    }

    pub fn list(&self) -> &[PlanDefinition] {
        &self.plans
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::new(vec![
            PlanDefinition {
                tier: PlanTier::Basic,
                monthly_price_minor: 9_900,
                limits: PlanLimits {
                    max_staff: 3,
                    max_outlets: 1,
                    max_products: 200,
                },
            },
            PlanDefinition {
                tier: PlanTier::Pro,
                monthly_price_minor: 29_900,
                limits: PlanLimits {
                    max_staff: 15,
                    max_outlets: 5,
                    max_products: 5_000,
                },
            },
            PlanDefinition {
                tier: PlanTier::Enterprise,
                monthly_price_minor: 59_900,
                limits: PlanLimits {
                    max_staff: 100,
                    max_outlets: 50,
                    max_products: 100_000,
                },
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_resolves_every_tier() {
        let catalog = PlanCatalog::default();

        for tier in [PlanTier::Basic, PlanTier::Pro, PlanTier::Enterprise] {
            let plan = catalog.find_by_tier(tier).unwrap();
            assert_eq!(plan.tier, tier);
            assert!(plan.monthly_price_minor > 0);
        }
    }

    #[test]
    fn tiers_are_priced_in_ascending_order() {
        let catalog = PlanCatalog::default();

        let basic = catalog.monthly_price_minor(PlanTier::Basic).unwrap();
        let pro = catalog.monthly_price_minor(PlanTier::Pro).unwrap();
        let enterprise = catalog.monthly_price_minor(PlanTier::Enterprise).unwrap();

        assert!(basic < pro);
        assert!(pro < enterprise);
    }
}
