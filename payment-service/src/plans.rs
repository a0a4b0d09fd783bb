use common_money::Money;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// A purchasable plan. `price` is what the confirmation message must show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: u32,
    pub name: String,
    pub price: Money,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("plan catalog is empty")]
    Empty,
    #[error("duplicate plan id {0}")]
    DuplicateId(u32),
    #[error("plan {0} has a negative price")]
    NegativePrice(u32),
    #[error("invalid plan catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    pub fn new(plans: Vec<Plan>) -> Result<Self, CatalogError> {
        if plans.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for plan in &plans {
            if !seen.insert(plan.id) {
                return Err(CatalogError::DuplicateId(plan.id));
            }
            if plan.price.is_negative() {
                return Err(CatalogError::NegativePrice(plan.id));
            }
        }
        Ok(Self { plans })
    }

    /// Parses a JSON array of `{id, name, price}`; price is `"500.00"` or `500`.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let plans: Vec<Plan> = serde_json::from_str(raw)?;
        Self::new(plans)
    }

    pub fn find(&self, id: u32) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == id)
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        let plan = |id, name: &str, cents| Plan { id, name: name.into(), price: Money::from_cents(cents) };
        Self {
            plans: vec![
                plan(1, "Basic", 10_000),
                plan(2, "Standard", 50_000),
                plan(3, "Premium", 100_000),
            ],
        }
    }
}
