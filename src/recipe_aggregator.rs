use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::error::NutritionError;
use crate::ingredient_parser::IngredientLine;
use crate::nutrients::NutrientVector;
use crate::nutritional_matcher::{MatchResult, ResolverChain};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateNutrition {
    /// Matched ingredients, in recipe order.
    pub items: Vec<MatchResult>,
    pub totals: NutrientVector,
}

impl AggregateNutrition {
    /// Sums item nutrients at full precision and rounds once at the end.
    pub fn from_items(items: Vec<MatchResult>) -> Self {
        let mut totals = NutrientVector::zero();
        for item in &items {
            totals += &item.nutrients;
        }
        Self {
            items,
            totals: totals.rounded(),
        }
    }

    /// Totals divided across `servings`, re-rounded per field. One serving or
    /// fewer returns the totals unchanged.
    pub fn per_serving(&self, servings: u32) -> NutrientVector {
        if servings <= 1 {
            return self.totals;
        }
        self.totals.scaled(1.0 / servings as f64).rounded()
    }
}

/// Runs every ingredient of a recipe through the resolver chain.
pub struct NutritionAggregator {
    chain: Arc<ResolverChain>,
}

impl NutritionAggregator {
    pub fn new(chain: ResolverChain) -> Self {
        Self {
            chain: Arc::new(chain),
        }
    }

    /// All lookups are dispatched at once and collected afterwards. Blank
    /// lines are skipped, misses and failed lookups are left out of the
    /// result. Fails only when every lookup attempted returned an error.
    pub async fn aggregate(
        &self,
        ingredients: &[IngredientLine],
    ) -> Result<AggregateNutrition, NutritionError> {
        let mut tasks = JoinSet::new();
        for (index, line) in ingredients.iter().enumerate() {
            if line.is_blank() {
                continue;
            }
            let chain = self.chain.clone();
            let line = line.clone();
            tasks.spawn(async move { (index, chain.resolve(&line).await) });
        }

        let attempted = tasks.len();
        let mut slots: Vec<Option<MatchResult>> = vec![None; ingredients.len()];
        let mut failed = 0;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(found))) => slots[index] = found,
                Ok((index, Err(e))) => {
                    warn!("Lookup for '{}' failed: {}", ingredients[index].ingredient_name, e);
                    failed += 1;
                }
                Err(e) => {
                    warn!("Lookup task did not complete: {}", e);
                    failed += 1;
                }
            }
        }

        if attempted > 0 && failed == attempted {
            return Err(NutritionError::SourcesUnavailable { failed });
        }

        let items: Vec<MatchResult> = slots.into_iter().flatten().collect();
        info!(
            "Nutrition aggregated: {} of {} ingredients matched, {} lookups failed",
            items.len(),
            attempted,
            failed
        );
        Ok(AggregateNutrition::from_items(items))
    }
}
