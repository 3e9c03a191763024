use async_trait::async_trait;

use crate::api_connection::endpoints::SearchFood;
use crate::error::LookupError;
use crate::nutrients::NutrientVector;

/// Reference-data quality tier reported by the food database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataQualityTier {
    Foundation,
    SrLegacy,
    Branded,
    Survey,
    Other(String),
}

impl DataQualityTier {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Foundation" => DataQualityTier::Foundation,
            "SR Legacy" => DataQualityTier::SrLegacy,
            "Branded" => DataQualityTier::Branded,
            l if l.starts_with("Survey") => DataQualityTier::Survey,
            other => DataQualityTier::Other(other.to_string()),
        }
    }
}

/// One search hit, nutrients per 100 g.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodCandidate {
    pub description: String,
    pub tier: DataQualityTier,
    pub per_100g: NutrientVector,
}

impl FoodCandidate {
    pub fn new(description: &str, tier: DataQualityTier, per_100g: NutrientVector) -> Self {
        Self {
            description: description.to_string(),
            tier,
            per_100g,
        }
    }
}

impl From<SearchFood> for FoodCandidate {
    fn from(food: SearchFood) -> Self {
        let per_100g = NutrientVector::from_fdc_pairs(
            food.food_nutrients.iter().map(|n| (n.nutrient_id, n.value)),
        );
        Self {
            tier: DataQualityTier::from_label(&food.data_type),
            description: food.description,
            per_100g,
        }
    }
}

/// Search-by-name access to an external food-composition database.
#[async_trait]
pub trait FoodSearch: Send + Sync {
    async fn search(&self, term: &str) -> Result<Vec<FoodCandidate>, LookupError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_connection::endpoints::SearchFoodNutrient;
    use crate::nutrients::NutrientField;

    #[test]
    fn test_tier_labels() {
        assert_eq!(DataQualityTier::from_label("Foundation"), DataQualityTier::Foundation);
        assert_eq!(DataQualityTier::from_label("SR Legacy"), DataQualityTier::SrLegacy);
        assert_eq!(DataQualityTier::from_label("Survey (FNDDS)"), DataQualityTier::Survey);
        assert_eq!(
            DataQualityTier::from_label("Experimental"),
            DataQualityTier::Other("Experimental".to_string())
        );
    }

    #[test]
    fn test_candidate_from_search_food() {
        let food = SearchFood {
            fdc_id: Some(1),
            description: "Rice, white, raw".to_string(),
            data_type: "SR Legacy".to_string(),
            food_nutrients: vec![
                SearchFoodNutrient { nutrient_id: 1008, value: 365.0, ..Default::default() },
                SearchFoodNutrient { nutrient_id: 1005, value: 80.0, ..Default::default() },
            ],
        };
        let candidate = FoodCandidate::from(food);
        assert_eq!(candidate.tier, DataQualityTier::SrLegacy);
        assert_eq!(candidate.per_100g[NutrientField::Calories], 365.0);
        assert_eq!(candidate.per_100g[NutrientField::Carbs], 80.0);
        assert_eq!(candidate.per_100g[NutrientField::Fat], 0.0);
    }
}
