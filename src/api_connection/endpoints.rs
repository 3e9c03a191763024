use serde::{Deserialize, Serialize};

pub const FDC_SEARCH_URL: &str = "https://api.nal.usda.gov/fdc/v1/foods/search";
pub const FDC_DEMO_KEY: &str = "DEMO_KEY";
pub const FDC_PAGE_SIZE: u32 = 5;
/// Data tiers requested from the search endpoint.
pub const FDC_DATA_TYPES: &str = "Foundation,SR Legacy";

/// Public CORS proxies, tried in this order. Each is called as `<proxy>?url=<target>`.
pub const DEFAULT_PROXIES: &[&str] = &[
    "https://api.allorigins.win/raw",
    "https://corsproxy.io/",
];

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; MealPrep/1.0)";

#[derive(Debug, Serialize, Clone)]
pub struct FoodSearchQuery<'a> {
    pub api_key: &'a str,
    pub query: &'a str,
    #[serde(rename = "pageSize")]
    pub page_size: u32,
    #[serde(rename = "dataType")]
    pub data_type: &'a str,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FoodSearchResponse {
    pub total_hits: Option<u64>,
    pub foods: Vec<SearchFood>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFood {
    pub fdc_id: Option<u64>,
    pub description: String,
    pub data_type: String,
    pub food_nutrients: Vec<SearchFoodNutrient>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchFoodNutrient {
    pub nutrient_id: u32,
    pub nutrient_name: Option<String>,
    pub unit_name: Option<String>,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_deserializes_sparse_payload() {
        let body = r#"{
            "totalHits": 2,
            "foods": [
                {"fdcId": 171287, "description": "Egg, whole, raw, fresh", "dataType": "SR Legacy",
                 "foodNutrients": [{"nutrientId": 1008, "nutrientName": "Energy", "unitName": "KCAL", "value": 143},
                                   {"nutrientId": 1003, "value": 12.6}]},
                {"description": "Egg salad"}
            ]
        }"#;
        let parsed: FoodSearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.total_hits, Some(2));
        assert_eq!(parsed.foods.len(), 2);
        assert_eq!(parsed.foods[0].data_type, "SR Legacy");
        assert_eq!(parsed.foods[0].food_nutrients[0].value, 143.0);
        assert!(parsed.foods[1].food_nutrients.is_empty());
    }
}
