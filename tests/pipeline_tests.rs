use async_trait::async_trait;
use mealprep::api_connection::{build_http_client, FetchChain, FoodDataCentralClient, PageFetcher};
use mealprep::error::{FetchError, LookupError, NutritionError};
use mealprep::ingredient_parser::IngredientLine;
use mealprep::nutrients::{NutrientField, NutrientVector};
use mealprep::nutritional_matcher::{FoodDatabaseResolver, Provenance, ResolverChain, SheetResolver};
use mealprep::recipe_aggregator::NutritionAggregator;
use mealprep::recipe_parser::segment;
use mealprep::search::{DataQualityTier, FoodCandidate, FoodSearch, SheetRow, SheetSource, StaticSheet};
use mealprep::structured_data::fetch_recipe_from_url;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const RECIPE_PAGE: &str = r#"<html><head>
<script type="application/ld+json">{ not json </script>
<script type="application/ld+json">
{"@context": "https://schema.org", "@graph": [
  {"@type": "WebPage", "name": "Pancakes | Example Kitchen"},
  {"@type": ["Recipe"], "name": "Pancakes", "recipeYield": ["4 servings"],
   "prepTime": "PT10M", "cookTime": "PT1H5M",
   "recipeIngredient": ["2 cups flour", "1½ cups milk"],
   "recipeInstructions": [{"@type": "HowToStep", "text": "Mix."}, {"@type": "HowToStep", "text": "Fry."}]}
]}
</script></head><body><p>Ignored</p></body></html>"#;

struct StaticPage(&'static str);

#[async_trait]
impl PageFetcher for StaticPage {
    async fn fetch_text(&self, _url: &str) -> Result<String, FetchError> {
        Ok(self.0.to_string())
    }
}

struct BlockedPage;

#[async_trait]
impl PageFetcher for BlockedPage {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        Err(FetchError::Status {
            status: 403,
            url: url.to_string(),
        })
    }
}

struct UnreachableSheet;

#[async_trait]
impl SheetSource for UnreachableSheet {
    async fn rows(&self) -> Result<Arc<Vec<SheetRow>>, LookupError> {
        Err(LookupError::Sheet("connection refused".to_string()))
    }
}

/// In-memory food database keyed by exact search term.
struct FakeFoodDb {
    foods: HashMap<&'static str, Vec<FoodCandidate>>,
}

#[async_trait]
impl FoodSearch for FakeFoodDb {
    async fn search(&self, term: &str) -> Result<Vec<FoodCandidate>, LookupError> {
        Ok(self.foods.get(term).cloned().unwrap_or_default())
    }
}

fn food(description: &str, tier: DataQualityTier, calories: f64, protein: f64) -> FoodCandidate {
    let mut per_100g = NutrientVector::zero();
    per_100g[NutrientField::Calories] = calories;
    per_100g[NutrientField::Protein] = protein;
    FoodCandidate::new(description, tier, per_100g)
}

fn food_db() -> Arc<FakeFoodDb> {
    let mut foods = HashMap::new();
    foods.insert(
        "flour, wheat, all-purpose",
        vec![
            food("Cookies, sugar, prepared from mix with wheat flour", DataQualityTier::SrLegacy, 470.0, 5.0),
            food("Wheat flour, white, all-purpose, enriched, bleached", DataQualityTier::SrLegacy, 364.0, 10.3),
        ],
    );
    foods.insert(
        "milk, whole",
        vec![food("Milk, whole, 3.25% milkfat", DataQualityTier::SrLegacy, 61.0, 3.2)],
    );
    Arc::new(FakeFoodDb { foods })
}

#[tokio::test]
async fn test_import_then_aggregate() {
    let recipe = fetch_recipe_from_url(&StaticPage(RECIPE_PAGE), "https://example.com/pancakes")
        .await
        .unwrap();

    assert_eq!(recipe.recipe.title, "Pancakes");
    assert_eq!(recipe.servings, "4");
    assert_eq!(recipe.prep_time, "10 min");
    assert_eq!(recipe.cook_time, "1 hr 5 min");
    assert_eq!(recipe.recipe.instructions, "Mix.\nFry.");
    assert_eq!(
        recipe.recipe.ingredients,
        vec![
            IngredientLine::new("2", "cups", "flour"),
            IngredientLine::new("1 1/2", "cups", "milk"),
        ]
    );

    let mut chain = ResolverChain::default();
    chain.push(Arc::new(SheetResolver::new(Arc::new(UnreachableSheet))));
    chain.push(Arc::new(FoodDatabaseResolver::new(food_db())));
    let nutrition = NutritionAggregator::new(chain)
        .aggregate(&recipe.recipe.ingredients)
        .await
        .unwrap();

    assert_eq!(nutrition.items.len(), 2);
    let flour = &nutrition.items[0];
    assert_eq!(flour.source_name, "Wheat flour, white, all-purpose, enriched, bleached");
    assert_eq!(flour.provenance, Provenance::ExternalDb);
    assert_eq!(flour.grams_estimate, 280.0);
    assert_eq!(flour.nutrients[NutrientField::Calories], 1019.0);
    assert_eq!(nutrition.items[1].grams_estimate, 210.0);
    assert_eq!(nutrition.items[1].nutrients[NutrientField::Calories], 128.0);
    assert_eq!(nutrition.totals[NutrientField::Calories], 1147.0);

    let per_serving = nutrition.per_serving(4);
    assert_eq!(per_serving[NutrientField::Calories], 287.0);
}

#[tokio::test]
async fn test_sheet_rows_take_precedence() {
    let mut nutrients = NutrientVector::zero();
    nutrients[NutrientField::Calories] = 110.0;
    let sheet = StaticSheet::new(vec![SheetRow {
        name: "Milk, oat".to_string(),
        measurement: "cup".to_string(),
        grams: 240.0,
        nutrients,
    }]);
    let mut chain = ResolverChain::default();
    chain.push(Arc::new(SheetResolver::new(Arc::new(sheet))));
    chain.push(Arc::new(FoodDatabaseResolver::new(food_db())));

    let recipe = segment("Latte\n\nIngredients:\n2 cups milk\n\nInstructions:\nSteam the milk.");
    let nutrition = NutritionAggregator::new(chain)
        .aggregate(&recipe.ingredients)
        .await
        .unwrap();

    assert_eq!(nutrition.items.len(), 1);
    assert_eq!(nutrition.items[0].source_name, "Milk, oat");
    assert_eq!(nutrition.items[0].provenance, Provenance::UserSheet);
    assert_eq!(nutrition.items[0].grams_estimate, 480.0);
    assert_eq!(nutrition.totals[NutrientField::Calories], 220.0);
}

#[tokio::test]
async fn test_blocked_fetch_surfaces_user_message() {
    let fetchers: Vec<Box<dyn PageFetcher>> = vec![Box::new(BlockedPage), Box::new(BlockedPage)];
    let chain = FetchChain::new(fetchers);
    let err = fetch_recipe_from_url(&chain, "https://example.com/r").await.unwrap_err();
    assert_eq!(err.to_string(), "Could not fetch the URL. The site may be blocking access.");
}

#[tokio::test]
async fn test_fallback_page_text_is_segmented() {
    let page = "<html><body><nav>Home</nav><h1>Toast</h1><h2>Ingredients</h2><ul><li>2 slices bread</li></ul>\
                <h2>Instructions</h2><p>Toast the bread.</p><footer>(c) Example</footer></body></html>";
    let recipe = fetch_recipe_from_url(&StaticPage(page), "https://example.com/toast")
        .await
        .unwrap();
    assert_eq!(recipe.recipe.title, "Toast");
    assert_eq!(recipe.recipe.ingredients, vec![IngredientLine::new("2", "slices", "bread")]);
    assert_eq!(recipe.recipe.instructions, "Toast the bread.");
    assert_eq!(recipe.servings, "1");
}

#[tokio::test]
async fn test_unreachable_sources_fail_the_whole_call() {
    let mut chain = ResolverChain::default();
    chain.push(Arc::new(SheetResolver::new(Arc::new(UnreachableSheet))));
    let err = NutritionAggregator::new(chain)
        .aggregate(&[IngredientLine::new("1", "", "eggs")])
        .await
        .unwrap_err();
    assert!(matches!(err, NutritionError::SourcesUnavailable { .. }));
}

#[tokio::test]
#[ignore] // hits the live FoodData Central API
async fn test_live_aggregate() {
    let client = build_http_client(Duration::from_secs(15)).unwrap();
    let fdc = FoodDataCentralClient::new(
        client,
        mealprep::api_connection::endpoints::FDC_DEMO_KEY,
        mealprep::api_connection::endpoints::FDC_SEARCH_URL,
    );
    let mut chain = ResolverChain::default();
    chain.push(Arc::new(FoodDatabaseResolver::new(Arc::new(fdc))));
    let nutrition = NutritionAggregator::new(chain)
        .aggregate(&[
            IngredientLine::new("2", "", "eggs"),
            IngredientLine::new("1", "cup", "flour"),
        ])
        .await
        .unwrap();
    assert!(nutrition.totals[NutrientField::Calories] > 0.0);
}
