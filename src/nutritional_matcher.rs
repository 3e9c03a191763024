//! Finds reference nutrition data for one ingredient line.
//!
//! Two lookups exist and they are deliberately different algorithms: the
//! user's reference sheet is searched with a first-match priority cascade,
//! the food database with a weighted score over its candidates. Both are
//! `IngredientResolver`s and a `ResolverChain` tries them in order.

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;

use crate::error::LookupError;
use crate::ingredient_parser::IngredientLine;
use crate::nutrients::NutrientVector;
use crate::recipe_converter::estimate_line_grams;
use crate::search::data_loader::SheetRow;
use crate::search::food_search::{DataQualityTier, FoodCandidate, FoodSearch};
use crate::search::sheet_cache::SheetSource;

lazy_static! {
    static ref SHEET_WORD_SPLIT: Regex = Regex::new(r"[\s_-]+").expect("word split pattern should be valid");
    static ref SEARCH_WORD_SPLIT: Regex = Regex::new(r"[\s,]+").expect("word split pattern should be valid");
}

/// Where a match came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    ExternalDb,
    UserSheet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// Name of the matched reference entry.
    pub source_name: String,
    /// Ingredient name as written in the recipe.
    pub requested_name: String,
    pub grams_estimate: f64,
    /// Absolute amounts for this line, rounded per field.
    pub nutrients: NutrientVector,
    pub provenance: Provenance,
}

/// One strategy for turning an ingredient line into reference nutrition.
/// `Ok(None)` is a clean miss; `Err` means the source itself failed.
#[async_trait]
pub trait IngredientResolver: Send + Sync {
    fn name(&self) -> &'static str;

    async fn resolve(&self, line: &IngredientLine) -> Result<Option<MatchResult>, LookupError>;
}

/// Ordered resolvers, first hit wins.
#[derive(Clone, Default)]
pub struct ResolverChain {
    resolvers: Vec<Arc<dyn IngredientResolver>>,
}

impl ResolverChain {
    pub fn push(&mut self, resolver: Arc<dyn IngredientResolver>) {
        self.resolvers.push(resolver);
    }

    /// Tries each resolver in turn. A failing resolver falls through to the
    /// next one; the chain only reports an error when every resolver failed.
    pub async fn resolve(&self, line: &IngredientLine) -> Result<Option<MatchResult>, LookupError> {
        let mut last_error = None;
        let mut any_answered = false;

        for resolver in &self.resolvers {
            match resolver.resolve(line).await {
                Ok(Some(found)) => {
                    debug!(
                        "'{}' resolved by {} to '{}'",
                        line.ingredient_name,
                        resolver.name(),
                        found.source_name
                    );
                    return Ok(Some(found));
                }
                Ok(None) => any_answered = true,
                Err(e) => {
                    warn!("{} lookup for '{}' failed: {}", resolver.name(), line.ingredient_name, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !any_answered => Err(e),
            _ => Ok(None),
        }
    }
}

/// First row matching `name`, trying in order: exact name, either name a
/// prefix of the other, every query word inside the row name, either name a
/// substring of the other. Comparison is case-insensitive.
pub fn find_sheet_match<'a>(rows: &'a [SheetRow], name: &str) -> Option<&'a SheetRow> {
    let search = name.trim().to_lowercase();
    if search.is_empty() {
        return None;
    }
    let lowered: Vec<String> = rows.iter().map(|r| r.name.to_lowercase()).collect();
    let words: Vec<&str> = SHEET_WORD_SPLIT
        .split(&search)
        .filter(|w| !w.is_empty())
        .collect();

    let search = search.as_str();
    let cascade: [&dyn Fn(&str) -> bool; 4] = [
        &|rn: &str| rn == search,
        &|rn: &str| rn.starts_with(search) || search.starts_with(rn),
        &|rn: &str| words.iter().all(|w| rn.contains(w)),
        &|rn: &str| rn.contains(search) || search.contains(rn),
    ];

    cascade.iter().enumerate().find_map(|(step, matches)| {
        let hit = lowered.iter().position(|rn| matches(rn.as_str()))?;
        debug!("Sheet match for '{}' at step {}: '{}'", search, step + 1, rows[hit].name);
        Some(&rows[hit])
    })
}

/// Looks ingredients up in the user's reference sheet. Sheet values are per
/// one unit of the row's own measurement and scale linearly with quantity.
pub struct SheetResolver {
    sheet: Arc<dyn SheetSource>,
}

impl SheetResolver {
    pub fn new(sheet: Arc<dyn SheetSource>) -> Self {
        Self { sheet }
    }
}

#[async_trait]
impl IngredientResolver for SheetResolver {
    fn name(&self) -> &'static str {
        "reference sheet"
    }

    async fn resolve(&self, line: &IngredientLine) -> Result<Option<MatchResult>, LookupError> {
        let rows = self.sheet.rows().await?;
        let Some(row) = find_sheet_match(&rows, &line.ingredient_name) else {
            return Ok(None);
        };

        let qty = line.effective_quantity();
        Ok(Some(MatchResult {
            source_name: row.name.clone(),
            requested_name: line.ingredient_name.clone(),
            grams_estimate: row.grams * qty,
            nutrients: row.nutrients.scaled(qty).rounded(),
            provenance: Provenance::UserSheet,
        }))
    }
}

/// Recipe names mapped to search terms that land on the plain reference entry.
const ALIASES: &[(&str, &str)] = &[
    ("egg", "egg, whole, raw"),
    ("eggs", "egg, whole, raw"),
    ("butter", "butter, salted"),
    ("unsalted butter", "butter, without salt"),
    ("flour", "flour, wheat, all-purpose"),
    ("all-purpose flour", "flour, wheat, all-purpose, enriched"),
    ("all purpose flour", "flour, wheat, all-purpose, enriched"),
    ("ap flour", "flour, wheat, all-purpose, enriched"),
    ("bread flour", "flour, wheat, bread"),
    ("whole wheat flour", "flour, whole wheat"),
    ("sugar", "sugar, granulated"),
    ("white sugar", "sugar, granulated"),
    ("granulated sugar", "sugar, granulated"),
    ("brown sugar", "sugar, brown"),
    ("powdered sugar", "sugar, powdered"),
    ("confectioners sugar", "sugar, powdered"),
    ("milk", "milk, whole"),
    ("whole milk", "milk, whole, 3.25%"),
    ("skim milk", "milk, nonfat, fluid"),
    ("2% milk", "milk, reduced fat, 2%"),
    ("heavy cream", "cream, heavy whipping"),
    ("cream cheese", "cream cheese, regular"),
    ("sour cream", "sour cream, regular"),
    ("cheddar cheese", "cheese, cheddar"),
    ("mozzarella", "cheese, mozzarella, whole milk"),
    ("parmesan", "cheese, parmesan, hard"),
    ("chocolate chips", "chocolate, chips, semisweet"),
    ("semi-sweet chocolate chips", "chocolate, chips, semisweet"),
    ("cocoa powder", "cocoa, dry powder, unsweetened"),
    ("olive oil", "oil, olive, salad or cooking"),
    ("vegetable oil", "oil, vegetable, soybean"),
    ("canola oil", "oil, canola"),
    ("coconut oil", "oil, coconut"),
    ("salt", "salt, table"),
    ("baking soda", "leavening agents, baking soda"),
    ("baking powder", "leavening agents, baking powder"),
    ("vanilla extract", "vanilla extract"),
    ("vanilla", "vanilla extract"),
    ("honey", "honey"),
    ("maple syrup", "syrups, maple"),
    ("rice", "rice, white, long-grain, regular, raw"),
    ("brown rice", "rice, brown, long-grain, raw"),
    ("pasta", "pasta, dry, enriched"),
    ("spaghetti", "pasta, spaghetti, dry, enriched"),
    ("chicken breast", "chicken, breast, meat only, raw"),
    ("chicken thigh", "chicken, thigh, meat only, raw"),
    ("chicken", "chicken, breast, meat only, raw"),
    ("ground beef", "beef, ground, 80% lean, raw"),
    ("beef", "beef, ground, 80% lean, raw"),
    ("salmon", "fish, salmon, atlantic, raw"),
    ("shrimp", "shrimp, raw"),
    ("bacon", "pork, cured, bacon, raw"),
    ("garlic", "garlic, raw"),
    ("onion", "onion, raw"),
    ("onions", "onion, raw"),
    ("tomato", "tomatoes, red, ripe, raw"),
    ("tomatoes", "tomatoes, red, ripe, raw"),
    ("potato", "potatoes, russet, flesh and skin, raw"),
    ("potatoes", "potatoes, russet, flesh and skin, raw"),
    ("carrot", "carrots, raw"),
    ("carrots", "carrots, raw"),
    ("celery", "celery, raw"),
    ("bell pepper", "peppers, sweet, red, raw"),
    ("spinach", "spinach, raw"),
    ("broccoli", "broccoli, raw"),
    ("lemon juice", "lemon juice, raw"),
    ("lime juice", "lime juice, raw"),
    ("soy sauce", "soy sauce"),
    ("worcestershire sauce", "sauce, worcestershire"),
    ("mayo", "mayonnaise"),
    ("mayonnaise", "mayonnaise"),
    ("ketchup", "catsup"),
    ("mustard", "mustard, prepared, yellow"),
    ("peanut butter", "peanut butter, smooth"),
    ("almonds", "nuts, almonds"),
    ("walnuts", "nuts, walnuts, english"),
    ("pecans", "nuts, pecans"),
    ("oats", "oats, regular and quick, not fortified, dry"),
    ("rolled oats", "oats, regular and quick, not fortified, dry"),
    ("cornstarch", "cornstarch"),
    ("cream of tartar", "cream of tartar"),
    ("yeast", "yeast, baker's, active dry"),
    ("banana", "bananas, raw"),
    ("bananas", "bananas, raw"),
    ("apple", "apples, raw, with skin"),
    ("apples", "apples, raw, with skin"),
    ("blueberries", "blueberries, raw"),
    ("strawberries", "strawberries, raw"),
];

/// Words that mark a prepared or composite food, e.g. "pasta salad" when the
/// recipe asked for pasta.
const PREPARED_FOOD_MARKERS: &[&str] = &[
    "cookie", "cookies", "cake", "bread", "muffin", "pie", "sauce", "soup", "stew", "casserole",
    "mix", "prepared", "frozen", "canned", "restaurant", "fast food", "infant", "baby", "formula",
];

/// Candidate scoring weights. Lower totals are better.
#[derive(Debug, Clone, Copy)]
pub struct MatchWeights {
    /// Per search-term word found in the description.
    pub word_overlap: f64,
    /// Per character of description.
    pub description_length: f64,
    pub foundation_tier: f64,
    pub sr_legacy_tier: f64,
    /// Per prepared-food marker found in the description.
    pub prepared_marker: f64,
    /// When the description mentions "raw".
    pub raw: f64,
}

pub const MATCH_WEIGHTS: MatchWeights = MatchWeights {
    word_overlap: -10.0,
    description_length: 0.1,
    foundation_tier: -20.0,
    sr_legacy_tier: -15.0,
    prepared_marker: 25.0,
    raw: -5.0,
};

/// Search term for an ingredient name: the alias for the name, else the alias
/// for the name without a trailing "s", else the name itself.
pub fn search_term(ingredient_name: &str) -> String {
    let trimmed = ingredient_name.trim();
    let lower = trimmed.to_lowercase();
    let alias = |key: &str| ALIASES.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);

    alias(&lower)
        .or_else(|| lower.strip_suffix('s').and_then(alias))
        .map(str::to_string)
        .unwrap_or_else(|| trimmed.to_string())
}

pub fn score_match(candidate: &FoodCandidate, search_term: &str) -> f64 {
    let w = &MATCH_WEIGHTS;
    let desc = candidate.description.to_lowercase();
    let search = search_term.to_lowercase();

    let mut score = 0.0;
    for word in SEARCH_WORD_SPLIT.split(&search).filter(|w| !w.is_empty()) {
        if desc.contains(word) {
            score += w.word_overlap;
        }
    }
    score += desc.chars().count() as f64 * w.description_length;
    score += match candidate.tier {
        DataQualityTier::Foundation => w.foundation_tier,
        DataQualityTier::SrLegacy => w.sr_legacy_tier,
        _ => 0.0,
    };
    for marker in PREPARED_FOOD_MARKERS {
        if desc.contains(marker) {
            score += w.prepared_marker;
        }
    }
    if desc.contains("raw") {
        score += w.raw;
    }
    score
}

/// Lowest-scoring candidate; on a tie the earlier one is kept.
pub fn best_candidate<'a>(candidates: &'a [FoodCandidate], search_term: &str) -> Option<&'a FoodCandidate> {
    let mut best: Option<(&FoodCandidate, f64)> = None;
    for candidate in candidates {
        let score = score_match(candidate, search_term);
        debug!("  {:>7.1}  {}", score, candidate.description);
        if best.map_or(true, |(_, s)| score < s) {
            best = Some((candidate, score));
        }
    }
    best.map(|(c, _)| c)
}

/// Looks ingredients up in an external food database and picks the best
/// scored candidate. Mass comes from the unit table.
pub struct FoodDatabaseResolver {
    search: Arc<dyn FoodSearch>,
}

impl FoodDatabaseResolver {
    pub fn new(search: Arc<dyn FoodSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl IngredientResolver for FoodDatabaseResolver {
    fn name(&self) -> &'static str {
        "food database"
    }

    async fn resolve(&self, line: &IngredientLine) -> Result<Option<MatchResult>, LookupError> {
        let term = search_term(&line.ingredient_name);
        let candidates = self.search.search(&term).await?;
        debug!("Scoring {} candidates for '{}'", candidates.len(), term);

        let Some(food) = best_candidate(&candidates, &term) else {
            return Ok(None);
        };

        let grams = estimate_line_grams(line);
        Ok(Some(MatchResult {
            source_name: food.description.clone(),
            requested_name: line.ingredient_name.clone(),
            grams_estimate: grams,
            nutrients: food.per_100g.scaled(grams / 100.0).rounded(),
            provenance: Provenance::ExternalDb,
        }))
    }
}
