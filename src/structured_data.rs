//! # Structured-Data Extractor
//!
//! Turns a fetched recipe page into the same shape the text segmenter
//! produces. Schema.org `Recipe` JSON-LD is preferred; pages without it are
//! reduced to visible text and segmented heuristically.

use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api_connection::connection::PageFetcher;
use crate::error::FetchError;
use crate::ingredient_parser::{parse_line, IngredientLine};
use crate::recipe_parser::{segment, ParsedRecipe};
use crate::text_normalizer::normalize_fractions;

lazy_static! {
    static ref JSONLD_SELECTOR: Selector =
        Selector::parse(r#"script[type="application/ld+json"]"#).expect("JSON-LD selector should be valid");
    static ref BODY_SELECTOR: Selector = Selector::parse("body").expect("body selector should be valid");
    static ref ISO_DURATION: Regex = Regex::new(r"(?i)^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$")
        .expect("duration pattern should be valid");
    static ref FIRST_INTEGER: Regex = Regex::new(r"(\d+)").expect("integer pattern should be valid");
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t]+").expect("space pattern should be valid");
}

/// Elements whose text never belongs to the recipe.
const NOISE_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "footer", "header", "aside",
];

/// Class names marking advertising and sidebar blocks.
const NOISE_CLASSES: &[&str] = &["ad", "ads", "advert", "advertisement", "sidebar"];

/// Elements after which a line break is inserted in the extracted text.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "li", "br", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "section", "article",
    "ul", "ol", "table", "blockquote", "pre",
];

/// A recipe imported from a web page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportedRecipe {
    #[serde(flatten)]
    pub recipe: ParsedRecipe,
    pub description: String,
    pub servings: String,
    pub prep_time: String,
    pub cook_time: String,
    pub source_url: String,
}

/// Fetches `url` through `fetcher` and extracts a recipe from the page.
/// A fetch failure is the only error; extraction itself never fails.
pub async fn fetch_recipe_from_url(
    fetcher: &dyn PageFetcher,
    url: &str,
) -> Result<ImportedRecipe, FetchError> {
    let html = fetcher.fetch_text(url).await?;
    info!("Fetched {} ({} bytes)", url, html.len());
    Ok(extract_from_html(&html, url))
}

pub fn extract_from_html(html: &str, source_url: &str) -> ImportedRecipe {
    let document = Html::parse_document(html);

    if let Some(recipe) = find_jsonld_recipe(&document) {
        info!("Using JSON-LD recipe data for {}", source_url);
        return recipe_from_jsonld(&recipe, source_url);
    }

    info!("No JSON-LD recipe in {}, falling back to page text", source_url);
    let text = visible_text(&document);
    ImportedRecipe {
        recipe: segment(&text),
        servings: "1".to_string(),
        source_url: source_url.to_string(),
        ..Default::default()
    }
}

fn is_recipe_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(kind)) => kind == "Recipe",
        Some(Value::Array(kinds)) => kinds.iter().any(|k| k.as_str() == Some("Recipe")),
        _ => false,
    }
}

/// First Recipe object across all JSON-LD blocks. One level of `@graph`
/// wrapping and top-level arrays are understood; malformed blocks are skipped.
fn find_jsonld_recipe(document: &Html) -> Option<Value> {
    for script in document.select(&JSONLD_SELECTOR) {
        let raw: String = script.text().collect();
        let data: Value = match serde_json::from_str(raw.trim()) {
            Ok(data) => data,
            Err(e) => {
                debug!("Skipping malformed JSON-LD block: {}", e);
                continue;
            }
        };

        let data = match data.get("@graph") {
            Some(graph) => graph.clone(),
            None => data,
        };

        let found = match data {
            Value::Array(items) => items.into_iter().find(is_recipe_type),
            other if is_recipe_type(&other) => Some(other),
            _ => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

fn recipe_from_jsonld(ld: &Value, source_url: &str) -> ImportedRecipe {
    let text_field = |key: &str| ld.get(key).and_then(Value::as_str).unwrap_or_default().to_string();

    ImportedRecipe {
        recipe: ParsedRecipe {
            title: text_field("name"),
            ingredients: normalize_ingredients(ld.get("recipeIngredient")),
            instructions: normalize_instructions(ld.get("recipeInstructions")),
        },
        description: text_field("description"),
        servings: normalize_servings(ld.get("recipeYield")),
        prep_time: ld
            .get("prepTime")
            .and_then(Value::as_str)
            .map(format_iso_duration)
            .unwrap_or_default(),
        cook_time: ld
            .get("cookTime")
            .and_then(Value::as_str)
            .map(format_iso_duration)
            .unwrap_or_default(),
        source_url: source_url.to_string(),
    }
}

/// Strings pass through and numbers are printed; anything else is empty.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// First run of digits in the yield, else the raw yield text.
pub fn normalize_servings(raw: Option<&Value>) -> String {
    let text = match raw {
        Some(Value::Array(items)) => items.first().map(scalar_text).unwrap_or_default(),
        Some(value) => scalar_text(value),
        None => String::new(),
    };
    match FIRST_INTEGER.captures(&text) {
        Some(caps) => caps[1].to_string(),
        None => text,
    }
}

/// `PT1H30M` → `1 hr 30 min`. Zero components are omitted; anything that is
/// not a `PT#H#M#S` duration becomes an empty string.
pub fn format_iso_duration(iso: &str) -> String {
    let Some(caps) = ISO_DURATION.captures(iso.trim()) else {
        return String::new();
    };
    let mut parts = Vec::new();
    for (index, unit) in [(1, "hr"), (2, "min"), (3, "sec")] {
        let amount: u64 = caps
            .get(index)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        if amount > 0 {
            parts.push(format!("{} {}", amount, unit));
        }
    }
    parts.join(" ")
}

fn normalize_ingredients(raw: Option<&Value>) -> Vec<IngredientLine> {
    let Some(Value::Array(items)) = raw else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| {
            let text = match item {
                Value::String(s) => s.as_str(),
                other => other.get("text").and_then(Value::as_str).unwrap_or_default(),
            };
            parse_line(&normalize_fractions(text))
        })
        .collect()
}

fn step_text(step: &Value) -> String {
    match step {
        Value::String(s) => s.trim().to_string(),
        other => other
            .get("text")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .or_else(|| other.get("name").and_then(Value::as_str))
            .unwrap_or_default()
            .trim()
            .to_string(),
    }
}

/// Flattens a string, a list of strings, or a list of HowToStep/HowToSection
/// objects into newline-joined text. Sections contribute their name as a
/// heading line followed by their steps.
pub fn normalize_instructions(raw: Option<&Value>) -> String {
    match raw {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                if item.get("@type").and_then(Value::as_str) == Some("HowToSection") {
                    let mut lines = Vec::new();
                    if let Some(name) = item.get("name").and_then(Value::as_str) {
                        if !name.trim().is_empty() {
                            lines.push(name.trim().to_string());
                        }
                    }
                    if let Some(Value::Array(steps)) = item.get("itemListElement") {
                        lines.extend(steps.iter().map(step_text).filter(|s| !s.is_empty()));
                    }
                    lines.join("\n")
                } else {
                    step_text(item)
                }
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => scalar_text(other),
    }
}

fn is_noise(element: &ElementRef) -> bool {
    let el = element.value();
    NOISE_ELEMENTS.contains(&el.name())
        || el.classes().any(|class| NOISE_CLASSES.contains(&class.to_ascii_lowercase().as_str()))
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if is_noise(&child_element) {
                continue;
            }
            collect_text(child_element, out);
            if BLOCK_ELEMENTS.contains(&child_element.value().name()) {
                out.push('\n');
            }
        } else if let Node::Text(text) = child.value() {
            out.push_str(text);
        }
    }
}

/// Visible body text with noise elements removed and horizontal whitespace
/// collapsed. Line breaks are kept so the segmenter can see lines.
fn visible_text(document: &Html) -> String {
    let root = document
        .select(&BODY_SELECTOR)
        .next()
        .unwrap_or_else(|| document.root_element());
    let mut text = String::new();
    collect_text(root, &mut text);
    HORIZONTAL_SPACE.replace_all(&text, " ").into_owned()
}
