//! # Ingredient Line Parser
//!
//! Splits one free-text ingredient line into quantity, measurement unit and
//! ingredient name. The grammar is greedy and order-sensitive: the quantity is
//! consumed first, and the unit is only looked for in what the quantity left.

use std::fmt;

use lazy_static::lazy_static;
use log::trace;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Measurement vocabulary, tried in order. Longer spellings come before their
/// abbreviations so `grams` wins over `g`.
const MEASUREMENTS: &[&str] = &[
    r"cups?",
    r"tbsps?",
    r"tablespoons?",
    r"tbs?\.?",
    r"tsps?",
    r"teaspoons?",
    r"ozs?\.?",
    r"ounces?",
    r"lbs?\.?",
    r"pounds?",
    r"grams?",
    r"g\.?",
    r"kgs?\.?",
    r"kilograms?",
    r"mls?\.?",
    r"milliliters?",
    r"liters?",
    r"l\.?",
    r"pints?",
    r"pts?\.?",
    r"quarts?",
    r"qts?\.?",
    r"gallons?",
    r"gal\.?",
    r"pinch(?:es)?",
    r"dash(?:es)?",
    r"bunche?s?",
    r"cloves?",
    r"cans?",
    r"packages?",
    r"pkgs?\.?",
    r"pieces?",
    r"pcs?\.?",
    r"slices?",
    r"sticks?",
    r"heads?",
    r"stalks?",
    r"sprigs?",
    r"handfuls?",
    r"small",
    r"medium",
    r"large",
];

/// Leading quantity: `a/b`, or `a[.b][-c[.d]]` optionally followed by ` b/c`.
pub const QUANTITY_PATTERN: &str = r"^([0-9]+\s*/\s*[0-9]+|[0-9]+(?:\.[0-9]+)?(?:\s*[-–]\s*[0-9]+(?:\.[0-9]+)?)?(?:\s+[0-9]+\s*/\s*[0-9]+)?)\s*";

lazy_static! {
    static ref BULLET: Regex = Regex::new(r"^(?:[-•*▪▸►]\s*)+").expect("bullet pattern should be valid");
    static ref QUANTITY: Regex = Regex::new(QUANTITY_PATTERN).expect("quantity pattern should be valid");
    static ref MEASUREMENT: Regex = Regex::new(&format!(r"(?i)^({})\b\.?\s*", MEASUREMENTS.join("|")))
        .expect("measurement pattern should be valid");
    static ref LEADING_OF: Regex = Regex::new(r"(?i)^(?:of\s+)+").expect("'of' pattern should be valid");
    static ref SLASH_SPACING: Regex = Regex::new(r"\s*/\s*").expect("slash pattern should be valid");
}

/// One ingredient as written in a recipe. All fields default to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IngredientLine {
    pub quantity: String,
    pub measurement: String,
    pub ingredient_name: String,
}

impl IngredientLine {
    pub fn new(quantity: &str, measurement: &str, ingredient_name: &str) -> Self {
        Self {
            quantity: quantity.to_string(),
            measurement: measurement.to_string(),
            ingredient_name: ingredient_name.to_string(),
        }
    }

    /// Lines without a name carry nothing to look up and are skipped downstream.
    pub fn is_blank(&self) -> bool {
        self.ingredient_name.trim().is_empty()
    }

    /// The quantity as a number; unparsable text evaluates to 0.
    pub fn numeric_quantity(&self) -> f64 {
        parse_quantity(&self.quantity)
    }

    /// Multiplier to apply to per-unit reference values. A line that names no
    /// quantity at all counts as one unit.
    pub fn effective_quantity(&self) -> f64 {
        if self.quantity.trim().is_empty() {
            1.0
        } else {
            self.numeric_quantity()
        }
    }
}

impl fmt::Display for IngredientLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [
            self.quantity.as_str(),
            self.measurement.as_str(),
            self.ingredient_name.as_str(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// True when the trimmed line opens with a quantity expression.
pub fn is_ingredient_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && QUANTITY.is_match(trimmed)
}

pub fn parse_line(line: &str) -> IngredientLine {
    let mut text = line.trim();
    if let Some(bullet) = BULLET.find(text) {
        text = &text[bullet.end()..];
    }

    let mut quantity = "";
    if let Some(caps) = QUANTITY.captures(text) {
        quantity = caps.get(1).map_or("", |m| m.as_str().trim());
        text = &text[caps.get(0).map_or(0, |m| m.end())..];
    }

    let mut measurement = "";
    if let Some(caps) = MEASUREMENT.captures(text) {
        measurement = caps
            .get(1)
            .map_or("", |m| m.as_str().trim_end_matches('.').trim());
        text = &text[caps.get(0).map_or(0, |m| m.end())..];
    }

    if let Some(of) = LEADING_OF.find(text) {
        text = &text[of.end()..];
    }

    let parsed = IngredientLine::new(quantity, measurement, text.trim());
    trace!("Parsed {:?} into {:?}", line, parsed);
    parsed
}

fn parse_number(token: &str) -> Option<f64> {
    let value = match token.split_once('/') {
        Some((numerator, denominator)) => {
            let numerator: f64 = numerator.trim().parse().ok()?;
            let denominator: f64 = denominator.trim().parse().ok()?;
            if denominator == 0.0 {
                return None;
            }
            numerator / denominator
        }
        None => token.parse().ok()?,
    };
    value.is_finite().then_some(value)
}

/// Evaluates a quantity expression: integer, decimal, `a/b`, mixed `a b/c`,
/// or a range `a-b` (lower bound). Anything else is 0.
pub fn parse_quantity(text: &str) -> f64 {
    let compact = SLASH_SPACING.replace_all(text.trim(), "/");
    let lower_bound = compact.split(['-', '–']).next().unwrap_or("").trim();
    let parts: Vec<&str> = lower_bound.split_whitespace().collect();
    let value = match parts.as_slice() {
        [single] => parse_number(single),
        [whole, fraction] if !whole.contains('/') && fraction.contains('/') => {
            parse_number(whole).zip(parse_number(fraction)).map(|(w, f)| w + f)
        }
        _ => None,
    };
    value.unwrap_or(0.0)
}
