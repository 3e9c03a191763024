//! Converts a recipe quantity and measurement into an estimated mass in grams.
//!
//! The table is deliberately coarse: a cup is priced as a cup of flour, a
//! piece as 50 g. Counts, size words and anything unrecognised are 100 g each.

use crate::ingredient_parser::IngredientLine;

pub const DEFAULT_GRAMS_PER_UNIT: f64 = 100.0;

const GRAMS_PER_UNIT: &[(&str, f64)] = &[
    ("g", 1.0),
    ("gram", 1.0),
    ("grams", 1.0),
    ("kg", 1000.0),
    ("kgs", 1000.0),
    ("kilogram", 1000.0),
    ("kilograms", 1000.0),
    ("oz", 28.35),
    ("ozs", 28.35),
    ("ounce", 28.35),
    ("ounces", 28.35),
    ("lb", 453.6),
    ("lbs", 453.6),
    ("pound", 453.6),
    ("pounds", 453.6),
    ("cup", 140.0),
    ("cups", 140.0),
    ("tbsp", 15.0),
    ("tbsps", 15.0),
    ("tbs", 15.0),
    ("tb", 15.0),
    ("tablespoon", 15.0),
    ("tablespoons", 15.0),
    ("tsp", 5.0),
    ("tsps", 5.0),
    ("teaspoon", 5.0),
    ("teaspoons", 5.0),
    ("ml", 1.0),
    ("mls", 1.0),
    ("milliliter", 1.0),
    ("milliliters", 1.0),
    ("l", 1000.0),
    ("liter", 1000.0),
    ("liters", 1000.0),
    ("pint", 473.0),
    ("pints", 473.0),
    ("pt", 473.0),
    ("quart", 946.0),
    ("quarts", 946.0),
    ("qt", 946.0),
    ("gallon", 3785.0),
    ("gallons", 3785.0),
    ("gal", 3785.0),
    ("pinch", 0.5),
    ("pinches", 0.5),
    ("dash", 0.5),
    ("dashes", 0.5),
    ("clove", 3.0),
    ("cloves", 3.0),
    ("slice", 30.0),
    ("slices", 30.0),
    ("piece", 50.0),
    ("pieces", 50.0),
    ("can", 400.0),
    ("cans", 400.0),
    ("stick", 113.0),
    ("sticks", 113.0),
];

/// Grams represented by one of `measurement`, if the unit is in the table.
pub fn grams_per_unit(measurement: &str) -> Option<f64> {
    let unit = measurement.trim().trim_end_matches('.').to_lowercase();
    GRAMS_PER_UNIT
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, grams)| *grams)
}

/// `quantity * grams_per_unit(measurement)`, or `quantity * 100` when the
/// measurement is blank, a size word or unknown.
pub fn estimate_grams(quantity: f64, measurement: &str) -> f64 {
    quantity * grams_per_unit(measurement).unwrap_or(DEFAULT_GRAMS_PER_UNIT)
}

/// Grams for a whole ingredient line; a line without a quantity is one unit.
pub fn estimate_line_grams(line: &IngredientLine) -> f64 {
    estimate_grams(line.effective_quantity(), &line.measurement)
}
