use anyhow::{Context, Result};
use csv::ReaderBuilder;
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use std::io::Read;
use std::path::Path;

use crate::nutrients::{NutrientField, NutrientVector};

/// Rows above the data: recipe names, daily values, column titles.
const HEADER_ROWS: usize = 3;

// Column indices (0-based) in the published sheet.
const INGREDIENT_COL: usize = 7;
const GRAMS_COL: usize = 8;
const MEASUREMENT_COL: usize = 9;

const NUTRIENT_COLS: &[(NutrientField, usize)] = &[
    (NutrientField::Protein, 10),
    (NutrientField::Carbs, 11),
    (NutrientField::Fat, 12),
    (NutrientField::Sugar, 13),
    (NutrientField::Sodium, 14),
    (NutrientField::Potassium, 15),
    (NutrientField::VitaminB12, 16),
    (NutrientField::VitaminC, 17),
    (NutrientField::Magnesium, 18),
    (NutrientField::Fiber, 19),
    (NutrientField::Zinc, 20),
    (NutrientField::Iron, 21),
    (NutrientField::Calcium, 22),
    (NutrientField::Calories, 23),
    (NutrientField::AddedSugar, 24),
    (NutrientField::SaturatedFat, 25),
    (NutrientField::Leucine, 26),
    (NutrientField::Omega3, 27),
];

lazy_static! {
    static ref LEADING_NUMBER: Regex =
        Regex::new(r"^[-+]?(?:\d+\.?\d*|\.\d+)").expect("number pattern should be valid");
}

/// One ingredient in the user's reference sheet. Nutrient values are for one
/// unit of `measurement`, which weighs `grams`.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub name: String,
    pub measurement: String,
    pub grams: f64,
    pub nutrients: NutrientVector,
}

/// Reads the numeric prefix of a cell the way spreadsheet exports tend to need
/// (`"12g"` is 12). Blank or non-numeric cells are 0.
fn parse_cell(s: Option<&str>) -> f64 {
    s.and_then(|s| LEADING_NUMBER.find(s.trim()))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

pub fn parse_sheet_csv<R: Read>(reader: R) -> Result<Vec<SheetRow>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (row_index, result) in rdr.records().enumerate().skip(HEADER_ROWS) {
        let record = result.with_context(|| format!("Failed to read sheet record at row {}", row_index + 1))?;

        let name = record.get(INGREDIENT_COL).unwrap_or_default().trim().to_string();
        if name.is_empty() {
            continue;
        }

        let mut nutrients = NutrientVector::zero();
        for &(field, col) in NUTRIENT_COLS {
            nutrients[field] = parse_cell(record.get(col));
        }

        rows.push(SheetRow {
            name,
            measurement: record.get(MEASUREMENT_COL).unwrap_or_default().trim().to_string(),
            grams: parse_cell(record.get(GRAMS_COL)),
            nutrients,
        });
    }

    debug!("Parsed {} reference sheet rows", rows.len());
    Ok(rows)
}

pub fn load_sheet_rows(csv_path: &Path) -> Result<Vec<SheetRow>> {
    if !csv_path.exists() {
        return Err(anyhow::anyhow!("Reference sheet CSV not found at: {:?}", csv_path));
    }

    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open reference sheet CSV at {:?}", csv_path))?;
    let rows = parse_sheet_csv(file)?;
    if rows.is_empty() {
        warn!("Reference sheet {:?} contains no ingredient rows", csv_path);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// A data row with the ingredient block starting at column 7.
    fn sheet_line(name: &str, grams: &str, measurement: &str, values: &[&str]) -> String {
        let mut cells = vec![""; 7];
        cells.extend([name, grams, measurement]);
        cells.extend(values);
        cells
            .iter()
            .map(|c| if c.contains(',') { format!("\"{}\"", c) } else { c.to_string() })
            .collect::<Vec<_>>()
            .join(",")
    }

    fn create_test_csv_file() -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "Recipes,Pancakes,Chili")?;
        writeln!(file, "Daily values,,")?;
        writeln!(file, ",,,,,,,Ingredient,Grams,Measurement,Protein,Carbs,Fat")?;
        writeln!(
            file,
            "{}",
            sheet_line(
                "Eggs, large",
                "50",
                "egg",
                &["6.3", "0.4", "4.8", "0.2", "71", "69", "0.45", "0", "6", "0", "0.6", "0.9", "28", "72", "0", "1.6", "0.54", "0.04"]
            )
        )?;
        writeln!(file, "{}", sheet_line("Oats", "40", "cup(s)", &["5", "27g", "", "n/a"]))?;
        writeln!(file, "{}", sheet_line("", "10", "g", &["1"]))?;
        writeln!(file)?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_load_sheet_rows_success() -> Result<()> {
        let file = create_test_csv_file()?;
        let rows = load_sheet_rows(file.path())?;

        assert_eq!(rows.len(), 2); // blank-name row skipped

        let eggs = &rows[0];
        assert_eq!(eggs.name, "Eggs, large");
        assert_eq!(eggs.measurement, "egg");
        assert_eq!(eggs.grams, 50.0);
        assert_eq!(eggs.nutrients[NutrientField::Protein], 6.3);
        assert_eq!(eggs.nutrients[NutrientField::Calories], 72.0);
        assert_eq!(eggs.nutrients[NutrientField::Leucine], 0.54);
        assert_eq!(eggs.nutrients[NutrientField::Omega3], 0.04);

        let oats = &rows[1];
        assert_eq!(oats.nutrients[NutrientField::Protein], 5.0);
        assert_eq!(oats.nutrients[NutrientField::Carbs], 27.0);
        assert_eq!(oats.nutrients[NutrientField::Fat], 0.0);
        assert_eq!(oats.nutrients[NutrientField::Sugar], 0.0);
        assert_eq!(oats.nutrients[NutrientField::Calories], 0.0);
        Ok(())
    }

    #[test]
    fn test_headers_only_sheet_is_empty() -> Result<()> {
        let data = "a\nb\nc\n";
        let rows = parse_sheet_csv(data.as_bytes())?;
        assert!(rows.is_empty());
        Ok(())
    }

    #[test]
    fn test_load_sheet_rows_file_not_found() {
        let path = Path::new("this_sheet_does_not_exist.csv");
        let result = load_sheet_rows(path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Reference sheet CSV not found"));
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell(Some(" 12.5 ")), 12.5);
        assert_eq!(parse_cell(Some("27g")), 27.0);
        assert_eq!(parse_cell(Some(".5")), 0.5);
        assert_eq!(parse_cell(Some("n/a")), 0.0);
        assert_eq!(parse_cell(None), 0.0);
    }
}
