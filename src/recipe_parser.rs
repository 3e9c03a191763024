//! # Recipe Text Segmenter
//!
//! Heuristic splitter for pasted recipe text: blog copy with explicit
//! "Ingredients" / "Instructions" headings, and heading-less social captions.
//! Parsing is best effort and never fails; blank input yields an empty recipe.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ingredient_parser::{is_ingredient_line, parse_line, IngredientLine};
use crate::text_normalizer::normalize;

lazy_static! {
    static ref HEADING_INGREDIENTS: Regex =
        Regex::new(r"(?i)^ingredients\s*:?$").expect("ingredients heading pattern should be valid");
    static ref HEADING_INSTRUCTIONS: Regex = Regex::new(
        r"(?i)^(?:instructions|directions|steps|method|preparation|how to make(?: it)?)\s*:?$"
    )
    .expect("instructions heading pattern should be valid");
    static ref HEADING_ANY: Regex = Regex::new(
        r"(?i)^(?:ingredients|instructions|directions|steps|method|preparation|how to make(?: it)?|notes?|tips?|nutrition(?: info(?:rmation)?)?|equipment|tools|servings?|yield|source)\s*:?$"
    )
    .expect("section heading pattern should be valid");
    static ref HASHTAG_LINE: Regex = Regex::new(r"^\s*#\w").expect("hashtag pattern should be valid");
    static ref URL_LINE: Regex = Regex::new(r"(?i)^\s*https?://").expect("url pattern should be valid");
    static ref DECORATIVE_LINE: Regex =
        Regex::new(r"^[-=_*~]{3,}\s*$").expect("separator pattern should be valid");
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsedRecipe {
    pub title: String,
    pub ingredients: Vec<IngredientLine>,
    /// Newline-joined, original line order.
    pub instructions: String,
}

fn is_hashtag(line: &str) -> bool {
    HASHTAG_LINE.is_match(line)
}

fn is_url(line: &str) -> bool {
    URL_LINE.is_match(line)
}

fn is_heading(line: &str) -> bool {
    HEADING_ANY.is_match(line)
}

/// The cleaned lines of one input, with helpers for index-based scans.
#[derive(Debug)]
struct SectionScan {
    lines: Vec<String>,
}

impl SectionScan {
    fn new(text: &str) -> Self {
        let lines = normalize(text)
            .split('\n')
            .map(|line| line.trim_end().to_string())
            .filter(|line| !DECORATIVE_LINE.is_match(line))
            .collect();
        Self { lines }
    }

    fn trimmed(&self, index: usize) -> &str {
        self.lines[index].trim()
    }

    fn first_matching(&self, pattern: &Regex) -> Option<usize> {
        (0..self.lines.len()).find(|&i| pattern.is_match(self.trimmed(i)))
    }

    /// Index of the next heading of any kind at or after `from`, else the end.
    fn next_heading(&self, from: usize) -> usize {
        (from..self.lines.len())
            .find(|&i| is_heading(self.trimmed(i)))
            .unwrap_or(self.lines.len())
    }
}

#[derive(Debug, Clone, Copy)]
struct Headings {
    ingredients: Option<usize>,
    instructions: Option<usize>,
}

impl Headings {
    fn locate(scan: &SectionScan) -> Option<Self> {
        let headings = Self {
            ingredients: scan.first_matching(&HEADING_INGREDIENTS),
            instructions: scan.first_matching(&HEADING_INSTRUCTIONS),
        };
        (headings.ingredients.is_some() || headings.instructions.is_some()).then_some(headings)
    }

    fn first(&self) -> usize {
        match (self.ingredients, self.instructions) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => 0,
        }
    }
}

pub fn segment(text: &str) -> ParsedRecipe {
    if text.trim().is_empty() {
        return ParsedRecipe::default();
    }

    let scan = SectionScan::new(text);
    match Headings::locate(&scan) {
        Some(headings) => {
            debug!("Segmenting with headings: {:?}", headings);
            segment_headed(&scan, headings)
        }
        None => {
            debug!("No section headings found, segmenting as freeform caption");
            segment_freeform(&scan)
        }
    }
}

fn segment_headed(scan: &SectionScan, headings: Headings) -> ParsedRecipe {
    ParsedRecipe {
        title: headed_title(scan, headings.first()),
        ingredients: headings
            .ingredients
            .map(|start| headed_ingredients(scan, start))
            .unwrap_or_default(),
        instructions: headings
            .instructions
            .map(|start| headed_instructions(scan, start))
            .unwrap_or_default(),
    }
}

fn headed_title(scan: &SectionScan, first_heading: usize) -> String {
    (0..first_heading)
        .map(|i| scan.trimmed(i))
        .find(|line| !line.is_empty() && !is_url(line) && !is_hashtag(line) && !is_heading(line))
        .unwrap_or_default()
        .to_string()
}

fn headed_ingredients(scan: &SectionScan, heading: usize) -> Vec<IngredientLine> {
    let end = scan.next_heading(heading + 1);
    (heading + 1..end)
        .map(|i| scan.trimmed(i))
        .filter(|line| !line.is_empty() && !is_hashtag(line) && !is_url(line))
        .map(parse_line)
        .collect()
}

fn headed_instructions(scan: &SectionScan, heading: usize) -> String {
    let end = scan.next_heading(heading + 1);
    let kept: Vec<&str> = (heading + 1..end)
        .filter(|&i| !is_hashtag(scan.trimmed(i)))
        .map(|i| scan.lines[i].as_str())
        .collect();
    kept.join("\n").trim().to_string()
}

fn segment_freeform(scan: &SectionScan) -> ParsedRecipe {
    let title_index = (0..scan.lines.len()).find(|&i| {
        let line = scan.trimmed(i);
        !line.is_empty() && !is_url(line) && !is_hashtag(line) && !is_ingredient_line(line)
    });

    let mut ingredients = Vec::new();
    let mut instructions = Vec::new();
    for (i, raw) in scan.lines.iter().enumerate() {
        if Some(i) == title_index {
            continue;
        }
        let line = raw.trim();
        if is_ingredient_line(line) {
            ingredients.push(parse_line(line));
        } else if !is_hashtag(line) {
            instructions.push(raw.as_str());
        }
    }

    ParsedRecipe {
        title: title_index
            .map(|i| scan.trimmed(i).to_string())
            .unwrap_or_default(),
        ingredients,
        instructions: instructions.join("\n").trim().to_string(),
    }
}
