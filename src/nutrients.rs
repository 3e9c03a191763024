//! Tracked nutrients and the fixed-shape vector that carries them.
//!
//! Every vector holds every field; absent data is 0. Each field rounds to its
//! own number of decimals, and rounding is always applied by the producer of a
//! final value, never to intermediate sums.

use std::ops::{AddAssign, Index, IndexMut};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NutrientField {
    Calories,
    Protein,
    Carbs,
    Fat,
    SaturatedFat,
    Sugar,
    AddedSugar,
    Fiber,
    Sodium,
    Potassium,
    Calcium,
    Iron,
    Magnesium,
    Zinc,
    VitaminB12,
    VitaminC,
    Leucine,
    Omega3,
}

/// Static description of one nutrient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NutrientInfo {
    pub field: NutrientField,
    /// JSON key.
    pub key: &'static str,
    pub label: &'static str,
    /// FoodData Central nutrient id, when the database reports this nutrient.
    pub fdc_id: Option<u32>,
    pub unit: &'static str,
    pub decimals: u32,
}

pub const NUTRIENT_COUNT: usize = 18;

pub static NUTRIENTS: [NutrientInfo; NUTRIENT_COUNT] = [
    info(NutrientField::Calories, "calories", "Calories", Some(1008), "", 0),
    info(NutrientField::Protein, "protein", "Protein", Some(1003), "g", 1),
    info(NutrientField::Carbs, "carbs", "Carbs", Some(1005), "g", 1),
    info(NutrientField::Fat, "fat", "Fat", Some(1004), "g", 1),
    info(NutrientField::SaturatedFat, "saturatedFat", "Saturated Fat", Some(1258), "g", 1),
    info(NutrientField::Sugar, "sugar", "Sugar", Some(2000), "g", 1),
    info(NutrientField::AddedSugar, "addedSugar", "Added Sugar", Some(1235), "g", 1),
    info(NutrientField::Fiber, "fiber", "Fiber", Some(1079), "g", 1),
    info(NutrientField::Sodium, "sodium", "Salt", Some(1093), "mg", 0),
    info(NutrientField::Potassium, "potassium", "Potassium", Some(1092), "mg", 0),
    info(NutrientField::Calcium, "calcium", "Calcium", Some(1087), "mg", 0),
    info(NutrientField::Iron, "iron", "Iron", Some(1089), "mg", 1),
    info(NutrientField::Magnesium, "magnesium", "Magnesium", Some(1090), "mg", 0),
    info(NutrientField::Zinc, "zinc", "Zinc", Some(1095), "mg", 1),
    info(NutrientField::VitaminB12, "vitaminB12", "B12", Some(1178), "µg", 2),
    info(NutrientField::VitaminC, "vitaminC", "Vitamin C", Some(1162), "mg", 1),
    info(NutrientField::Leucine, "leucine", "Leucine", Some(1213), "g", 2),
    info(NutrientField::Omega3, "omega3", "Omega-3", None, "g", 2),
];

const fn info(
    field: NutrientField,
    key: &'static str,
    label: &'static str,
    fdc_id: Option<u32>,
    unit: &'static str,
    decimals: u32,
) -> NutrientInfo {
    NutrientInfo {
        field,
        key,
        label,
        fdc_id,
        unit,
        decimals,
    }
}

impl NutrientField {
    pub const ALL: [NutrientField; NUTRIENT_COUNT] = [
        NutrientField::Calories,
        NutrientField::Protein,
        NutrientField::Carbs,
        NutrientField::Fat,
        NutrientField::SaturatedFat,
        NutrientField::Sugar,
        NutrientField::AddedSugar,
        NutrientField::Fiber,
        NutrientField::Sodium,
        NutrientField::Potassium,
        NutrientField::Calcium,
        NutrientField::Iron,
        NutrientField::Magnesium,
        NutrientField::Zinc,
        NutrientField::VitaminB12,
        NutrientField::VitaminC,
        NutrientField::Leucine,
        NutrientField::Omega3,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn info(self) -> &'static NutrientInfo {
        &NUTRIENTS[self.index()]
    }

    pub fn from_fdc_id(id: u32) -> Option<NutrientField> {
        NUTRIENTS
            .iter()
            .find(|n| n.fdc_id == Some(id))
            .map(|n| n.field)
    }
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NutrientVector {
    values: [f64; NUTRIENT_COUNT],
}

impl NutrientVector {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, field: NutrientField) -> f64 {
        self.values[field.index()]
    }

    pub fn set(&mut self, field: NutrientField, value: f64) {
        self.values[field.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (NutrientField, f64)> + '_ {
        NutrientField::ALL.iter().map(move |&field| (field, self.get(field)))
    }

    pub fn scaled(&self, factor: f64) -> Self {
        let mut out = *self;
        out.values.iter_mut().for_each(|v| *v *= factor);
        out
    }

    /// Each field rounded to its own precision.
    pub fn rounded(&self) -> Self {
        let mut out = *self;
        for field in NutrientField::ALL {
            out.set(field, round_to(self.get(field), field.info().decimals));
        }
        out
    }

    /// Builds a vector from `(nutrientId, value)` pairs; unknown ids are ignored
    /// and the first value reported for an id wins.
    pub fn from_fdc_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, f64)>,
    {
        let mut seen = [false; NUTRIENT_COUNT];
        let mut out = Self::zero();
        for (id, value) in pairs {
            if let Some(field) = NutrientField::from_fdc_id(id) {
                if !seen[field.index()] {
                    seen[field.index()] = true;
                    out.set(field, value);
                }
            }
        }
        out
    }
}

impl Index<NutrientField> for NutrientVector {
    type Output = f64;

    fn index(&self, field: NutrientField) -> &f64 {
        &self.values[field.index()]
    }
}

impl IndexMut<NutrientField> for NutrientVector {
    fn index_mut(&mut self, field: NutrientField) -> &mut f64 {
        &mut self.values[field.index()]
    }
}

impl AddAssign<&NutrientVector> for NutrientVector {
    fn add_assign(&mut self, other: &NutrientVector) {
        for (value, addend) in self.values.iter_mut().zip(other.values.iter()) {
            *value += addend;
        }
    }
}

impl Serialize for NutrientVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(NUTRIENT_COUNT))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.info().key, &value)?;
        }
        map.end()
    }
}
