//! Energy category tables and the classification result.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One energy category and the feature targets it scores against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyCategory {
    pub label: String,
    /// Normalised loudness target, 0 to 1.
    pub level: f32,
    /// Typical tempo in BPM.
    pub tempo: f32,
    /// Normalised brightness target, 0 to 1.
    pub brightness: f32,
}

impl EnergyCategory {
    pub fn new(label: impl Into<String>, level: f32, tempo: f32, brightness: f32) -> Self {
        Self {
            label: label.into(),
            level,
            tempo,
            brightness,
        }
    }
}

/// Built-in category schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryScheme {
    /// Chill, Groove, Club
    #[default]
    ThreeLevel,
    /// Chill Vibe, Lounge, Groove, Party, Club Rager
    FiveLevel,
}

impl CategoryScheme {
    pub fn table(self) -> CategoryTable {
        match self {
            CategoryScheme::ThreeLevel => CategoryTable::three_level(),
            CategoryScheme::FiveLevel => CategoryTable::five_level(),
        }
    }
}

/// Ordered category list; a category's class id is its index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCategoryTable")]
pub struct CategoryTable {
    categories: Vec<EnergyCategory>,
}

#[derive(Deserialize)]
struct RawCategoryTable {
    categories: Vec<EnergyCategory>,
}

impl TryFrom<RawCategoryTable> for CategoryTable {
    type Error = &'static str;

    fn try_from(raw: RawCategoryTable) -> Result<Self, Self::Error> {
        Self::new(raw.categories).ok_or("category table must be non-empty with unique labels")
    }
}

impl CategoryTable {
    /// Returns `None` for an empty list or when two categories share a label.
    pub fn new(categories: Vec<EnergyCategory>) -> Option<Self> {
        if categories.is_empty() {
            return None;
        }
        let mut labels = BTreeSet::new();
        if !categories.iter().all(|c| labels.insert(c.label.as_str())) {
            return None;
        }
        Some(Self { categories })
    }

    pub fn three_level() -> Self {
        Self {
            categories: vec![
                EnergyCategory::new("Chill", 0.2, 85.0, 0.1),
                EnergyCategory::new("Groove", 0.5, 118.0, 0.25),
                EnergyCategory::new("Club", 0.85, 135.0, 0.45),
            ],
        }
    }

    pub fn five_level() -> Self {
        Self {
            categories: vec![
                EnergyCategory::new("Chill Vibe", 0.1, 80.0, 0.08),
                EnergyCategory::new("Lounge", 0.3, 100.0, 0.15),
                EnergyCategory::new("Groove", 0.5, 118.0, 0.25),
                EnergyCategory::new("Party", 0.7, 128.0, 0.35),
                EnergyCategory::new("Club Rager", 0.9, 140.0, 0.5),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, class_id: usize) -> Option<&EnergyCategory> {
        self.categories.get(class_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnergyCategory> {
        self.categories.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.label.as_str()).collect()
    }

    /// Class id of the neutral category.
    pub fn middle(&self) -> usize {
        self.categories.len() / 2
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::three_level()
    }
}

/// Result of energy classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyAnalysis {
    pub energy_level: String,
    pub confidence: f32,
    pub class_id: usize,
    /// Label to probability; values sum to 1.
    pub probabilities: BTreeMap<String, f32>,
}

impl EnergyAnalysis {
    /// Build a result from per-category probabilities in table order.
    ///
    /// The winner is the first maximum.
    pub fn from_probabilities(table: &CategoryTable, probabilities: &[f32], confidence: f32) -> Self {
        let class_id = probabilities
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, &p)| {
                if p > best.1 {
                    (i, p)
                } else {
                    best
                }
            })
            .0;

        Self {
            energy_level: table
                .get(class_id)
                .map(|c| c.label.clone())
                .unwrap_or_default(),
            confidence,
            class_id,
            probabilities: table
                .iter()
                .zip(probabilities)
                .map(|(c, &p)| (c.label.clone(), p))
                .collect(),
        }
    }

    /// Neutral result: middle category at 0.5, the rest sharing the remainder.
    pub fn fallback(table: &CategoryTable) -> Self {
        let n = table.len();
        let middle = table.middle();
        let probabilities: Vec<f32> = if n <= 1 {
            vec![1.0; n]
        } else {
            let rest = 0.5 / (n - 1) as f32;
            (0..n).map(|i| if i == middle { 0.5 } else { rest }).collect()
        };
        let mut analysis = Self::from_probabilities(table, &probabilities, 0.5);
        analysis.class_id = middle;
        if let Some(category) = table.get(middle) {
            analysis.energy_level = category.label.clone();
        }
        analysis
    }

    pub fn probability(&self, label: &str) -> Option<f32> {
        self.probabilities.get(label).copied()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
