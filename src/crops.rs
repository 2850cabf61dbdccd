use std::fmt;

use serde::{Deserialize, Serialize};

/// Catalog key for a crop, e.g. `CORN`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CropKind(String);

impl CropKind {
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CropKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CropKind {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempRange {
    pub min: u32,
    pub max: u32,
}

impl TempRange {
    pub fn contains(&self, temperature: u32) -> bool {
        (self.min..=self.max).contains(&temperature)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropDefinition {
    pub kind: CropKind,
    #[serde(default)]
    pub icon: String,
    /// Day-advances needed before the crop can be harvested.
    pub growth_time: u32,
    pub value: u64,
    pub cost: u64,
    /// Moisture percentage the crop is tuned for.
    pub water_needs: u32,
    pub temp_range: TempRange,
    #[serde(default)]
    pub description: String,
}

/// Immutable crop table. Order is the order the picker lists kinds in.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct CropCatalog {
    crops: Vec<CropDefinition>,
}

impl CropCatalog {
    pub fn new(crops: Vec<CropDefinition>) -> Self {
        Self { crops }
    }

    pub fn get(&self, kind: &CropKind) -> Option<&CropDefinition> {
        self.crops.iter().find(|crop| &crop.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CropDefinition> {
        self.crops.iter()
    }

    pub fn kinds(&self) -> Vec<CropKind> {
        self.crops.iter().map(|crop| crop.kind.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }
}

impl Default for CropCatalog {
    fn default() -> Self {
        Self::new(default_crops())
    }
}

pub fn default_crops() -> Vec<CropDefinition> {
    vec![
        CropDefinition {
            kind: CropKind::new("CORN"),
            icon: "🌽".into(),
            growth_time: 3,
            value: 100,
            cost: 25,
            water_needs: 60,
            temp_range: TempRange { min: 60, max: 85 },
            description: "Hardy crop, moderate water needs".into(),
        },
        CropDefinition {
            kind: CropKind::new("WHEAT"),
            icon: "🌾".into(),
            growth_time: 2,
            value: 75,
            cost: 15,
            water_needs: 40,
            temp_range: TempRange { min: 55, max: 75 },
            description: "Fast-growing, drought-resistant".into(),
        },
        CropDefinition {
            kind: CropKind::new("TOMATO"),
            icon: "🍅".into(),
            growth_time: 4,
            value: 150,
            cost: 35,
            water_needs: 75,
            temp_range: TempRange { min: 65, max: 90 },
            description: "High value, needs lots of water".into(),
        },
    ]
}
