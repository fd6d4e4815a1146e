//! Canonical hazard taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical report category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    IllegalDump,
    Burning,
    ObstructedDrain,
    HazardousSpill,
    Other,
}

impl Category {
    /// All categories in code order.
    pub const ALL: [Category; 5] = [
        Category::IllegalDump,
        Category::Burning,
        Category::ObstructedDrain,
        Category::HazardousSpill,
        Category::Other,
    ];

    /// Stable numeric code used by the backend.
    pub fn code(&self) -> i64 {
        match self {
            Category::IllegalDump => 0,
            Category::Burning => 1,
            Category::ObstructedDrain => 2,
            Category::HazardousSpill => 3,
            Category::Other => 4,
        }
    }

    /// Stable string code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::IllegalDump => "IllegalDump",
            Category::Burning => "Burning",
            Category::ObstructedDrain => "ObstructedDrain",
            Category::HazardousSpill => "HazardousSpill",
            Category::Other => "Other",
        }
    }

    /// Human label shown on cards and popups.
    pub fn label(&self) -> &'static str {
        match self {
            Category::IllegalDump => "Illegal dump",
            Category::Burning => "Waste burning",
            Category::ObstructedDrain => "Obstructed drain",
            Category::HazardousSpill => "Hazardous spill",
            Category::Other => "Other report",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
