//! Map marker descriptors.

use super::{Category, GeoPoint, ReportId};
use serde::Serialize;

/// Marker icon identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerIcon {
    Trash,
    Fire,
    Water,
    Biohazard,
    Question,
}

impl MarkerIcon {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerIcon::Trash => "trash",
            MarkerIcon::Fire => "fire",
            MarkerIcon::Water => "water",
            MarkerIcon::Biohazard => "biohazard",
            MarkerIcon::Question => "question",
        }
    }
}

/// Colour token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerColor {
    Green,
    Orange,
    Blue,
    Red,
    Purple,
    Gray,
}

impl MarkerColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerColor::Green => "green",
            MarkerColor::Orange => "orange",
            MarkerColor::Blue => "blue",
            MarkerColor::Red => "red",
            MarkerColor::Purple => "purple",
            MarkerColor::Gray => "gray",
        }
    }
}

/// Icon plus colour for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MarkerDescriptor {
    pub icon: MarkerIcon,
    pub color: MarkerColor,
}

/// A marker for one report. `position` is `None` when the report has no
/// usable coordinates; the caller should not draw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedMarker {
    pub report_id: ReportId,
    pub category: Category,
    pub descriptor: MarkerDescriptor,
    pub position: Option<GeoPoint>,
}

impl PlacedMarker {
    pub fn is_renderable(&self) -> bool {
        self.position.is_some()
    }
}
