//! Map marker dispatch.
//!
//! Every report gets exactly one marker. Reports without usable
//! coordinates still get one, with `position: None`, so the caller can skip
//! drawing it instead of placing it at (0, 0).

use crate::types::{Category, MarkerColor, MarkerDescriptor, MarkerIcon, PlacedMarker, Report};
use tracing::debug;

/// Marker used for `Other` and anything the table does not know.
pub const NEUTRAL_MARKER: MarkerDescriptor = MarkerDescriptor {
    icon: MarkerIcon::Question,
    color: MarkerColor::Gray,
};

const MARKER_TABLE: &[(Category, MarkerDescriptor)] = &[
    (
        Category::IllegalDump,
        MarkerDescriptor {
            icon: MarkerIcon::Trash,
            color: MarkerColor::Green,
        },
    ),
    (
        Category::Burning,
        MarkerDescriptor {
            icon: MarkerIcon::Fire,
            color: MarkerColor::Orange,
        },
    ),
    (
        Category::ObstructedDrain,
        MarkerDescriptor {
            icon: MarkerIcon::Water,
            color: MarkerColor::Blue,
        },
    ),
    (
        Category::HazardousSpill,
        MarkerDescriptor {
            icon: MarkerIcon::Biohazard,
            color: MarkerColor::Red,
        },
    ),
];

/// Descriptor for a category.
pub fn marker_for(category: Category) -> MarkerDescriptor {
    MARKER_TABLE
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, descriptor)| *descriptor)
        .unwrap_or(NEUTRAL_MARKER)
}

/// One marker per report, in input order.
pub fn dispatch<'a, I>(reports: I) -> Vec<PlacedMarker>
where
    I: IntoIterator<Item = &'a Report>,
{
    let markers: Vec<PlacedMarker> = reports
        .into_iter()
        .map(|report| PlacedMarker {
            report_id: report.id,
            category: report.category,
            descriptor: marker_for(report.category),
            position: report.location,
        })
        .collect();

    let unplaced = markers.iter().filter(|m| !m.is_renderable()).count();
    if unplaced > 0 {
        debug!(
            "Dispatched {} markers, {} without coordinates",
            markers.len(),
            unplaced
        );
    }
    markers
}

/// Only the markers that can be drawn.
pub fn renderable(markers: &[PlacedMarker]) -> impl Iterator<Item = &PlacedMarker> {
    markers.iter().filter(|m| m.is_renderable())
}

/// Legend entries (one per non-neutral category).
pub fn legend() -> Vec<(Category, MarkerDescriptor)> {
    MARKER_TABLE.to_vec()
}
