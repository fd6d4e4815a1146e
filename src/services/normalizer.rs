/**
 * Code Normalizer
 *
 * Maps raw category and status codes to the canonical enums.
 * Backends send these as integers, numeric strings or free-form
 * names (including legacy camelCase tokens). Every function here is
 * total: unknown input lands on the table's fallback value.
 *
 * Matching order:
 * 1. Exact numeric code (integers, integral floats, numeric strings)
 * 2. Alias match, case-insensitive, ignoring whitespace, `_` and `-`
 * 3. Fallback
 */

use crate::types::{parse_timestamp, Category, GeoPoint, RawReport, Report, ReportStatus};
use serde_json::Value;
use tracing::debug;

/// Two-way lookup between wire codes and a canonical value.
pub struct CodeTable<T: 'static> {
    numeric: &'static [(i64, T)],
    aliases: &'static [(&'static str, T)],
    fallback: T,
}

impl<T: Copy + PartialEq + 'static> CodeTable<T> {
    pub const fn new(
        numeric: &'static [(i64, T)],
        aliases: &'static [(&'static str, T)],
        fallback: T,
    ) -> Self {
        Self {
            numeric,
            aliases,
            fallback,
        }
    }

    /// Resolve any JSON value. Never fails.
    pub fn resolve(&self, raw: &Value) -> T {
        match raw {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(integral))
                .and_then(|code| self.by_code(code))
                .unwrap_or(self.fallback),
            Value::String(s) => self.resolve_str(s),
            _ => self.fallback,
        }
    }

    /// Resolve a string token. Never fails.
    pub fn resolve_str(&self, raw: &str) -> T {
        let trimmed = raw.trim();
        let numeric = trimmed
            .parse::<i64>()
            .ok()
            .or_else(|| trimmed.parse::<f64>().ok().and_then(integral));
        if let Some(code) = numeric {
            return self.by_code(code).unwrap_or(self.fallback);
        }
        let key = alias_key(trimmed);
        self.aliases
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|(_, value)| *value)
            .unwrap_or(self.fallback)
    }

    pub fn by_code(&self, code: i64) -> Option<T> {
        self.numeric
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, value)| *value)
    }

    /// Reverse direction: the numeric code for a canonical value.
    pub fn code_of(&self, value: T) -> Option<i64> {
        self.numeric
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(code, _)| *code)
    }

    pub fn fallback(&self) -> T {
        self.fallback
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn alias_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

pub static CATEGORY_CODES: CodeTable<Category> = CodeTable::new(
    &[
        (0, Category::IllegalDump),
        (1, Category::Burning),
        (2, Category::ObstructedDrain),
        (3, Category::HazardousSpill),
        (4, Category::Other),
    ],
    &[
        ("illegaldump", Category::IllegalDump),
        ("basureroclandestino", Category::IllegalDump),
        ("burning", Category::Burning),
        ("quemadebasura", Category::Burning),
        ("obstructeddrain", Category::ObstructedDrain),
        ("drenajeobstruido", Category::ObstructedDrain),
        ("hazardousspill", Category::HazardousSpill),
        ("derramedesustanciaspeligrosas", Category::HazardousSpill),
        ("other", Category::Other),
        ("otro", Category::Other),
    ],
    Category::Other,
);

pub static STATUS_CODES: CodeTable<ReportStatus> = CodeTable::new(
    &[
        (0, ReportStatus::Pending),
        (1, ReportStatus::Approved),
        (2, ReportStatus::Rejected),
    ],
    &[
        ("pending", ReportStatus::Pending),
        ("pendiente", ReportStatus::Pending),
        ("approved", ReportStatus::Approved),
        ("aprobado", ReportStatus::Approved),
        ("rejected", ReportStatus::Rejected),
        ("rechazado", ReportStatus::Rejected),
    ],
    ReportStatus::Pending,
);

/// Normalize a raw category code. Unknown input is `Other`.
pub fn normalize_category(raw: &Value) -> Category {
    CATEGORY_CODES.resolve(raw)
}

/// Normalize a raw status code. Unknown input is `Pending`, never a terminal state.
pub fn normalize_status(raw: &Value) -> ReportStatus {
    STATUS_CODES.resolve(raw)
}

/// Normalize a whole report payload.
pub fn normalize_report(raw: RawReport) -> Report {
    let category = normalize_category(&raw.category);
    let status = normalize_status(&raw.status);
    let location = GeoPoint::from_parts(raw.loc_latitude, raw.loc_longitude);
    if location.is_none() {
        debug!("Report {} has no usable coordinates", raw.id);
    }

    Report {
        id: raw.id,
        location,
        description: raw.description.unwrap_or_default(),
        category,
        status,
        evidence: raw.image_url.filter(|p| !p.trim().is_empty()),
        author_id: raw.user_id,
        created_at: raw.created_at.as_deref().and_then(parse_timestamp),
    }
}
