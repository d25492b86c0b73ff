use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One hospital/date/time-slot offering of one checkup package. Several rows
/// may share a package id and date when multiple hospitals offer it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRow {
    pub package_id: String,
    pub package_name: String,
    pub tests_included: String,
    /// Minimum recommended age; 0 means no minimum.
    pub recommended_age: u32,
    /// Free text, possibly listing several values; matched as a
    /// case-insensitive substring. Empty means any gender.
    pub recommended_gender: String,
    pub medical_history_keywords: String,
    pub hospital_name: String,
    pub date: NaiveDate,
    pub time_slot: String,
}
