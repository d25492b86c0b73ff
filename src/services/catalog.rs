use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::CatalogRow;

/// Read-only, process-lifetime table of checkup offerings. Shared across all
/// sessions without locking.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    rows: Vec<CatalogRow>,
}

impl Catalog {
    pub fn from_rows(rows: Vec<CatalogRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Load the catalog from a CSV file. A missing or unreadable source
    /// yields an empty catalog so every consumer degrades gracefully.
    pub fn load(path: &str) -> Self {
        if !Path::new(path).exists() {
            tracing::warn!(path, "catalog file not found, starting with empty catalog");
            return Self::default();
        }

        match File::open(path)
            .context("failed to open catalog file")
            .and_then(parse_reader)
        {
            Ok(rows) => {
                tracing::info!(path, rows = rows.len(), "catalog loaded");
                Self { rows }
            }
            Err(e) => {
                tracing::error!(error = %e, path, "failed to load catalog, starting empty");
                Self::default()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRow {
    package_id: String,
    package_name: String,
    tests_included: String,
    #[serde(default)]
    recommended_age: String,
    #[serde(default)]
    recommended_gender: String,
    #[serde(default)]
    medical_history: String,
    hospital_name: String,
    date: String,
    time_slot: String,
}

fn parse_reader<R: Read>(reader: R) -> anyhow::Result<Vec<CatalogRow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for record in csv_reader.deserialize::<RawRow>() {
        let raw = record.context("malformed catalog record")?;

        let date = match NaiveDate::parse_from_str(raw.date.trim(), "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                tracing::warn!(
                    package_id = %raw.package_id,
                    date = %raw.date,
                    "skipping catalog row with unparsable date"
                );
                continue;
            }
        };

        // Blank or non-numeric age means no minimum.
        let recommended_age = raw.recommended_age.trim().parse().unwrap_or(0);

        rows.push(CatalogRow {
            package_id: raw.package_id,
            package_name: raw.package_name,
            tests_included: raw.tests_included,
            recommended_age,
            recommended_gender: raw.recommended_gender,
            medical_history_keywords: raw.medical_history,
            hospital_name: raw.hospital_name,
            date,
            time_slot: raw.time_slot,
        });
    }

    Ok(rows)
}
