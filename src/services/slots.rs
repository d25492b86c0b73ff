use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::AlternativeSlot;
use crate::services::catalog::Catalog;

#[derive(Debug, Clone, PartialEq)]
pub struct SlotOffer {
    pub hospital_name: String,
    pub appointment_date: NaiveDate,
    pub time_slot: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlotResolution {
    /// An exact-date opening exists; the first matching row wins.
    Confirmed(SlotOffer),
    /// No exact match, but future openings exist (at most five, soonest
    /// first).
    Alternatives(Vec<AlternativeSlot>),
    /// Nothing on the preferred date and nothing after it.
    Exhausted,
}

const MAX_ALTERNATIVES: usize = 5;

pub fn resolve_slot(
    package_id: &str,
    preferred_date: NaiveDate,
    catalog: &Catalog,
) -> SlotResolution {
    let rows = catalog.rows();

    if let Some(row) = rows
        .iter()
        .find(|r| r.package_id == package_id && r.date == preferred_date)
    {
        return SlotResolution::Confirmed(SlotOffer {
            hospital_name: row.hospital_name.clone(),
            appointment_date: row.date,
            time_slot: row.time_slot.clone(),
        });
    }

    let mut future: Vec<_> = rows
        .iter()
        .filter(|r| r.package_id == package_id && r.date > preferred_date)
        .collect();
    // Stable sort keeps catalog order within a date.
    future.sort_by_key(|r| r.date);

    if future.is_empty() {
        return SlotResolution::Exhausted;
    }

    let alternatives = future
        .into_iter()
        .take(MAX_ALTERNATIVES)
        .map(|r| AlternativeSlot {
            hospital_name: r.hospital_name.clone(),
            appointment_date: r.date.format("%Y-%m-%d").to_string(),
            time_slot: r.time_slot.clone(),
            package_id: r.package_id.clone(),
            package_name: r.package_name.clone(),
        })
        .collect();

    SlotResolution::Alternatives(alternatives)
}

static NUMERIC_CHOICE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)\s*$").unwrap());

/// Fast path for "pick option N": a purely numeric message within range
/// resolves directly, without consulting the extraction oracle. Anything
/// else (including out-of-range numbers) falls through to the oracle path.
pub fn numeric_selection(
    message: &str,
    alternatives: &[AlternativeSlot],
) -> Option<AlternativeSlot> {
    let captures = NUMERIC_CHOICE.captures(message)?;
    let n: usize = captures[1].parse().ok()?;
    if n >= 1 && n <= alternatives.len() {
        Some(alternatives[n - 1].clone())
    } else {
        None
    }
}

/// Hospital/date/time triple recovered from the extraction oracle's reply.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotChoice {
    pub hospital: String,
    pub date: NaiveDate,
    pub time: String,
}

/// Scan the offer set for the extracted triple. A stored alternative whose
/// serialized date no longer parses fails that candidate only, never the
/// whole turn.
pub fn match_extracted(
    choice: &SlotChoice,
    alternatives: &[AlternativeSlot],
) -> Option<AlternativeSlot> {
    for alt in alternatives {
        let Ok(alt_date) = NaiveDate::parse_from_str(&alt.appointment_date, "%Y-%m-%d") else {
            continue;
        };
        if alt.hospital_name.trim().eq_ignore_ascii_case(choice.hospital.trim())
            && alt_date == choice.date
            && time_slots_match(&alt.time_slot, &choice.time)
        {
            return Some(alt.clone());
        }
    }
    None
}

fn time_slots_match(stored: &str, extracted: &str) -> bool {
    normalize_time(stored) == normalize_time(extracted)
}

// Tolerates a trailing time-zone qualifier on either side.
fn normalize_time(s: &str) -> String {
    let mut t = s.trim().to_lowercase();
    for zone in ["ist", "utc", "gmt"] {
        if let Some(stripped) = t.strip_suffix(zone) {
            t = stripped.trim_end().to_string();
            break;
        }
    }
    t
}
