//! Prompt construction and defensive parsing for the extraction oracle.
//!
//! The oracle returns loosely-structured free text. Every parser here maps
//! to an optional-field record and treats any miss as an absent field; a
//! parse failure is an extraction-failure outcome for the caller, never an
//! error.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::AlternativeSlot;
use crate::services::slots::SlotChoice;

// ── Patient details ──

pub fn details_prompt(message: &str) -> String {
    format!(
        "From the following text, extract the Name, Age, Gender, and Medical History. \
         Format your output as a markdown list, like: '* **Name:** [name]\\n* **Age:** [age]...'. \
         If any piece of information is missing, use 'N/A' for that specific field.\n\
         Text: '{message}'"
    )
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientDetails {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub medical_history: String,
}

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\*\s*\*\*Name:\*\*\s*(.*?)(?:\n|$)").unwrap());
static AGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\*\s*\*\*Age:\*\*\s*(\d+)(?:\n|$)").unwrap());
static GENDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\*\s*\*\*Gender:\*\*\s*(.*?)(?:\n|$)").unwrap());
static HISTORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\*\s*\*\*Medical History:\*\*\s*(.*)").unwrap());

pub fn parse_patient_details(response: &str) -> PatientDetails {
    let name = capture(&NAME_RE, response).filter(|v| !is_absent(v));
    let age = capture(&AGE_RE, response).and_then(|v| v.parse().ok());
    let gender = capture(&GENDER_RE, response).filter(|v| !is_absent(v));
    let medical_history = capture(&HISTORY_RE, response)
        .filter(|v| !is_absent(v))
        .unwrap_or_default();

    PatientDetails {
        name,
        age,
        gender,
        medical_history,
    }
}

// ── Alternative-slot choice ──

pub fn selection_prompt(alternatives: &[AlternativeSlot], message: &str) -> String {
    let offered = alternatives
        .iter()
        .map(|a| {
            format!(
                "{} on {} {} IST",
                a.hospital_name, a.appointment_date, a.time_slot
            )
        })
        .collect::<Vec<_>>()
        .join("; ");

    format!(
        "From the alternatives provided: {offered}\n\
         Identify the hospital, date (YYYY-MM-DD), and time (HH:MM IST) selected in the \
         user's message: '{message}'. \
         Format as: Hospital: [hospital_name], Date: [date], Time: [time]. If uncertain, state N/A."
    )
}

static HOSPITAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Hospital:\s*(.*?)(?:,|\n|$)").unwrap());
static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Date:\s*(\d{4}-\d{2}-\d{2})").unwrap());
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Time:\s*(\d{1,2}:\d{2}(?:\s*[AP]M)?(?:\s*[A-Z]{2,4})?)").unwrap()
});

pub fn parse_slot_choice(response: &str) -> Option<SlotChoice> {
    let hospital = capture(&HOSPITAL_RE, response).filter(|v| !is_absent(v))?;
    let date_str = capture(&DATE_RE, response)?;
    let time = capture(&TIME_RE, response).filter(|v| !is_absent(v))?;

    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").ok()?;

    Some(SlotChoice {
        hospital,
        date,
        time,
    })
}

// ── Recurrence interval ──

pub fn recurrence_prompt(message: &str) -> String {
    format!("Extract the follow-up interval (e.g., 6 months, 1 year) from: '{message}'")
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecurrenceUnit {
    Month,
    Year,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceInterval {
    pub count: u32,
    pub unit: RecurrenceUnit,
}

impl RecurrenceInterval {
    /// Approximate day offset: months as 30 days, years as 365.
    pub fn days(&self) -> i64 {
        match self.unit {
            RecurrenceUnit::Month => self.count as i64 * 30,
            RecurrenceUnit::Year => self.count as i64 * 365,
        }
    }

    pub fn label(&self) -> String {
        let unit = match self.unit {
            RecurrenceUnit::Month => "month",
            RecurrenceUnit::Year => "year",
        };
        format!("{} {}s", self.count, unit)
    }
}

static INTERVAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*(month|year)s?").unwrap());

pub fn parse_recurrence(response: &str) -> Option<RecurrenceInterval> {
    let captures = INTERVAL_RE.captures(response)?;
    let count: u32 = captures[1].parse().ok()?;
    let unit = if captures[2].eq_ignore_ascii_case("month") {
        RecurrenceUnit::Month
    } else {
        RecurrenceUnit::Year
    };
    Some(RecurrenceInterval { count, unit })
}

// ── Helpers ──

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|v| !v.is_empty())
}

fn is_absent(value: &str) -> bool {
    value.eq_ignore_ascii_case("n/a")
}
