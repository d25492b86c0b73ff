use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::models::{Appointment, AppointmentStatus, PatientDraft};

#[derive(Debug)]
pub enum FinalizeOutcome {
    Booked(Appointment),
    /// A required draft field was missing or empty; nothing was persisted.
    Incomplete,
}

const REFERENCE_ATTEMPTS: u32 = 5;

/// Assemble and persist the booking from a completed draft. Requires package
/// name, hospital, preferred date, and time slot, plus the patient identity
/// fields; any gap aborts with `Incomplete` so the caller can reset the
/// conversation.
pub fn finalize(conn: &Connection, draft: &PatientDraft) -> anyhow::Result<FinalizeOutcome> {
    let (Some(package_name), Some(hospital_name), Some(appointment_date), Some(time_slot)) = (
        non_empty(draft.recommended_package_name.as_deref()),
        non_empty(draft.selected_hospital.as_deref()),
        draft.preferred_date,
        non_empty(draft.selected_time_slot.as_deref()),
    ) else {
        return Ok(FinalizeOutcome::Incomplete);
    };

    let (Some(name), Some(age), Some(gender)) = (
        non_empty(draft.name.as_deref()),
        draft.age,
        non_empty(draft.gender.as_deref()),
    ) else {
        return Ok(FinalizeOutcome::Incomplete);
    };

    let medical_history = draft.medical_history.clone().unwrap_or_default();
    let reference_number = unique_reference(conn)?;
    let patient_id = queries::find_or_create_patient(conn, &name, age, &gender, &medical_history)?;

    let appointment = Appointment {
        id: Uuid::new_v4().to_string(),
        patient_id,
        package_id: draft.recommended_package_id.clone().unwrap_or_default(),
        package_name,
        hospital_name,
        appointment_date,
        time_slot,
        reference_number,
        status: AppointmentStatus::Confirmed,
        is_recurring: draft.is_recurring,
        recurrence_interval: draft.recurrence_interval.clone(),
        created_at: Utc::now().naive_utc(),
    };

    queries::create_appointment(conn, &appointment)?;
    Ok(FinalizeOutcome::Booked(appointment))
}

pub fn generate_reference_number() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("CHK{}", raw[..9].to_uppercase())
}

// Collision odds are astronomically low; the store check covers the rest.
fn unique_reference(conn: &Connection) -> anyhow::Result<String> {
    for _ in 0..REFERENCE_ATTEMPTS {
        let candidate = generate_reference_number();
        if !queries::reference_exists(conn, &candidate)? {
            return Ok(candidate);
        }
    }
    Ok(generate_reference_number())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
