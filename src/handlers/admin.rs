use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::AppointmentStatus;
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/status
#[derive(Serialize)]
pub struct StatusResponse {
    active_sessions: i64,
    patients_count: i64,
    upcoming_appointments_count: i64,
    catalog_rows: usize,
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let stats = {
        let db = state.db.lock().unwrap();
        queries::get_dashboard_stats(&db)?
    };

    Ok(Json(StatusResponse {
        active_sessions: stats.active_sessions,
        patients_count: stats.patients_count,
        upcoming_appointments_count: stats.upcoming_appointments_count,
        catalog_rows: state.catalog.len(),
    }))
}

// GET /api/admin/appointments
#[derive(Deserialize)]
pub struct AppointmentsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct AppointmentResponse {
    id: String,
    patient_id: i64,
    package_id: String,
    package_name: String,
    hospital_name: String,
    appointment_date: String,
    time_slot: String,
    reference_number: String,
    status: String,
    is_recurring: bool,
    recurrence_interval: Option<String>,
    created_at: String,
}

pub async fn get_appointments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50);
    let status_filter = query.status.as_deref();

    let appointments = {
        let db = state.db.lock().unwrap();
        queries::get_all_appointments(&db, status_filter, limit)?
    };

    let response: Vec<AppointmentResponse> = appointments
        .into_iter()
        .map(|a| AppointmentResponse {
            id: a.id,
            patient_id: a.patient_id,
            package_id: a.package_id,
            package_name: a.package_name,
            hospital_name: a.hospital_name,
            appointment_date: a.appointment_date.format("%Y-%m-%d").to_string(),
            time_slot: a.time_slot,
            reference_number: a.reference_number,
            status: a.status.as_str().to_string(),
            is_recurring: a.is_recurring,
            recurrence_interval: a.recurrence_interval,
            created_at: a.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();

    Ok(Json(response))
}

// POST /api/admin/appointments/:id/cancel
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_appointment_status(&db, &id, &AppointmentStatus::Cancelled)?
    };

    if updated {
        Ok(Json(serde_json::json!({"cancelled": id})))
    } else {
        Err(AppError::NotFound(format!("appointment {id}")))
    }
}

// GET /api/admin/patients
#[derive(Serialize)]
pub struct PatientResponse {
    id: i64,
    name: String,
    age: u32,
    gender: String,
    medical_history: String,
}

pub async fn get_patients(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<PatientResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let patients = {
        let db = state.db.lock().unwrap();
        queries::get_patients(&db, 100)?
    };

    let response: Vec<PatientResponse> = patients
        .into_iter()
        .map(|p| PatientResponse {
            id: p.id,
            name: p.name,
            age: p.age,
            gender: p.gender,
            medical_history: p.medical_history,
        })
        .collect();

    Ok(Json(response))
}
