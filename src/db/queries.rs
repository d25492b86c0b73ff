use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    Appointment, AppointmentStatus, ChatSession, ChatState, Patient, SessionData,
};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";

// ── Sessions ──

pub fn get_session(conn: &Connection, session_id: &str) -> anyhow::Result<Option<ChatSession>> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
    let mut stmt = conn.prepare(
        "SELECT session_id, state, data, last_activity, expires_at
         FROM sessions WHERE session_id = ?1 AND expires_at > ?2",
    )?;

    let result = stmt.query_row(params![session_id, now], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    });

    match result {
        Ok((session_id, state_str, data_json, last_activity_str, expires_at_str)) => {
            let data: SessionData = serde_json::from_str(&data_json).unwrap_or(SessionData {
                draft: Default::default(),
                alternatives: vec![],
            });

            let last_activity = NaiveDateTime::parse_from_str(&last_activity_str, DATETIME_FMT)
                .unwrap_or_else(|_| Utc::now().naive_utc());
            let expires_at = NaiveDateTime::parse_from_str(&expires_at_str, DATETIME_FMT)
                .unwrap_or_else(|_| Utc::now().naive_utc());

            Ok(Some(ChatSession {
                session_id,
                state: ChatState::parse(&state_str),
                draft: data.draft,
                alternatives: data.alternatives,
                last_activity,
                expires_at,
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_session(conn: &Connection, session: &ChatSession) -> anyhow::Result<()> {
    let data = SessionData {
        draft: session.draft.clone(),
        alternatives: session.alternatives.clone(),
    };
    let data_json = serde_json::to_string(&data)?;
    let last_activity = session.last_activity.format(DATETIME_FMT).to_string();
    let expires_at = session.expires_at.format(DATETIME_FMT).to_string();

    conn.execute(
        "INSERT INTO sessions (session_id, state, data, last_activity, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(session_id) DO UPDATE SET
           state = excluded.state,
           data = excluded.data,
           last_activity = excluded.last_activity,
           expires_at = excluded.expires_at",
        params![
            session.session_id,
            session.state.as_str(),
            data_json,
            last_activity,
            expires_at
        ],
    )?;
    Ok(())
}

pub fn expire_old_sessions(conn: &Connection) -> anyhow::Result<usize> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
    let count = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
    Ok(count)
}

// ── Patients ──

/// Match on (name, age, gender); medical history is written only when the
/// patient row is first created, never overwritten on a later match.
pub fn find_or_create_patient(
    conn: &Connection,
    name: &str,
    age: u32,
    gender: &str,
    default_history: &str,
) -> anyhow::Result<i64> {
    let existing: Result<i64, _> = conn.query_row(
        "SELECT id FROM patients WHERE name = ?1 AND age = ?2 AND gender = ?3",
        params![name, age, gender],
        |row| row.get(0),
    );

    match existing {
        Ok(id) => Ok(id),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            conn.execute(
                "INSERT INTO patients (name, age, gender, medical_history) VALUES (?1, ?2, ?3, ?4)",
                params![name, age, gender, default_history],
            )?;
            Ok(conn.last_insert_rowid())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn get_patients(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Patient>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, age, gender, medical_history
         FROM patients ORDER BY id DESC LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        Ok(Patient {
            id: row.get(0)?,
            name: row.get(1)?,
            age: row.get(2)?,
            gender: row.get(3)?,
            medical_history: row.get(4)?,
        })
    })?;

    let mut patients = vec![];
    for row in rows {
        patients.push(row?);
    }
    Ok(patients)
}

// ── Appointments ──

pub fn create_appointment(conn: &Connection, appointment: &Appointment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO appointments (id, patient_id, package_id, package_name, hospital_name,
                                   appointment_date, time_slot, reference_number, status,
                                   is_recurring, recurrence_interval, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            appointment.id,
            appointment.patient_id,
            appointment.package_id,
            appointment.package_name,
            appointment.hospital_name,
            appointment.appointment_date.format(DATE_FMT).to_string(),
            appointment.time_slot,
            appointment.reference_number,
            appointment.status.as_str(),
            appointment.is_recurring as i32,
            appointment.recurrence_interval,
            appointment.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn reference_exists(conn: &Connection, reference: &str) -> anyhow::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE reference_number = ?1",
        params![reference],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn get_all_appointments(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Appointment>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            "SELECT id, patient_id, package_id, package_name, hospital_name, appointment_date, \
             time_slot, reference_number, status, is_recurring, recurrence_interval, created_at \
             FROM appointments WHERE status = ?1 ORDER BY appointment_date DESC LIMIT ?2"
                .to_string(),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            "SELECT id, patient_id, package_id, package_name, hospital_name, appointment_date, \
             time_slot, reference_number, status, is_recurring, recurrence_interval, created_at \
             FROM appointments ORDER BY appointment_date DESC LIMIT ?1"
                .to_string(),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_appointment_row(row)))?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &str,
    status: &AppointmentStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let id: String = row.get(0)?;
    let patient_id: i64 = row.get(1)?;
    let package_id: String = row.get(2)?;
    let package_name: String = row.get(3)?;
    let hospital_name: String = row.get(4)?;
    let appointment_date_str: String = row.get(5)?;
    let time_slot: String = row.get(6)?;
    let reference_number: String = row.get(7)?;
    let status_str: String = row.get(8)?;
    let is_recurring: bool = row.get::<_, i32>(9)? != 0;
    let recurrence_interval: Option<String> = row.get(10)?;
    let created_at_str: String = row.get(11)?;

    let appointment_date = NaiveDate::parse_from_str(&appointment_date_str, DATE_FMT)
        .unwrap_or_else(|_| Utc::now().date_naive());
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, DATETIME_FMT)
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Appointment {
        id,
        patient_id,
        package_id,
        package_name,
        hospital_name,
        appointment_date,
        time_slot,
        reference_number,
        status: AppointmentStatus::parse(&status_str),
        is_recurring,
        recurrence_interval,
        created_at,
    })
}

// ── Dashboard ──

pub struct DashboardStats {
    pub active_sessions: i64,
    pub patients_count: i64,
    pub upcoming_appointments_count: i64,
}

pub fn get_dashboard_stats(conn: &Connection) -> anyhow::Result<DashboardStats> {
    let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();
    let today = Utc::now().date_naive().format(DATE_FMT).to_string();

    let active_sessions: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sessions WHERE expires_at > ?1",
            params![now],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let patients_count: i64 = conn
        .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))
        .unwrap_or(0);

    let upcoming_appointments_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM appointments WHERE appointment_date >= ?1 AND status = 'confirmed'",
            params![today],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(DashboardStats {
        active_sessions,
        patients_count,
        upcoming_appointments_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::PatientDraft;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    #[test]
    fn test_session_round_trip() {
        let conn = setup_db();
        let now = Utc::now().naive_utc();

        let mut draft = PatientDraft::default();
        draft.name = Some("Jane Doe".to_string());
        draft.age = Some(45);

        let session = ChatSession {
            session_id: "s-1".to_string(),
            state: ChatState::RecommendPackage,
            draft,
            alternatives: vec![],
            last_activity: now,
            expires_at: now + chrono::Duration::minutes(30),
        };
        save_session(&conn, &session).unwrap();

        let loaded = get_session(&conn, "s-1").unwrap().unwrap();
        assert_eq!(loaded.state, ChatState::RecommendPackage);
        assert_eq!(loaded.draft.name.as_deref(), Some("Jane Doe"));
        assert_eq!(loaded.draft.age, Some(45));
    }

    #[test]
    fn test_expired_session_not_returned() {
        let conn = setup_db();
        let now = Utc::now().naive_utc();

        let session = ChatSession {
            session_id: "s-old".to_string(),
            state: ChatState::ConfirmSlot,
            draft: PatientDraft::default(),
            alternatives: vec![],
            last_activity: now - chrono::Duration::hours(2),
            expires_at: now - chrono::Duration::hours(1),
        };
        save_session(&conn, &session).unwrap();

        assert!(get_session(&conn, "s-old").unwrap().is_none());
        assert_eq!(expire_old_sessions(&conn).unwrap(), 1);
    }

    #[test]
    fn test_find_or_create_patient_matches_identity() {
        let conn = setup_db();

        let first =
            find_or_create_patient(&conn, "Jane Doe", 45, "female", "hypertension").unwrap();
        // Same identity, different history: must match, not overwrite.
        let second = find_or_create_patient(&conn, "Jane Doe", 45, "female", "other").unwrap();
        assert_eq!(first, second);

        let patients = get_patients(&conn, 10).unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].medical_history, "hypertension");

        let third = find_or_create_patient(&conn, "Jane Doe", 46, "female", "").unwrap();
        assert_ne!(first, third);
    }

    #[test]
    fn test_appointment_round_trip() {
        let conn = setup_db();
        let patient_id =
            find_or_create_patient(&conn, "Jane Doe", 45, "female", "").unwrap();

        let appointment = Appointment {
            id: "appt-1".to_string(),
            patient_id,
            package_id: "PKG1".to_string(),
            package_name: "Full Body Checkup".to_string(),
            hospital_name: "City Care".to_string(),
            appointment_date: NaiveDate::from_ymd_opt(2025, 8, 15).unwrap(),
            time_slot: "10:00 AM".to_string(),
            reference_number: "CHK123ABC456".to_string(),
            status: AppointmentStatus::Confirmed,
            is_recurring: false,
            recurrence_interval: None,
            created_at: Utc::now().naive_utc(),
        };
        create_appointment(&conn, &appointment).unwrap();

        assert!(reference_exists(&conn, "CHK123ABC456").unwrap());
        assert!(!reference_exists(&conn, "CHKZZZZZZZZZ").unwrap());

        let all = get_all_appointments(&conn, None, 10).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].package_name, "Full Body Checkup");
        assert_eq!(all[0].status, AppointmentStatus::Confirmed);

        assert!(update_appointment_status(&conn, "appt-1", &AppointmentStatus::Cancelled).unwrap());
        let cancelled = get_all_appointments(&conn, Some("cancelled"), 10).unwrap();
        assert_eq!(cancelled.len(), 1);
    }
}
