use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};

use crate::db::queries;
use crate::models::{intent, ChatSession, ChatState, KeywordIntent, PatientDraft};
use crate::services::ai::extract;
use crate::services::booking::{self, FinalizeOutcome};
use crate::services::catalog::Catalog;
use crate::services::recommendation;
use crate::services::render;
use crate::services::slots::{self, SlotResolution};
use crate::state::AppState;

const SESSION_TTL_MINUTES: i64 = 30;

const WELCOME: &str = "Welcome to the Health Checkup Scheduling Bot! \
    Do you want to schedule a checkup or view available packages?";
const DETAILS_PROMPT: &str = "Please provide your name, age, gender, and any medical history \
    (e.g., Jane Doe, 45, female, history of hypertension).";
const NO_PACKAGES: &str = "Sorry, we have no checkup packages available right now. \
    Please try again later or contact the hospital directly.";
const RECURRENCE_ASK: &str = "For recurring checkups, please specify the interval \
    (e.g., 'in 6 months', 'annually').";
const SCHEDULE_FIRST: &str = "I can set up a follow-up once we've scheduled your first checkup. \
    Please ask to 'schedule a checkup' to get started.";

/// One conversational turn: load the session, dispatch on (state, message),
/// apply the resulting draft/state changes, save the session, reply.
pub async fn process_message(
    state: &Arc<AppState>,
    session_id: &str,
    message: &str,
) -> anyhow::Result<String> {
    let _turn = state.session_turn_lock(session_id).await;

    let mut session = {
        let db = state.db.lock().unwrap();
        queries::get_session(&db, session_id)?
    }
    .unwrap_or_else(|| new_session(session_id));

    tracing::info!(
        session = session_id,
        state = session.state.as_str(),
        "processing message"
    );

    // Recurrence requests short-circuit the normal state dispatch.
    let reply = if intent::classify(message, &[KeywordIntent::Recurring]).is_some() {
        handle_recurrence(state, &mut session, message).await
    } else {
        match session.state {
            ChatState::Initial => handle_initial(state, &mut session, message),
            ChatState::CollectDetails => handle_collect_details(state, &mut session, message).await,
            ChatState::RecommendPackage => handle_preferred_date(state, &mut session, message),
            ChatState::SelectAlternativeSlot => handle_selection(state, &mut session, message).await,
            ChatState::ConfirmSlot => handle_confirmation(state, &mut session, message)?,
        }
    };

    let now = Utc::now().naive_utc();
    session.last_activity = now;
    session.expires_at = now + Duration::minutes(SESSION_TTL_MINUTES);

    {
        let db = state.db.lock().unwrap();
        queries::save_session(&db, &session)?;
    }

    Ok(reply)
}

fn new_session(session_id: &str) -> ChatSession {
    let now = Utc::now().naive_utc();
    ChatSession {
        session_id: session_id.to_string(),
        state: ChatState::Initial,
        draft: PatientDraft::default(),
        alternatives: vec![],
        last_activity: now,
        expires_at: now + Duration::minutes(SESSION_TTL_MINUTES),
    }
}

fn handle_initial(state: &Arc<AppState>, session: &mut ChatSession, message: &str) -> String {
    match intent::classify(
        message,
        &[KeywordIntent::Schedule, KeywordIntent::ListPackages],
    ) {
        Some(KeywordIntent::Schedule) => {
            session.state = ChatState::CollectDetails;
            DETAILS_PROMPT.to_string()
        }
        Some(KeywordIntent::ListPackages) => {
            if state.catalog.is_empty() {
                NO_PACKAGES.to_string()
            } else {
                render::package_listing(&state.catalog)
                    .to_html("Here are some of our available packages:")
            }
        }
        _ => WELCOME.to_string(),
    }
}

async fn handle_collect_details(
    state: &Arc<AppState>,
    session: &mut ChatSession,
    message: &str,
) -> String {
    let prompt = extract::details_prompt(message);
    let response = match state.llm.generate(&prompt).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "detail extraction failed");
            return format!("I couldn't process your details. {DETAILS_PROMPT}");
        }
    };

    let details = extract::parse_patient_details(&response);
    let (Some(name), Some(age), Some(gender)) =
        (details.name.clone(), details.age, details.gender.clone())
    else {
        let mut missing = Vec::new();
        if details.name.is_none() {
            missing.push("name");
        }
        if details.age.is_none() {
            missing.push("age");
        }
        if details.gender.is_none() {
            missing.push("gender");
        }
        return format!("I couldn't get your {}. {DETAILS_PROMPT}", missing.join(", "));
    };

    session.draft.name = Some(name);
    session.draft.age = Some(age);
    session.draft.gender = Some(gender.clone());
    session.draft.medical_history = Some(details.medical_history.clone());

    match recommendation::recommend(age, &gender, &details.medical_history, &state.catalog) {
        Some(rec) => {
            session.draft.recommended_package_id = Some(rec.package_id);
            session.draft.recommended_package_name = Some(rec.package_name.clone());
            session.state = ChatState::RecommendPackage;
            format!(
                "Based on your profile, I recommend the \"{}\" package (includes {}). \
                 Preferred date? (YYYY-MM-DD)",
                rec.package_name, rec.tests_included
            )
        }
        None => {
            session.state = ChatState::Initial;
            NO_PACKAGES.to_string()
        }
    }
}

fn handle_preferred_date(
    state: &Arc<AppState>,
    session: &mut ChatSession,
    message: &str,
) -> String {
    match NaiveDate::parse_from_str(message.trim(), "%Y-%m-%d") {
        Ok(date) => {
            session.draft.preferred_date = Some(date);
            display_slots(&state.catalog, session)
        }
        Err(_) => "Invalid date format. Please use YYYY-MM-DD.".to_string(),
    }
}

/// Shared slot-display step: runs the resolver for the drafted package and
/// preferred date, records the outcome on the session, and renders the reply.
fn display_slots(catalog: &Catalog, session: &mut ChatSession) -> String {
    let (Some(package_id), Some(preferred_date)) = (
        session.draft.recommended_package_id.clone(),
        session.draft.preferred_date,
    ) else {
        session.state = ChatState::Initial;
        return SCHEDULE_FIRST.to_string();
    };

    match slots::resolve_slot(&package_id, preferred_date, catalog) {
        SlotResolution::Confirmed(offer) => {
            session.draft.selected_hospital = Some(offer.hospital_name.clone());
            session.draft.selected_time_slot = Some(offer.time_slot.clone());
            session.draft.selected_appointment_date = Some(offer.appointment_date);
            session.alternatives.clear();
            session.state = ChatState::ConfirmSlot;
            format!(
                "Checking availability... Available slot at {} on {} {} IST. Confirm? (Yes/No)",
                offer.hospital_name,
                offer.appointment_date.format("%Y-%m-%d"),
                offer.time_slot
            )
        }
        SlotResolution::Alternatives(alternatives) => {
            let caption = format!(
                "No slots available on {}. Here are some alternatives:",
                preferred_date.format("%Y-%m-%d")
            );
            let table = render::alternatives_table(&alternatives);
            session.alternatives = alternatives;
            session.state = ChatState::SelectAlternativeSlot;
            format!(
                "{}<p>Please select an option by number (e.g., '1') or by mentioning the \
                 hospital/date.</p>",
                table.to_html(&caption)
            )
        }
        SlotResolution::Exhausted => {
            session.alternatives.clear();
            session.state = ChatState::Initial;
            "Sorry, no immediate slots or alternatives are available for that package. \
             Please try a different package or contact the hospital directly."
                .to_string()
        }
    }
}

async fn handle_selection(
    state: &Arc<AppState>,
    session: &mut ChatSession,
    message: &str,
) -> String {
    let alternatives = session.alternatives.clone();
    let mut selected = slots::numeric_selection(message, &alternatives);

    if selected.is_none() && !alternatives.is_empty() {
        let prompt = extract::selection_prompt(&alternatives, message);
        match state.llm.generate(&prompt).await {
            Ok(response) => {
                selected = extract::parse_slot_choice(&response)
                    .and_then(|choice| slots::match_extracted(&choice, &alternatives));
            }
            Err(e) => tracing::warn!(error = %e, "selection extraction failed"),
        }
    }

    // The offer set stays on the session until a match or a fresh date
    // request supersedes it.
    let Some(slot) = selected else {
        return "I couldn't understand your selection. Please choose an alternative by number \
                (e.g., '1') or by mentioning the hospital and date (e.g., 'Metro Health 2025-08-15')."
            .to_string();
    };

    let Ok(appointment_date) = NaiveDate::parse_from_str(&slot.appointment_date, "%Y-%m-%d")
    else {
        return "There was an issue processing the selected date. Please try again.".to_string();
    };

    session.draft.selected_hospital = Some(slot.hospital_name.clone());
    session.draft.selected_time_slot = Some(slot.time_slot.clone());
    session.draft.selected_appointment_date = Some(appointment_date);
    session.draft.recommended_package_id = Some(slot.package_id.clone());
    session.draft.recommended_package_name = Some(slot.package_name.clone());
    session.alternatives.clear();
    session.state = ChatState::ConfirmSlot;

    format!(
        "You've selected the slot at {} on {} {} IST. Confirm? (Yes/No)",
        slot.hospital_name,
        appointment_date.format("%Y-%m-%d"),
        slot.time_slot
    )
}

fn handle_confirmation(
    state: &Arc<AppState>,
    session: &mut ChatSession,
    message: &str,
) -> anyhow::Result<String> {
    match intent::classify(message, &[KeywordIntent::Confirm, KeywordIntent::Decline]) {
        Some(KeywordIntent::Confirm) => {
            let outcome = {
                let db = state.db.lock().unwrap();
                booking::finalize(&db, &session.draft)?
            };

            match outcome {
                FinalizeOutcome::Booked(appointment) => {
                    tracing::info!(
                        session = %session.session_id,
                        reference = %appointment.reference_number,
                        "booking confirmed"
                    );
                    session.state = ChatState::Initial;
                    session.alternatives.clear();
                    Ok(format!(
                        "Checkup confirmed! Reference number: {}. Anything else?",
                        appointment.reference_number
                    ))
                }
                FinalizeOutcome::Incomplete => {
                    session.state = ChatState::Initial;
                    session.draft = PatientDraft::default();
                    session.alternatives.clear();
                    Ok(
                        "Something went wrong with the appointment details. Please start over."
                            .to_string(),
                    )
                }
            }
        }
        Some(KeywordIntent::Decline) => {
            session.state = ChatState::RecommendPackage;
            Ok(
                "No problem. Would you like to check for alternative dates or hospitals, \
                 or perhaps a different package?"
                    .to_string(),
            )
        }
        _ => Ok("Please confirm with 'Yes' or 'No'.".to_string()),
    }
}

async fn handle_recurrence(
    state: &Arc<AppState>,
    session: &mut ChatSession,
    message: &str,
) -> String {
    let prompt = extract::recurrence_prompt(message);
    let response = match state.llm.generate(&prompt).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "recurrence extraction failed");
            return RECURRENCE_ASK.to_string();
        }
    };

    let Some(interval) = extract::parse_recurrence(&response) else {
        return RECURRENCE_ASK.to_string();
    };

    if session.draft.recommended_package_id.is_none() {
        session.state = ChatState::Initial;
        return SCHEDULE_FIRST.to_string();
    }

    let follow_up_date = Utc::now().date_naive() + Duration::days(interval.days());
    session.draft.preferred_date = Some(follow_up_date);
    session.draft.is_recurring = true;
    session.draft.recurrence_interval = Some(interval.label());

    format!(
        "For a follow-up on {}, I'll check availability. {}",
        follow_up_date.format("%Y-%m-%d"),
        display_slots(&state.catalog, session)
    )
}
