use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    Initial,
    CollectDetails,
    RecommendPackage,
    ConfirmSlot,
    SelectAlternativeSlot,
}

impl ChatState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatState::Initial => "initial",
            ChatState::CollectDetails => "collect_details",
            ChatState::RecommendPackage => "recommend_package",
            ChatState::ConfirmSlot => "confirm_slot",
            ChatState::SelectAlternativeSlot => "select_alternative_slot",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "collect_details" => ChatState::CollectDetails,
            "recommend_package" => ChatState::RecommendPackage,
            "confirm_slot" => ChatState::ConfirmSlot,
            "select_alternative_slot" => ChatState::SelectAlternativeSlot,
            _ => ChatState::Initial,
        }
    }
}

/// Patient profile accumulated across turns. Every field is optional until
/// the state responsible for it has run; readers must tolerate gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientDraft {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub medical_history: Option<String>,
    pub preferred_date: Option<NaiveDate>,
    pub recommended_package_id: Option<String>,
    pub recommended_package_name: Option<String>,
    pub selected_hospital: Option<String>,
    pub selected_time_slot: Option<String>,
    pub selected_appointment_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurrence_interval: Option<String>,
}

/// One offered slot candidate. The date is kept as serialized text because
/// the offer set round-trips through the session store between turns; it is
/// normalized back to a calendar date at comparison time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeSlot {
    pub hospital_name: String,
    pub appointment_date: String,
    pub time_slot: String,
    pub package_id: String,
    pub package_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: String,
    pub state: ChatState,
    pub draft: PatientDraft,
    pub alternatives: Vec<AlternativeSlot>,
    pub last_activity: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

/// Draft plus offer set, stored together as one JSON document per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub draft: PatientDraft,
    #[serde(default)]
    pub alternatives: Vec<AlternativeSlot>,
}
