pub mod appointment;
pub mod catalog;
pub mod intent;
pub mod patient;
pub mod session;

pub use appointment::{Appointment, AppointmentStatus};
pub use catalog::CatalogRow;
pub use intent::KeywordIntent;
pub use patient::Patient;
pub use session::{AlternativeSlot, ChatSession, ChatState, PatientDraft, SessionData};
