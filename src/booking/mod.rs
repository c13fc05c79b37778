//! Court booking: site script, time normalization, the suspendable
//! workflow, and the completed-booking ledger.

pub mod records;
pub mod site;
pub mod time;
pub mod workflow;

pub use records::{BookingRecord, BookingRecordStore};
pub use site::{CourtSite, KNOWN_COURTS, parse_date, validate_court};
pub use time::normalize_time;
pub use workflow::{BookingPhase, BookingWorkflow, PendingBooking};
