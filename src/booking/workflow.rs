//! The suspendable booking workflow.
//!
//! A booking spans two independent invocations with a human in the middle:
//! `start` drives the site up to the point where a verification code is sent
//! to the operator's phone, then suspends with the page parked at the code
//! prompt; `submit_code` re-enters later, finds that page again, and finishes
//! or fails the attempt. At most one booking may be suspended at a time,
//! since it owns the single automation session's active page.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;

use crate::booking::records::{BookingRecord, BookingRecordStore};
use crate::booking::site::CourtSite;
use crate::booking::time::normalize_time;
use crate::booking::{parse_date, validate_court};
use crate::driver::AutomationPage;
use crate::error::BookingError;
use crate::session::SessionManager;

/// Where a booking attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingPhase {
    AwaitingVerification,
    Completed,
    Failed,
}

/// What the caller needs to relay to the user after a successful `start`.
#[derive(Debug, Clone)]
pub struct PendingBooking {
    pub court: String,
    pub date: NaiveDate,
    pub time: String,
    pub subject_email: String,
}

struct Suspended {
    booking: PendingBooking,
}

pub struct BookingWorkflow {
    session: Arc<SessionManager>,
    site: Arc<CourtSite>,
    records: Arc<BookingRecordStore>,
    /// The one suspended attempt. Holding the lock across a site drive is
    /// what keeps two overlapping booking calls off the shared page.
    pending: Mutex<Option<Suspended>>,
    /// Phase of the most recent attempt, for status reporting.
    phase: Mutex<Option<BookingPhase>>,
}

impl BookingWorkflow {
    pub fn new(
        session: Arc<SessionManager>,
        site: Arc<CourtSite>,
        records: Arc<BookingRecordStore>,
    ) -> Self {
        Self {
            session,
            site,
            records,
            pending: Mutex::new(None),
            phase: Mutex::new(None),
        }
    }

    /// Whether a booking is suspended awaiting its code.
    pub async fn awaiting_verification(&self) -> bool {
        self.pending.lock().await.is_some()
    }

    /// Phase of the most recent booking attempt, if any.
    pub async fn phase(&self) -> Option<BookingPhase> {
        *self.phase.lock().await
    }

    async fn set_phase(&self, phase: BookingPhase) {
        *self.phase.lock().await = Some(phase);
    }

    /// Drive a booking to its suspend point.
    ///
    /// Validation happens before the browser is touched. Any failure after
    /// that aborts the attempt and leaves the page as-is for diagnosis;
    /// nothing retries automatically.
    pub async fn start(
        &self,
        court: &str,
        time: &str,
        date: &str,
        subject_email: &str,
    ) -> Result<PendingBooking, BookingError> {
        let normalized_time = normalize_time(time)?;
        let date = parse_date(date)?;
        let court = validate_court(court)?;

        let mut pending = self.pending.lock().await;
        if pending.is_some() {
            return Err(BookingError::AlreadyPending);
        }

        let outcome = async {
            let driver = self.session.ensure_ready().await?;
            let page = driver.open_page().await?;

            self.site.open_and_login(page.as_ref()).await?;
            self.site.select_court(page.as_ref(), &court).await?;
            self.site.select_date(page.as_ref(), date).await?;

            let available = self.site.read_slot_times(page.as_ref()).await?;
            if !available.contains(&normalized_time) {
                return Err(BookingError::SlotUnavailable {
                    court: court.clone(),
                    date: date.to_string(),
                    time: normalized_time.clone(),
                    available: if available.is_empty() {
                        "none".to_string()
                    } else {
                        available.join(", ")
                    },
                });
            }

            self.site.reserve_slot(page.as_ref(), &normalized_time).await?;

            Ok(PendingBooking {
                court: court.clone(),
                date,
                time: normalized_time.clone(),
                subject_email: subject_email.to_string(),
            })
        }
        .await;

        match outcome {
            Ok(booking) => {
                tracing::info!(
                    court = %booking.court,
                    date = %booking.date,
                    time = %booking.time,
                    "Booking suspended awaiting verification code"
                );
                *pending = Some(Suspended {
                    booking: booking.clone(),
                });
                self.set_phase(BookingPhase::AwaitingVerification).await;
                Ok(booking)
            }
            Err(e) => {
                // The page is deliberately left open for diagnosis.
                self.set_phase(BookingPhase::Failed).await;
                Err(e)
            }
        }
    }

    /// Resume the suspended booking with the human-delivered code.
    ///
    /// The parked page is found by probing the session's open pages for the
    /// verification prompt; no page handle survives between invocations.
    /// Every outcome is terminal for the suspended attempt.
    pub async fn submit_code(&self, code: &str) -> Result<BookingRecord, BookingError> {
        let mut pending = self.pending.lock().await;
        let suspended = pending.take().ok_or(BookingError::NoPendingBooking)?;
        let booking = suspended.booking;

        let page = match self.find_verification_page().await {
            Ok(page) => page,
            Err(e) => {
                self.set_phase(BookingPhase::Failed).await;
                return Err(e);
            }
        };

        if let Err(e) = self.site.confirm_with_code(page.as_ref(), code).await {
            self.set_phase(BookingPhase::Failed).await;
            return Err(e);
        }

        let record = BookingRecord {
            court: booking.court,
            time: booking.time,
            date: booking.date.to_string(),
            subject_email: booking.subject_email,
            completed_at: Utc::now(),
            status: "confirmed".to_string(),
        };

        // Losing the ledger write must not fail a booking the site already
        // accepted.
        if let Err(e) = self.records.save(&record).await {
            tracing::warn!("Booking confirmed but record write failed: {e}");
        }
        self.set_phase(BookingPhase::Completed).await;
        tracing::info!(court = %record.court, date = %record.date, "Booking completed");
        Ok(record)
    }

    /// Probe the session's open pages for the parked verification prompt.
    async fn find_verification_page(&self) -> Result<Arc<dyn AutomationPage>, BookingError> {
        let driver = self.session.ensure_ready().await?;
        for page in driver.pages().await? {
            match self.site.has_verification_prompt(page.as_ref()).await {
                Ok(true) => return Ok(page),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("Skipping unprobeable page: {e}");
                }
            }
        }
        Err(BookingError::PendingPageLost)
    }
}
