//! Reservation-site script.
//!
//! Everything this module knows about the target property (selectors, court
//! names, calendar layout) is fixed domain data. It drives the opaque
//! [`AutomationPage`] capability and never holds workflow state of its own.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use secrecy::ExposeSecret;

use crate::config::SiteConfig;
use crate::driver::AutomationPage;
use crate::error::{BookingError, DriverError};

/// Courts this deployment knows how to book.
pub const KNOWN_COURTS: &[&str] = &["Alice Marble", "Dupont", "Hamilton", "Moscone"];

/// Ordinary UI waits.
const UI_WAIT: Duration = Duration::from_secs(10);
/// Post-login settle can be slower than a plain element wait.
const LOGIN_WAIT: Duration = Duration::from_secs(15);
/// The site confirms a reservation well after the code is submitted.
pub const CONFIRM_WAIT: Duration = Duration::from_secs(180);

pub(crate) mod sel {
    pub const LOGIN_BUTTON: &str = "button[data-testid='login']";
    pub const LOGIN_EMAIL: &str = "input[name='email']";
    pub const LOGIN_PASSWORD: &str = "input[name='password']";
    pub const LOGIN_SUBMIT: &str = "button[type='submit']";
    pub const ACCOUNT_MENU: &str = "[data-testid='account-menu']";

    pub const CALENDAR_HEADER: &str = ".rdp-caption_label";
    pub const NEXT_MONTH: &str = "button[name='next-month']";
    /// Day cells padding the grid from a neighboring month carry this class.
    pub const DAY_OUTSIDE: &str = "rdp-day_outside";

    pub const SLOT_LIST: &str = "[data-testid='time-slots']";
    pub const DURATION_ONE_HOUR: &str = "[data-testid='duration-60']";
    pub const PARTICIPANT_FIRST: &str = "[data-testid='participant-option']:first-child";
    pub const SEND_CODE: &str = "button[data-testid='send-code']";

    pub const VERIFICATION_INPUT: &str = "input[name='verificationCode']";
    pub const VERIFICATION_CONFIRM: &str = "button[data-testid='confirm-code']";
    pub const BOOKING_CONFIRMED: &str = "[data-testid='reservation-confirmed']";
    pub const ALREADY_RESERVED: &str = "[data-testid='slot-taken']";
}

static SLOT_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,2}):(\d{2})\s*(AM|PM)").expect("valid slot regex"));

/// Parse a YYYY-MM-DD request date.
pub fn parse_date(input: &str) -> Result<NaiveDate, BookingError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| BookingError::InvalidDate {
        input: input.to_string(),
    })
}

/// Validate a court name against the known list.
pub fn validate_court(court: &str) -> Result<String, BookingError> {
    KNOWN_COURTS
        .iter()
        .find(|c| c.eq_ignore_ascii_case(court.trim()))
        .map(|c| c.to_string())
        .ok_or_else(|| BookingError::UnknownCourt {
            court: court.to_string(),
            known: KNOWN_COURTS.join(", "),
        })
}

/// Pull every "H:MM AM/PM" out of rendered slot text, canonicalized.
pub fn extract_slot_times(raw: &str) -> Vec<String> {
    let mut times = Vec::new();
    for caps in SLOT_TIME_RE.captures_iter(raw) {
        let hour: u32 = match caps[1].parse() {
            Ok(h) => h,
            Err(_) => continue,
        };
        let time = format!("{hour}:{} {}", &caps[2], caps[3].to_ascii_uppercase());
        if !times.contains(&time) {
            times.push(time);
        }
    }
    times
}

/// Script for one specific recreation property.
pub struct CourtSite {
    config: SiteConfig,
}

impl CourtSite {
    pub fn new(config: SiteConfig) -> Self {
        Self { config }
    }

    /// Navigate to the property and log in with the operator's account.
    pub async fn open_and_login(&self, page: &dyn AutomationPage) -> Result<(), BookingError> {
        page.navigate(&self.config.base_url).await?;
        page.wait_for(sel::LOGIN_BUTTON, UI_WAIT).await?;
        page.click(sel::LOGIN_BUTTON).await?;
        page.wait_for(sel::LOGIN_EMAIL, UI_WAIT).await?;
        page.fill(sel::LOGIN_EMAIL, &self.config.username).await?;
        page.fill(sel::LOGIN_PASSWORD, self.config.password.expose_secret())
            .await?;
        page.click(sel::LOGIN_SUBMIT).await?;
        page.wait_for(sel::ACCOUNT_MENU, LOGIN_WAIT).await?;
        Ok(())
    }

    /// Open a court's booking panel.
    pub async fn select_court(
        &self,
        page: &dyn AutomationPage,
        court: &str,
    ) -> Result<(), BookingError> {
        let selector = court_selector(court);
        page.wait_for(&selector, UI_WAIT).await?;
        page.click(&selector).await?;
        page.wait_for(sel::CALENDAR_HEADER, UI_WAIT).await?;
        Ok(())
    }

    /// Bring the calendar to the requested date's month and click its day.
    ///
    /// The calendar opens on its current month; the site supports stepping
    /// forward one month at a time and this script issues at most one step,
    /// so dates past the next month are rejected rather than silently
    /// selecting the wrong day.
    pub async fn select_date(
        &self,
        page: &dyn AutomationPage,
        date: NaiveDate,
    ) -> Result<(), BookingError> {
        let header = page.read_text(sel::CALENDAR_HEADER).await?;
        let shown = parse_calendar_header(&header)?;

        let months_ahead = month_index(date) - month_index(shown);
        match months_ahead {
            0 => {}
            1 => {
                page.click(sel::NEXT_MONTH).await?;
                page.wait_for(sel::CALENDAR_HEADER, UI_WAIT).await?;
            }
            n if n > 1 => {
                return Err(BookingError::DateTooFarOut {
                    date: date.to_string(),
                });
            }
            _ => {
                return Err(BookingError::InvalidDate {
                    input: format!("{date} is before the calendar's current month"),
                });
            }
        }

        // Short months pad their grid with neighboring-month days that share
        // the same day number; those cells must never be picked.
        let day_cell = format!(
            "button[name='day']:not(.{}):has-text(\"{}\")",
            sel::DAY_OUTSIDE,
            date.day()
        );
        page.click(&day_cell).await?;
        page.wait_for(sel::SLOT_LIST, UI_WAIT).await?;
        Ok(())
    }

    /// The canonicalized time set currently rendered for the selected day.
    pub async fn read_slot_times(
        &self,
        page: &dyn AutomationPage,
    ) -> Result<Vec<String>, BookingError> {
        let raw = page.read_text(sel::SLOT_LIST).await?;
        Ok(extract_slot_times(&raw))
    }

    /// Reserve a slot up to the point where the site sends the user a
    /// verification code. The page is then parked at the code prompt.
    pub async fn reserve_slot(
        &self,
        page: &dyn AutomationPage,
        normalized_time: &str,
    ) -> Result<(), BookingError> {
        page.click(&slot_selector(normalized_time)).await?;
        page.wait_for(sel::DURATION_ONE_HOUR, UI_WAIT).await?;
        page.click(sel::DURATION_ONE_HOUR).await?;
        page.click(sel::PARTICIPANT_FIRST).await?;
        page.click(sel::SEND_CODE).await?;
        page.wait_for(sel::VERIFICATION_INPUT, UI_WAIT).await?;
        Ok(())
    }

    /// Probe: is this page parked at the verification-code prompt?
    pub async fn has_verification_prompt(
        &self,
        page: &dyn AutomationPage,
    ) -> Result<bool, DriverError> {
        page.is_present(sel::VERIFICATION_INPUT).await
    }

    /// Enter the human-delivered code and wait for the site's verdict.
    pub async fn confirm_with_code(
        &self,
        page: &dyn AutomationPage,
        code: &str,
    ) -> Result<(), BookingError> {
        page.type_text(sel::VERIFICATION_INPUT, code).await?;
        page.click(sel::VERIFICATION_CONFIRM).await?;

        match page.wait_for(sel::BOOKING_CONFIRMED, CONFIRM_WAIT).await {
            Ok(()) => Ok(()),
            Err(DriverError::WaitTimeout { .. }) => {
                // Distinguish "someone beat us to it" from a genuinely
                // ambiguous outcome before reporting.
                if page.is_present(sel::ALREADY_RESERVED).await.unwrap_or(false) {
                    Err(BookingError::AlreadyReserved)
                } else {
                    Err(BookingError::VerificationTimeout {
                        waited: CONFIRM_WAIT,
                    })
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn court_selector(court: &str) -> String {
    format!("[data-testid='court-card']:has-text(\"{court}\")")
}

fn slot_selector(normalized_time: &str) -> String {
    format!("[data-testid='time-slots'] button:has-text(\"{normalized_time}\")")
}

fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

/// Parse a calendar header like "July 2025" into the first of that month.
fn parse_calendar_header(header: &str) -> Result<NaiveDate, BookingError> {
    let trimmed = header.trim();
    NaiveDate::parse_from_str(&format!("{trimmed} 1"), "%B %Y %d").map_err(|_| {
        BookingError::Site(DriverError::Call(format!(
            "unrecognized calendar header {trimmed:?}"
        )))
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_extract_slot_times() {
        let raw = "8:00 AM tennis\n10:00 AM tennis\n 2:30pm pickleball";
        assert_eq!(
            extract_slot_times(raw),
            vec!["8:00 AM", "10:00 AM", "2:30 PM"]
        );
    }

    #[test]
    fn test_extract_slot_times_dedupes() {
        let raw = "8:00 AM court A, 8:00 AM court B";
        assert_eq!(extract_slot_times(raw), vec!["8:00 AM"]);
    }

    #[test]
    fn test_parse_calendar_header() {
        let date = parse_calendar_header(" July 2025 ").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
        assert!(parse_calendar_header("whenever").is_err());
    }

    #[test]
    fn test_month_index_spans_year_boundary() {
        let dec = NaiveDate::from_ymd_opt(2025, 12, 15).unwrap();
        let jan = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        assert_eq!(month_index(jan) - month_index(dec), 1);
    }

    #[test]
    fn test_validate_court() {
        assert_eq!(validate_court("alice marble").unwrap(), "Alice Marble");
        let err = validate_court("Center Court").unwrap_err();
        assert!(err.to_string().contains("Known courts"));
    }

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2025-07-29").is_ok());
        assert!(parse_date("July 29").is_err());
    }
}
