//! Read-only availability queries.
//!
//! Never mutates booking state. Per-court failures are captured into the
//! report instead of raised, so the caller always gets an answer describing
//! either data or what went wrong; the prose summary degrades to a template
//! when the summarization capability fails.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::booking::site::CourtSite;
use crate::booking::{KNOWN_COURTS, normalize_time, parse_date, validate_court};
use crate::error::BookingError;
use crate::llm::Summarizer;
use crate::session::SessionManager;

/// Slots (or the error encountered) for one court.
#[derive(Debug, Clone, Serialize)]
pub struct CourtAvailability {
    pub court: String,
    pub times: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The full response object for one query.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_time: Option<String>,
    pub courts: Vec<CourtAvailability>,
    pub summary: String,
}

pub struct AvailabilityQuery {
    session: Arc<SessionManager>,
    site: Arc<CourtSite>,
    summarizer: Arc<dyn Summarizer>,
}

impl AvailabilityQuery {
    pub fn new(
        session: Arc<SessionManager>,
        site: Arc<CourtSite>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            session,
            site,
            summarizer,
        }
    }

    /// Check availability for a date (default today), one court or all of
    /// them, optionally noting a requested time.
    ///
    /// Input validation errors are the only hard failures; once the query is
    /// running, trouble lands in the per-court entries.
    pub async fn check(
        &self,
        date: Option<&str>,
        court: Option<&str>,
        time: Option<&str>,
    ) -> Result<AvailabilityReport, BookingError> {
        let date = match date {
            Some(raw) => parse_date(raw)?,
            None => Utc::now().date_naive(),
        };
        let requested_time = time.map(normalize_time).transpose()?;
        let courts: Vec<String> = match court {
            Some(raw) => vec![validate_court(raw)?],
            None => KNOWN_COURTS.iter().map(|c| c.to_string()).collect(),
        };

        let mut entries = Vec::with_capacity(courts.len());
        match self.session.ensure_ready().await {
            Ok(driver) => {
                let page = match driver.open_page().await {
                    Ok(page) => page,
                    Err(e) => {
                        return Ok(self
                            .report_with_uniform_error(date, requested_time, &courts, &e.to_string())
                            .await);
                    }
                };

                let mut logged_in = false;
                for court in &courts {
                    let entry = async {
                        if !logged_in {
                            self.site.open_and_login(page.as_ref()).await?;
                            // The page is authenticated from here on even if
                            // this court's read fails further down.
                            logged_in = true;
                        }
                        self.site.select_court(page.as_ref(), court).await?;
                        self.site.select_date(page.as_ref(), date).await?;
                        self.site.read_slot_times(page.as_ref()).await
                    }
                    .await;

                    match entry {
                        Ok(times) => {
                            entries.push(CourtAvailability {
                                court: court.clone(),
                                times,
                                error: None,
                            });
                        }
                        Err(e) => {
                            tracing::warn!(court, "Availability read failed: {e}");
                            entries.push(CourtAvailability {
                                court: court.clone(),
                                times: Vec::new(),
                                error: Some(e.to_string()),
                            });
                        }
                    }
                }
            }
            Err(e) => {
                return Ok(self
                    .report_with_uniform_error(date, requested_time, &courts, &e.to_string())
                    .await);
            }
        }

        Ok(self.build_report(date.to_string(), requested_time, entries).await)
    }

    async fn report_with_uniform_error(
        &self,
        date: chrono::NaiveDate,
        requested_time: Option<String>,
        courts: &[String],
        error: &str,
    ) -> AvailabilityReport {
        let entries = courts
            .iter()
            .map(|court| CourtAvailability {
                court: court.clone(),
                times: Vec::new(),
                error: Some(error.to_string()),
            })
            .collect();
        self.build_report(date.to_string(), requested_time, entries)
            .await
    }

    async fn build_report(
        &self,
        date: String,
        requested_time: Option<String>,
        courts: Vec<CourtAvailability>,
    ) -> AvailabilityReport {
        let facts = serde_json::json!({
            "date": date,
            "requested_time": requested_time,
            "courts": courts,
        });

        let summary = match self.summarizer.summarize(&facts).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Summarization failed, using template: {e}");
                template_summary(&date, requested_time.as_deref(), &courts)
            }
        };

        AvailabilityReport {
            date,
            requested_time,
            courts,
            summary,
        }
    }
}

/// Deterministic fallback sentence; always names every court and its times.
fn template_summary(
    date: &str,
    requested_time: Option<&str>,
    courts: &[CourtAvailability],
) -> String {
    let mut parts = Vec::with_capacity(courts.len());
    for entry in courts {
        let detail = match &entry.error {
            Some(error) => format!("could not be checked ({error})"),
            None if entry.times.is_empty() => "has no open slots".to_string(),
            None => format!("has {}", entry.times.join(", ")),
        };
        parts.push(format!("{} {detail}", entry.court));
    }
    let mut summary = format!("Availability for {date}: {}.", parts.join("; "));
    if let Some(time) = requested_time {
        let somewhere = courts.iter().any(|c| c.times.iter().any(|t| t == time));
        if somewhere {
            summary.push_str(&format!(" {time} is open."));
        } else {
            summary.push_str(&format!(" {time} is not open anywhere."));
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::booking::site::sel;
    use crate::config::SiteConfig;
    use crate::driver::{AutomationDriver, AutomationPage, DriverConnector};
    use crate::error::{DriverError, SummarizeError};

    struct StubPage {
        texts: HashMap<String, String>,
    }

    #[async_trait]
    impl AutomationPage for StubPage {
        async fn navigate(&self, _url: &str) -> Result<(), DriverError> {
            Ok(())
        }

        async fn click(&self, _selector: &str) -> Result<(), DriverError> {
            Ok(())
        }

        async fn fill(&self, _selector: &str, _value: &str) -> Result<(), DriverError> {
            Ok(())
        }

        async fn type_text(&self, _selector: &str, _text: &str) -> Result<(), DriverError> {
            Ok(())
        }

        async fn wait_for(&self, _selector: &str, _timeout: Duration) -> Result<(), DriverError> {
            Ok(())
        }

        async fn read_text(&self, selector: &str) -> Result<String, DriverError> {
            Ok(self.texts.get(selector).cloned().unwrap_or_default())
        }

        async fn is_present(&self, _selector: &str) -> Result<bool, DriverError> {
            Ok(false)
        }
    }

    struct StubDriver {
        texts: HashMap<String, String>,
    }

    #[async_trait]
    impl AutomationDriver for StubDriver {
        async fn open_page(&self) -> Result<Arc<dyn AutomationPage>, DriverError> {
            Ok(Arc::new(StubPage {
                texts: self.texts.clone(),
            }) as Arc<dyn AutomationPage>)
        }

        async fn pages(&self) -> Result<Vec<Arc<dyn AutomationPage>>, DriverError> {
            Ok(Vec::new())
        }

        async fn close(&self) -> Result<(), DriverError> {
            Ok(())
        }
    }

    struct StubConnector {
        texts: HashMap<String, String>,
        fail: bool,
    }

    #[async_trait]
    impl DriverConnector for StubConnector {
        async fn connect(&self) -> Result<Arc<dyn AutomationDriver>, DriverError> {
            if self.fail {
                return Err(DriverError::NotConfigured("no binding".to_string()));
            }
            Ok(Arc::new(StubDriver {
                texts: self.texts.clone(),
            }) as Arc<dyn AutomationDriver>)
        }
    }

    /// A page whose login button exists only before the first login, and
    /// whose "Alice Marble" court card cannot be clicked.
    struct SingleLoginPage {
        texts: HashMap<String, String>,
        logins: StdMutex<u32>,
    }

    #[async_trait]
    impl AutomationPage for SingleLoginPage {
        async fn navigate(&self, _url: &str) -> Result<(), DriverError> {
            Ok(())
        }

        async fn click(&self, selector: &str) -> Result<(), DriverError> {
            if selector.contains("Alice Marble") {
                return Err(DriverError::ElementNotFound {
                    selector: selector.to_string(),
                });
            }
            Ok(())
        }

        async fn fill(&self, _selector: &str, _value: &str) -> Result<(), DriverError> {
            Ok(())
        }

        async fn type_text(&self, _selector: &str, _text: &str) -> Result<(), DriverError> {
            Ok(())
        }

        async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<(), DriverError> {
            if selector == sel::LOGIN_BUTTON {
                let mut logins = self.logins.lock().unwrap();
                *logins += 1;
                if *logins > 1 {
                    return Err(DriverError::ElementNotFound {
                        selector: selector.to_string(),
                    });
                }
            }
            Ok(())
        }

        async fn read_text(&self, selector: &str) -> Result<String, DriverError> {
            Ok(self.texts.get(selector).cloned().unwrap_or_default())
        }

        async fn is_present(&self, _selector: &str) -> Result<bool, DriverError> {
            Ok(false)
        }
    }

    struct SharedPageDriver {
        page: Arc<SingleLoginPage>,
    }

    #[async_trait]
    impl AutomationDriver for SharedPageDriver {
        async fn open_page(&self) -> Result<Arc<dyn AutomationPage>, DriverError> {
            Ok(Arc::clone(&self.page) as Arc<dyn AutomationPage>)
        }

        async fn pages(&self) -> Result<Vec<Arc<dyn AutomationPage>>, DriverError> {
            Ok(vec![Arc::clone(&self.page) as Arc<dyn AutomationPage>])
        }

        async fn close(&self) -> Result<(), DriverError> {
            Ok(())
        }
    }

    struct SharedPageConnector {
        page: Arc<SingleLoginPage>,
    }

    #[async_trait]
    impl DriverConnector for SharedPageConnector {
        async fn connect(&self) -> Result<Arc<dyn AutomationDriver>, DriverError> {
            Ok(Arc::new(SharedPageDriver {
                page: Arc::clone(&self.page),
            }) as Arc<dyn AutomationDriver>)
        }
    }

    struct FailingSummarizer;

    #[async_trait]
    impl Summarizer for FailingSummarizer {
        async fn summarize(&self, _facts: &serde_json::Value) -> Result<String, SummarizeError> {
            Err(SummarizeError::Request("summarizer down".to_string()))
        }
    }

    struct CannedSummarizer;

    #[async_trait]
    impl Summarizer for CannedSummarizer {
        async fn summarize(&self, _facts: &serde_json::Value) -> Result<String, SummarizeError> {
            Ok("Plenty of tennis to be had.".to_string())
        }
    }

    fn query(
        slot_text: &str,
        fail_driver: bool,
        summarizer: Arc<dyn Summarizer>,
    ) -> AvailabilityQuery {
        let mut texts = HashMap::new();
        texts.insert(sel::CALENDAR_HEADER.to_string(), "July 2025".to_string());
        texts.insert(sel::SLOT_LIST.to_string(), slot_text.to_string());

        let session = Arc::new(SessionManager::new(
            Arc::new(StubConnector {
                texts,
                fail: fail_driver,
            }),
            Duration::from_secs(300),
        ));
        let site = Arc::new(CourtSite::new(SiteConfig {
            base_url: "https://courts.test".to_string(),
            username: "operator@courts.test".to_string(),
            password: secrecy::SecretString::from("hunter2".to_string()),
        }));
        AvailabilityQuery::new(session, site, summarizer)
    }

    #[tokio::test]
    async fn test_fallback_summary_names_court_and_times() {
        let q = query(
            "8:00 AM tennis\n10:00 AM tennis",
            false,
            Arc::new(FailingSummarizer),
        );

        let report = q
            .check(Some("2025-07-29"), Some("Alice Marble"), None)
            .await
            .unwrap();

        assert_eq!(report.courts.len(), 1);
        assert_eq!(report.courts[0].times, vec!["8:00 AM", "10:00 AM"]);
        assert!(report.summary.contains("Alice Marble"));
        assert!(report.summary.contains("8:00 AM"));
        assert!(report.summary.contains("10:00 AM"));
    }

    #[tokio::test]
    async fn test_summarizer_text_is_used_when_available() {
        let q = query("8:00 AM", false, Arc::new(CannedSummarizer));
        let report = q
            .check(Some("2025-07-29"), Some("Alice Marble"), None)
            .await
            .unwrap();
        assert_eq!(report.summary, "Plenty of tennis to be had.");
    }

    #[tokio::test]
    async fn test_session_failure_is_captured_per_court() {
        let q = query("", true, Arc::new(FailingSummarizer));
        let report = q.check(Some("2025-07-29"), None, None).await.unwrap();

        assert_eq!(report.courts.len(), KNOWN_COURTS.len());
        for entry in &report.courts {
            assert!(entry.error.as_deref().unwrap_or("").contains("no binding"));
        }
    }

    #[tokio::test]
    async fn test_login_survives_a_failed_court() {
        let mut texts = HashMap::new();
        texts.insert(sel::CALENDAR_HEADER.to_string(), "July 2025".to_string());
        texts.insert(sel::SLOT_LIST.to_string(), "8:00 AM tennis".to_string());
        let page = Arc::new(SingleLoginPage {
            texts,
            logins: StdMutex::new(0),
        });

        let session = Arc::new(SessionManager::new(
            Arc::new(SharedPageConnector {
                page: Arc::clone(&page),
            }),
            Duration::from_secs(300),
        ));
        let site = Arc::new(CourtSite::new(SiteConfig {
            base_url: "https://courts.test".to_string(),
            username: "operator@courts.test".to_string(),
            password: secrecy::SecretString::from("hunter2".to_string()),
        }));
        let q = AvailabilityQuery::new(session, site, Arc::new(FailingSummarizer));

        let report = q.check(Some("2025-07-29"), None, None).await.unwrap();

        // The first court fails after login; the rest still read their slots
        // on the already-authenticated page instead of logging in again.
        assert_eq!(report.courts.len(), KNOWN_COURTS.len());
        assert!(report.courts[0].error.is_some());
        for entry in &report.courts[1..] {
            assert!(entry.error.is_none(), "{} should still be readable", entry.court);
            assert_eq!(entry.times, vec!["8:00 AM"]);
        }
        assert_eq!(*page.logins.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_requested_time_is_reflected() {
        let q = query("8:00 AM", false, Arc::new(FailingSummarizer));
        let report = q
            .check(Some("2025-07-29"), Some("Alice Marble"), Some("9pm"))
            .await
            .unwrap();
        assert_eq!(report.requested_time.as_deref(), Some("9:00 PM"));
        assert!(report.summary.contains("9:00 PM is not open"));
    }

    #[tokio::test]
    async fn test_bad_date_is_a_hard_error() {
        let q = query("", false, Arc::new(FailingSummarizer));
        assert!(q.check(Some("tomorrow"), None, None).await.is_err());
    }
}
