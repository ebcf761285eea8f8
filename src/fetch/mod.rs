//! Fetch strategy engine.
//!
//! Resilient retrieval of listing pages from sites that actively resist
//! automation. Each attempt runs under a fresh browser identity (user agent
//! plus matching headers, own cookie jar), optionally warms the session up on
//! the site homepage, and classifies the response as content, a challenge
//! page, or a network failure. Blocked and failed attempts retry up to a
//! per-site-family cap with table-driven backoff.

mod attempt;
mod blocking;
mod identity;
mod site_family;
mod throttle;
mod timing;
mod transport;

pub use attempt::{AttemptOutcome, FetchAttempt};
pub use blocking::{classify_response, classify_vendor, BlockReason, BlockVendor};
pub use identity::{random_identity, BrowserIdentity, IDENTITY_POOL};
pub use site_family::SiteFamily;
pub use throttle::RequestThrottle;
pub use timing::{jitter, RecordingSleeper, Sleeper, TokioSleeper};
pub use transport::{ReqwestTransport, Transport, TransportResponse, TransportSession};

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::models::ListingDocument;

use attempt::last_block_reason;

/// Fetches listing pages with identity rotation and blocking detection.
pub struct FetchEngine {
    config: FetchConfig,
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    throttle: RequestThrottle,
    caller: String,
}

impl FetchEngine {
    /// Production engine: reqwest transport, real delays.
    pub fn new(config: FetchConfig) -> Self {
        let throttle = RequestThrottle::new(config.min_request_interval());
        Self {
            config,
            transport: Arc::new(ReqwestTransport),
            sleeper: Arc::new(TokioSleeper),
            throttle,
            caller: "default".to_string(),
        }
    }

    /// Fully injectable constructor for tests and embedding.
    pub fn with_parts(
        config: FetchConfig,
        transport: Arc<dyn Transport>,
        sleeper: Arc<dyn Sleeper>,
        throttle: RequestThrottle,
        caller: impl Into<String>,
    ) -> Self {
        Self {
            config,
            transport,
            sleeper,
            throttle,
            caller: caller.into(),
        }
    }

    /// Share one throttle across engines so independent callers still honor
    /// the per-domain interval.
    pub fn with_throttle(mut self, throttle: RequestThrottle) -> Self {
        self.throttle = throttle;
        self
    }

    /// Fetch a listing URL, retrying through blocks and transient failures.
    pub async fn fetch(&self, raw_url: &str) -> Result<ListingDocument, FetchError> {
        let parsed = Url::parse(raw_url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme: {}",
                parsed.scheme()
            )));
        }
        let host = parsed
            .host_str()
            .ok_or_else(|| FetchError::InvalidUrl("missing host".to_string()))?
            .to_lowercase();

        let family = SiteFamily::classify(&host);
        if family.javascript_only() {
            info!(host, "rejecting JavaScript-only site without fetching");
            return Err(FetchError::JavascriptRequired { host });
        }

        self.throttle
            .try_acquire(&host, &self.caller)
            .await
            .map_err(|wait| FetchError::RateLimited {
                domain: host.clone(),
                wait,
            })?;

        let limits = self.config.limits_for(family.key());
        let origin = format!("{}://{}", parsed.scheme(), host);
        let mut attempts: Vec<FetchAttempt> = Vec::new();
        let mut last_network_error = String::new();

        for attempt_number in 1..=limits.max_attempts {
            let identity = random_identity();
            debug!(
                attempt = attempt_number,
                cap = limits.max_attempts,
                identity = identity.label,
                "starting fetch attempt"
            );

            let outcome = match self
                .transport
                .session(identity, self.config.request_timeout())
            {
                Ok(session) => {
                    self.warm_up(&*session, family, &origin, attempt_number).await;
                    self.pre_request_delay().await;
                    match session.get(raw_url).await {
                        Ok(response) => {
                            match classify_response(
                                response.status,
                                &response.body,
                                limits.min_response_bytes,
                                &self.config.blocking_keywords,
                            ) {
                                None => {
                                    info!(
                                        url = raw_url,
                                        bytes = response.body.len(),
                                        attempt = attempt_number,
                                        "listing fetched"
                                    );
                                    return Ok(ListingDocument::new(
                                        raw_url,
                                        response.final_url,
                                        response.status,
                                        response.body,
                                    ));
                                }
                                Some(reason) => {
                                    attempts.push(FetchAttempt {
                                        number: attempt_number,
                                        identity: identity.label,
                                        outcome: AttemptOutcome::Blocked(reason.clone()),
                                        response_bytes: response.body.len(),
                                    });
                                    AttemptOutcome::Blocked(reason)
                                }
                            }
                        }
                        Err(message) => {
                            last_network_error = message.clone();
                            attempts.push(FetchAttempt {
                                number: attempt_number,
                                identity: identity.label,
                                outcome: AttemptOutcome::NetworkError(message.clone()),
                                response_bytes: 0,
                            });
                            AttemptOutcome::NetworkError(message)
                        }
                    }
                }
                Err(message) => {
                    last_network_error = message.clone();
                    attempts.push(FetchAttempt {
                        number: attempt_number,
                        identity: identity.label,
                        outcome: AttemptOutcome::NetworkError(message.clone()),
                        response_bytes: 0,
                    });
                    AttemptOutcome::NetworkError(message)
                }
            };

            warn!(
                attempt = attempt_number,
                ?outcome,
                "fetch attempt did not yield content"
            );

            if attempt_number < limits.max_attempts {
                self.sleeper
                    .sleep(self.config.backoff_for(attempt_number))
                    .await;
            }
        }

        match last_block_reason(&attempts) {
            Some(reason) => {
                let vendor = match reason {
                    BlockReason::Challenge { vendor } => *vendor,
                    _ => None,
                };
                Err(FetchError::AllAttemptsBlocked {
                    attempts: limits.max_attempts,
                    vendor,
                })
            }
            None => Err(FetchError::Network {
                attempts: limits.max_attempts,
                message: last_network_error,
            }),
        }
    }

    /// Visit the homepage (and, from the second attempt, a search page) to
    /// pick up session cookies. Warmup failures are never fatal.
    async fn warm_up(
        &self,
        session: &dyn TransportSession,
        family: SiteFamily,
        origin: &str,
        attempt_number: u32,
    ) {
        if !family.wants_warmup() {
            return;
        }
        self.pre_request_delay().await;
        if let Err(e) = session.get(origin).await {
            debug!(error = %e, "homepage warmup failed; continuing");
        }
        if attempt_number >= 2 {
            if let Some(path) = family.search_path() {
                self.pre_request_delay().await;
                let url = format!("{origin}{path}");
                if let Err(e) = session.get(&url).await {
                    debug!(error = %e, "search page warmup failed; continuing");
                }
            }
        }
    }

    async fn pre_request_delay(&self) {
        let delay = jitter(self.config.jitter_min_secs, self.config.jitter_max_secs);
        self.sleeper.sleep(delay).await;
    }
}
