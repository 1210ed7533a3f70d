//! Debounced, cached postal code autofill.
//!
//! Each registration draft owns a generation counter. A lookup request bumps
//! it, waits out the debounce window and only proceeds if nothing newer
//! arrived meanwhile. Superseded requests never reach the provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use nb1_core::{DraftId, LookupOutcome, PostalCode};
use tracing::{debug, instrument, warn};

use super::AddressLookup;

/// Found and not-found answers are kept this long.
const RESULT_TTL: Duration = Duration::from_secs(3600);

/// Drafts idle for this long forget their counter.
const TICKET_IDLE: Duration = Duration::from_secs(30 * 60);

const MAX_CACHED_CODES: u64 = 10_000;
const MAX_TRACKED_DRAFTS: u64 = 100_000;

/// Outcome of a debounced lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutofillResult {
    Completed(LookupOutcome),
    /// A newer input for the same draft arrived during the debounce window.
    Superseded,
}

pub struct AddressAutofill<L> {
    provider: L,
    debounce: Duration,
    results: Cache<PostalCode, LookupOutcome>,
    tickets: Cache<DraftId, Arc<AtomicU64>>,
}

impl<L: AddressLookup> AddressAutofill<L> {
    #[must_use]
    pub fn new(provider: L, debounce: Duration) -> Self {
        let results = Cache::builder()
            .max_capacity(MAX_CACHED_CODES)
            .time_to_live(RESULT_TTL)
            .build();
        let tickets = Cache::builder()
            .max_capacity(MAX_TRACKED_DRAFTS)
            .time_to_idle(TICKET_IDLE)
            .build();

        Self {
            provider,
            debounce,
            results,
            tickets,
        }
    }

    async fn ticket(&self, draft: DraftId) -> Arc<AtomicU64> {
        self.tickets
            .get_with(draft, async { Arc::new(AtomicU64::new(0)) })
            .await
    }

    /// Invalidate any lookup still waiting for `draft`.
    pub async fn supersede(&self, draft: DraftId) {
        self.ticket(draft).await.fetch_add(1, Ordering::SeqCst);
    }

    /// Wait out the debounce window, then resolve `code` unless a newer
    /// request for `draft` arrived.
    #[instrument(skip(self), fields(draft = %draft, postal_code = %code))]
    pub async fn debounced(&self, draft: DraftId, code: &PostalCode) -> AutofillResult {
        let ticket = self.ticket(draft).await;
        let generation = ticket.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.debounce).await;

        if ticket.load(Ordering::SeqCst) != generation {
            debug!("Postal code lookup superseded");
            return AutofillResult::Superseded;
        }
        AutofillResult::Completed(self.resolve(code).await)
    }

    /// Resolve `code` immediately, using the cache when possible.
    pub async fn resolve(&self, code: &PostalCode) -> LookupOutcome {
        if let Some(cached) = self.results.get(code).await {
            debug!(postal_code = %code, "Cache hit for postal code");
            return cached;
        }

        let outcome = match self.provider.lookup(code).await {
            Ok(Some(address)) => LookupOutcome::Found(address),
            Ok(None) => LookupOutcome::NotFound,
            Err(e) => {
                warn!(error = %e, postal_code = %code, "Address lookup failed");
                return LookupOutcome::Unavailable;
            }
        };

        self.results.insert(code.clone(), outcome.clone()).await;
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use nb1_core::AddressSuggestion;

    use crate::lookup::LookupError;
    use super::*;

    #[derive(Clone, Default)]
    struct FakeLookup {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl AddressLookup for FakeLookup {
        async fn lookup(
            &self,
            code: &PostalCode,
        ) -> Result<Option<AddressSuggestion>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(LookupError::Parse("down".to_string()));
            }
            Ok((code.as_str() == "01310930").then(|| AddressSuggestion {
                postal_code: code.as_str().to_string(),
                country: "Brazil".to_string(),
                state: "SP".to_string(),
                city: "São Paulo".to_string(),
                street: "Avenida Paulista".to_string(),
            }))
        }
    }

    fn code(s: &str) -> PostalCode {
        PostalCode::parse(s).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_request_wins() {
        let fake = FakeLookup::default();
        let autofill = Arc::new(AddressAutofill::new(fake.clone(), Duration::from_millis(500)));
        let draft = DraftId::generate();

        let first = {
            let autofill = Arc::clone(&autofill);
            tokio::spawn(async move { autofill.debounced(draft, &code("01310931")).await })
        };
        tokio::time::sleep(Duration::from_millis(200)).await;
        let second = autofill.debounced(draft, &code("01310930")).await;

        assert_eq!(first.await.unwrap(), AutofillResult::Superseded);
        assert!(matches!(
            second,
            AutofillResult::Completed(LookupOutcome::Found(ref a)) if a.street == "Avenida Paulista"
        ));
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drafts_are_independent() {
        let fake = FakeLookup::default();
        let autofill = Arc::new(AddressAutofill::new(fake, Duration::from_millis(500)));

        let other = {
            let autofill = Arc::clone(&autofill);
            tokio::spawn(async move {
                autofill
                    .debounced(DraftId::generate(), &code("00000000"))
                    .await
            })
        };
        let mine = autofill.debounced(DraftId::generate(), &code("01310930")).await;

        assert_eq!(
            other.await.unwrap(),
            AutofillResult::Completed(LookupOutcome::NotFound)
        );
        assert!(matches!(mine, AutofillResult::Completed(LookupOutcome::Found(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_supersede_cancels_pending() {
        let autofill = Arc::new(AddressAutofill::new(
            FakeLookup::default(),
            Duration::from_millis(500),
        ));
        let draft = DraftId::generate();

        let pending = {
            let autofill = Arc::clone(&autofill);
            tokio::spawn(async move { autofill.debounced(draft, &code("01310930")).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        autofill.supersede(draft).await;

        assert_eq!(pending.await.unwrap(), AutofillResult::Superseded);
    }

    #[tokio::test]
    async fn test_results_are_cached() {
        let fake = FakeLookup::default();
        let autofill = AddressAutofill::new(fake.clone(), Duration::ZERO);

        assert_eq!(autofill.resolve(&code("00000000")).await, LookupOutcome::NotFound);
        assert_eq!(autofill.resolve(&code("00000000")).await, LookupOutcome::NotFound);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let fake = FakeLookup {
            fail: true,
            ..FakeLookup::default()
        };
        let autofill = AddressAutofill::new(fake.clone(), Duration::ZERO);

        assert_eq!(autofill.resolve(&code("01310930")).await, LookupOutcome::Unavailable);
        assert_eq!(autofill.resolve(&code("01310930")).await, LookupOutcome::Unavailable);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 2);
    }
}
