//! Scan session state
//!
//! [`ScanSession`] holds the debounce and in-flight tracking for one device
//! session. All transitions are synchronous; the coordinator calls them from
//! its single message loop so no locking is needed.
//!
//! Generations are issued from one counter for every fetch regardless of
//! slot, so a completion can be matched against the active fetch by number
//! alone.

use checkin_common::events::LookupSlot;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Outcome of offering a decoded text to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeDecision {
    /// Code accepted for processing (trimmed)
    Accepted(String),
    /// Blank after trimming
    Empty,
    /// Inside the cooldown window of the last accepted code
    CoolingDown,
    /// A previous code is still being processed
    Processing,
    /// Same code as the last accepted one, still within its window
    Duplicate,
}

/// The one in-flight lookup
#[derive(Debug)]
pub struct ActiveFetch {
    pub slot: LookupSlot,
    pub generation: u64,
    token: CancellationToken,
}

#[derive(Debug)]
pub struct ScanSession {
    id: Uuid,
    cooldown: Duration,
    last_accepted_code: Option<String>,
    cooldown_until: Option<Instant>,
    is_processing: bool,
    active_fetch: Option<ActiveFetch>,
    next_generation: u64,
}

impl ScanSession {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            cooldown,
            last_accepted_code: None,
            cooldown_until: None,
            is_processing: false,
            active_fetch: None,
            next_generation: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn last_accepted_code(&self) -> Option<&str> {
        self.last_accepted_code.as_deref()
    }

    pub fn cooldown_until(&self) -> Option<Instant> {
        self.cooldown_until
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn active_fetch(&self) -> Option<&ActiveFetch> {
        self.active_fetch.as_ref()
    }

    pub fn has_active_fetch(&self) -> bool {
        self.active_fetch.is_some()
    }

    fn in_cooldown(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    /// Decide whether a decoded text starts a new lookup
    ///
    /// On acceptance the code is recorded, processing begins and the
    /// cooldown window restarts from `now`.
    pub fn evaluate(&mut self, raw: &str, now: Instant) -> DecodeDecision {
        let code = raw.trim();
        if code.is_empty() {
            return DecodeDecision::Empty;
        }
        if self.in_cooldown(now) {
            return DecodeDecision::CoolingDown;
        }
        if self.is_processing {
            return DecodeDecision::Processing;
        }
        // Same-code guard; only reachable if the window check above changes
        if self.last_accepted_code.as_deref() == Some(code) && self.in_cooldown(now) {
            return DecodeDecision::Duplicate;
        }

        self.last_accepted_code = Some(code.to_string());
        self.is_processing = true;
        self.cooldown_until = Some(now + self.cooldown);
        DecodeDecision::Accepted(code.to_string())
    }

    /// Register a new fetch, cancelling any fetch still in flight
    pub fn begin_fetch(&mut self, slot: LookupSlot) -> (u64, CancellationToken) {
        self.cancel_fetch();

        self.next_generation += 1;
        let generation = self.next_generation;
        let token = CancellationToken::new();
        self.active_fetch = Some(ActiveFetch {
            slot,
            generation,
            token: token.clone(),
        });
        if slot == LookupSlot::Scan {
            self.is_processing = true;
        }
        (generation, token)
    }

    /// Settle the fetch with this generation
    ///
    /// Returns `false` for a stale generation (superseded or cancelled), in
    /// which case nothing changes.
    pub fn finish_fetch(&mut self, generation: u64) -> bool {
        match &self.active_fetch {
            Some(active) if active.generation == generation => {
                self.active_fetch = None;
                self.is_processing = false;
                true
            }
            _ => false,
        }
    }

    /// Cancel the in-flight fetch (if any) and end processing
    pub fn cancel_fetch(&mut self) -> Option<LookupSlot> {
        self.is_processing = false;
        self.active_fetch.take().map(|active| {
            active.token.cancel();
            active.slot
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_millis(3500);

    #[test]
    fn test_blank_input_is_ignored() {
        let mut session = ScanSession::new(COOLDOWN);
        let now = Instant::now();
        assert_eq!(session.evaluate("", now), DecodeDecision::Empty);
        assert_eq!(session.evaluate("  \t\n", now), DecodeDecision::Empty);
        assert!(!session.is_processing());
        assert!(session.last_accepted_code().is_none());
    }

    #[test]
    fn test_accept_trims_and_starts_processing() {
        let mut session = ScanSession::new(COOLDOWN);
        let now = Instant::now();

        assert_eq!(
            session.evaluate("  abc123 \n", now),
            DecodeDecision::Accepted("abc123".to_string())
        );
        assert!(session.is_processing());
        assert_eq!(session.last_accepted_code(), Some("abc123"));
        assert_eq!(session.cooldown_until(), Some(now + COOLDOWN));
    }

    #[test]
    fn test_repeat_within_cooldown_is_rejected() {
        let mut session = ScanSession::new(COOLDOWN);
        let start = Instant::now();
        session.evaluate("abc123", start);
        session.finish_fetch(0);
        session.cancel_fetch();

        let one_second_later = start + Duration::from_secs(1);
        assert_eq!(
            session.evaluate("abc123", one_second_later),
            DecodeDecision::CoolingDown
        );
        assert_eq!(
            session.evaluate("other", one_second_later),
            DecodeDecision::CoolingDown
        );
    }

    #[test]
    fn test_burst_accepts_exactly_one() {
        let mut session = ScanSession::new(COOLDOWN);
        let start = Instant::now();

        let accepted = (0..50)
            .map(|i| start + Duration::from_millis(i * 30))
            .filter(|at| matches!(session.evaluate("abc123", *at), DecodeDecision::Accepted(_)))
            .count();

        assert_eq!(accepted, 1);
    }

    #[test]
    fn test_processing_blocks_after_cooldown() {
        let mut session = ScanSession::new(COOLDOWN);
        let start = Instant::now();
        session.evaluate("abc123", start);
        let (_generation, _token) = session.begin_fetch(LookupSlot::Scan);

        let later = start + COOLDOWN + Duration::from_millis(1);
        assert_eq!(session.evaluate("xyz", later), DecodeDecision::Processing);
    }

    #[test]
    fn test_accept_again_after_cooldown_and_settle() {
        let mut session = ScanSession::new(COOLDOWN);
        let start = Instant::now();
        session.evaluate("abc123", start);
        let (generation, _token) = session.begin_fetch(LookupSlot::Scan);
        assert!(session.finish_fetch(generation));

        let later = start + COOLDOWN;
        assert_eq!(
            session.evaluate("abc123", later),
            DecodeDecision::Accepted("abc123".to_string())
        );
    }

    #[test]
    fn test_new_fetch_cancels_previous() {
        let mut session = ScanSession::new(COOLDOWN);
        let (first, first_token) = session.begin_fetch(LookupSlot::Phone);
        let (second, second_token) = session.begin_fetch(LookupSlot::Phone);

        assert!(first_token.is_cancelled());
        assert!(!second_token.is_cancelled());
        assert!(second > first);

        // Late completion of the superseded fetch is stale
        assert!(!session.finish_fetch(first));
        assert!(session.has_active_fetch());
        assert!(session.finish_fetch(second));
        assert!(!session.has_active_fetch());
    }

    #[test]
    fn test_cancel_clears_processing_and_fetch() {
        let mut session = ScanSession::new(COOLDOWN);
        session.evaluate("abc123", Instant::now());
        let (generation, token) = session.begin_fetch(LookupSlot::Scan);

        assert_eq!(session.cancel_fetch(), Some(LookupSlot::Scan));
        assert!(token.is_cancelled());
        assert!(!session.is_processing());
        assert!(!session.has_active_fetch());
        assert!(!session.finish_fetch(generation));

        // Idempotent
        assert_eq!(session.cancel_fetch(), None);
    }

    #[test]
    fn test_cooldown_survives_cancel() {
        let mut session = ScanSession::new(COOLDOWN);
        let start = Instant::now();
        session.evaluate("abc123", start);
        session.cancel_fetch();

        assert_eq!(
            session.evaluate("abc123", start + Duration::from_millis(300)),
            DecodeDecision::CoolingDown
        );
    }
}
