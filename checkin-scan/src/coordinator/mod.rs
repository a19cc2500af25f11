//! Scan coordinator
//!
//! Owns the intake flow: decoded text is debounced into a lookup, the lookup
//! result becomes a working record, and confirming it marks the attendee
//! present. The camera is stopped whenever a modal (scan result or phone
//! lookup) is open and restarted after both have closed.
//!
//! # Concurrency
//!
//! One tokio task owns all state and processes one message at a time from
//! three queues:
//! - user intents from [`CoordinatorHandle`]
//! - decode events from the active [`DecodeSink`]
//! - completions of spawned lookups, updates and resume timers
//!
//! Network calls run on their own tasks and report back tagged with a
//! generation number. A completion whose generation no longer matches is
//! dropped, so a superseded or cancelled request can never overwrite newer
//! state. The view is published through a `watch` channel after every
//! message.

pub mod phone;
pub mod record;
pub mod session;
pub mod view;

use crate::decode::{DecodeEvent, DecodeSink, DecodeSource};
use crate::error::{CheckinError, CoordinatorClosed, DecoderError, ErrorState, LookupError};
use crate::lookup::{run_cancelable, LookupClient, LookupOutcome, LookupRequest};
use checkin_common::config::ScanConfig;
use checkin_common::events::{CheckinEvent, EventBus, LookupSlot};
use checkin_common::{time, AttendeePatch, AttendeeRecord};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, trace, warn, Instrument};

pub use phone::PhoneRule;
pub use record::WorkingRecord;
pub use session::{DecodeDecision, ScanSession};
pub use view::{CoordinatorView, Stage};

const INTENT_QUEUE_CAPACITY: usize = 32;
const DECODE_QUEUE_CAPACITY: usize = 64;

const NOT_FOUND_BY_ID: &str = "No attendee found for this code.";
const NOT_FOUND_BY_PHONE: &str = "No records found for this phone number.";

/// User intents accepted by the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    OpenPhoneLookup,
    ClosePhoneLookup,
    StartPhoneLookup(String),
    /// Switch the working record to another phone match (0-based)
    SelectMatch(usize),
    EditField { field: String, value: String },
    Confirm,
    /// Dismiss the scan result modal
    Cancel,
    RetryCamera,
    Shutdown,
}

/// Results coming back from spawned work
enum Completion {
    Lookup {
        slot: LookupSlot,
        generation: u64,
        result: Result<LookupOutcome, LookupError>,
    },
    Confirm {
        generation: u64,
        record_id: String,
        patch: AttendeePatch,
        result: Result<Option<AttendeeRecord>, LookupError>,
    },
    Resume {
        generation: u64,
    },
}

struct PendingConfirm {
    generation: u64,
    record_id: String,
    token: CancellationToken,
}

pub struct ScanCoordinator {
    config: ScanConfig,
    phone_rule: PhoneRule,
    session: ScanSession,
    client: Arc<dyn LookupClient>,
    decoder: Box<dyn DecodeSource>,
    events: EventBus,
    view: CoordinatorView,
    view_tx: watch::Sender<CoordinatorView>,
    decode_tx: mpsc::Sender<DecodeEvent>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    scanner_epoch: u64,
    /// Camera failed to start; only an explicit retry starts it again
    camera_failed: bool,
    confirm: Option<PendingConfirm>,
    confirm_generation: u64,
    resume_generation: u64,
    /// Check-in recorded, waiting for the post-confirm resume
    done: bool,
}

impl ScanCoordinator {
    /// Start the coordinator task
    ///
    /// The decode source is started immediately. The returned handle is the
    /// only way to reach the task; dropping every handle shuts it down.
    pub fn spawn(
        config: ScanConfig,
        client: Arc<dyn LookupClient>,
        decoder: Box<dyn DecodeSource>,
        events: EventBus,
    ) -> (CoordinatorHandle, JoinHandle<()>) {
        let (intent_tx, intent_rx) = mpsc::channel(INTENT_QUEUE_CAPACITY);
        let (decode_tx, decode_rx) = mpsc::channel(DECODE_QUEUE_CAPACITY);
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let session = ScanSession::new(config.cooldown());
        let session_id = session.id();
        let view = CoordinatorView::new(session_id);
        let (view_tx, view_rx) = watch::channel(view.clone());

        let coordinator = Self {
            phone_rule: PhoneRule::from_config(&config),
            config,
            session,
            client,
            decoder,
            events: events.clone(),
            view,
            view_tx,
            decode_tx,
            completion_tx,
            scanner_epoch: 0,
            camera_failed: false,
            confirm: None,
            confirm_generation: 0,
            resume_generation: 0,
            done: false,
        };

        let task = tokio::spawn(
            coordinator
                .run(intent_rx, decode_rx, completion_rx)
                .instrument(info_span!("scan_session", %session_id)),
        );

        let handle = CoordinatorHandle {
            intents: intent_tx,
            view: view_rx,
            events,
        };
        (handle, task)
    }

    async fn run(
        mut self,
        mut intents: mpsc::Receiver<Intent>,
        mut decodes: mpsc::Receiver<DecodeEvent>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        info!(
            cooldown_ms = self.config.cooldown_ms,
            lookup_timeout_ms = self.config.lookup_timeout_ms,
            "Scan coordinator started"
        );
        self.start_scanner();
        self.publish();

        loop {
            tokio::select! {
                intent = intents.recv() => match intent {
                    Some(Intent::Shutdown) | None => break,
                    Some(intent) => self.handle_intent(intent),
                },
                Some(event) = decodes.recv() => self.handle_decode_event(event, Instant::now()),
                Some(completion) = completions.recv() => self.handle_completion(completion),
            }
            self.publish();
        }

        self.shutdown();
        self.publish();
        info!("Scan coordinator stopped");
    }

    fn handle_intent(&mut self, intent: Intent) {
        debug!(?intent, "Intent received");
        match intent {
            Intent::OpenPhoneLookup => self.open_phone_lookup(),
            Intent::ClosePhoneLookup | Intent::Cancel => self.close_modal(),
            Intent::StartPhoneLookup(text) => self.start_phone_lookup(&text),
            Intent::SelectMatch(index) => self.select_match(index),
            Intent::EditField { field, value } => self.edit_field(&field, &value),
            Intent::Confirm => self.confirm(),
            Intent::RetryCamera => self.retry_camera(),
            Intent::Shutdown => self.shutdown(),
        }
    }

    fn handle_decode_event(&mut self, event: DecodeEvent, now: Instant) {
        if event.epoch() != self.scanner_epoch || !self.decoder.is_active() {
            trace!(
                epoch = event.epoch(),
                current = self.scanner_epoch,
                "Dropping event from stopped scanner"
            );
            return;
        }

        match event {
            DecodeEvent::Decoded { text, .. } => self.on_decoded(&text, now),
            DecodeEvent::Failed { message, .. } => {
                warn!(%message, "Decode source stopped unexpectedly");
                self.decoder.stop();
                self.report_camera_failure(DecoderError::CameraUnavailable(message));
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Lookup {
                slot,
                generation,
                result,
            } => self.on_lookup_settled(slot, generation, result),
            Completion::Confirm {
                generation,
                record_id,
                patch,
                result,
            } => self.on_confirm_settled(generation, record_id, patch, result),
            Completion::Resume { generation } => self.on_resume_due(generation),
        }
    }

    // ========================================================================
    // Decode intake
    // ========================================================================

    fn on_decoded(&mut self, text: &str, now: Instant) {
        match self.session.evaluate(text, now) {
            DecodeDecision::Accepted(code) => self.accept_code(code),
            decision => trace!(?decision, "Decode ignored"),
        }
    }

    fn accept_code(&mut self, code: String) {
        info!(code = %code, "Code accepted");
        self.stop_scanner();
        self.clear_modal_state();
        self.view.scan_modal_open = true;
        self.view.scanned_id = Some(code.clone());

        self.events.emit_lossy(CheckinEvent::CodeAccepted {
            session_id: self.session.id(),
            code: code.clone(),
            timestamp: time::now(),
        });

        self.begin_lookup(LookupSlot::Scan, LookupRequest::ById(code));
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    fn begin_lookup(&mut self, slot: LookupSlot, request: LookupRequest) {
        let (generation, token) = self.session.begin_fetch(slot);
        self.view.loading = slot == LookupSlot::Scan;
        self.view.phone_loading = slot == LookupSlot::Phone;
        *self.slot_error_mut(slot) = None;

        debug!(%slot, generation, ?request, "Lookup started");
        self.events.emit_lossy(CheckinEvent::LookupStarted {
            session_id: self.session.id(),
            slot,
            generation,
            timestamp: time::now(),
        });

        let client = Arc::clone(&self.client);
        let tx = self.completion_tx.clone();
        let timeout = self.config.lookup_timeout();
        tokio::spawn(async move {
            let result = run_cancelable(&token, timeout, request.execute(client.as_ref())).await;
            let _ = tx.send(Completion::Lookup {
                slot,
                generation,
                result,
            });
        });
    }

    fn on_lookup_settled(
        &mut self,
        slot: LookupSlot,
        generation: u64,
        result: Result<LookupOutcome, LookupError>,
    ) {
        if !self.session.finish_fetch(generation) {
            debug!(%slot, generation, "Discarding stale lookup result");
            return;
        }
        match slot {
            LookupSlot::Scan => self.view.loading = false,
            LookupSlot::Phone => self.view.phone_loading = false,
        }

        match result {
            Ok(LookupOutcome::Single(Some(record))) => self.load_record(&record, slot),
            Ok(LookupOutcome::Single(None)) => self.report_not_found(slot, NOT_FOUND_BY_ID),
            Ok(LookupOutcome::Many(records)) => match records.first().cloned() {
                Some(first) => {
                    if records.len() > 1 {
                        info!(%slot, matches = records.len(), "Several attendees share a number");
                    }
                    self.view.phone_matches = records;
                    self.load_record(&first, slot);
                }
                None => self.report_not_found(slot, NOT_FOUND_BY_PHONE),
            },
            Err(e) if e.is_cancelled() => debug!(%slot, generation, "Lookup cancelled"),
            Err(e) => {
                warn!(%slot, generation, error = %e, "Lookup failed");
                let error = CheckinError::Lookup(e);
                self.events.emit_lossy(CheckinEvent::LookupFailed {
                    session_id: self.session.id(),
                    slot,
                    message: error.to_string(),
                    timestamp: time::now(),
                });
                *self.slot_error_mut(slot) = Some(error.to_state());
            }
        }
    }

    fn load_record(&mut self, record: &AttendeeRecord, slot: LookupSlot) {
        let working = WorkingRecord::from_fetched(record, slot);
        info!(
            %slot,
            record_id = %working.id,
            present = working.present,
            actual_adults = working.actual_adults,
            actual_children = working.actual_children,
            "Attendee loaded"
        );

        self.done = false;
        self.view.warning = working
            .present
            .then(|| format!("{} is already checked in.", working.display_name()));
        *self.slot_error_mut(slot) = None;

        self.events.emit_lossy(CheckinEvent::RecordLoaded {
            session_id: self.session.id(),
            slot,
            record_id: working.id.clone(),
            already_present: working.present,
            timestamp: time::now(),
        });
        self.view.record = Some(working);
    }

    fn report_not_found(&mut self, slot: LookupSlot, message: &str) {
        info!(%slot, "No matching attendee");
        self.view.record = None;
        self.view.phone_matches.clear();
        self.view.warning = None;
        *self.slot_error_mut(slot) = Some(CheckinError::NotFound(message.to_string()).to_state());

        self.events.emit_lossy(CheckinEvent::NotFound {
            session_id: self.session.id(),
            slot,
            timestamp: time::now(),
        });
    }

    fn select_match(&mut self, index: usize) {
        if self.confirm.is_some() {
            debug!(index, "Match selection ignored while confirming");
            return;
        }
        match self.view.phone_matches.get(index).cloned() {
            Some(record) => self.load_record(&record, LookupSlot::Phone),
            None => {
                let error = CheckinError::Validation(format!(
                    "There is no match number {}.",
                    index + 1
                ));
                self.view.phone_error = Some(error.to_state());
            }
        }
    }

    // ========================================================================
    // Phone mode
    // ========================================================================

    fn open_phone_lookup(&mut self) {
        if self.view.phone_modal_open {
            return;
        }
        if let Some(slot) = self.session.cancel_fetch() {
            debug!(%slot, "Cancelled in-flight lookup for phone mode");
        }
        self.abandon_confirm();
        self.clear_modal_state();
        self.view.scan_modal_open = false;
        self.stop_scanner();
        self.view.phone_modal_open = true;
        info!("Phone lookup opened");
    }

    fn start_phone_lookup(&mut self, input: &str) {
        if self.confirm.is_some() {
            debug!("Phone lookup ignored while confirming");
            return;
        }
        if !self.view.phone_modal_open {
            self.open_phone_lookup();
        }
        match self.phone_rule.validate(input) {
            Ok(phone) => self.begin_lookup(LookupSlot::Phone, LookupRequest::ByPhone(phone)),
            Err(error) => {
                debug!(input, "Phone number rejected");
                self.view.phone_error = Some(error.to_state());
            }
        }
    }

    // ========================================================================
    // Edit and confirm
    // ========================================================================

    fn edit_field(&mut self, field: &str, value: &str) {
        if self.confirm.is_some() || self.done {
            debug!(field, "Edit ignored; check-in already submitted");
            return;
        }

        let Some(record) = self.view.record.as_mut() else {
            let slot = self.current_slot();
            *self.slot_error_mut(slot) = Some(CheckinError::NoRecord.to_state());
            return;
        };
        let slot = record.source;
        let result = record.apply_edit(field, value);

        match result {
            Ok(()) => {
                debug!(field, value, "Working record edited");
                let slot_error = self.slot_error_mut(slot);
                if slot_error.as_ref().is_some_and(|e| e.code == "VALIDATION") {
                    *slot_error = None;
                }
            }
            Err(error) => {
                debug!(field, value, %error, "Edit rejected");
                *self.slot_error_mut(slot) = Some(error.to_state());
            }
        }
    }

    fn confirm(&mut self) {
        if self.confirm.is_some() {
            debug!("Confirm already in flight");
            return;
        }
        if self.done {
            debug!("Check-in already recorded");
            return;
        }

        let Some(record) = self.view.record.clone() else {
            let slot = self.current_slot();
            *self.slot_error_mut(slot) = Some(CheckinError::NoRecord.to_state());
            return;
        };
        let slot = record.source;

        if record.id.trim().is_empty() {
            *self.slot_error_mut(slot) = Some(CheckinError::NoRecord.to_state());
            return;
        }
        if record.present {
            warn!(record_id = %record.id, "Refusing to check in an attendee twice");
            let error = CheckinError::AlreadyCheckedIn {
                name: record.display_name().to_string(),
            };
            *self.slot_error_mut(slot) = Some(error.to_state());
            return;
        }

        let record_id = record.id.clone();
        let patch = record.to_patch();
        info!(record_id = %record_id, ?patch, "Confirming check-in");

        self.confirm_generation += 1;
        let generation = self.confirm_generation;
        let token = CancellationToken::new();
        self.confirm = Some(PendingConfirm {
            generation,
            record_id: record_id.clone(),
            token: token.clone(),
        });
        *self.slot_error_mut(slot) = None;

        let client = Arc::clone(&self.client);
        let tx = self.completion_tx.clone();
        let timeout = self.config.lookup_timeout();
        tokio::spawn(async move {
            let result = run_cancelable(&token, timeout, client.update(&record_id, &patch)).await;
            let _ = tx.send(Completion::Confirm {
                generation,
                record_id,
                patch,
                result,
            });
        });
    }

    fn on_confirm_settled(
        &mut self,
        generation: u64,
        record_id: String,
        patch: AttendeePatch,
        result: Result<Option<AttendeeRecord>, LookupError>,
    ) {
        let awaited = self
            .confirm
            .as_ref()
            .is_some_and(|pending| pending.generation == generation);
        if !awaited {
            info!(
                record_id = %record_id,
                succeeded = result.is_ok(),
                "Confirm settled after its modal closed"
            );
            return;
        }
        self.confirm = None;

        // The working record must still be the one that was patched
        if !self.view.record.as_ref().is_some_and(|r| r.id == record_id) {
            warn!(
                record_id = %record_id,
                succeeded = result.is_ok(),
                "Confirm settled for an attendee no longer shown"
            );
            return;
        }

        let slot = self
            .view
            .record
            .as_ref()
            .map_or_else(|| self.current_slot(), |r| r.source);

        match result {
            Ok(echoed) => {
                if let Some(record) = self.view.record.as_mut() {
                    record.present = true;
                }
                info!(
                    record_id = %record_id,
                    actual_adults = patch.no_of_actual_adults,
                    actual_children = patch.no_of_actual_children,
                    echoed = echoed.is_some(),
                    "Check-in recorded"
                );

                self.done = true;
                self.view.warning = None;
                self.events.emit_lossy(CheckinEvent::CheckInConfirmed {
                    session_id: self.session.id(),
                    record_id,
                    actual_adults: patch.no_of_actual_adults,
                    actual_children: patch.no_of_actual_children,
                    timestamp: time::now(),
                });
                self.schedule_resume(self.config.resume_after_confirm());
            }
            Err(e) if e.is_cancelled() => debug!(record_id = %record_id, "Confirm cancelled"),
            Err(e) => {
                warn!(record_id = %record_id, error = %e, "Check-in update failed");
                let error = CheckinError::Lookup(e);
                self.events.emit_lossy(CheckinEvent::ConfirmFailed {
                    session_id: self.session.id(),
                    record_id,
                    message: error.to_string(),
                    timestamp: time::now(),
                });
                *self.slot_error_mut(slot) = Some(error.to_state());
            }
        }
    }

    /// Stop tracking an outstanding update
    ///
    /// The request itself keeps running so the store sees it through; its
    /// result is logged and otherwise ignored.
    fn abandon_confirm(&mut self) {
        if let Some(pending) = self.confirm.take() {
            info!(
                record_id = %pending.record_id,
                generation = pending.generation,
                "Leaving check-in update to finish in the background"
            );
        }
    }

    // ========================================================================
    // Modal and camera lifecycle
    // ========================================================================

    fn close_modal(&mut self) {
        if let Some(slot) = self.session.cancel_fetch() {
            debug!(%slot, "Cancelled in-flight lookup");
        }
        self.abandon_confirm();
        self.clear_modal_state();
        self.view.scan_modal_open = false;
        self.view.phone_modal_open = false;
        self.schedule_resume(self.config.resume_grace());
    }

    /// Reset per-modal view state; a camera error stays visible
    fn clear_modal_state(&mut self) {
        self.done = false;
        self.view.scanned_id = None;
        self.view.record = None;
        self.view.phone_matches.clear();
        self.view.warning = None;
        self.view.loading = false;
        self.view.phone_loading = false;
        self.view.phone_error = None;
        if !self.view.error.as_ref().is_some_and(ErrorState::is_camera) {
            self.view.error = None;
        }
    }

    fn retry_camera(&mut self) {
        self.camera_failed = false;
        if self.view.error.as_ref().is_some_and(ErrorState::is_camera) {
            self.view.error = None;
        }
        if self.modal_open() {
            debug!("Camera retry deferred until modals close");
            return;
        }
        // Supersede any pending resume; starting now
        self.resume_generation += 1;
        self.start_scanner();
    }

    fn start_scanner(&mut self) {
        if self.decoder.is_active() {
            return;
        }

        self.scanner_epoch += 1;
        let sink = DecodeSink::new(self.decode_tx.clone(), self.scanner_epoch);
        match self.decoder.start(sink) {
            Ok(()) => {
                self.camera_failed = false;
                info!(epoch = self.scanner_epoch, "Scanner started");
                self.events.emit_lossy(CheckinEvent::ScannerStarted {
                    session_id: self.session.id(),
                    timestamp: time::now(),
                });
            }
            Err(error) => {
                warn!(%error, "Scanner failed to start");
                self.report_camera_failure(error);
            }
        }
    }

    /// Stop the camera and invalidate any pending resume
    fn stop_scanner(&mut self) {
        self.resume_generation += 1;
        if self.decoder.is_active() {
            self.decoder.stop();
            info!(epoch = self.scanner_epoch, "Scanner stopped");
            self.events.emit_lossy(CheckinEvent::ScannerStopped {
                session_id: self.session.id(),
                timestamp: time::now(),
            });
        }
    }

    fn report_camera_failure(&mut self, error: DecoderError) {
        self.camera_failed = true;
        let message = error.to_string();
        self.view.error = Some(CheckinError::from(error).to_state());
        self.events.emit_lossy(CheckinEvent::CameraUnavailable {
            session_id: self.session.id(),
            message,
            timestamp: time::now(),
        });
    }

    fn schedule_resume(&mut self, delay: Duration) {
        self.resume_generation += 1;
        let generation = self.resume_generation;
        let tx = self.completion_tx.clone();
        debug!(delay_ms = delay.as_millis() as u64, generation, "Scanner resume scheduled");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Completion::Resume { generation });
        });
    }

    fn on_resume_due(&mut self, generation: u64) {
        if generation != self.resume_generation {
            trace!(generation, "Stale resume ignored");
            return;
        }
        if self.done {
            self.clear_modal_state();
            self.view.scan_modal_open = false;
            self.view.phone_modal_open = false;
        }
        if self.modal_open() {
            return;
        }
        if self.camera_failed {
            debug!("Camera unavailable; waiting for an explicit retry");
            return;
        }
        self.start_scanner();
    }

    fn shutdown(&mut self) {
        self.session.cancel_fetch();
        if let Some(pending) = self.confirm.take() {
            pending.token.cancel();
        }
        self.stop_scanner();
        self.view.loading = false;
        self.view.phone_loading = false;
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn modal_open(&self) -> bool {
        self.view.scan_modal_open || self.view.phone_modal_open
    }

    fn current_slot(&self) -> LookupSlot {
        if self.view.phone_modal_open {
            LookupSlot::Phone
        } else {
            LookupSlot::Scan
        }
    }

    fn slot_error_mut(&mut self, slot: LookupSlot) -> &mut Option<ErrorState> {
        match slot {
            LookupSlot::Scan => &mut self.view.error,
            LookupSlot::Phone => &mut self.view.phone_error,
        }
    }

    fn publish(&mut self) {
        self.view.scanner_active = self.decoder.is_active();
        self.view.processing = self.session.is_processing();
        self.view.fetch_in_flight = self.session.has_active_fetch();
        self.view.confirming = self.confirm.is_some();
        self.view.stage = self.view.derive_stage(self.done);

        let view = &self.view;
        self.view_tx.send_if_modified(|current| {
            if *current == *view {
                false
            } else {
                *current = view.clone();
                true
            }
        });
    }
}

/// Cloneable handle to a running coordinator
#[derive(Clone)]
pub struct CoordinatorHandle {
    intents: mpsc::Sender<Intent>,
    view: watch::Receiver<CoordinatorView>,
    events: EventBus,
}

impl CoordinatorHandle {
    pub async fn send(&self, intent: Intent) -> Result<(), CoordinatorClosed> {
        self.intents.send(intent).await.map_err(|_| CoordinatorClosed)
    }

    pub async fn open_phone_lookup(&self) -> Result<(), CoordinatorClosed> {
        self.send(Intent::OpenPhoneLookup).await
    }

    pub async fn close_phone_lookup(&self) -> Result<(), CoordinatorClosed> {
        self.send(Intent::ClosePhoneLookup).await
    }

    pub async fn start_phone_lookup(
        &self,
        phone: impl Into<String>,
    ) -> Result<(), CoordinatorClosed> {
        self.send(Intent::StartPhoneLookup(phone.into())).await
    }

    pub async fn select_match(&self, index: usize) -> Result<(), CoordinatorClosed> {
        self.send(Intent::SelectMatch(index)).await
    }

    pub async fn edit_field(
        &self,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), CoordinatorClosed> {
        self.send(Intent::EditField {
            field: field.into(),
            value: value.into(),
        })
        .await
    }

    pub async fn confirm(&self) -> Result<(), CoordinatorClosed> {
        self.send(Intent::Confirm).await
    }

    /// Dismiss the scan result modal, cancelling its lookup
    pub async fn cancel(&self) -> Result<(), CoordinatorClosed> {
        self.send(Intent::Cancel).await
    }

    pub async fn close_modal(&self) -> Result<(), CoordinatorClosed> {
        self.cancel().await
    }

    pub async fn retry_camera(&self) -> Result<(), CoordinatorClosed> {
        self.send(Intent::RetryCamera).await
    }

    pub async fn shutdown(&self) -> Result<(), CoordinatorClosed> {
        self.send(Intent::Shutdown).await
    }

    /// Latest published view
    pub fn view(&self) -> CoordinatorView {
        self.view.borrow().clone()
    }

    /// Receiver notified on every view change
    pub fn watch(&self) -> watch::Receiver<CoordinatorView> {
        self.view.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CheckinEvent> {
        self.events.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.intents.is_closed()
    }
}
