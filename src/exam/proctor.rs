// src/exam/proctor.rs

use std::fmt;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::{
    config::{DEBOUNCE_SECS, KIND_SUPPRESSION_SECS, LOCKOUT_DISPLAY_SECS},
    exam::{platform::Capability, timer::TimerSlot},
    models::{
        attempt::AttemptStatus,
        violation::{ViolationEvent, ViolationKind},
    },
};

/// Shown when Escape is pressed; some hosts cannot stop Escape from leaving fullscreen.
pub const FULLSCREEN_REQUIRED: &str = "PROCTORING ALERT: Fullscreen is required! Do not press Esc.";

/// The three independent proctoring intervals.
///
/// `debounce` applies across all kinds; `kind_suppression` only to a repeat of
/// the immediately preceding kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProctorTimings {
    pub debounce: Duration,
    pub kind_suppression: Duration,
    pub lockout_display: Duration,
}

impl Default for ProctorTimings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(DEBOUNCE_SECS),
            kind_suppression: Duration::from_secs(KIND_SUPPRESSION_SECS),
            lockout_display: Duration::from_secs(LOCKOUT_DISPLAY_SECS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardAction {
    Copy,
    Cut,
    Paste,
}

impl fmt::Display for ClipboardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardAction::Copy => f.write_str("copy"),
            ClipboardAction::Cut => f.write_str("cut"),
            ClipboardAction::Paste => f.write_str("paste"),
        }
    }
}

/// Raw client-observable events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    VisibilityChanged { hidden: bool },
    WindowBlur,
    FullscreenChanged { active: bool },
    ContextMenu,
    Clipboard(ClipboardAction),
    SelectStart,
    EscapePressed,
}

impl Signal {
    /// Whether the UI boundary must cancel the event's default action.
    pub fn prevents_default(&self) -> bool {
        matches!(
            self,
            Signal::ContextMenu | Signal::Clipboard(_) | Signal::SelectStart | Signal::EscapePressed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Active,
    /// A violation (or the Escape alert) is being flashed.
    LockoutVisual,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenState {
    Ok,
    /// Persistent banner until fullscreen is re-entered.
    Breached,
}

/// How an attempt is being saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitDecision {
    pub status: AttemptStatus,
    pub automatic: bool,
}

impl SubmitDecision {
    pub const FORCED: SubmitDecision = SubmitDecision {
        status: AttemptStatus::Completed,
        automatic: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// A save is in flight or the attempt is submitted.
    Closed,
    SameKind,
    Debounced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Discarded(DiscardReason),
    Recorded {
        event: ViolationEvent,
        warning_count: u32,
        /// Set when this violation reached the warning limit.
        forced: Option<SubmitDecision>,
    },
}

impl Verdict {
    pub fn is_recorded(&self) -> bool {
        matches!(self, Verdict::Recorded { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalResponse {
    pub prevent_default: bool,
    /// Present when the signal maps to a violation kind.
    pub verdict: Option<Verdict>,
}

/// Proctoring state for one exam attempt.
///
/// Single writer: every method runs to completion and takes the current time
/// explicitly, so the whole machine is driven (and tested) without a clock.
#[derive(Debug)]
pub struct ProctorSession {
    timings: ProctorTimings,
    warning_limit: u32,
    warning_count: u32,
    last_kind: Option<ViolationKind>,
    kind_timer: TimerSlot,
    last_recorded_at: Option<Instant>,
    lockout_message: Option<String>,
    lockout_timer: TimerSlot,
    fullscreen: FullscreenState,
    saving: Option<SubmitDecision>,
    submitted: Option<SubmitDecision>,
}

impl ProctorSession {
    pub fn new(warning_limit: u32, timings: ProctorTimings) -> Self {
        Self {
            timings,
            warning_limit: warning_limit.max(1),
            warning_count: 0,
            last_kind: None,
            kind_timer: TimerSlot::new(),
            last_recorded_at: None,
            lockout_message: None,
            lockout_timer: TimerSlot::new(),
            fullscreen: FullscreenState::Ok,
            saving: None,
            submitted: None,
        }
    }

    pub fn warning_count(&self) -> u32 {
        self.warning_count
    }

    pub fn warning_limit(&self) -> u32 {
        self.warning_limit
    }

    pub fn fullscreen(&self) -> FullscreenState {
        self.fullscreen
    }

    pub fn lockout_message(&self) -> Option<&str> {
        self.lockout_message.as_deref()
    }

    /// The decision of the save in flight, if any.
    pub fn pending_save(&self) -> Option<SubmitDecision> {
        self.saving
    }

    /// The final decision once the attempt is submitted.
    pub fn submission(&self) -> Option<SubmitDecision> {
        self.submitted
    }

    pub fn phase(&self) -> SessionPhase {
        let finishing = matches!(
            self.saving,
            Some(SubmitDecision {
                status: AttemptStatus::Completed,
                ..
            })
        );
        if self.submitted.is_some() || finishing {
            SessionPhase::Submitted
        } else if self.lockout_message.is_some() {
            SessionPhase::LockoutVisual
        } else {
            SessionPhase::Active
        }
    }

    /// True while any save is in flight or after submission; violations are dropped.
    pub fn is_closed(&self) -> bool {
        self.saving.is_some() || self.submitted.is_some()
    }

    /// Earliest instant at which [`fire_timers`](Self::fire_timers) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.kind_timer.deadline(), self.lockout_timer.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Expires due timers. Returns true if anything visible changed.
    pub fn fire_timers(&mut self, now: Instant) -> bool {
        if self.kind_timer.poll(now).is_some() {
            self.last_kind = None;
        }
        if self.lockout_timer.poll(now).is_some() {
            self.lockout_message = None;
            return true;
        }
        false
    }

    /// Maps a platform signal onto the state machine.
    pub fn handle_signal(&mut self, signal: &Signal, now: Instant) -> SignalResponse {
        self.fire_timers(now);
        let prevent_default = signal.prevents_default();
        let verdict = match signal {
            Signal::VisibilityChanged { hidden: true } => Some(self.log_violation(
                ViolationKind::TabSwitch,
                "Student switched tabs or minimized the browser.",
                now,
            )),
            Signal::VisibilityChanged { hidden: false } => None,
            Signal::WindowBlur => Some(self.log_violation(
                ViolationKind::FocusLoss,
                "Student clicked outside the exam window.",
                now,
            )),
            Signal::FullscreenChanged { active } => {
                if self.is_closed() {
                    None
                } else if *active {
                    self.fullscreen = FullscreenState::Ok;
                    None
                } else {
                    // The banner goes up even when the violation itself is debounced.
                    self.fullscreen = FullscreenState::Breached;
                    Some(self.log_violation(
                        ViolationKind::FullscreenExit,
                        "Student exited fullscreen mode.",
                        now,
                    ))
                }
            }
            Signal::ContextMenu => Some(self.log_violation(
                ViolationKind::RightClick,
                "Student attempted to right-click.",
                now,
            )),
            Signal::Clipboard(action) => Some(self.log_violation(
                ViolationKind::CopyPaste,
                format!("Student attempted to {}.", action),
                now,
            )),
            Signal::SelectStart => None,
            Signal::EscapePressed => {
                // No alert once the attempt is being finished or is done.
                if self.phase() != SessionPhase::Submitted {
                    self.show_lockout(FULLSCREEN_REQUIRED.to_string(), now);
                }
                None
            }
        };

        SignalResponse {
            prevent_default,
            verdict,
        }
    }

    /// Records a violation unless it is closed out, a repeat of the previous kind, or debounced.
    pub fn log_violation(
        &mut self,
        kind: ViolationKind,
        detail: impl Into<String>,
        now: Instant,
    ) -> Verdict {
        self.fire_timers(now);

        if self.is_closed() {
            return self.discard(kind, DiscardReason::Closed);
        }
        if self.last_kind == Some(kind) {
            return self.discard(kind, DiscardReason::SameKind);
        }
        let debounced = self
            .last_recorded_at
            .is_some_and(|last| now.saturating_duration_since(last) < self.timings.debounce);
        if debounced {
            return self.discard(kind, DiscardReason::Debounced);
        }

        self.warning_count += 1;
        self.last_kind = Some(kind);
        self.last_recorded_at = Some(now);
        self.kind_timer.arm(now, self.timings.kind_suppression);

        let forced = if self.warning_count >= self.warning_limit {
            tracing::warn!(
                kind = %kind,
                warnings = self.warning_count,
                limit = self.warning_limit,
                "Warning limit reached, forcing submission"
            );
            self.saving = Some(SubmitDecision::FORCED);
            Some(SubmitDecision::FORCED)
        } else {
            tracing::info!(
                kind = %kind,
                warnings = self.warning_count,
                limit = self.warning_limit,
                "Violation recorded"
            );
            None
        };

        let detail = detail.into();
        self.show_lockout(detail.clone(), now);

        Verdict::Recorded {
            event: ViolationEvent {
                kind,
                detail,
                timestamp: Utc::now(),
            },
            warning_count: self.warning_count,
            forced,
        }
    }

    /// Flips the save guard. Returns `None` if a save is already running or the attempt is over.
    pub fn begin_save(&mut self, status: AttemptStatus, automatic: bool) -> Option<SubmitDecision> {
        if self.is_closed() {
            return None;
        }
        let decision = SubmitDecision { status, automatic };
        self.saving = Some(decision);
        Some(decision)
    }

    /// Completes the save in flight. A `COMPLETED` save makes the session terminal.
    pub fn save_succeeded(&mut self) -> Option<SubmitDecision> {
        let decision = self.saving.take()?;
        if decision.status == AttemptStatus::Completed {
            self.submitted = Some(decision);
            self.kind_timer.cancel();
            self.lockout_timer.cancel();
            self.lockout_message = None;
        }
        Some(decision)
    }

    /// Drops the save in flight and reopens the session.
    pub fn save_failed(&mut self) -> Option<SubmitDecision> {
        self.saving.take()
    }

    pub fn capability_granted(&mut self, capability: Capability) {
        if capability == Capability::Fullscreen {
            self.fullscreen = FullscreenState::Ok;
        }
    }

    /// Records a refused capability. The exam continues without that protection.
    pub fn capability_denied(&mut self, capability: Capability, reason: &str) {
        tracing::warn!(capability = %capability, reason, "Capability denied, continuing without it");
        if capability == Capability::Fullscreen {
            self.fullscreen = FullscreenState::Breached;
        }
    }

    fn show_lockout(&mut self, message: String, now: Instant) {
        self.lockout_message = Some(message);
        self.lockout_timer.arm(now, self.timings.lockout_display);
    }

    fn discard(&self, kind: ViolationKind, reason: DiscardReason) -> Verdict {
        tracing::debug!(kind = %kind, ?reason, "Violation discarded");
        Verdict::Discarded(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn session(limit: u32) -> (ProctorSession, Instant) {
        (ProctorSession::new(limit, ProctorTimings::default()), Instant::now())
    }

    #[test]
    fn test_first_violation_is_recorded() {
        let (mut s, t0) = session(10);
        let verdict = s.log_violation(ViolationKind::TabSwitch, "switched", t0);
        match verdict {
            Verdict::Recorded {
                event,
                warning_count,
                forced,
            } => {
                assert_eq!(event.kind, ViolationKind::TabSwitch);
                assert_eq!(event.detail, "switched");
                assert_eq!(warning_count, 1);
                assert_eq!(forced, None);
            }
            other => panic!("unexpected verdict {:?}", other),
        }
        assert_eq!(s.phase(), SessionPhase::LockoutVisual);
        assert_eq!(s.lockout_message(), Some("switched"));
    }

    #[test]
    fn test_same_kind_within_window_counts_once() {
        let (mut s, t0) = session(10);
        assert!(s.log_violation(ViolationKind::TabSwitch, "a", t0).is_recorded());
        assert_eq!(
            s.log_violation(ViolationKind::TabSwitch, "b", t0 + secs(0.5)),
            Verdict::Discarded(DiscardReason::SameKind)
        );
        assert_eq!(s.warning_count(), 1);
    }

    #[test]
    fn test_any_kind_is_debounced() {
        let (mut s, t0) = session(10);
        assert!(s.log_violation(ViolationKind::TabSwitch, "a", t0).is_recorded());
        // Alt-tab fires blur right after visibility; the kind differs but the window applies.
        assert_eq!(
            s.log_violation(ViolationKind::FocusLoss, "b", t0 + secs(0.1)),
            Verdict::Discarded(DiscardReason::Debounced)
        );
        // Per-kind suppression expired at 2s, but the 3s debounce still holds.
        assert_eq!(
            s.log_violation(ViolationKind::TabSwitch, "c", t0 + secs(2.5)),
            Verdict::Discarded(DiscardReason::Debounced)
        );
        assert!(s.log_violation(ViolationKind::TabSwitch, "d", t0 + secs(3.0)).is_recorded());
        assert_eq!(s.warning_count(), 2);
    }

    #[test]
    fn test_kind_suppression_longer_than_debounce() {
        let timings = ProctorTimings {
            debounce: secs(1.0),
            kind_suppression: secs(4.0),
            lockout_display: secs(5.0),
        };
        let mut s = ProctorSession::new(10, timings);
        let t0 = Instant::now();
        assert!(s.log_violation(ViolationKind::RightClick, "a", t0).is_recorded());
        assert_eq!(
            s.log_violation(ViolationKind::RightClick, "b", t0 + secs(2.0)),
            Verdict::Discarded(DiscardReason::SameKind)
        );
        assert!(s.log_violation(ViolationKind::CopyPaste, "c", t0 + secs(2.0)).is_recorded());
        // The previous kind is now COPY_PASTE, so RIGHT_CLICK is free again.
        assert!(s.log_violation(ViolationKind::RightClick, "d", t0 + secs(3.5)).is_recorded());
        assert_eq!(s.warning_count(), 3);
    }

    #[test]
    fn test_threshold_forces_submission_then_noop() {
        let (mut s, t0) = session(3);
        assert!(s.log_violation(ViolationKind::TabSwitch, "1", t0).is_recorded());
        assert!(s.log_violation(ViolationKind::FocusLoss, "2", t0 + secs(3.0)).is_recorded());
        match s.log_violation(ViolationKind::RightClick, "3", t0 + secs(6.0)) {
            Verdict::Recorded {
                warning_count,
                forced,
                ..
            } => {
                assert_eq!(warning_count, 3);
                assert_eq!(forced, Some(SubmitDecision::FORCED));
            }
            other => panic!("unexpected verdict {:?}", other),
        }
        assert_eq!(s.phase(), SessionPhase::Submitted);
        assert_eq!(s.pending_save(), Some(SubmitDecision::FORCED));

        assert_eq!(
            s.log_violation(ViolationKind::CopyPaste, "4", t0 + secs(20.0)),
            Verdict::Discarded(DiscardReason::Closed)
        );
        assert_eq!(s.warning_count(), 3);

        assert_eq!(s.save_succeeded(), Some(SubmitDecision::FORCED));
        assert_eq!(s.submission(), Some(SubmitDecision::FORCED));
        assert_eq!(s.phase(), SessionPhase::Submitted);
        assert_eq!(
            s.log_violation(ViolationKind::TabSwitch, "5", t0 + secs(40.0)),
            Verdict::Discarded(DiscardReason::Closed)
        );
    }

    #[test]
    fn test_lockout_clears_and_restarts() {
        let (mut s, t0) = session(10);
        s.log_violation(ViolationKind::TabSwitch, "first", t0);
        assert_eq!(s.next_deadline(), Some(t0 + secs(2.0)));

        s.handle_signal(&Signal::EscapePressed, t0 + secs(4.0));
        assert_eq!(s.lockout_message(), Some(FULLSCREEN_REQUIRED));

        // The first lockout would have ended at 5s; the Escape alert replaced it.
        assert!(!s.fire_timers(t0 + secs(6.0)));
        assert_eq!(s.phase(), SessionPhase::LockoutVisual);

        assert!(s.fire_timers(t0 + secs(9.0)));
        assert_eq!(s.phase(), SessionPhase::Active);
        assert_eq!(s.lockout_message(), None);
        assert_eq!(s.next_deadline(), None);
        assert_eq!(s.warning_count(), 1);
    }

    #[test]
    fn test_signal_mapping() {
        let (mut s, t0) = session(10);

        let response = s.handle_signal(&Signal::SelectStart, t0);
        assert!(response.prevent_default);
        assert_eq!(response.verdict, None);

        let response = s.handle_signal(&Signal::VisibilityChanged { hidden: false }, t0);
        assert!(!response.prevent_default);
        assert_eq!(response.verdict, None);

        let response = s.handle_signal(&Signal::Clipboard(ClipboardAction::Paste), t0);
        assert!(response.prevent_default);
        match response.verdict {
            Some(Verdict::Recorded { event, .. }) => {
                assert_eq!(event.kind, ViolationKind::CopyPaste);
                assert_eq!(event.detail, "Student attempted to paste.");
            }
            other => panic!("unexpected verdict {:?}", other),
        }

        let response = s.handle_signal(&Signal::ContextMenu, t0 + secs(1.0));
        assert!(response.prevent_default);
        assert_eq!(response.verdict, Some(Verdict::Discarded(DiscardReason::Debounced)));
    }

    #[test]
    fn test_fullscreen_banner_is_independent_of_debounce() {
        let (mut s, t0) = session(10);
        s.handle_signal(&Signal::VisibilityChanged { hidden: true }, t0);

        let response = s.handle_signal(&Signal::FullscreenChanged { active: false }, t0 + secs(1.0));
        assert_eq!(response.verdict, Some(Verdict::Discarded(DiscardReason::Debounced)));
        assert_eq!(s.fullscreen(), FullscreenState::Breached);

        s.handle_signal(&Signal::FullscreenChanged { active: true }, t0 + secs(2.0));
        assert_eq!(s.fullscreen(), FullscreenState::Ok);
        assert_eq!(s.warning_count(), 1);
    }

    #[test]
    fn test_fullscreen_reentry_keeps_logged_violation() {
        let (mut s, t0) = session(10);
        let response = s.handle_signal(&Signal::FullscreenChanged { active: false }, t0);
        assert!(response.verdict.unwrap().is_recorded());
        s.handle_signal(&Signal::FullscreenChanged { active: true }, t0 + secs(1.0));
        assert_eq!(s.fullscreen(), FullscreenState::Ok);
        assert_eq!(s.warning_count(), 1);
    }

    #[test]
    fn test_escape_is_not_a_violation() {
        let (mut s, t0) = session(1);
        let response = s.handle_signal(&Signal::EscapePressed, t0);
        assert!(response.prevent_default);
        assert_eq!(response.verdict, None);
        assert_eq!(s.warning_count(), 0);
        assert_eq!(s.phase(), SessionPhase::LockoutVisual);
    }

    #[test]
    fn test_escape_after_submission_shows_nothing() {
        let (mut s, t0) = session(10);
        let decision = s.begin_save(AttemptStatus::Completed, false).unwrap();

        // While the final save is in flight.
        let response = s.handle_signal(&Signal::EscapePressed, t0);
        assert!(response.prevent_default);
        assert_eq!(s.lockout_message(), None);
        assert_eq!(s.next_deadline(), None);

        assert_eq!(s.save_succeeded(), Some(decision));
        s.handle_signal(&Signal::EscapePressed, t0 + secs(1.0));
        assert_eq!(s.lockout_message(), None);
        assert_eq!(s.phase(), SessionPhase::Submitted);
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn test_escape_during_autosave_still_alerts() {
        let (mut s, t0) = session(10);
        s.begin_save(AttemptStatus::InProgress, true).unwrap();
        s.handle_signal(&Signal::EscapePressed, t0);
        assert_eq!(s.lockout_message(), Some(FULLSCREEN_REQUIRED));
        assert_eq!(s.warning_count(), 0);
    }

    #[test]
    fn test_capability_denial_keeps_session_active() {
        let (mut s, t0) = session(10);
        s.capability_denied(Capability::KeyboardLock, "not allowed");
        s.capability_denied(Capability::Fullscreen, "user gesture required");
        assert_eq!(s.phase(), SessionPhase::Active);
        assert_eq!(s.fullscreen(), FullscreenState::Breached);
        assert!(s.log_violation(ViolationKind::TabSwitch, "still proctored", t0).is_recorded());
    }

    #[test]
    fn test_autosave_window_drops_violations() {
        let (mut s, t0) = session(10);
        let decision = s.begin_save(AttemptStatus::InProgress, true).unwrap();
        assert_eq!(decision.status, AttemptStatus::InProgress);
        assert!(s.begin_save(AttemptStatus::Completed, false).is_none());
        assert_eq!(s.phase(), SessionPhase::Active);
        assert_eq!(
            s.log_violation(ViolationKind::TabSwitch, "during save", t0),
            Verdict::Discarded(DiscardReason::Closed)
        );

        assert_eq!(s.save_succeeded(), Some(decision));
        assert_eq!(s.submission(), None);
        assert!(s.log_violation(ViolationKind::TabSwitch, "after save", t0).is_recorded());
    }

    #[test]
    fn test_failed_final_save_reopens() {
        let (mut s, _) = session(10);
        s.begin_save(AttemptStatus::Completed, false).unwrap();
        assert_eq!(s.phase(), SessionPhase::Submitted);
        assert!(s.save_failed().is_some());
        assert_eq!(s.phase(), SessionPhase::Active);
        assert!(s.begin_save(AttemptStatus::Completed, false).is_some());
    }

    #[test]
    fn test_zero_limit_is_clamped() {
        let (s, _) = session(0);
        assert_eq!(s.warning_limit(), 1);
    }
}
