// src/exam/runner.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{
    error::AppError,
    exam::{
        answers::to_canonical,
        countdown::{Countdown, Tick, format_clock},
        gate::{AttemptPlan, Student},
        platform::{Capability, Grant, Platform},
        proctor::{FullscreenState, ProctorSession, SessionPhase, Signal, SubmitDecision, Verdict},
    },
    models::{
        attempt::{Answer, Attempt, AttemptStatus, PaperRef},
        paper::Paper,
        question::Question,
        violation::{StudentIdentity, ViolationEvent, ViolationRecord},
    },
    state::AppState,
};

const INPUT_BUFFER: usize = 32;
const CLOCK_PERIOD: Duration = Duration::from_secs(1);

/// What the exam UI feeds the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamInput {
    Signal(Signal),
    /// Replaces the answer at `index`, in the order the questions are shown.
    Answer { index: usize, answer: Answer },
    /// Saves progress without ending the attempt.
    Autosave,
    /// The student submits.
    Finish,
}

/// Snapshot published after every processed input or tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub warning_count: u32,
    pub warning_limit: u32,
    pub fullscreen: FullscreenState,
    pub lockout_message: Option<String>,
    pub remaining_secs: u64,
    /// `remaining_secs` as the header shows it.
    pub clock: String,
    pub saving: bool,
}

#[derive(Debug, Clone)]
pub struct ExamOutcome {
    /// The attempt as the submission store returned it.
    pub attempt: Attempt,
    pub submission: SubmitDecision,
    pub warning_count: u32,
}

struct SaveResult {
    decision: SubmitDecision,
    result: Result<Attempt, AppError>,
}

/// Drives one attempt: proctoring, answers, the clock and saving.
///
/// Inputs are processed one at a time. Violation delivery and saves run on
/// spawned tasks; save results come back through an internal channel.
pub struct ExamRunner {
    state: AppState,
    platform: Arc<dyn Platform>,
    identity: StudentIdentity,
    paper: Paper,
    assigned: Vec<Question>,
    answers: Vec<Answer>,
    attempt_id: Option<String>,
    session: ProctorSession,
    countdown: Countdown,
    granted: Vec<Capability>,
    view_tx: watch::Sender<SessionView>,
}

impl ExamRunner {
    pub fn new(state: AppState, platform: Arc<dyn Platform>, plan: AttemptPlan, student: &Student) -> Self {
        let limit = plan.paper.effective_warning_limit(state.config.default_warning_limit);
        let session = ProctorSession::new(limit, state.config.timings);
        let countdown = Countdown::for_assignment(&plan.paper, &plan.assigned);
        let identity = student.identity(&plan.paper.id);

        let mut answers = plan.answers;
        answers.resize(plan.assigned.len(), Answer::Unanswered);

        let view = view_of(&session, &countdown);
        let (view_tx, _) = watch::channel(view);

        Self {
            state,
            platform,
            identity,
            paper: plan.paper,
            assigned: plan.assigned,
            answers,
            attempt_id: plan.attempt_id,
            session,
            countdown,
            granted: Vec::new(),
            view_tx,
        }
    }

    /// Replaces the clock derived from the paper.
    pub fn with_countdown(mut self, countdown: Countdown) -> Self {
        self.countdown = countdown;
        self.publish();
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view_tx.subscribe()
    }

    /// Runs the attempt on a new task.
    pub fn spawn(self) -> (mpsc::Sender<ExamInput>, watch::Receiver<SessionView>, JoinHandle<ExamOutcome>) {
        let (tx, rx) = mpsc::channel(INPUT_BUFFER);
        let view = self.subscribe();
        let handle = tokio::spawn(self.run(rx));
        (tx, view, handle)
    }

    /// Runs until the attempt is submitted.
    ///
    /// If `inputs` closes first, the attempt stays open until the clock runs out.
    pub async fn run(mut self, mut inputs: mpsc::Receiver<ExamInput>) -> ExamOutcome {
        self.negotiate_capabilities().await;
        self.publish();

        tracing::info!(
            student_id = %self.identity.student_id,
            paper_id = %self.identity.paper_id,
            questions = self.assigned.len(),
            warning_limit = self.session.warning_limit(),
            "Exam started"
        );

        let (save_tx, mut save_rx) = mpsc::channel::<SaveResult>(4);
        let mut clock = time::interval_at(Instant::now() + CLOCK_PERIOD, CLOCK_PERIOD);
        clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut inputs_open = true;

        let outcome = loop {
            let deadline = self.session.next_deadline().map(Instant::from_std);
            // Only polled when a deadline exists.
            let wake_at = deadline.unwrap_or_else(|| Instant::now() + CLOCK_PERIOD);

            tokio::select! {
                input = inputs.recv(), if inputs_open => match input {
                    Some(input) => self.handle_input(input, &save_tx),
                    None => {
                        tracing::warn!(
                            student_id = %self.identity.student_id,
                            "Exam input closed, attempt stays open until time runs out"
                        );
                        inputs_open = false;
                    }
                },
                Some(saved) = save_rx.recv() => {
                    if let Some(outcome) = self.on_save_result(saved) {
                        break outcome;
                    }
                }
                _ = clock.tick() => self.on_tick(&save_tx),
                _ = time::sleep_until(wake_at), if deadline.is_some() => {
                    self.session.fire_timers(now());
                }
            }

            self.publish();
        };

        self.publish();
        self.release_capabilities().await;
        outcome
    }

    async fn negotiate_capabilities(&mut self) {
        for capability in [Capability::Fullscreen, Capability::KeyboardLock] {
            match self.platform.request(capability).await {
                Grant::Granted => {
                    self.session.capability_granted(capability);
                    self.granted.push(capability);
                }
                Grant::Denied(reason) => self.session.capability_denied(capability, &reason),
            }
        }
    }

    async fn release_capabilities(&mut self) {
        for capability in self.granted.drain(..) {
            self.platform.release(capability).await;
        }
    }

    fn handle_input(&mut self, input: ExamInput, save_tx: &mpsc::Sender<SaveResult>) {
        match input {
            ExamInput::Signal(signal) => {
                let response = self.session.handle_signal(&signal, now());
                if let Some(verdict) = response.verdict {
                    self.on_verdict(verdict, save_tx);
                }
            }
            ExamInput::Answer { index, answer } => self.set_answer(index, answer),
            ExamInput::Autosave => self.start_save(AttemptStatus::InProgress, true, save_tx),
            ExamInput::Finish => self.start_save(AttemptStatus::Completed, false, save_tx),
        }
    }

    fn set_answer(&mut self, index: usize, answer: Answer) {
        if self.session.phase() == SessionPhase::Submitted {
            tracing::debug!(index, "Answer ignored, attempt is being submitted");
            return;
        }
        let Some(question) = self.assigned.get(index) else {
            tracing::warn!(index, questions = self.assigned.len(), "Answer for unknown question index");
            return;
        };
        self.answers[index] = if question.is_mcq() {
            answer.into_choice()
        } else {
            answer
        };
    }

    fn on_verdict(&mut self, verdict: Verdict, save_tx: &mpsc::Sender<SaveResult>) {
        if let Verdict::Recorded { event, forced, .. } = verdict {
            self.deliver(&event);
            if let Some(decision) = forced {
                self.spawn_save(decision, save_tx);
            }
        }
    }

    fn on_tick(&mut self, save_tx: &mpsc::Sender<SaveResult>) {
        if let Tick::Expired = self.countdown.tick(Utc::now()) {
            if self.session.submission().is_some() || self.session.phase() == SessionPhase::Submitted {
                return;
            }
            // An autosave in flight makes this a no-op; the next tick retries.
            if self.session.pending_save().is_none() {
                tracing::info!(student_id = %self.identity.student_id, "Time is up, submitting");
            }
            self.start_save(AttemptStatus::Completed, true, save_tx);
        }
    }

    fn start_save(&mut self, status: AttemptStatus, automatic: bool, save_tx: &mpsc::Sender<SaveResult>) {
        match self.session.begin_save(status, automatic) {
            Some(decision) => self.spawn_save(decision, save_tx),
            None => tracing::debug!(?status, "Save skipped, another save is in flight"),
        }
    }

    fn on_save_result(&mut self, saved: SaveResult) -> Option<ExamOutcome> {
        let SaveResult { decision, result } = saved;
        match result {
            Ok(attempt) => {
                if attempt.id.is_some() {
                    self.attempt_id = attempt.id.clone();
                }
                let done = self.session.save_succeeded()?;
                if done.status != AttemptStatus::Completed {
                    tracing::debug!(attempt_id = ?self.attempt_id, "Progress saved");
                    return None;
                }
                tracing::info!(
                    student_id = %self.identity.student_id,
                    paper_id = %self.identity.paper_id,
                    automatic = done.automatic,
                    warnings = self.session.warning_count(),
                    "Attempt submitted"
                );
                Some(ExamOutcome {
                    attempt,
                    submission: done,
                    warning_count: self.session.warning_count(),
                })
            }
            Err(e) => {
                tracing::error!(
                    student_id = %self.identity.student_id,
                    status = ?decision.status,
                    "Failed to save attempt: {}",
                    e
                );
                self.session.save_failed();
                None
            }
        }
    }

    /// Fire-and-forget: a failed delivery is logged and never blocks the exam.
    fn deliver(&self, event: &ViolationEvent) {
        let record = ViolationRecord::from_event(&self.identity, event);
        let sink = self.state.violations.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.record(&record).await {
                tracing::error!(
                    student_id = %record.student_id,
                    kind = %record.violation_type,
                    "Failed to log violation: {}",
                    e
                );
            }
        });
    }

    fn spawn_save(&self, decision: SubmitDecision, save_tx: &mpsc::Sender<SaveResult>) {
        let attempt = self.attempt(decision);
        let sink = self.state.submissions.clone();
        let tx = save_tx.clone();
        tokio::spawn(async move {
            let result = sink.submit(&attempt).await;
            // The runner only stops after a successful COMPLETED save, so it is still listening.
            let _ = tx.send(SaveResult { decision, result }).await;
        });
    }

    fn attempt(&self, decision: SubmitDecision) -> Attempt {
        Attempt {
            id: self.attempt_id.clone(),
            paper: PaperRef {
                id: self.paper.id.clone(),
            },
            student_id: self.identity.student_id.clone(),
            student_name: self.identity.student_name.clone(),
            answers: to_canonical(&self.paper, &self.assigned, &self.answers),
            score: 0.0,
            status: decision.status,
            automatic: decision.automatic,
            submitted_at: Some(Utc::now()),
        }
    }

    fn publish(&self) {
        self.view_tx.send_replace(view_of(&self.session, &self.countdown));
    }
}

fn view_of(session: &ProctorSession, countdown: &Countdown) -> SessionView {
    let remaining = countdown.remaining(Utc::now());
    SessionView {
        phase: session.phase(),
        warning_count: session.warning_count(),
        warning_limit: session.warning_limit(),
        fullscreen: session.fullscreen(),
        lockout_message: session.lockout_message().map(str::to_string),
        remaining_secs: remaining,
        clock: format_clock(remaining),
        saving: session.pending_save().is_some(),
    }
}

/// Session time, following tokio's clock so paused-time tests drive it too.
fn now() -> std::time::Instant {
    Instant::now().into_std()
}
