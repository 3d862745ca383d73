//! Drift lifecycle driver.
//!
//! Generalizes `agent_lifecycle::state_machine`'s
//! `#[state_machine]` shape (statig, one `#[state]` fn per lifecycle
//! state, `self` carrying the mutable working fields) from a five-state
//! agent lifecycle to the drift remediation pipeline's twenty-three
//! states. The state machine only decides the *next* state; the actual
//! step work (fetching docs, building evidence, validating a patch) is
//! performed by the driver before it feeds in the resulting event — the
//! machine itself never calls out.

use statig::prelude::*;

use super::failure::{FailureClass, FailureCode};
use super::DriftState;

pub const MAX_RETRY_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriftEvent {
    StepSucceeded,
    StepFailed(FailureCode),
    HumanApproved,
    HumanRequestedEdit,
    HumanRejected,
    HumanSnoozed,
    SnoozeExpired,
}

/// What a failed step resolves to once the retry budget is taken into
/// account. Computed once per failure and reused by every state handler
/// so the retry/terminal decision logic isn't duplicated twenty times.
enum Resolution {
    RetrySameState,
    Terminal(DriftState),
}

fn resolve_failure(attempt: u32, code: FailureCode) -> Resolution {
    match code.class() {
        FailureClass::Retryable if attempt < MAX_RETRY_ATTEMPTS => Resolution::RetrySameState,
        FailureClass::Retryable => Resolution::Terminal(DriftState::Failed),
        FailureClass::Configuration => Resolution::Terminal(DriftState::FailedNeedsMapping),
        FailureClass::Safety => Resolution::Terminal(DriftState::Failed),
        FailureClass::Concurrency if attempt < 1 => Resolution::RetrySameState,
        FailureClass::Concurrency => Resolution::Terminal(DriftState::Failed),
    }
}

#[derive(Debug, Default)]
pub struct DriftStateMachine {
    pub candidate_id: String,
    pub attempt: u32,
    pub last_error: Option<String>,
    /// Mirrors the statig-internal state after every transition so the
    /// driver can persist [`DriftState`] without depending on statig's
    /// own (non-serializable) state representation.
    pub observed_state: Option<DriftState>,
}

impl DriftStateMachine {
    pub fn new(candidate_id: String) -> Self {
        Self { candidate_id, attempt: 0, last_error: None, observed_state: None }
    }

    fn record(&mut self, state: DriftState) {
        self.observed_state = Some(state);
    }

    fn on_failure(&mut self, code: FailureCode) -> Option<DriftState> {
        self.last_error = Some(format!("{code:?}"));
        match resolve_failure(self.attempt, code) {
            Resolution::RetrySameState => {
                self.attempt += 1;
                None
            }
            Resolution::Terminal(state) => Some(state),
        }
    }
}

/// Drives a single step purely from a persisted `(state, attempt)` pair.
///
/// The `#[state_machine]` driver below is the single-process shape (an
/// `InitializedStateMachine` holds the active state as an in-memory
/// token); the CLI instead persists one [`DriftState`] per candidate and
/// drives it one step per invocation, so it has no live machine to hand
/// the next event to. This mirrors the same transition table using a
/// plain match instead, reusing [`DriftStateMachine::on_failure`] for
/// the shared retry/terminal accounting.
pub fn advance(state: DriftState, attempt: u32, event: &DriftEvent) -> (DriftState, u32, Option<String>) {
    fn linear(machine: &mut DriftStateMachine, event: &DriftEvent, current: DriftState, next: DriftState) -> DriftState {
        match event {
            DriftEvent::StepSucceeded => {
                machine.attempt = 0;
                next
            }
            DriftEvent::StepFailed(code) => machine.on_failure(*code).unwrap_or(current),
            _ => current,
        }
    }

    let mut machine = DriftStateMachine { candidate_id: String::new(), attempt, last_error: None, observed_state: None };
    let next = match state {
        DriftState::Ingested => linear(&mut machine, event, state, DriftState::EligibilityChecked),
        DriftState::EligibilityChecked => linear(&mut machine, event, state, DriftState::SignalsCorrelated),
        DriftState::SignalsCorrelated => linear(&mut machine, event, state, DriftState::DriftClassified),
        DriftState::DriftClassified => linear(&mut machine, event, state, DriftState::DocsResolved),
        DriftState::DocsResolved => linear(&mut machine, event, state, DriftState::DocsFetched),
        DriftState::DocsFetched => linear(&mut machine, event, state, DriftState::DocContextExtracted),
        DriftState::DocContextExtracted => linear(&mut machine, event, state, DriftState::BaselineChecked),
        DriftState::BaselineChecked => linear(&mut machine, event, state, DriftState::PatchPlanned),
        DriftState::PatchPlanned => linear(&mut machine, event, state, DriftState::PatchGenerated),
        DriftState::PatchGenerated => linear(&mut machine, event, state, DriftState::PatchValidated),
        DriftState::PatchValidated => linear(&mut machine, event, state, DriftState::OwnerResolved),
        DriftState::OwnerResolved => linear(&mut machine, event, state, DriftState::SlackSent),
        DriftState::SlackSent => linear(&mut machine, event, state, DriftState::AwaitingHuman),
        DriftState::AwaitingHuman => match event {
            DriftEvent::HumanApproved => DriftState::Approved,
            DriftEvent::HumanRequestedEdit => DriftState::EditRequested,
            DriftEvent::HumanRejected => DriftState::Rejected,
            DriftEvent::HumanSnoozed => DriftState::Snoozed,
            _ => state,
        },
        DriftState::Snoozed => match event {
            DriftEvent::SnoozeExpired => DriftState::AwaitingHuman,
            _ => state,
        },
        DriftState::EditRequested => linear(&mut machine, event, state, DriftState::PatchGenerated),
        DriftState::Approved => linear(&mut machine, event, state, DriftState::WritebackValidated),
        DriftState::WritebackValidated => linear(&mut machine, event, state, DriftState::WrittenBack),
        DriftState::WrittenBack => linear(&mut machine, event, state, DriftState::Completed),
        DriftState::Rejected | DriftState::Completed | DriftState::Failed | DriftState::FailedNeedsMapping => state,
    };
    (next, machine.attempt, machine.last_error)
}

macro_rules! linear_state {
    ($fn_name:ident, $this_state:expr, $next:ident) => {
        #[state]
        fn $fn_name(&mut self, event: &DriftEvent) -> Outcome<State> {
            match event {
                DriftEvent::StepSucceeded => {
                    self.attempt = 0;
                    self.record(DriftState::$next);
                    Transition(State::$next())
                }
                DriftEvent::StepFailed(code) => match self.on_failure(*code) {
                    None => Handled,
                    Some(terminal) => {
                        self.record(terminal);
                        match terminal {
                            DriftState::Failed => Transition(State::failed()),
                            DriftState::FailedNeedsMapping => Transition(State::failed_needs_mapping()),
                            _ => unreachable!("resolve_failure only returns Failed or FailedNeedsMapping"),
                        }
                    }
                },
                _ => Handled,
            }
        }
    };
}

#[state_machine(initial = "State::ingested()")]
impl DriftStateMachine {
    linear_state!(ingested, DriftState::Ingested, eligibility_checked);
    linear_state!(eligibility_checked, DriftState::EligibilityChecked, signals_correlated);
    linear_state!(signals_correlated, DriftState::SignalsCorrelated, drift_classified);
    linear_state!(drift_classified, DriftState::DriftClassified, docs_resolved);
    linear_state!(docs_resolved, DriftState::DocsResolved, docs_fetched);
    linear_state!(docs_fetched, DriftState::DocsFetched, doc_context_extracted);
    linear_state!(doc_context_extracted, DriftState::DocContextExtracted, baseline_checked);
    linear_state!(baseline_checked, DriftState::BaselineChecked, patch_planned);
    linear_state!(patch_planned, DriftState::PatchPlanned, patch_generated);
    linear_state!(patch_generated, DriftState::PatchGenerated, patch_validated);
    linear_state!(patch_validated, DriftState::PatchValidated, owner_resolved);
    linear_state!(owner_resolved, DriftState::OwnerResolved, slack_sent);

    #[state]
    fn slack_sent(&mut self, event: &DriftEvent) -> Outcome<State> {
        match event {
            DriftEvent::StepSucceeded => {
                self.attempt = 0;
                self.record(DriftState::AwaitingHuman);
                Transition(State::awaiting_human())
            }
            DriftEvent::StepFailed(code) => match self.on_failure(*code) {
                None => Handled,
                Some(DriftState::Failed) => {
                    self.record(DriftState::Failed);
                    Transition(State::failed())
                }
                Some(DriftState::FailedNeedsMapping) => {
                    self.record(DriftState::FailedNeedsMapping);
                    Transition(State::failed_needs_mapping())
                }
                Some(_) => unreachable!(),
            },
            _ => Handled,
        }
    }

    /// Human-gated: the driver returns immediately without enqueuing a
    /// follow-up. Only an external, signed callback re-enters here.
    #[state]
    fn awaiting_human(&mut self, event: &DriftEvent) -> Outcome<State> {
        match event {
            DriftEvent::HumanApproved => {
                self.record(DriftState::Approved);
                Transition(State::approved())
            }
            DriftEvent::HumanRequestedEdit => {
                self.record(DriftState::EditRequested);
                Transition(State::edit_requested())
            }
            DriftEvent::HumanRejected => {
                self.record(DriftState::Rejected);
                Transition(State::rejected())
            }
            DriftEvent::HumanSnoozed => {
                self.record(DriftState::Snoozed);
                Transition(State::snoozed())
            }
            _ => Handled,
        }
    }

    #[state]
    fn snoozed(&mut self, event: &DriftEvent) -> Outcome<State> {
        match event {
            DriftEvent::SnoozeExpired => {
                self.record(DriftState::AwaitingHuman);
                Transition(State::awaiting_human())
            }
            _ => Handled,
        }
    }

    #[state]
    fn edit_requested(&mut self, event: &DriftEvent) -> Outcome<State> {
        match event {
            // A human edit request re-engages patch generation with the
            // human's feedback folded in by the driver before this fires.
            DriftEvent::StepSucceeded => {
                self.attempt = 0;
                self.record(DriftState::PatchGenerated);
                Transition(State::patch_generated())
            }
            _ => Handled,
        }
    }

    #[state]
    fn rejected(&mut self, _event: &DriftEvent) -> Outcome<State> {
        Handled
    }

    #[state]
    fn approved(&mut self, event: &DriftEvent) -> Outcome<State> {
        match event {
            DriftEvent::StepSucceeded => {
                self.attempt = 0;
                self.record(DriftState::WritebackValidated);
                Transition(State::writeback_validated())
            }
            _ => Handled,
        }
    }

    /// Concurrency failures here get exactly one retry from this state
    /// before terminating.
    #[state]
    fn writeback_validated(&mut self, event: &DriftEvent) -> Outcome<State> {
        match event {
            DriftEvent::StepSucceeded => {
                self.attempt = 0;
                self.record(DriftState::WrittenBack);
                Transition(State::written_back())
            }
            DriftEvent::StepFailed(code) => match self.on_failure(*code) {
                None => Handled,
                Some(DriftState::Failed) => {
                    self.record(DriftState::Failed);
                    Transition(State::failed())
                }
                Some(DriftState::FailedNeedsMapping) => {
                    self.record(DriftState::FailedNeedsMapping);
                    Transition(State::failed_needs_mapping())
                }
                Some(_) => unreachable!(),
            },
            _ => Handled,
        }
    }

    linear_state!(written_back, DriftState::WrittenBack, completed);

    #[state]
    fn completed(&mut self, _event: &DriftEvent) -> Outcome<State> {
        Handled
    }

    #[state]
    fn failed(&mut self, _event: &DriftEvent) -> Outcome<State> {
        Handled
    }

    #[state]
    fn failed_needs_mapping(&mut self, _event: &DriftEvent) -> Outcome<State> {
        Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_matches_the_in_process_machine_on_the_happy_path() {
        let mut machine = DriftStateMachine::new("d1".to_string()).state_machine();
        let mut state = DriftState::Ingested;
        let mut attempt = 0;
        for _ in 0..12 {
            machine.handle(&DriftEvent::StepSucceeded);
            (state, attempt, _) = advance(state, attempt, &DriftEvent::StepSucceeded);
        }
        assert_eq!(Some(state), machine.context().observed_state);
        assert_eq!(state, DriftState::AwaitingHuman);
    }

    #[test]
    fn advance_retries_then_terminates_on_a_retryable_failure() {
        let mut state = DriftState::BaselineChecked;
        let mut attempt = 0;
        for _ in 0..MAX_RETRY_ATTEMPTS {
            let (next, next_attempt, _) = advance(state, attempt, &DriftEvent::StepFailed(FailureCode::Timeout));
            assert_eq!(next, state);
            attempt = next_attempt;
        }
        let (terminal, _, _) = advance(state, attempt, &DriftEvent::StepFailed(FailureCode::Timeout));
        assert_eq!(terminal, DriftState::Failed);
        state = terminal;
        let _ = state;
    }

    #[test]
    fn retryable_failure_stays_in_state_until_budget_exhausted() {
        let mut machine = DriftStateMachine::new("d1".to_string()).state_machine();
        for _ in 0..MAX_RETRY_ATTEMPTS {
            machine.handle(&DriftEvent::StepFailed(FailureCode::Timeout));
            assert_eq!(machine.context().observed_state, None);
        }
        machine.handle(&DriftEvent::StepFailed(FailureCode::Timeout));
        assert_eq!(machine.context().observed_state, Some(DriftState::Failed));
    }

    #[test]
    fn configuration_failure_is_terminal_immediately() {
        let mut machine = DriftStateMachine::new("d1".to_string()).state_machine();
        machine.handle(&DriftEvent::StepFailed(FailureCode::NeedsDocMapping));
        assert_eq!(machine.context().observed_state, Some(DriftState::FailedNeedsMapping));
    }

    #[test]
    fn happy_path_reaches_awaiting_human_then_completes() {
        let mut machine = DriftStateMachine::new("d1".to_string()).state_machine();
        for _ in 0..12 {
            machine.handle(&DriftEvent::StepSucceeded);
        }
        assert_eq!(machine.context().observed_state, Some(DriftState::AwaitingHuman));
        machine.handle(&DriftEvent::HumanApproved);
        assert_eq!(machine.context().observed_state, Some(DriftState::Approved));
        machine.handle(&DriftEvent::StepSucceeded);
        assert_eq!(machine.context().observed_state, Some(DriftState::WritebackValidated));
        machine.handle(&DriftEvent::StepSucceeded);
        assert_eq!(machine.context().observed_state, Some(DriftState::WrittenBack));
        machine.handle(&DriftEvent::StepSucceeded);
        assert_eq!(machine.context().observed_state, Some(DriftState::Completed));
    }

    #[test]
    fn writeback_concurrency_failure_gets_one_retry() {
        let mut machine = DriftStateMachine::new("d1".to_string()).state_machine();
        for _ in 0..12 {
            machine.handle(&DriftEvent::StepSucceeded);
        }
        machine.handle(&DriftEvent::HumanApproved);
        machine.handle(&DriftEvent::StepSucceeded);
        assert_eq!(machine.context().observed_state, Some(DriftState::WritebackValidated));

        machine.handle(&DriftEvent::StepFailed(FailureCode::RevisionMismatch));
        assert_eq!(machine.context().observed_state, Some(DriftState::WritebackValidated));
        machine.handle(&DriftEvent::StepFailed(FailureCode::RevisionMismatch));
        assert_eq!(machine.context().observed_state, Some(DriftState::Failed));
    }
}
