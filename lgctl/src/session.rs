//! Per-session driver workflow state.
//!
//! One [`DriverFlow`] value is owned by each user-dashboard session. It is advanced by feeding
//! it [`FlowEvent`]s; the screen to render and the loading indicator are derived from the
//! current state and never stored separately.

use crate::gate::{DriverScreen, SurveyState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Main,
    Checking,
    OperationalForm,
    StatusView { survey: SurveyState },
    IntakeForm { error: Option<String> },
    Submitting,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    DriverClicked,
    Resolved(DriverScreen),
    Failed(String),
    Submit,
    SubmitSucceeded,
    SubmitFailed(String),
    Close,
}

/// What the dashboard should render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowScreen {
    Main,
    OperationalForm,
    StatusView(SurveyState),
    IntakeForm,
    Confirmation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverFlow {
    state: FlowState,
    /// Error from the last failed lookup, shown on the main screen
    last_error: Option<String>,
}

impl Default for DriverFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverFlow {
    pub fn new() -> Self {
        Self {
            state: FlowState::Main,
            last_error: None,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, FlowState::Checking | FlowState::Submitting)
    }

    pub fn screen(&self) -> FlowScreen {
        match &self.state {
            // While checking, the main screen stays up behind the loading indicator
            FlowState::Main | FlowState::Checking => FlowScreen::Main,
            FlowState::OperationalForm => FlowScreen::OperationalForm,
            FlowState::StatusView { survey } => FlowScreen::StatusView(*survey),
            FlowState::IntakeForm { .. } | FlowState::Submitting => FlowScreen::IntakeForm,
            FlowState::Submitted => FlowScreen::Confirmation,
        }
    }

    /// Apply an event. Pairs without a transition leave the state unchanged.
    pub fn handle(&mut self, event: FlowEvent) -> &FlowState {
        let next = match (&self.state, event) {
            (_, FlowEvent::Close) => Some(FlowState::Main),
            (FlowState::Main, FlowEvent::DriverClicked) => {
                self.last_error = None;
                Some(FlowState::Checking)
            }
            (FlowState::Checking, FlowEvent::Resolved(screen)) => Some(match screen {
                DriverScreen::OperationalForm => FlowState::OperationalForm,
                DriverScreen::ApplicationStatus(survey) => FlowState::StatusView { survey },
                DriverScreen::IntakeForm => FlowState::IntakeForm { error: None },
            }),
            (FlowState::Checking, FlowEvent::Failed(message)) => {
                self.last_error = Some(message);
                Some(FlowState::Main)
            }
            (FlowState::IntakeForm { .. }, FlowEvent::Submit) => Some(FlowState::Submitting),
            (FlowState::Submitting, FlowEvent::SubmitSucceeded) => Some(FlowState::Submitted),
            (FlowState::Submitting, FlowEvent::SubmitFailed(message)) => Some(FlowState::IntakeForm { error: Some(message) }),
            _ => None,
        };

        if let Some(state) = next {
            tracing::trace!("Driver flow {:?} -> {:?}", self.state, state);
            self.state = state;
        }
        &self.state
    }
}
