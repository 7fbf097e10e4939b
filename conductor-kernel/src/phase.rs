//! Turn phases and the trace the orchestrator leaves behind.

use tracing::debug;

/// Phases one chat turn moves through, in order.
///
/// A turn with zero tool calls skips straight from [`ExtractingCalls`] to
/// [`UpdatingSession`]; the second-prompt phases only appear when at least
/// one tool ran.
///
/// [`ExtractingCalls`]: TurnPhase::ExtractingCalls
/// [`UpdatingSession`]: TurnPhase::UpdatingSession
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// No turn in flight.
    Idle,
    /// Composing system instructions, catalog, history, and the new message.
    BuildingFirstPrompt,
    /// Blocking on the first generation-service call.
    AwaitingFirstResponse,
    /// Running the extractor over the first response.
    ExtractingCalls,
    /// Executing extracted calls sequentially.
    ExecutingTools,
    /// Serializing tool results into the second prompt.
    BuildingSecondPrompt,
    /// Blocking on the second generation-service call.
    AwaitingSecondResponse,
    /// Writing the turn's messages back to the session store.
    UpdatingSession,
    /// Turn complete.
    Done,
}

impl TurnPhase {
    /// Log label for the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::BuildingFirstPrompt => "building_first_prompt",
            Self::AwaitingFirstResponse => "awaiting_first_response",
            Self::ExtractingCalls => "extracting_calls",
            Self::ExecutingTools => "executing_tools",
            Self::BuildingSecondPrompt => "building_second_prompt",
            Self::AwaitingSecondResponse => "awaiting_second_response",
            Self::UpdatingSession => "updating_session",
            Self::Done => "done",
        }
    }
}

/// Ordered record of the phases a turn visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnTrace {
    phases: Vec<TurnPhase>,
}

impl TurnTrace {
    /// Starts a trace in the idle phase.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phases: vec![TurnPhase::Idle],
        }
    }

    /// Records entry into a phase.
    pub fn enter(&mut self, phase: TurnPhase) {
        debug!(phase = phase.as_str(), "turn phase");
        self.phases.push(phase);
    }

    /// Visited phases, oldest first.
    #[must_use]
    pub fn phases(&self) -> &[TurnPhase] {
        &self.phases
    }

    /// Whether the turn passed through the given phase.
    #[must_use]
    pub fn visited(&self, phase: TurnPhase) -> bool {
        self.phases.contains(&phase)
    }
}

impl Default for TurnTrace {
    fn default() -> Self {
        Self::new()
    }
}
