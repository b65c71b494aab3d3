use crate::model::attendance::EventType;

/// Per-employee check-in/check-out state machine. The state is always
/// derived from the latest valid event at decision time, never cached, so a
/// rejected event leaves the machine where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    AwaitingCheckIn,
    AwaitingCheckOut,
}

impl SequenceState {
    /// State implied by the employee's most recent valid event. No prior
    /// valid event means the employee has never checked in.
    pub fn from_latest(latest: Option<EventType>) -> Self {
        match latest {
            None | Some(EventType::CheckOut) => SequenceState::AwaitingCheckIn,
            Some(EventType::CheckIn) => SequenceState::AwaitingCheckOut,
        }
    }

    /// Whether an incoming event keeps the alternation invariant.
    pub fn admits(self, event_type: EventType) -> bool {
        matches!(
            (self, event_type),
            (SequenceState::AwaitingCheckIn, EventType::CheckIn)
                | (SequenceState::AwaitingCheckOut, EventType::CheckOut)
        )
    }
}
