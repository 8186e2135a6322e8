//! Latched error state
use crate::error::Error;

/// Payload of a baton hand-off: `[coordination_error, transport_code]`
pub type RingMessage = [i32; 2];

/// Error state latched by a baton and carried forward with every hand-off.
///
/// Only the owning process writes to its own state. Downstream ranks see it
/// as the payload of the hand-off message, never by remote write.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
pub struct ErrorState {
    /// A ring link upstream of (or at) this rank has failed
    pub coordination_error: bool,
    /// Code of the first transport failure seen, or 0
    pub transport_code: i32,
}

impl ErrorState {
    /// Has any error been latched?
    pub fn is_error(&self) -> bool {
        self.coordination_error || self.transport_code != 0
    }

    /// Latch an error. The first transport code is kept.
    pub fn latch(&mut self, error: &Error) {
        self.coordination_error = true;
        if self.transport_code == 0 {
            self.transport_code = error.code();
        }
    }

    /// Merge a state received from the predecessor
    pub fn merge(&mut self, other: ErrorState) {
        self.coordination_error |= other.coordination_error;
        if self.transport_code == 0 {
            self.transport_code = other.transport_code;
        }
    }

    /// Encode as a hand-off message
    pub fn to_message(&self) -> RingMessage {
        [i32::from(self.coordination_error), self.transport_code]
    }

    /// Decode a hand-off message
    pub fn from_message(message: RingMessage) -> Self {
        Self {
            coordination_error: message[0] != 0,
            transport_code: message[1],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_latch_keeps_first_code() {
        let mut state = ErrorState::default();
        assert!(!state.is_error());
        state.latch(&Error::Transport { peer: 3, code: 11 });
        state.latch(&Error::Timeout);
        assert!(state.is_error());
        assert_eq!(state.transport_code, 11);
    }

    #[test]
    fn test_message() {
        let state = ErrorState {
            coordination_error: true,
            transport_code: 4,
        };
        assert_eq!(state.to_message(), [1, 4]);
        assert_eq!(ErrorState::from_message([1, 4]), state);
        assert_eq!(ErrorState::from_message([0, 0]), ErrorState::default());
    }

    #[test]
    fn test_merge() {
        let mut state = ErrorState::default();
        state.merge(ErrorState::from_message([1, 9]));
        assert!(state.coordination_error);
        assert_eq!(state.transport_code, 9);
    }
}
