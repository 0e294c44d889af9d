//! Playback token state machine.
//!
//! ```text
//! Missing --acquired--> Valid --(4xx on update | failed resume)--> Invalid
//!                         ^                                          |
//!                         +------------- successful resume ---------+
//! ```
//!
//! No state is terminal; an invalid token is recovered by the user retrying
//! playback.

use bridge_traits::PlaybackToken;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TokenState {
    /// No token obtained yet
    #[default]
    Missing,
    Valid(PlaybackToken),
    /// Rejected by the server; only a resume can leave this state
    Invalid,
}

impl TokenState {
    pub fn token(&self) -> Option<&PlaybackToken> {
        match self {
            TokenState::Valid(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, TokenState::Invalid)
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, TokenState::Valid(_))
    }

    /// Store a freshly acquired token.
    pub fn accept(&mut self, token: PlaybackToken) {
        *self = TokenState::Valid(token);
    }

    pub fn invalidate(&mut self) {
        *self = TokenState::Invalid;
    }
}
