//! Connection state of the primary tier.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;

// == Backend State ==
/// `Disconnected -> Connecting -> Connected`, back to `Disconnected` or
/// `Error` when the connection is lost. `Disabled` means no primary tier
/// was configured; it never leaves that state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendState {
    Disabled,
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl BackendState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => BackendState::Disconnected,
            2 => BackendState::Connecting,
            3 => BackendState::Connected,
            4 => BackendState::Error,
            _ => BackendState::Disabled,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            BackendState::Disabled => 0,
            BackendState::Disconnected => 1,
            BackendState::Connecting => 2,
            BackendState::Connected => 3,
            BackendState::Error => 4,
        }
    }

    pub fn is_available(self) -> bool {
        self == BackendState::Connected
    }
}

impl fmt::Display for BackendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BackendState::Disabled => "disabled",
            BackendState::Disconnected => "disconnected",
            BackendState::Connecting => "connecting",
            BackendState::Connected => "connected",
            BackendState::Error => "error",
        };
        f.write_str(label)
    }
}

// == State Cell ==
/// Lock-free holder for the current [`BackendState`].
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new(state: BackendState) -> Self {
        Self(AtomicU8::new(state.as_u8()))
    }

    pub fn get(&self) -> BackendState {
        BackendState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: BackendState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }

    /// Moves `from -> to` only if the current state is `from`.
    pub fn transition(&self, from: BackendState, to: BackendState) -> bool {
        self.0
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
