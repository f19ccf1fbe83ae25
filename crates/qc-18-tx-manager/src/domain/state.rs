//! Per-call state machine
//!
//! ```text
//! [IDLE] ──attempt──→ [ATTEMPTING {fee, n}] ──attempt──→ [ATTEMPTING {fee', n+1}]
//!                             │
//!                             ├── receipt observed ──→ [CONFIRMED]
//!                             ├── ceiling timed out ──→ [TIMED_OUT]
//!                             └── caller cancelled ──→ [CANCELLED]
//! ```
//!
//! Attempts are not mutually exclusive: `Attempting` tracks the latest fee
//! offered while earlier attempts keep running.

use primitive_types::U256;

/// State of one `send` call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SendState {
    #[default]
    Idle,
    /// `attempts` attempts started so far, the latest at `fee`
    Attempting { fee: U256, attempts: u32 },
    Confirmed,
    TimedOut,
    Cancelled,
}

/// Events driving [`SendState`] transitions. Only the wait loop emits these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendEvent {
    AttemptStarted { fee: U256 },
    ReceiptObserved,
    ScheduleExhausted,
    CancelRequested,
}

impl SendState {
    /// Apply an event. Terminal states absorb every event.
    pub fn transition(self, event: SendEvent) -> SendState {
        match (self, event) {
            (SendState::Idle, SendEvent::AttemptStarted { fee }) => {
                SendState::Attempting { fee, attempts: 1 }
            }
            (SendState::Attempting { attempts, .. }, SendEvent::AttemptStarted { fee }) => {
                SendState::Attempting {
                    fee,
                    attempts: attempts.saturating_add(1),
                }
            }
            (SendState::Attempting { .. }, SendEvent::ReceiptObserved) => SendState::Confirmed,
            (SendState::Attempting { .. }, SendEvent::ScheduleExhausted) => SendState::TimedOut,
            (SendState::Idle | SendState::Attempting { .. }, SendEvent::CancelRequested) => {
                SendState::Cancelled
            }
            (state, _) => state,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SendState::Confirmed | SendState::TimedOut | SendState::Cancelled
        )
    }

    /// Latest fee offered, if any attempt has started
    pub fn current_fee(&self) -> Option<U256> {
        match self {
            SendState::Attempting { fee, .. } => Some(*fee),
            _ => None,
        }
    }
}
