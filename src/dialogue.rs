//! Order dialogue state, tracked per issued order menu.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::events::MessageRef;

/// How long a resolved or abandoned menu is remembered
pub const SESSION_TTL_HOURS: i64 = 48;

/// Represents the state of one order menu
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrderState {
    /// No menu issued, or the menu is unknown to this process
    #[default]
    Idle,
    /// Menu delivered, waiting for a button press
    AwaitingSelection,
    /// Submission in flight
    Submitting,
    Accepted,
    Failed,
    Cancelled,
}

impl OrderState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderState::Accepted | OrderState::Failed | OrderState::Cancelled
        )
    }
}

#[derive(Clone, Debug)]
struct MenuSession {
    state: OrderState,
    updated_at: DateTime<Utc>,
}

/// Result of trying to consume a menu for a button press
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Claim {
    /// The menu was awaiting a selection and is now owned by the caller
    Claimed,
    /// The menu already left `AwaitingSelection`
    AlreadyResolved(OrderState),
    /// No session exists for the menu
    Unknown,
}

/// Per-menu session table.
///
/// Not synchronized itself; the dispatcher guards it with a mutex.
#[derive(Debug, Default)]
pub struct OrderSessions {
    sessions: HashMap<MessageRef, MenuSession>,
}

impl OrderSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly delivered menu, pruning stale sessions
    pub fn open(&mut self, menu: MessageRef, now: DateTime<Utc>) {
        let cutoff = now - Duration::hours(SESSION_TTL_HOURS);
        self.sessions.retain(|_, session| session.updated_at > cutoff);

        self.sessions.insert(
            menu,
            MenuSession {
                state: OrderState::AwaitingSelection,
                updated_at: now,
            },
        );
    }

    /// Move an awaiting menu to `next`, or report why that is impossible
    pub fn claim(&mut self, menu: &MessageRef, next: OrderState, now: DateTime<Utc>) -> Claim {
        match self.sessions.get_mut(menu) {
            Some(session) if session.state == OrderState::AwaitingSelection => {
                session.state = next;
                session.updated_at = now;
                Claim::Claimed
            }
            Some(session) => Claim::AlreadyResolved(session.state),
            None => Claim::Unknown,
        }
    }

    /// Finish a submitting menu
    pub fn finish(&mut self, menu: &MessageRef, state: OrderState, now: DateTime<Utc>) {
        if let Some(session) = self.sessions.get_mut(menu) {
            session.state = state;
            session.updated_at = now;
        }
    }

    pub fn state(&self, menu: &MessageRef) -> OrderState {
        self.sessions
            .get(menu)
            .map(|session| session.state)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
