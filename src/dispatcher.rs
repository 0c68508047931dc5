//! Order flow: menu → selection → single submission → outcome.

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::catalog::ServiceCatalogEntry;
use crate::dialogue::{Claim, OrderSessions, OrderState};
use crate::events::{MessageRef, UserRef};
use crate::order::{OrderOutcome, OrderReceipt, OrderRequest};
use crate::reply::HandlerResult;
use crate::submission::OrderSubmitter;

/// Drives order menus through their states and submits selected orders.
///
/// A menu is consumed under the session lock before any network call, so a
/// duplicated button press can never submit the same menu twice.
pub struct OrderDispatcher<S> {
    submitter: S,
    sessions: Mutex<OrderSessions>,
}

impl<S: OrderSubmitter> OrderDispatcher<S> {
    pub fn new(submitter: S) -> Self {
        Self {
            submitter,
            sessions: Mutex::new(OrderSessions::new()),
        }
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    /// Start awaiting a selection on a delivered order menu
    pub async fn register_menu(&self, menu: MessageRef, now: DateTime<Utc>) {
        self.sessions.lock().await.open(menu, now);
        debug!(menu = ?menu, "Order menu awaiting selection");
    }

    /// Current state of a menu
    pub async fn state(&self, menu: &MessageRef) -> OrderState {
        self.sessions.lock().await.state(menu)
    }

    /// Handle the cancel button. `None` means the press is a no-op.
    pub async fn cancel(&self, menu: MessageRef, now: DateTime<Utc>) -> Option<HandlerResult> {
        let claim = self
            .sessions
            .lock()
            .await
            .claim(&menu, OrderState::Cancelled, now);

        match claim {
            Claim::Claimed => {
                info!(menu = ?menu, "Order cancelled");
                Some(HandlerResult::OrderCancelled)
            }
            Claim::AlreadyResolved(state) => {
                debug!(menu = ?menu, state = ?state, "Ignoring cancel on resolved menu");
                None
            }
            Claim::Unknown => Some(HandlerResult::MenuExpired),
        }
    }

    /// Handle a service button: build the order, submit it once and report
    /// the outcome. `None` means the press is a no-op.
    pub async fn select(
        &self,
        entry: &'static ServiceCatalogEntry,
        sender: &UserRef,
        menu: MessageRef,
        now: DateTime<Utc>,
    ) -> Option<HandlerResult> {
        let claim = self
            .sessions
            .lock()
            .await
            .claim(&menu, OrderState::Submitting, now);

        match claim {
            Claim::Claimed => {}
            Claim::AlreadyResolved(state) => {
                debug!(user_id = sender.id, menu = ?menu, state = ?state, "Ignoring repeated selection");
                return None;
            }
            Claim::Unknown => {
                warn!(user_id = sender.id, menu = ?menu, "Selection on unknown order menu");
                return Some(HandlerResult::MenuExpired);
            }
        }

        let order = OrderRequest::new(entry, sender, now);
        info!(user_id = sender.id, service = entry.label, "Processing order");

        let outcome = self.submitter.submit(&order).await;

        let (state, result) = match outcome {
            OrderOutcome::Accepted => (
                OrderState::Accepted,
                HandlerResult::OrderAccepted(OrderReceipt::new(entry, &order)),
            ),
            OrderOutcome::TimedOut => (OrderState::Failed, HandlerResult::OrderTimedOut),
            OrderOutcome::Rejected { reason_summary } => {
                (OrderState::Failed, HandlerResult::OrderRejected { reason_summary })
            }
        };

        self.sessions.lock().await.finish(&menu, state, Utc::now());
        info!(user_id = sender.id, menu = ?menu, state = ?state, "Order flow finished");

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSubmitter {
        outcome: OrderOutcome,
        calls: AtomicUsize,
    }

    impl OrderSubmitter for FixedSubmitter {
        fn submit(&self, _order: &OrderRequest) -> impl Future<Output = OrderOutcome> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self.outcome.clone();
            async move { outcome }
        }
    }

    fn dispatcher(outcome: OrderOutcome) -> OrderDispatcher<FixedSubmitter> {
        OrderDispatcher::new(FixedSubmitter {
            outcome,
            calls: AtomicUsize::new(0),
        })
    }

    fn menu() -> MessageRef {
        MessageRef {
            chat_id: 100,
            message_id: 5,
        }
    }

    fn sender() -> UserRef {
        UserRef {
            id: 100,
            display_name: "Тест".to_string(),
            handle: None,
        }
    }

    #[tokio::test]
    async fn test_rejected_submission_fails_menu() {
        let dispatcher = dispatcher(OrderOutcome::rejected("HTTP 500"));
        dispatcher.register_menu(menu(), Utc::now()).await;

        let entry = catalog::resolve("order_parse").unwrap();
        let result = dispatcher.select(entry, &sender(), menu(), Utc::now()).await;

        assert_eq!(
            result,
            Some(HandlerResult::OrderRejected {
                reason_summary: "HTTP 500".to_string()
            })
        );
        assert_eq!(dispatcher.state(&menu()).await, OrderState::Failed);
    }

    #[tokio::test]
    async fn test_cancel_after_selection_is_noop() {
        let dispatcher = dispatcher(OrderOutcome::Accepted);
        dispatcher.register_menu(menu(), Utc::now()).await;

        let entry = catalog::resolve("order_bot").unwrap();
        assert!(dispatcher.select(entry, &sender(), menu(), Utc::now()).await.is_some());
        assert_eq!(dispatcher.cancel(menu(), Utc::now()).await, None);
        assert_eq!(dispatcher.state(&menu()).await, OrderState::Accepted);
    }

    #[tokio::test]
    async fn test_unknown_menu_expires() {
        let dispatcher = dispatcher(OrderOutcome::Accepted);
        let entry = catalog::resolve("order_bot").unwrap();

        assert_eq!(
            dispatcher.select(entry, &sender(), menu(), Utc::now()).await,
            Some(HandlerResult::MenuExpired)
        );
        assert_eq!(
            dispatcher.cancel(menu(), Utc::now()).await,
            Some(HandlerResult::MenuExpired)
        );
        assert_eq!(dispatcher.submitter().calls.load(Ordering::SeqCst), 0);
    }
}
