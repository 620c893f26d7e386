use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::{Forward, Link, Observable, Operation};

/// Holds every operation back for a fixed latency before forwarding it.
///
/// Cancelling during the wait means the rest of the chain never sees the
/// operation.
#[derive(Clone, Debug)]
pub struct DelayLink {
    latency: Duration,
}

impl DelayLink {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl Link for DelayLink {
    fn request(&self, operation: Operation, forward: Forward) -> Observable {
        let latency = self.latency;
        Observable::from_stream(
            stream::once(async move {
                tokio::time::sleep(latency).await;
                log::trace!(
                    "Forwarding {} after {:?}",
                    operation.display_name(),
                    latency
                );
                forward.run(operation).into_stream()
            })
            .flatten(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualLink;
    use crate::{FetchResult, LinkChain, Notification};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn forwards_after_latency() {
        let terminal = ManualLink::new();
        let chain = LinkChain::new(vec![
            Arc::new(DelayLink::new(Duration::from_millis(300))) as Arc<dyn Link>,
            Arc::new(terminal.clone()),
        ]);

        let (_subscription, mut rx) = chain.execute(Operation::new("{ a }")).subscribe_channel();

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert_eq!(terminal.issued_count(), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(terminal.issued_count(), 1);

        terminal.issued(0).respond(FetchResult::from_data(json!({ "a": 1 })));
        terminal.issued(0).finish();
        assert!(matches!(rx.recv().await, Some(Notification::Next(_))));
        assert!(matches!(rx.recv().await, Some(Notification::Complete)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_during_wait_never_forwards() {
        let terminal = ManualLink::new();
        let chain = LinkChain::new(vec![
            Arc::new(DelayLink::new(Duration::from_millis(300))) as Arc<dyn Link>,
            Arc::new(terminal.clone()),
        ]);

        let (subscription, mut rx) = chain.execute(Operation::new("{ a }")).subscribe_channel();
        tokio::time::sleep(Duration::from_millis(100)).await;
        subscription.unsubscribe();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(terminal.issued_count(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_after_forward_cancels_downstream() {
        let terminal = ManualLink::new();
        let chain = LinkChain::new(vec![
            Arc::new(DelayLink::new(Duration::from_millis(10))) as Arc<dyn Link>,
            Arc::new(terminal.clone()),
        ]);

        let (subscription, _rx) = chain.execute(Operation::new("{ a }")).subscribe_channel();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(terminal.issued_count(), 1);

        subscription.unsubscribe();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(terminal.issued(0).is_cancelled());
    }
}
