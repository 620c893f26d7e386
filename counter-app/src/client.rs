use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use graphql_link::{
    AbortConfig, AbortLink, AbortStats, DelayLink, FetchResult, Link, LinkChain, LinkError,
    Observer, Operation, SchemaLink, SharedAbortRegistry, Subscription,
};
use log::{debug, error, info};

use crate::api::CounterSchema;
use crate::error::AppError;
use crate::models::config::{Click, Config};

pub const COUNT_QUERY: &str = "query Count { counter { id count } }";
pub const SET_COUNT_MUTATION: &str =
    "mutation SetCount($count: Int!) { setCount(count: $count) { id count } }";

/// Applies `setCount` results to the displayed counter.
///
/// The requested count is shown as soon as the click is dispatched. A failed
/// request puts back the count shown before the click, unless a later click
/// already replaced it.
struct DisplayObserver {
    displayed: Arc<AtomicI32>,
    label: String,
    previous: i32,
    requested: i32,
}

impl DisplayObserver {
    fn roll_back(&self) {
        let restored = self
            .displayed
            .compare_exchange(self.requested, self.previous, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if restored {
            debug!("{} rolled back to {}", self.label, self.previous);
        }
    }
}

impl Observer for DisplayObserver {
    fn next(&self, result: FetchResult) {
        match result.pointer("/setCount/count").and_then(|count| count.as_i64()) {
            Some(count) => {
                info!("{} settled with count {}", self.label, count);
                self.displayed.store(count as i32, Ordering::SeqCst);
            }
            None => {
                error!("{} returned no count: {:?}", self.label, result.errors());
                self.roll_back();
            }
        }
    }

    fn error(&self, error: LinkError) {
        error!("{} failed: {}", self.label, error);
        self.roll_back();
    }

    fn complete(&self) {
        debug!("{} completed", self.label);
    }
}

/// Client side of the demo: the two counter buttons wired through the link chain.
pub struct CounterClient {
    chain: LinkChain,
    abort_link: Arc<AbortLink>,
    abort_context_key: String,
    abort_key: String,
    displayed: Arc<AtomicI32>,
}

impl CounterClient {
    /// Builds the chain `abort -> delay -> schema`.
    pub fn new(schema: CounterSchema, registry: SharedAbortRegistry, config: &Config) -> Self {
        let abort_link = Arc::new(AbortLink::with_registry(
            AbortConfig::new(config.abort_context_key().clone()),
            registry,
        ));
        let chain = LinkChain::new(vec![
            abort_link.clone() as Arc<dyn Link>,
            Arc::new(DelayLink::new(config.latency())),
            Arc::new(SchemaLink::new(schema)),
        ]);

        Self {
            chain,
            abort_link,
            abort_context_key: config.abort_context_key().clone(),
            abort_key: config.abort_key().clone(),
            displayed: Arc::new(AtomicI32::new(0)),
        }
    }

    /// Runs the `Count` query and records the result as the displayed count.
    pub async fn fetch_count(&self) -> Result<i32, AppError> {
        let operation = Operation::new(COUNT_QUERY).with_operation_name("Count");
        let mut results = self.chain.execute(operation).into_stream();

        let result = results
            .next()
            .await
            .ok_or_else(|| AppError::UnexpectedResponse("Count returned nothing".to_string()))??;
        let count = result
            .pointer("/counter/count")
            .and_then(|count| count.as_i64())
            .ok_or_else(|| AppError::UnexpectedResponse(format!("{:?}", result)))?;

        let count = count as i32;
        self.displayed.store(count, Ordering::SeqCst);
        info!("Fetched count {}", count);
        Ok(count)
    }

    /// Increments the counter, superseding any keyed increment still in flight.
    pub fn increment_with_abort(&self) -> Subscription {
        let requested = self.displayed_count() + 1;
        let operation = set_count_operation(requested)
            .with_context(self.abort_context_key.clone(), self.abort_key.clone());
        self.dispatch(operation, requested, "Increment with abort")
    }

    /// Increments the counter without a dedup key.
    pub fn increment(&self) -> Subscription {
        let requested = self.displayed_count() + 1;
        self.dispatch(set_count_operation(requested), requested, "Increment")
    }

    pub fn click(&self, click: Click) -> Subscription {
        match click {
            Click::IncrementWithAbort => self.increment_with_abort(),
            Click::Increment => self.increment(),
        }
    }

    pub fn displayed_count(&self) -> i32 {
        self.displayed.load(Ordering::SeqCst)
    }

    pub fn abort_stats(&self) -> AbortStats {
        self.abort_link.stats()
    }

    fn dispatch(&self, operation: Operation, requested: i32, label: &str) -> Subscription {
        let label = format!("{} ({})", label, requested);
        let previous = self.displayed.swap(requested, Ordering::SeqCst);
        info!("{} issued, showing {} until it settles", label, requested);
        self.chain.execute(operation).subscribe(DisplayObserver {
            displayed: self.displayed.clone(),
            label,
            previous,
            requested,
        })
    }
}

fn set_count_operation(count: i32) -> Operation {
    Operation::new(SET_COUNT_MUTATION)
        .with_operation_name("SetCount")
        .with_variable("count", count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::build_schema;
    use crate::models::context::{Context, ContextPointer};
    use figment::providers::{Format, Yaml};
    use figment::Figment;
    use graphql_link::AbortRegistry;
    use std::time::Duration;

    fn client() -> (CounterClient, ContextPointer) {
        let figment = Figment::new().merge(Yaml::string("latency_ms: 300"));
        let config = Config::from_figment(&figment).unwrap();
        let registry = Arc::new(AbortRegistry::new());
        let context = Arc::new(Context::new(config.clone(), registry.clone()));
        let client = CounterClient::new(build_schema(context.clone()), registry, &config);
        (client, context)
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_count_reads_server_state() {
        let (client, context) = client();
        context.set_count(7).await;

        assert_eq!(client.fetch_count().await.unwrap(), 7);
        assert_eq!(client.displayed_count(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_abort_clicks_run_one_mutation() {
        let (client, context) = client();

        let first = client.increment_with_abort();
        assert_eq!(client.displayed_count(), 1);
        tokio::time::sleep(Duration::from_millis(100)).await;
        let _second = client.increment_with_abort();
        assert_eq!(client.displayed_count(), 2);
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(context.count().await, 2);
        assert_eq!(client.displayed_count(), 2);
        assert!(!first.is_closed());

        let stats = client.abort_stats();
        assert_eq!(stats.superseded, 1);
        assert_eq!(stats.settled, 1);
        assert_eq!(stats.pending_requests, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_abort_clicks_send_increasing_counts() {
        let (client, context) = client();

        let mut subscriptions = vec![];
        for expected in 1..=3 {
            subscriptions.push(client.increment_with_abort());
            assert_eq!(client.displayed_count(), expected);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;

        // Only the last click reached the schema, carrying the highest count.
        assert_eq!(context.count().await, 3);
        assert_eq!(client.displayed_count(), 3);
        assert!(subscriptions[2].is_closed());
        assert!(!subscriptions[0].is_closed() && !subscriptions[1].is_closed());

        let stats = client.abort_stats();
        assert_eq!(stats.superseded, 2);
        assert_eq!(stats.settled, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_abort_clicks_both_apply() {
        let (client, context) = client();

        client.increment_with_abort();
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(client.displayed_count(), 1);

        client.increment_with_abort();
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(context.count().await, 2);
        assert_eq!(client.displayed_count(), 2);
        assert_eq!(client.abort_stats().superseded, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn plain_clicks_are_never_cancelled() {
        let (client, context) = client();

        let first = client.click(Click::Increment);
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = client.click(Click::Increment);
        tokio::time::sleep(Duration::from_millis(500)).await;

        // The second click saw the first click's count on display.
        assert_eq!(context.count().await, 2);
        assert_eq!(client.displayed_count(), 2);
        assert!(first.is_closed());
        assert!(second.is_closed());
        assert_eq!(client.abort_stats(), AbortStats::default());
    }

    fn display_observer(displayed: &Arc<AtomicI32>) -> DisplayObserver {
        DisplayObserver {
            displayed: displayed.clone(),
            label: "Increment (4)".to_string(),
            previous: 3,
            requested: 4,
        }
    }

    #[test]
    fn failed_request_restores_previous_count() {
        let displayed = Arc::new(AtomicI32::new(4));

        display_observer(&displayed).error(LinkError::Request("offline".to_string()));

        assert_eq!(displayed.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn failure_keeps_a_newer_count() {
        let displayed = Arc::new(AtomicI32::new(5));

        display_observer(&displayed).error(LinkError::Request("offline".to_string()));

        assert_eq!(displayed.load(Ordering::SeqCst), 5);
    }
}
