use graphql_link::{
    AbortConfig, AbortLink, DelayLink, FetchResult, Forward, Link, LinkChain, Observable,
    Operation,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let executed = Arc::new(AtomicUsize::new(0));
    let counter = executed.clone();
    let terminal = move |operation: Operation, _forward: Forward| {
        let executed = counter.fetch_add(1, Ordering::SeqCst) + 1;
        Observable::of(FetchResult::from_data(json!({
            "operation": operation.display_name(),
            "executed": executed,
        })))
    };

    let abort = Arc::new(AbortLink::new(AbortConfig::default()));
    let chain = LinkChain::new(vec![
        abort.clone() as Arc<dyn Link>,
        Arc::new(DelayLink::new(Duration::from_millis(300))),
        Arc::new(terminal),
    ]);

    println!("=== Five keyed requests, 50ms apart ===");
    let mut last = None;
    for attempt in 1..=5 {
        let operation = Operation::new("mutation Save { save }")
            .with_operation_name("Save")
            .with_variable("attempt", attempt)
            .with_context("abortKey", "save");
        last = Some(chain.execute(operation).subscribe_channel());
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    if let Some((_subscription, mut rx)) = last {
        println!("Last request produced: {:?}", rx.recv().await);
    }
    println!("Executed {} time(s)", executed.load(Ordering::SeqCst));
    println!("Abort stats: {:?}", abort.stats());

    println!("\n=== Five unkeyed requests ===");
    let mut pending = vec![];
    for _ in 0..5 {
        pending.push(chain.execute(Operation::new("mutation Save { save }")).subscribe_channel());
    }
    for (_subscription, rx) in &mut pending {
        rx.recv().await;
    }
    println!("Executed {} time(s) in total", executed.load(Ordering::SeqCst));

    Ok(())
}
