use getset::Getters;
use graphql_link::SharedAbortRegistry;
use log::info;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::config::Config;

pub const COUNTER_ID: &str = "1";

#[derive(Getters)]
#[get = "pub"]
pub struct Context {
    counter: Mutex<i32>,
    abort_registry: SharedAbortRegistry,
    config: Config,
}

impl Context {
    pub fn new(config: Config, abort_registry: SharedAbortRegistry) -> Self {
        info!(
            "Initialized counter context (latency: {}ms, abort key: {}={})",
            config.latency_ms(),
            config.abort_context_key(),
            config.abort_key()
        );

        Self {
            counter: Mutex::new(0),
            abort_registry,
            config,
        }
    }

    pub async fn count(&self) -> i32 {
        *self.counter.lock().await
    }

    pub async fn set_count(&self, count: i32) -> i32 {
        let mut counter = self.counter.lock().await;
        if *counter != count {
            info!("Counter changed from {} to {}", *counter, count);
        }
        *counter = count;
        count
    }
}

pub type ContextPointer = Arc<Context>;
