mod api;
mod client;
mod error;
mod models;

use std::sync::Arc;

use chrono::Utc;
use graphql_link::AbortRegistry;
use log::info;
use simplelog::{ColorChoice, TermLogger, TerminalMode};

use api::build_schema;
use client::CounterClient;
use error::AppError;
use models::config::{parse_clicks, Config};
use models::context::Context;

fn init_logging(config: &Config) -> Result<(), AppError> {
    TermLogger::init(
        config.level_filter()?,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;
    Ok(())
}

// One thread, so a superseded request never delivers after it is cancelled.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppError> {
    let mut config = Config::load()?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        config = config.with_clicks(parse_clicks(&args)?);
    }
    init_logging(&config)?;

    let started = Utc::now();
    let registry = Arc::new(AbortRegistry::new());
    let context = Arc::new(Context::new(config.clone(), registry.clone()));
    let client = CounterClient::new(build_schema(context.clone()), registry, &config);

    client.fetch_count().await?;

    let mut subscriptions = Vec::with_capacity(config.clicks().len());
    for click in config.clicks() {
        info!("Clicked {} (displayed count {})", click, client.displayed_count());
        subscriptions.push(client.click(*click));
        tokio::time::sleep(config.click_interval()).await;
    }

    // Anything still in flight settles within one latency period.
    tokio::time::sleep(context.config().latency() * 2).await;

    let unresolved = subscriptions.iter().filter(|s| !s.is_closed()).count();
    info!(
        "Session finished after {}ms: displayed count {}, server count {}, \
         {} superseded request(s) never resolved",
        (Utc::now() - started).num_milliseconds(),
        client.displayed_count(),
        context.count().await,
        unresolved
    );
    info!("Abort stats: {:?}", client.abort_stats());

    Ok(())
}
