//! Enqueues one JSON payload.
//!
//! ```text
//! cargo run --example enqueue -- populate-cache '{"page": "/home"}'
//! ```

use std::sync::Arc;

use cumin::{Config, Cumin, RedisStore};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "cumin=debug".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let queue = args.next().unwrap_or_else(|| "populate-cache".to_string());
    let payload: Value = match args.next() {
        Some(raw) => serde_json::from_str(&raw)?,
        None => json!({ "some": "task" }),
    };

    let url = std::env::var("CUMIN_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
    let cumin = Cumin::new(Arc::new(RedisStore::connect(&url).await?), Config::default());

    let envelope = cumin.enqueue(&queue, &payload).await?;
    println!("enqueued on {queue} at {}", envelope.date);
    Ok(())
}
