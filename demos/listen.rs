//! Listens on a queue and simulates a one-second task per job.
//!
//! ```text
//! cargo run --example listen -- populate-cache
//! ```
//!
//! Stop with Ctrl-C: the first signal drains in-flight jobs, a second one forces exit.

use std::sync::Arc;
use std::time::Duration;

use cumin::{CallbackFn, Config, Cumin, Done, LogWriter, RedisStore, Subscribe};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "cumin=info".into()))
        .init();

    let queue = std::env::args().nth(1).unwrap_or_else(|| "populate-cache".to_string());
    let url = std::env::var("CUMIN_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());
    let store = RedisStore::connect(&url).await?;

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default())];
    let cumin = Cumin::builder(Arc::new(store))
        .config(Config {
            exit_process: true,
            ..Config::default()
        })
        .with_subscribers(subs)
        .build();

    let listener = cumin.listen(
        &queue,
        CallbackFn::new(|data: Value, done: Done| {
            println!("-- received {data}");
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                done.complete();
            });
        }),
    )?;
    listener.run().await?;
    Ok(())
}
