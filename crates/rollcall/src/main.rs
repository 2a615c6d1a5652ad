use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use rollcall_core::{
    config::Config,
    roster::{JsonFileRoster, RosterStore},
};

mod liveness;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rollcall_core::logging::init("rollcall")?;

    // Missing token fails here, before anything else starts.
    let cfg = Arc::new(Config::load()?);

    let store = Arc::new(RosterStore::open(Arc::new(JsonFileRoster::new(
        &cfg.roster_file,
    ))));

    let shutdown = CancellationToken::new();
    let liveness = (cfg.liveness_port != 0).then(|| {
        let port = cfg.liveness_port;
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = liveness::serve(port, shutdown).await {
                tracing::error!(port, error = %e, "liveness endpoint failed");
            }
        })
    });

    let result = rollcall_telegram::router::run_polling(cfg, store).await;

    shutdown.cancel();
    if let Some(handle) = liveness {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "liveness task did not exit cleanly");
        }
    }

    result
}
