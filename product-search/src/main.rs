use std::env;

use tokio::net::TcpListener;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use product_search::{Dependencies, ServiceError, Settings};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    dotenv::dotenv().ok();
    init_tracing();

    let settings = Settings::from_env()?;
    let Dependencies {
        orchestrator,
        api_state,
        http_addr,
    } = Dependencies::new(&settings).await?;

    let shutdown = orchestrator.shutdown_handle();
    let pipeline = tokio::spawn(async move { orchestrator.run().await });

    let listener = TcpListener::bind(http_addr).await?;
    info!(addr = %http_addr, "Search API listening");

    axum::serve(listener, product_search_api::router(api_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown.send(());
    match pipeline.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "Pipeline failed"),
        Err(e) => error!(error = %e, "Pipeline task failed"),
    }

    info!("Product search service stopped");
    Ok(())
}
