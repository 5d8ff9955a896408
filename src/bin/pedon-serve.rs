//! Serving CLI: load the artifact set and answer prediction requests.
//!
//! Artifacts are loaded before the listener binds. A missing or
//! corrupt artifact set is fatal; the process exits instead of serving
//! a roster it cannot honor.

use clap::Parser;
use pedon::artifact::ArtifactStore;
use pedon::server::router;
use pedon::service::ServiceContext;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "pedon-serve", about = "Serve SOC predictions over HTTP", version)]
struct Args {
    /// Directory holding the trained artifact set
    #[arg(long, default_value = "models")]
    artifacts: PathBuf,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let store = ArtifactStore::new(&args.artifacts);
    let context = match store.load().and_then(ServiceContext::from_artifacts) {
        Ok(context) => {
            tracing::info!(
                dir = %args.artifacts.display(),
                models = context.n_models(),
                "artifacts loaded"
            );
            Arc::new(context)
        }
        Err(err) => {
            tracing::error!(error = %err, "cannot load artifacts, refusing to serve");
            return ExitCode::FAILURE;
        }
    };

    let app = router(context);

    let listener = match tokio::net::TcpListener::bind(args.bind).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, addr = %args.bind, "cannot bind");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(addr = %args.bind, "listening");

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!(error = %err, "server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
