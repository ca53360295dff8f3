use anyhow::Context;
use tonic::{codegen::http, transport::Server};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{pb, state::AppState, users::handlers::user_server};

/// Attached to every log line emitted while serving.
pub const API_NAME: &str = "User-API-v1";

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.grpc.address()?;

    let reflection = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(pb::FILE_DESCRIPTOR_SET)
        .build_v1()
        .context("build reflection service")?;

    info!(%addr, "server listening");
    Server::builder()
        .layer(
            TraceLayer::new_for_grpc().make_span_with(|req: &http::Request<_>| {
                tracing::info_span!("grpc_request", path = %req.uri().path())
            }),
        )
        .add_service(reflection)
        .add_service(user_server(state.users.clone()))
        .serve_with_shutdown(addr, shutdown_signal())
        .await
        .context("grpc server")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
