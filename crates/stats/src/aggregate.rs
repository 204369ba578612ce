use crate::calculator::Calculator;
use crate::categories::{Databases, Devices, GatewayNetwork, Meta, OpcServers, Projects};
use crate::error::{ErrorKind, Result};
use crate::report::{Outcome, Report};
use ember_source::Bundle;
use ember_source::consts::{CONFIG_DIR, PROJECTS_DIR};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Calculate every statistics category for a bundle.
///
/// See [`analyze_with`].
pub async fn analyze(bundle: &Bundle) -> Report {
    analyze_with(bundle, &CancellationToken::new()).await
}

/// Calculate every statistics category for a bundle, concurrently.
///
/// Each calculator runs exactly once. A failing calculator is recorded as
/// [`Outcome::Failed`] without affecting the others, and cancelling the
/// token fails whichever categories haven't finished yet. The bundle is left
/// open.
#[instrument(skip_all, fields(bundle = bundle.display_name()))]
pub async fn analyze_with(bundle: &Bundle, cancel: &CancellationToken) -> Report {
    let (has_config_db, has_projects, has_config) = futures::join!(
        flag(bundle.has_config_db(), "has_config_db"),
        flag(bundle.exists(PROJECTS_DIR), "has_projects"),
        flag(bundle.exists(CONFIG_DIR), "has_config"),
    );
    let (meta, projects, databases, devices, opc_servers, gateway_network) = futures::join!(
        run(Meta, bundle, cancel),
        run(Projects, bundle, cancel),
        run(Databases, bundle, cancel),
        run(Devices, bundle, cancel),
        run(OpcServers, bundle, cancel),
        run(GatewayNetwork, bundle, cancel),
    );
    Report {
        path: bundle.path().to_path_buf(),
        display_name: bundle.display_name().to_string(),
        is_archive: bundle.is_archive(),
        has_config_db,
        has_projects,
        has_config,
        meta,
        projects,
        databases,
        devices,
        opc_servers,
        gateway_network,
    }
}

async fn run<C: Calculator>(calculator: C, bundle: &Bundle, cancel: &CancellationToken) -> Outcome<C::Output> {
    let result: Result<Option<C::Output>> = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(exn::Exn::from(ErrorKind::Cancelled)),
        result = calculator.calculate(bundle) => result,
    };
    Outcome::from_result(C::CATEGORY, result)
}

async fn flag(check: impl Future<Output = ember_source::error::Result<bool>>, name: &'static str) -> bool {
    check.await.unwrap_or_else(|err| {
        tracing::warn!(flag = name, error = ?err, "Presence check failed");
        false
    })
}
