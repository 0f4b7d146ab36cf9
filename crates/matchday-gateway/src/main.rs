use matchday_gateway::config::GatewayConfig;
use matchday_gateway::features::assignment::controller::RegistryController;
use matchday_gateway::features::assignment::repo::StoreAssignmentRepository;
use matchday_gateway::features::assignment::service::RegistryService;
use matchday_gateway::features::compute_control::controller::ComputeController;
use matchday_gateway::features::compute_control::repo::HttpComputeApi;
use matchday_gateway::features::compute_control::service::ComputeService;
use matchday_gateway::features::observability::controller::ObservabilityController;
use matchday_gateway::features::remote_exec::controller::ExecController;
use matchday_gateway::features::remote_exec::repo::SshTransport;
use matchday_gateway::features::remote_exec::service::ExecService;
use matchday_gateway::features::state_store::controller::StoreController;
use matchday_gateway::features::state_store::service::{HttpStoreHandleFactory, StoreService};
use matchday_gateway::server;
use matchday_gateway::tools::ToolGateway;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = GatewayConfig::from_env()?;
    info!("Starting Matchday fleet gateway");

    let compute_service = Arc::new(ComputeService::new(Arc::new(HttpComputeApi::new(
        config.compute.clone(),
    )?)));
    let compute = Arc::new(ComputeController::new(compute_service.clone()));

    let exec = Arc::new(ExecController::new(Arc::new(ExecService::new(
        Arc::new(SshTransport::new()),
        config.shell.clone(),
    ))));

    let store_service = Arc::new(StoreService::new(Box::new(HttpStoreHandleFactory::new(
        config.store.clone(),
    ))));
    let store = Arc::new(StoreController::new(store_service.clone()));

    let assignment_repo = Arc::new(StoreAssignmentRepository::new(
        store_service,
        config.registry.project,
        config.registry.assignment_root.clone(),
    ));
    let registry = Arc::new(RegistryController::new(Arc::new(RegistryService::new(
        compute_service,
        assignment_repo,
        config.registry.pool_tag.clone(),
    ))));

    let observability = ObservabilityController::build()?;

    let gateway = Arc::new(ToolGateway::new(
        compute,
        exec,
        store,
        registry,
        observability.clone(),
    ));
    let app = server::router(gateway, observability);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Gateway listening");
    axum::serve(listener, app).await?;

    Ok(())
}
