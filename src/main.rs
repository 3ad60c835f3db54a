use std::sync::Arc;

use gated_static::config::{AppState, Config, DEFAULT_CONFIG_PATH};
use gated_static::logger;
use gated_static::server::{self, readiness, SignalHandler};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Create Tokio runtime, sized by the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg, config_path))
}

async fn async_main(cfg: Config, config_path: String) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let state = Arc::new(AppState::new(&cfg));

    for entry in state.routes.entries() {
        logger::log_route_bound(&entry.pattern.to_string(), &entry.target.to_string());
    }
    logger::log_gate_armed(cfg.pause.seconds, state.gate.release_at());

    let listener = server::create_reusable_listener(addr)?;
    let local_addr = listener.local_addr()?;

    let signals = Arc::new(SignalHandler::new(config_path));
    server::start_signal_handler(Arc::clone(&signals), Arc::clone(&state));

    let serving = tokio::spawn(server::run(
        listener,
        Arc::clone(&state),
        Arc::clone(&signals.shutdown),
    ));

    if let Err(e) =
        server::wait_until_ready(local_addr, readiness::POLL_INTERVAL, readiness::READY_TIMEOUT)
            .await
    {
        signals.request_shutdown("Readiness check failed");
        serving.await?;
        return Err(e.into());
    }
    logger::log_server_start(&local_addr, &cfg);
    logger::log_server_ready(&local_addr);

    serving.await?;
    Ok(())
}
