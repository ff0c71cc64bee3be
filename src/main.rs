use clap::Parser;

use ollama_gateway::config::{CliArgs, GatewayConfig};
use ollama_gateway::server::{self, AppState};

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let config = GatewayConfig::from_args(&args)?;
    let app_state = AppState::new(&config)?;
    actix_web::rt::System::new().block_on(async move {
        tokio::spawn(server::periodic_logging(app_state.clone()));
        tokio::select! {
            res = server::startup(config, app_state) => res.map_err(anyhow::Error::from),
            _ = tokio::signal::ctrl_c() => {
                println!("Received Ctrl+C, shutting down");
                Ok(())
            }
        }
    })
}
