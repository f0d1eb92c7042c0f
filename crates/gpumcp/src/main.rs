//! Entry point: parse CLI flags, build the selected role, run until
//! shutdown.

mod agent;
mod cli;
mod gateway;
mod logging;

use clap::Parser;
use cli::{Cli, Role};
use gpumcp_server::lifecycle::ServerLifecycle;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(err) = run(cli).await {
        tracing::error!(error = %err, "startup failed");
        eprintln!("gpumcp: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let transport = cli.resolve_transport();
    let lifecycle = ServerLifecycle::new();
    let token = lifecycle.token();

    let server = match cli.role {
        Role::Agent => agent::build(&cli)?,
        Role::Gateway => gateway::build(&cli).await?,
    };

    let signal_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received interrupt signal");
            signal_token.cancel();
        }
    });

    let run_result = server.run(transport, token).await;
    lifecycle.shutdown(async {}).await;
    run_result?;
    Ok(())
}
