pub mod commands;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "continuum-library")]
#[command(about = "Continuum Library - multi-tenant document library API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default when no command is given)")]
    Serve {
        #[arg(long, help = "Port to listen on, overriding PORT")]
        port: Option<u16>,
    },

    #[command(about = "Tenant API key management")]
    TenantKey {
        #[command(subcommand)]
        cmd: commands::tenant::TenantKeyCommands,
    },
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::server::serve(config, port).await,
        Commands::TenantKey { cmd } => commands::tenant::handle(cmd, &config).await,
    }
}
