use anyhow::bail;
use clap::Subcommand;

use crate::auth::{issue_tenant_key, KeyStore};
use crate::config::AppConfig;
use crate::tenant::resolve_tenant;

#[derive(Subcommand)]
pub enum TenantKeyCommands {
    #[command(about = "Mint a new key for a tenant and write it to the tenant keys file")]
    Issue {
        #[arg(help = "Tenant ID")]
        tenant: String,
    },

    #[command(about = "Show whether requests for a tenant must present a key")]
    Check {
        #[arg(help = "Tenant ID")]
        tenant: String,
    },
}

pub async fn handle(cmd: TenantKeyCommands, config: &AppConfig) -> anyhow::Result<()> {
    let keys = KeyStore::from_config(&config.security);

    match cmd {
        TenantKeyCommands::Issue { tenant } => {
            let tenant = tenant.trim();
            if tenant.is_empty() {
                bail!("tenant must not be empty");
            }
            let Some(path) = keys.file_path() else {
                bail!("CONTINUUM_TENANT_KEYS_FILE is not set; a key issued here would be lost");
            };
            let path = path.display().to_string();

            let api_key = issue_tenant_key(&keys, tenant).await?;
            println!("{}", serde_json::json!({ "tenant_id": tenant, "api_key": api_key }));
            eprintln!("Saved to {}", path);
            Ok(())
        }
        TenantKeyCommands::Check { tenant } => {
            println!("{}", check_tenant(&keys, &tenant).await);
            Ok(())
        }
    }
}

/// Same tenant resolution as the request gate, so a blank argument checks
/// the default tenant.
async fn check_tenant(keys: &KeyStore, raw: &str) -> String {
    let tenant = resolve_tenant(Some(raw), None);
    let state = match keys.resolve_required_key(tenant.as_str()).await {
        Some(_) => "key required",
        None => "open",
    };
    format!("{}: {}", tenant, state)
}
