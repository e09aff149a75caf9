mod render;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, error, info};

use access_core::{
    AccessError, AccessStore, ExpansionState, MenuCatalog, SaveOutcome, SyncCoordinator,
};
use access_infrastructure::{AuthenticatedTransport, HttpAccessStore};
use access_security::CredentialSession;
use access_shared::config::AppConfig;
use access_shared::telemetry::init_telemetry;
use access_shared::{MenuId, UserId};

#[derive(Parser)]
#[command(name = "access-console")]
#[command(about = "Inspect and edit per-user menu access")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Short-lived access token from the login endpoint
    #[arg(long, env = "ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    /// Long-lived refresh token from the login endpoint
    #[arg(long, env = "REFRESH_TOKEN", hide_env_values = true)]
    refresh_token: String,

    /// Overrides api.base_url from configuration
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full menu catalog
    Catalog {
        /// Expand only these nodes (default: everything)
        #[arg(long = "expand", value_name = "MENU_ID")]
        expand: Vec<MenuId>,
    },
    /// Show a user's granted menus
    Show {
        #[arg(long)]
        user: UserId,
        /// Print the navigation tree the user sees instead of the checklist
        #[arg(long)]
        navigation: bool,
    },
    /// Toggle menus for a user, then save
    Toggle {
        #[arg(long)]
        user: UserId,
        #[arg(long = "menu", value_name = "MENU_ID", required = true)]
        menus: Vec<MenuId>,
        /// Print the resulting changes without saving
        #[arg(long)]
        dry_run: bool,
    },
    /// Grant every menu to a user
    GrantAll {
        #[arg(long)]
        user: UserId,
    },
    /// Revoke every menu from a user
    RevokeAll {
        #[arg(long)]
        user: UserId,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load().context("failed to load configuration")?;
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    let guard = init_telemetry(&config.telemetry)?;

    info!(base_url = %config.api.base_url, "Access console starting");

    match run(cli, config).await {
        Err(e) if e.downcast_ref::<AccessError>().is_some_and(AccessError::requires_login) => {
            error!("Credentials rejected by the remote store");
            eprintln!("Your login has expired. Log in again and export fresh ACCESS_TOKEN and REFRESH_TOKEN.");
            drop(guard);
            std::process::exit(2);
        }
        result => result,
    }
}

async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let session = Arc::new(CredentialSession::new());
    session.init(cli.access_token, cli.refresh_token);
    debug!(
        operator = ?session.user_id(),
        expires_at = ?session.access_expires_at(),
        "Credentials loaded"
    );

    let transport = AuthenticatedTransport::from_settings(&config.api, session.clone())?;
    let store = Arc::new(HttpAccessStore::new(transport, config.api.clone()));

    match cli.command {
        Commands::Catalog { expand } => {
            let catalog = MenuCatalog::build(store.fetch_catalog().await?)?;
            let mut expansion = ExpansionState::new();
            if expand.is_empty() {
                expansion.expand_all(&catalog);
            } else {
                for id in expand {
                    catalog.lookup(id)?;
                    expansion.expand(id);
                }
            }
            print!("{}", render::render_catalog(&catalog, &expansion, None)?);
        }
        Commands::Show { user, navigation } => {
            let coordinator = SyncCoordinator::new(store);
            let snapshot = coordinator.open(user).await?;
            if navigation {
                print!("{}", render::render_navigation(&coordinator.visible_tree()?));
            } else {
                let catalog = coordinator.catalog().ok_or(AccessError::SessionClosed)?;
                let mut expansion = ExpansionState::new();
                expansion.expand_all(&catalog);
                print!(
                    "{}",
                    render::render_catalog(&catalog, &expansion, Some(&snapshot.working))?
                );
                println!("{} of {} menus granted", snapshot.working.len(), catalog.len());
            }
            coordinator.close();
        }
        Commands::Toggle { user, menus, dry_run } => {
            let coordinator = SyncCoordinator::new(store);
            coordinator.open(user).await?;
            for id in menus {
                let outcome = coordinator.toggle(id)?;
                println!("#{}: {:?}", id, outcome);
            }
            finish(&coordinator, dry_run).await?;
        }
        Commands::GrantAll { user } => {
            let coordinator = SyncCoordinator::new(store);
            coordinator.open(user).await?;
            coordinator.select_all()?;
            finish(&coordinator, false).await?;
        }
        Commands::RevokeAll { user } => {
            let coordinator = SyncCoordinator::new(store);
            coordinator.open(user).await?;
            coordinator.deselect_all()?;
            finish(&coordinator, false).await?;
        }
    }

    Ok(())
}

/// Saves (or previews) the open session and closes it.
async fn finish<S: AccessStore>(coordinator: &SyncCoordinator<S>, dry_run: bool) -> anyhow::Result<()> {
    if dry_run {
        if let Some(snapshot) = coordinator.snapshot() {
            println!("dry run, not saved: {}", render::render_diff(&snapshot.diff()));
        }
        coordinator.close();
        return Ok(());
    }

    let outcome = coordinator.save().await;
    coordinator.close();
    match outcome? {
        SaveOutcome::Saved(diff) => println!("saved: {}", render::render_diff(&diff)),
        SaveOutcome::Unchanged => println!("nothing to save"),
    }
    Ok(())
}
