//! Command line: serve the dashboard API (default) or provision tenants

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::db::{Database, NewProject};

#[derive(Debug, Parser)]
#[command(
    name = "chatlabs-dashboard",
    version,
    about = "Analytics backend for chatbot interaction dashboards"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP API (the default)
    Serve,
    /// Register a project (tenant)
    CreateProject {
        #[arg(long)]
        name: String,
        #[arg(long)]
        warehouse_project: Option<String>,
        #[arg(long)]
        warehouse_dataset: Option<String>,
        #[arg(long)]
        warehouse_table: Option<String>,
        #[arg(long, env = "CHATLABS_CHAT_API_KEY", hide_env_values = true)]
        chat_api_key: Option<String>,
        #[arg(long)]
        chat_project: Option<String>,
    },
    /// Create a user, or refresh an existing user's name and email
    UpsertUser {
        /// Identity sent in the x-user-id header
        external_id: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    /// Grant a user a project and make it their current one
    AssignProject {
        external_id: String,
        project_id: i64,
    },
    /// Print the project a user's dashboard resolves to
    ShowProject { external_id: String },
}

/// Run a provisioning command against the project directory.
/// `Serve` is handled by the caller.
pub async fn run_admin(db: &Database, command: Commands) -> Result<()> {
    match command {
        Commands::Serve => {}
        Commands::CreateProject {
            name,
            warehouse_project,
            warehouse_dataset,
            warehouse_table,
            chat_api_key,
            chat_project,
        } => {
            let id = db
                .create_project(&NewProject {
                    name: name.clone(),
                    warehouse_project_id: warehouse_project,
                    warehouse_dataset_id: warehouse_dataset,
                    warehouse_table_id: warehouse_table,
                    chat_api_key,
                    chat_project_id: chat_project,
                })
                .await?;
            info!("Created project '{}' with id {}", name, id);
            println!("{id}");
        }
        Commands::UpsertUser {
            external_id,
            name,
            email,
        } => {
            let id = db.upsert_user(&external_id, &name, &email).await?;
            info!("User {} stored with id {}", external_id, id);
        }
        Commands::AssignProject {
            external_id,
            project_id,
        } => {
            db.assign_project(&external_id, project_id).await?;
        }
        Commands::ShowProject { external_id } => match db.project_for_user(&external_id).await? {
            Some(project) => {
                let table = project
                    .warehouse
                    .as_ref()
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "<not configured>".to_string());
                let chat = project
                    .chat
                    .as_ref()
                    .map(|c| c.project_id.as_str())
                    .unwrap_or("<not configured>");
                println!("{}\t{}\t{}\t{}", project.id, project.name, table, chat);
            }
            None => anyhow::bail!("no project assigned to user '{external_id}'"),
        },
    }
    Ok(())
}
