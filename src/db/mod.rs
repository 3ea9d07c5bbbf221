//! Database module: tenants (projects) and which users may see them

mod schema;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::str::FromStr;

use crate::config::DatabaseConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::service::ProjectDirectory;
use crate::warehouse::WarehouseTable;

/// Credentials for the chat platform serving transcripts and knowledge-base documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPlatformConfig {
    pub api_key: String,
    pub project_id: String,
}

/// A tenant's configuration bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    /// Present only when all three warehouse identifiers are set
    pub warehouse: Option<WarehouseTable>,
    pub chat: Option<ChatPlatformConfig>,
}

/// Fields accepted when registering a project
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub warehouse_project_id: Option<String>,
    pub warehouse_dataset_id: Option<String>,
    pub warehouse_table_id: Option<String>,
    pub chat_api_key: Option<String>,
    pub chat_project_id: Option<String>,
}

type ProjectRow = (
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        let (id, name, wh_project, wh_dataset, wh_table, chat_key, chat_project) = row;
        let warehouse = match (
            non_blank(wh_project),
            non_blank(wh_dataset),
            non_blank(wh_table),
        ) {
            (Some(project_id), Some(dataset_id), Some(table_id)) => Some(WarehouseTable {
                project_id,
                dataset_id,
                table_id,
            }),
            _ => None,
        };
        let chat = match (non_blank(chat_key), non_blank(chat_project)) {
            (Some(api_key), Some(project_id)) => Some(ChatPlatformConfig {
                api_key,
                project_id,
            }),
            _ => None,
        };
        Project {
            id,
            name,
            warehouse,
            chat,
        }
    }
}

const PROJECT_COLUMNS: &str = "p.id, p.name, p.warehouse_project_id, p.warehouse_dataset_id, \
    p.warehouse_table_id, p.chat_api_key, p.chat_project_id";

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    pub async fn new(config: &DatabaseConfig) -> DashboardResult<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.url))?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options).await?;
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> DashboardResult<()> {
        sqlx::query(schema::CREATE_PROJECTS_TABLE).execute(&self.pool).await?;
        sqlx::query(schema::CREATE_USERS_TABLE).execute(&self.pool).await?;
        sqlx::query(schema::CREATE_USER_PROJECTS_TABLE).execute(&self.pool).await?;
        sqlx::query(schema::CREATE_INDEX_USER_PROJECTS).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn create_project(&self, project: &NewProject) -> DashboardResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO projects (
                name, warehouse_project_id, warehouse_dataset_id, warehouse_table_id,
                chat_api_key, chat_project_id, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&project.name)
        .bind(&project.warehouse_project_id)
        .bind(&project.warehouse_dataset_id)
        .bind(&project.warehouse_table_id)
        .bind(&project.chat_api_key)
        .bind(&project.chat_project_id)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Insert the user, or refresh name and email if the identity is already known
    pub async fn upsert_user(
        &self,
        external_id: &str,
        name: &str,
        email: &str,
    ) -> DashboardResult<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO users (external_id, name, email, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(external_id) DO UPDATE SET name = excluded.name, email = excluded.email
            RETURNING id
            "#,
        )
        .bind(external_id)
        .bind(name)
        .bind(email)
        .bind(Utc::now().timestamp_millis())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// Grant a user access to a project and make it their current one
    pub async fn assign_project(&self, external_id: &str, project_id: i64) -> DashboardResult<()> {
        let mut tx = self.pool.begin().await?;

        let user: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE external_id = ?")
            .bind(external_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some((user_id,)) = user else {
            return Err(DashboardError::Configuration(format!("unknown user '{external_id}'")));
        };

        let project: Option<(i64,)> = sqlx::query_as("SELECT id FROM projects WHERE id = ?")
            .bind(project_id)
            .fetch_optional(&mut *tx)
            .await?;
        if project.is_none() {
            return Err(DashboardError::Configuration(format!("unknown project {project_id}")));
        }

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO user_projects (user_id, project_id, assigned_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user_id)
            .bind(project_id)
            .bind(Utc::now().timestamp_millis())
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE users SET current_project_id = ? WHERE id = ?")
            .bind(project_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!("Assigned project {} to user {}", project_id, external_id);
        Ok(())
    }

    /// The user's current project, falling back to the earliest assigned one
    pub async fn project_for_user(&self, external_id: &str) -> DashboardResult<Option<Project>> {
        let current: Option<ProjectRow> = sqlx::query_as(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM users u
            JOIN projects p ON p.id = u.current_project_id
            WHERE u.external_id = ?
            "#
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(row) = current {
            return Ok(Some(row.into()));
        }

        let assigned: Option<ProjectRow> = sqlx::query_as(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM users u
            JOIN user_projects up ON up.user_id = u.id
            JOIN projects p ON p.id = up.project_id
            WHERE u.external_id = ?
            ORDER BY up.assigned_at, up.project_id
            LIMIT 1
            "#
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(assigned.map(Project::from))
    }
}

#[async_trait]
impl ProjectDirectory for Database {
    async fn warehouse_table_for(&self, user: &str) -> DashboardResult<WarehouseTable> {
        let project = self
            .project_for_user(user)
            .await?
            .ok_or_else(|| {
                DashboardError::Configuration(format!("no project assigned to user '{user}'"))
            })?;

        project.warehouse.ok_or_else(|| {
            DashboardError::Configuration(format!(
                "project '{}' has no warehouse table configured",
                project.name
            ))
        })
    }
}
