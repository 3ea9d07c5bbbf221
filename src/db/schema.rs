//! Database schema definitions

pub const CREATE_PROJECTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    warehouse_project_id TEXT,
    warehouse_dataset_id TEXT,
    warehouse_table_id TEXT,
    chat_api_key TEXT,                -- credentials for the chat platform (transcripts, knowledge base)
    chat_project_id TEXT,
    created_at BIGINT NOT NULL        -- Unix millis
)
"#;

pub const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE, -- identity asserted by the auth layer
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    current_project_id INTEGER REFERENCES projects(id),
    created_at BIGINT NOT NULL
)
"#;

pub const CREATE_USER_PROJECTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS user_projects (
    user_id INTEGER NOT NULL REFERENCES users(id),
    project_id INTEGER NOT NULL REFERENCES projects(id),
    assigned_at BIGINT NOT NULL,
    PRIMARY KEY (user_id, project_id)
)
"#;

// For "first assigned project" fallback lookups
pub const CREATE_INDEX_USER_PROJECTS: &str =
    "CREATE INDEX IF NOT EXISTS idx_user_projects_user ON user_projects(user_id, assigned_at)";
