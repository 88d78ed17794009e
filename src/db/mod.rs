//! Database module for SQLite persistence using SeaORM

pub mod entities;
pub mod questions;
pub mod roles;
pub mod topics;
pub mod users;

pub use questions::{NewAnswer, QuestionRepository};
pub use roles::RoleRepository;
pub use topics::TopicRepository;
pub use users::{NewUser, UserRepository};

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::path::Path;

/// Current Unix time in seconds, the timestamp format of every table.
pub fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Initialize database connection and create tables
pub async fn init_database(db_path: &Path) -> Result<DatabaseConnection, DbErr> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
    tracing::info!("Connecting to database: {}", db_url);

    let db = Database::connect(&db_url).await?;
    create_tables(&db).await?;

    Ok(db)
}

/// Fresh in-memory database with the full schema.
pub async fn connect_in_memory() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    create_tables(&db).await?;
    Ok(db)
}

async fn execute(db: &DatabaseConnection, sql: &str) -> Result<(), DbErr> {
    db.execute(Statement::from_string(db.get_database_backend(), sql.to_string()))
        .await?;
    Ok(())
}

/// Create all tables if they don't exist
async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS roles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            is_default INTEGER NOT NULL DEFAULT 0,
            permissions INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .await?;
    execute(db, r#"CREATE INDEX IF NOT EXISTS idx_roles_default ON roles(is_default)"#).await?;

    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            fullname TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role_id INTEGER,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (role_id) REFERENCES roles(id)
        )
        "#,
    )
    .await?;
    execute(db, r#"CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)"#).await?;

    // Composite key: one edge per ordered pair
    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS follows (
            follower_id INTEGER NOT NULL,
            followed_id INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (follower_id, followed_id),
            FOREIGN KEY (follower_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (followed_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .await?;
    execute(db, r#"CREATE INDEX IF NOT EXISTS idx_follows_followed ON follows(followed_id)"#).await?;

    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            token_hash TEXT NOT NULL UNIQUE,
            user_id INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .await?;

    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS topics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT
        )
        "#,
    )
    .await?;
    execute(db, r#"CREATE UNIQUE INDEX IF NOT EXISTS idx_topics_name ON topics(name)"#).await?;

    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS questions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            author_id INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (author_id) REFERENCES users(id)
        )
        "#,
    )
    .await?;
    execute(db, r#"CREATE INDEX IF NOT EXISTS idx_questions_created ON questions(created_at)"#).await?;
    execute(db, r#"CREATE INDEX IF NOT EXISTS idx_questions_author ON questions(author_id)"#).await?;

    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS topic_questions (
            topic_id INTEGER NOT NULL,
            question_id INTEGER NOT NULL,
            PRIMARY KEY (topic_id, question_id),
            FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE,
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
        )
        "#,
    )
    .await?;

    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS answers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question_id INTEGER NOT NULL,
            author_id INTEGER NOT NULL,
            content TEXT NOT NULL,
            content_html TEXT NOT NULL,
            summary TEXT NOT NULL,
            summary_img_url TEXT,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (question_id) REFERENCES questions(id),
            FOREIGN KEY (author_id) REFERENCES users(id)
        )
        "#,
    )
    .await?;
    execute(db, r#"CREATE INDEX IF NOT EXISTS idx_answers_question ON answers(question_id)"#).await?;
    execute(db, r#"CREATE INDEX IF NOT EXISTS idx_answers_created ON answers(created_at)"#).await?;

    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS question_comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question_id INTEGER NOT NULL,
            author_id INTEGER NOT NULL,
            content TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (question_id) REFERENCES questions(id),
            FOREIGN KEY (author_id) REFERENCES users(id)
        )
        "#,
    )
    .await?;
    execute(
        db,
        r#"CREATE INDEX IF NOT EXISTS idx_question_comments_question ON question_comments(question_id)"#,
    )
    .await?;

    execute(
        db,
        r#"
        CREATE TABLE IF NOT EXISTS answer_comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            answer_id INTEGER NOT NULL,
            author_id INTEGER NOT NULL,
            content TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (answer_id) REFERENCES answers(id),
            FOREIGN KEY (author_id) REFERENCES users(id)
        )
        "#,
    )
    .await?;
    execute(
        db,
        r#"CREATE INDEX IF NOT EXISTS idx_answer_comments_answer ON answer_comments(answer_id)"#,
    )
    .await?;

    tracing::info!("Database tables initialized");
    Ok(())
}
