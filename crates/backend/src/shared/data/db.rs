use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

pub async fn initialize_database(db_path: Option<&str>) -> anyhow::Result<()> {
    let db_file = db_path.unwrap_or("target/db/app.db");
    if let Some(parent) = std::path::Path::new(db_file).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_file).is_absolute() {
        std::path::PathBuf::from(db_file)
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
    let conn = Database::connect(&db_url).await?;

    bootstrap_schema(&conn).await?;

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

/// Minimal schema bootstrap: create tables and indexes if absent.
async fn bootstrap_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    let check_student_table = r#"
        SELECT name FROM sqlite_master WHERE type='table' AND name='a001_student';
    "#;
    let student_table_exists = conn
        .query_all(Statement::from_string(
            DatabaseBackend::Sqlite,
            check_student_table.to_string(),
        ))
        .await?;

    if student_table_exists.is_empty() {
        tracing::info!("Creating a001_student table");
        let create_student_table_sql = r#"
            CREATE TABLE a001_student (
                id TEXT PRIMARY KEY NOT NULL,
                code TEXT NOT NULL DEFAULT '',
                photo_url TEXT,
                full_name TEXT NOT NULL,
                address TEXT NOT NULL,
                date_of_birth TEXT NOT NULL,
                mobile_number TEXT NOT NULL,
                prn_number TEXT NOT NULL,
                roll_number TEXT NOT NULL,
                year_of_joining INTEGER NOT NULL,
                course_name TEXT NOT NULL,
                qr_code TEXT,
                card_validity TEXT,
                created_at TEXT,
                updated_at TEXT,
                version INTEGER NOT NULL DEFAULT 0
            );
        "#;
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            create_student_table_sql.to_string(),
        ))
        .await?;
    }

    // PRN must stay globally unique among persisted students
    conn.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_a001_student_prn ON a001_student(prn_number);"
            .to_string(),
    ))
    .await?;

    conn.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        "CREATE INDEX IF NOT EXISTS idx_a001_student_created_at ON a001_student(created_at);"
            .to_string(),
    ))
    .await?;

    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}
