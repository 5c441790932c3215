use anyhow::Result;
use sea_orm::{FromQueryResult, Statement};

use crate::shared::data::db::get_connection;

#[derive(Debug, FromQueryResult)]
struct CountRow {
    cnt: i64,
}

async fn scalar_count(sql: &str, values: Vec<sea_orm::Value>) -> Result<i64> {
    let db = get_connection();
    let stmt = Statement::from_sql_and_values(sea_orm::DatabaseBackend::Sqlite, sql, values);
    let row = CountRow::find_by_statement(stmt).one(db).await?;
    Ok(row.map(|r| r.cnt).unwrap_or(0))
}

pub async fn total_students() -> Result<i64> {
    scalar_count("SELECT COUNT(*) AS cnt FROM a001_student", vec![]).await
}

/// Students holding an issued card (QR reference present)
pub async fn total_cards() -> Result<i64> {
    scalar_count(
        "SELECT COUNT(*) AS cnt FROM a001_student WHERE qr_code IS NOT NULL",
        vec![],
    )
    .await
}

pub async fn registrations_since(cutoff: chrono::DateTime<chrono::Utc>) -> Result<i64> {
    scalar_count(
        "SELECT COUNT(*) AS cnt FROM a001_student WHERE created_at >= ?",
        vec![cutoff.into()],
    )
    .await
}

pub async fn course_count() -> Result<i64> {
    scalar_count(
        "SELECT COUNT(DISTINCT course_name) AS cnt FROM a001_student",
        vec![],
    )
    .await
}

/// Aggregation row for per-course distribution
#[derive(Debug, FromQueryResult)]
pub struct CourseAggregation {
    pub course: String,
    pub cnt: i64,
}

pub async fn course_distribution() -> Result<Vec<CourseAggregation>> {
    let db = get_connection();

    let sql = r#"
        SELECT course_name AS course, COUNT(*) AS cnt
        FROM a001_student
        GROUP BY course_name
        ORDER BY cnt DESC, course_name
    "#;

    let stmt = Statement::from_sql_and_values(sea_orm::DatabaseBackend::Sqlite, sql, []);
    let results = CourseAggregation::find_by_statement(stmt).all(db).await?;
    Ok(results)
}

/// Aggregation row for registrations by year of joining
#[derive(Debug, FromQueryResult)]
pub struct YearAggregation {
    pub year: i32,
    pub cnt: i64,
}

pub async fn yearly_registration() -> Result<Vec<YearAggregation>> {
    let db = get_connection();

    let sql = r#"
        SELECT year_of_joining AS year, COUNT(*) AS cnt
        FROM a001_student
        GROUP BY year_of_joining
        ORDER BY year_of_joining
    "#;

    let stmt = Statement::from_sql_and_values(sea_orm::DatabaseBackend::Sqlite, sql, []);
    let results = YearAggregation::find_by_statement(stmt).all(db).await?;
    Ok(results)
}
