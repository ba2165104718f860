//! Storage layer: SQLite status store for fetches and clips.
//!
//! Holds DB pool setup, the migration runner and the status upserts used by
//! the pipeline. The raw-video directory stays the source of truth for
//! "already downloaded"; this store records what each run observed.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

pub mod models;

pub use models::{ClipRow, ClipState, FetchRow, FetchState};

pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let mut url = database_url.to_string();
    if !database_url.starts_with("sqlite:") {
        let path = std::path::PathBuf::from(database_url);
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let norm = path.to_string_lossy().replace('\\', "/");
        if path.is_absolute() {
            url = format!("sqlite:///{}", norm.trim_start_matches('/'));
        } else {
            url = format!("sqlite://{}", norm);
        }
    }
    let opts = SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(10));
    let mut pool = SqlitePoolOptions::new();
    if url.contains("memory") {
        pool = pool.max_connections(1);
    } else {
        pool = pool.max_connections(5);
    }
    Ok(pool.connect_with(opts).await?)
}

pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    // Applies SQLx migrations located in crates/storage/migrations.
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn record_fetch(
    pool: &SqlitePool,
    raw_name: &str,
    url: &str,
    state: FetchState,
    error: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO fetches (raw_name, url, status, error, updated_at)
         VALUES (?1, ?2, ?3, ?4, strftime('%s','now'))
         ON CONFLICT(raw_name) DO UPDATE SET
           url = excluded.url,
           status = excluded.status,
           error = excluded.error,
           updated_at = excluded.updated_at",
    )
    .bind(raw_name)
    .bind(url)
    .bind(state.as_str())
    .bind(error)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn record_clip(
    pool: &SqlitePool,
    output_path: &str,
    raw_name: &str,
    split: &str,
    state: ClipState,
    error: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO clips (output_path, raw_name, split, status, error, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, strftime('%s','now'))
         ON CONFLICT(output_path) DO UPDATE SET
           raw_name = excluded.raw_name,
           split = excluded.split,
           status = excluded.status,
           error = excluded.error,
           updated_at = excluded.updated_at",
    )
    .bind(output_path)
    .bind(raw_name)
    .bind(split)
    .bind(state.as_str())
    .bind(error)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn fetch_row(pool: &SqlitePool, raw_name: &str) -> anyhow::Result<Option<FetchRow>> {
    let row = sqlx::query_as::<_, FetchRow>(
        "SELECT raw_name, url, status, error, updated_at FROM fetches WHERE raw_name = ?1",
    )
    .bind(raw_name)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn failed_fetches(pool: &SqlitePool) -> anyhow::Result<Vec<FetchRow>> {
    let rows = sqlx::query_as::<_, FetchRow>(
        "SELECT raw_name, url, status, error, updated_at FROM fetches
         WHERE status = 'failed' ORDER BY raw_name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Clips that did not produce an output: failed or skipped.
pub async fn unfinished_clips(pool: &SqlitePool) -> anyhow::Result<Vec<ClipRow>> {
    let rows = sqlx::query_as::<_, ClipRow>(
        "SELECT output_path, raw_name, split, status, error, updated_at FROM clips
         WHERE status IN ('failed', 'skipped') ORDER BY split, output_path",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
