use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::job::{JobRecord, JobState};
use crate::services::store::{JobQuery, StateCounts, StoreError};

fn decode(document: &str) -> Result<JobRecord, StoreError> {
    Ok(serde_json::from_str(document)?)
}

/// Insert a new job document
pub async fn insert_job(pool: &SqlitePool, job: &JobRecord) -> Result<(), StoreError> {
    let document = serde_json::to_string(job)?;

    sqlx::query(
        r#"
        INSERT INTO jobs (job_id, kind, state, repo_guid, created_at, updated_at, document)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(job.job_id.to_string())
    .bind(job.kind.as_str())
    .bind(job.state.as_str())
    .bind(job.repo_guid.as_str())
    .bind(job.created_at.timestamp_micros())
    .bind(job.updated_at.timestamp_micros())
    .bind(document)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a job by ID
pub async fn get_job(pool: &SqlitePool, job_id: Uuid) -> Result<Option<JobRecord>, StoreError> {
    let row = sqlx::query("SELECT document FROM jobs WHERE job_id = ?1")
        .bind(job_id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(r) => {
            let document: String = r.try_get("document")?;
            Ok(Some(decode(&document)?))
        }
        None => Ok(None),
    }
}

/// Overwrite the whole document if the stored state still matches `expected`.
pub async fn replace_job(
    pool: &SqlitePool,
    job: &JobRecord,
    expected: JobState,
) -> Result<bool, StoreError> {
    let document = serde_json::to_string(job)?;

    let result = sqlx::query(
        r#"
        UPDATE jobs
        SET state = ?1,
            updated_at = ?2,
            document = ?3
        WHERE job_id = ?4 AND state = ?5
        "#,
    )
    .bind(job.state.as_str())
    .bind(job.updated_at.timestamp_micros())
    .bind(document)
    .bind(job.job_id.to_string())
    .bind(expected.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// List jobs newest first, optionally filtered by repo and kind
pub async fn list_jobs(pool: &SqlitePool, query: &JobQuery) -> Result<Vec<JobRecord>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT document
        FROM jobs
        WHERE (?1 IS NULL OR repo_guid = ?1)
          AND (?2 IS NULL OR kind = ?2)
        ORDER BY created_at DESC, seq DESC
        LIMIT ?3
        "#,
    )
    .bind(query.repo_guid.as_deref())
    .bind(query.kind.map(|k| k.as_str()))
    .bind(query.limit as i64)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| {
            let document: String = r.try_get("document")?;
            decode(&document)
        })
        .collect()
}

/// Jobs left in `state` since before `before` (for the stale sweep)
pub async fn list_stale_jobs(
    pool: &SqlitePool,
    state: JobState,
    before: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<JobRecord>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT document
        FROM jobs
        WHERE state = ?1 AND updated_at < ?2
        ORDER BY updated_at ASC
        LIMIT ?3
        "#,
    )
    .bind(state.as_str())
    .bind(before.timestamp_micros())
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| {
            let document: String = r.try_get("document")?;
            decode(&document)
        })
        .collect()
}

/// Count jobs per state
pub async fn count_by_state(pool: &SqlitePool) -> Result<StateCounts, StoreError> {
    let rows = sqlx::query("SELECT state, COUNT(*) AS n FROM jobs GROUP BY state")
        .fetch_all(pool)
        .await?;

    let mut counts = StateCounts::default();
    for r in rows {
        let state: String = r.try_get("state")?;
        let n: i64 = r.try_get("n")?;
        match JobState::from_str(&state) {
            Ok(state) => counts.add(state, n as u64),
            Err(_) => tracing::warn!(state = %state, "Ignoring unknown job state in store"),
        }
    }

    Ok(counts)
}
