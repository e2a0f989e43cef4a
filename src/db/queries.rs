use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::db::store::{JobStore, StoreError};
use crate::models::job::{ItemCounts, ItemStatus, Job, JobItem, JobStatus, NewJob};

const JOB_COLUMNS: &str = r#"
    id, job_type, status, enterprise_id, created_by_user_id, payload,
    total_items, processed_items, failed_items, error_message,
    created_at, started_at, finished_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, job_id, seller_id, profile_id, offer_id, status, attempts,
    last_error, result_snapshot, created_at, started_at, finished_at
"#;

/// PostgreSQL-backed job store.
#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn job_from_row(row: &PgRow) -> Result<Job, StoreError> {
    let status: String = row.try_get("status")?;
    Ok(Job {
        id: row.try_get("id")?,
        job_type: row.try_get("job_type")?,
        status: status
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("unknown job status '{status}'")))?,
        enterprise_id: row.try_get("enterprise_id")?,
        created_by_user_id: row.try_get("created_by_user_id")?,
        payload: row.try_get("payload")?,
        total_items: row.try_get("total_items")?,
        processed_items: row.try_get("processed_items")?,
        failed_items: row.try_get("failed_items")?,
        error_message: row.try_get("error_message")?,
        created_at: row.try_get("created_at")?,
        started_at: row.try_get("started_at")?,
        finished_at: row.try_get("finished_at")?,
    })
}

fn item_from_row(row: &PgRow) -> Result<JobItem, StoreError> {
    let status: String = row.try_get("status")?;
    Ok(JobItem {
        id: row.try_get("id")?,
        job_id: row.try_get("job_id")?,
        seller_id: row.try_get("seller_id")?,
        profile_id: row.try_get("profile_id")?,
        offer_id: row.try_get("offer_id")?,
        status: status
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("unknown item status '{status}'")))?,
        attempts: row.try_get("attempts")?,
        last_error: row.try_get("last_error")?,
        result_snapshot: row.try_get("result_snapshot")?,
        created_at: row.try_get("created_at")?,
        started_at: row.try_get("started_at")?,
        finished_at: row.try_get("finished_at")?,
    })
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create_job(&self, job: NewJob) -> Result<Job, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO content_jobs (id, job_type, status, enterprise_id, created_by_user_id, payload, total_items)
            VALUES ($1, $2, 'pending', $3, $4, $5, $6)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&job.job_type)
        .bind(&job.enterprise_id)
        .bind(&job.created_by_user_id)
        .bind(&job.payload)
        .bind(job.items.len() as i32)
        .fetch_one(&mut *tx)
        .await?;
        let created = job_from_row(&row)?;

        let mut offer_ids = Vec::with_capacity(job.items.len());
        let mut seller_ids = Vec::with_capacity(job.items.len());
        let mut profile_ids = Vec::with_capacity(job.items.len());
        for item in job.items {
            offer_ids.push(item.offer_id);
            seller_ids.push(item.seller_id);
            profile_ids.push(item.profile_id);
        }

        // Row order of UNNEST drives `seq`, which breaks created_at ties.
        sqlx::query(
            r#"
            INSERT INTO job_items (id, job_id, offer_id, seller_id, profile_id, status)
            SELECT gen_random_uuid(), $1, t.offer_id, t.seller_id, t.profile_id, 'pending'
            FROM UNNEST($2::text[], $3::text[], $4::text[]) AS t(offer_id, seller_id, profile_id)
            "#,
        )
        .bind(created.id)
        .bind(&offer_ids)
        .bind(&seller_ids)
        .bind(&profile_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM content_jobs WHERE id = $1"
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(job_from_row).transpose()
    }

    async fn list_jobs(&self, limit: i64) -> Result<Vec<Job>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM content_jobs ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(job_from_row).collect()
    }

    async fn list_items(
        &self,
        job_id: Uuid,
        status: Option<ItemStatus>,
    ) -> Result<Vec<JobItem>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ITEM_COLUMNS} FROM job_items
            WHERE job_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at ASC, seq ASC
            "#
        ))
        .bind(job_id)
        .bind(status.map(|s| s.as_ref().to_string()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(item_from_row).collect()
    }

    async fn pending_items(&self, limit: i64) -> Result<Vec<JobItem>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ITEM_COLUMNS} FROM job_items
            WHERE status = 'pending'
            ORDER BY created_at ASC, seq ASC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(item_from_row).collect()
    }

    async fn claim_item(&self, item_id: Uuid) -> Result<Option<JobItem>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE job_items
            SET status = 'in_progress',
                attempts = attempts + 1,
                started_at = NOW(),
                finished_at = NULL
            WHERE id = $1 AND status = 'pending'
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn finish_item(
        &self,
        item_id: Uuid,
        status: ItemStatus,
        snapshot: Option<serde_json::Value>,
        error: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE job_items
            SET status = $2,
                result_snapshot = $3,
                last_error = $4,
                finished_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(item_id)
        .bind(status.as_ref())
        .bind(snapshot)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn release_item(&self, item_id: Uuid, error: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE job_items
            SET status = 'pending',
                last_error = $2,
                started_at = NULL
            WHERE id = $1
            "#,
        )
        .bind(item_id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_items(&self, job_id: Uuid) -> Result<ItemCounts, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'done') AS done,
                   COUNT(*) FILTER (WHERE status = 'failed') AS failed,
                   COUNT(*) FILTER (WHERE status = 'skipped') AS skipped
            FROM job_items
            WHERE job_id = $1
            "#,
        )
        .bind(job_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ItemCounts {
            total: row.try_get::<i64, _>("total")? as i32,
            done: row.try_get::<i64, _>("done")? as i32,
            failed: row.try_get::<i64, _>("failed")? as i32,
            skipped: row.try_get::<i64, _>("skipped")? as i32,
        })
    }

    async fn update_job_progress(
        &self,
        job_id: Uuid,
        counts: ItemCounts,
        status: JobStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE content_jobs
            SET total_items = $2,
                processed_items = $3,
                failed_items = $4,
                status = $5::text,
                started_at = COALESCE(started_at, NOW()),
                finished_at = CASE WHEN $5::text = 'completed' THEN COALESCE(finished_at, NOW()) ELSE NULL END
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .bind(counts.total)
        .bind(counts.done)
        .bind(counts.failed)
        .bind(status.as_ref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::JobNotFound(job_id));
        }
        Ok(())
    }

    async fn reclaim_stale_items(
        &self,
        cutoff: DateTime<Utc>,
        reason: &str,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE job_items
            SET status = 'pending',
                last_error = $2,
                started_at = NULL
            WHERE status = 'in_progress' AND started_at < $1
            "#,
        )
        .bind(cutoff)
        .bind(reason)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
