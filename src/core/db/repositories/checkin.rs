//! Check-in ledger repository
//!
//! One attendance row per user per calendar day, where a day is
//! midnight-to-midnight on the server's local clock. The service-level
//! already-checked-in probe is re-run before every insert, but the
//! unique constraint on `(user_id, check_in_day)` is what actually
//! closes the concurrent double check-in race.

use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone};
use sqlx::PgPool;

use crate::core::db::models::CheckIn;

/// Check-in repository error types
#[derive(Debug, thiserror::Error)]
pub enum CheckInRepositoryError {
    #[error("Already checked in today")]
    AlreadyCheckedIn,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Inclusive `[start of day, end of day]` bounds around `now` in the
/// server's local timezone. The end bound is the last representable
/// microsecond of the day, so a check-in just before local midnight and
/// one just after land on different days.
pub fn local_day_bounds(now: DateTime<Local>) -> (DateTime<Local>, DateTime<Local>) {
    let start_naive = now.date_naive().and_time(NaiveTime::MIN);
    let end_naive = start_naive + Duration::days(1) - Duration::microseconds(1);

    let start = Local
        .from_local_datetime(&start_naive)
        .earliest()
        .unwrap_or(now);
    let end = Local
        .from_local_datetime(&end_naive)
        .latest()
        .unwrap_or(now);

    (start, end)
}

/// Total page count for a paginated listing: `ceil(total / page_size)`
pub fn total_pages(total_count: i64, page_size: u32) -> i64 {
    if page_size == 0 {
        return 0;
    }
    (total_count + i64::from(page_size) - 1) / i64::from(page_size)
}

/// Check-in ledger repository
#[derive(Clone)]
pub struct CheckInRepository {
    pool: PgPool,
}

impl CheckInRepository {
    /// Create a new check-in repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// True if a check-in exists for the user within the local calendar
    /// day containing `now`, both boundaries inclusive
    pub async fn has_checked_in_today(
        &self,
        user_id: i64,
        now: DateTime<Local>,
    ) -> Result<bool, CheckInRepositoryError> {
        let (start, end) = local_day_bounds(now);

        let existing: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT id
            FROM check_ins
            WHERE user_id = $1
              AND check_in_date BETWEEN $2 AND $3
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await?;

        Ok(existing.is_some())
    }

    /// Record today's check-in stamped with `now`.
    ///
    /// Re-checks `has_checked_in_today` first; a concurrent insert that
    /// wins the race surfaces as a unique violation and maps to
    /// `AlreadyCheckedIn` as well.
    pub async fn record_check_in(
        &self,
        user_id: i64,
        now: DateTime<Local>,
    ) -> Result<CheckIn, CheckInRepositoryError> {
        if self.has_checked_in_today(user_id, now).await? {
            return Err(CheckInRepositoryError::AlreadyCheckedIn);
        }

        let result = sqlx::query_as::<_, CheckIn>(
            r#"
            INSERT INTO check_ins (user_id, check_in_date, check_in_day)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, check_in_date
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(now.date_naive())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(check_in) => Ok(check_in),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(CheckInRepositoryError::AlreadyCheckedIn)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check-ins for a user ordered newest first, paginated by
    /// 1-indexed page number, plus the total matching count
    pub async fn list_check_ins(
        &self,
        user_id: i64,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<CheckIn>, i64), CheckInRepositoryError> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);

        let items = sqlx::query_as::<_, CheckIn>(
            r#"
            SELECT id, user_id, check_in_date
            FROM check_ins
            WHERE user_id = $1
            ORDER BY check_in_date DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM check_ins
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((items, total.0))
    }
}
