use diesel::{
    r2d2::{ConnectionManager, Pool, PoolError},
    PgConnection,
};
use serde::Deserialize;

use super::error::ApiError;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub fn create_conn(database_url: &str, max_size: u32) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().max_size(max_size).build(manager)
}

/// Run database migrations
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> {
            format!("Migration error: {e}").into()
        })?;
    Ok(())
}

/// Checks a connection out of the pool and runs `f` on the blocking thread pool.
pub async fn run_blocking<T, F>(pool: &DbPool, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut PgConnection) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        f(&mut conn)
    })
    .await?
}

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Bounded so that `offset()` cannot overflow.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, i64::MAX / MAX_PAGE_SIZE)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// `round(part / whole * 100)`, rounding half away from zero. An empty whole yields 0.
pub fn percentage(part: i64, whole: i64) -> i32 {
    if whole <= 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as i32
}

/// Changeset value for a nullable column: `clear` wins over a new value, absent means untouched.
pub fn nullable_change<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear {
        Some(None)
    } else {
        value.map(Some)
    }
}

pub fn require_non_empty(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let p = Pagination::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_pagination_clamps() {
        let p = Pagination::new(0, 1000);
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), MAX_PAGE_SIZE);

        let p = Pagination::new(3, 0);
        assert_eq!(p.limit(), 1);
        assert_eq!(p.offset(), 2);
    }

    #[test]
    fn test_pagination_offset() {
        assert_eq!(Pagination::new(3, 25).offset(), 50);
    }

    #[test]
    fn test_pagination_huge_page_does_not_overflow() {
        let p: Pagination = serde_json::from_value(serde_json::json!({
            "page": i64::MAX,
            "limit": 20
        }))
        .unwrap();
        assert!(p.offset() >= 0);
        assert_eq!(p.page(), i64::MAX / MAX_PAGE_SIZE);

        assert!(Pagination::new(i64::MAX, MAX_PAGE_SIZE).offset() > 0);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(3, 3), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn test_nullable_change() {
        assert_eq!(nullable_change(Some(5), false), Some(Some(5)));
        assert_eq!(nullable_change(Some(5), true), Some(None));
        assert_eq!(nullable_change::<i32>(None, true), Some(None));
        assert_eq!(nullable_change::<i32>(None, false), None);
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("title", "Rust 101").is_ok());
        assert!(matches!(
            require_non_empty("title", "   "),
            Err(ApiError::Validation(_))
        ));
    }
}
