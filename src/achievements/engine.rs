use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::badges::{summarize, AchievementSummary};
use crate::core::shared::schema::{progress, users};
use crate::core::shared::{run_blocking, ApiError, ApiResult, DbPool};

pub struct AchievementEngine {
    db: DbPool,
}

impl AchievementEngine {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn for_user(&self, user_id: Uuid) -> ApiResult<AchievementSummary> {
        run_blocking(&self.db, move |conn| {
            let exists: i64 = users::table
                .filter(users::id.eq(user_id))
                .count()
                .get_result(conn)?;
            if exists == 0 {
                return Err(ApiError::not_found("User"));
            }

            let completions: Vec<Option<DateTime<Utc>>> = progress::table
                .filter(progress::user_id.eq(user_id))
                .filter(progress::completed.eq(true))
                .order(progress::completed_at.asc())
                .select(progress::completed_at)
                .load(conn)?;

            let completions: Vec<DateTime<Utc>> = completions.into_iter().flatten().collect();
            Ok(summarize(&completions))
        })
        .await
    }
}
