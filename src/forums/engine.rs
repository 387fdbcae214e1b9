use chrono::Utc;
use diesel::prelude::*;
use log::info;
use std::collections::HashMap;
use uuid::Uuid;

use super::types::*;
use crate::core::shared::schema::{forum_posts, forum_threads, users};
use crate::core::shared::utils::require_non_empty;
use crate::core::shared::{run_blocking, ApiError, ApiResult, DbPool, Pagination};
use crate::courses::access::{
    course_id_for_post, course_id_for_thread, course_owner, require_access, require_owner,
};
use crate::security::AuthenticatedUser;

/// Authors may remove their own threads and posts; course owners and admins may remove any.
pub fn can_remove(user: &AuthenticatedUser, author_id: Uuid, course_owner_id: Uuid) -> bool {
    (user.is_authenticated() && user.user_id == author_id) || user.can_manage(course_owner_id)
}

fn load_thread(conn: &mut PgConnection, thread_id: Uuid) -> ApiResult<ForumThread> {
    forum_threads::table
        .find(thread_id)
        .select(ForumThread::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Thread"))
}

fn load_post(conn: &mut PgConnection, post_id: Uuid) -> ApiResult<ForumPost> {
    forum_posts::table
        .find(post_id)
        .select(ForumPost::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::not_found("Post"))
}

fn author_name(conn: &mut PgConnection, author_id: Uuid) -> QueryResult<String> {
    users::table
        .find(author_id)
        .select(users::name)
        .first(conn)
}

pub struct ForumEngine {
    db: DbPool,
}

impl ForumEngine {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Pinned threads first, then newest.
    pub async fn list_threads(
        &self,
        user: AuthenticatedUser,
        course_id: Uuid,
        pagination: Pagination,
    ) -> ApiResult<ThreadPage> {
        run_blocking(&self.db, move |conn| {
            require_access(conn, &user, course_id)?;

            let total: i64 = forum_threads::table
                .filter(forum_threads::course_id.eq(course_id))
                .count()
                .get_result(conn)?;

            let rows: Vec<(ForumThread, String)> = forum_threads::table
                .inner_join(users::table.on(users::id.eq(forum_threads::author_id)))
                .filter(forum_threads::course_id.eq(course_id))
                .order((forum_threads::is_pinned.desc(), forum_threads::created_at.desc()))
                .limit(pagination.limit())
                .offset(pagination.offset())
                .select((ForumThread::as_select(), users::name))
                .load(conn)?;

            let thread_ids: Vec<Uuid> = rows.iter().map(|(t, _)| t.id).collect();
            let counts: HashMap<Uuid, i64> = forum_posts::table
                .filter(forum_posts::thread_id.eq_any(&thread_ids))
                .group_by(forum_posts::thread_id)
                .select((forum_posts::thread_id, diesel::dsl::count(forum_posts::id)))
                .load::<(Uuid, i64)>(conn)?
                .into_iter()
                .collect();

            let threads = rows
                .into_iter()
                .map(|(thread, author_name)| ThreadSummary {
                    post_count: counts.get(&thread.id).copied().unwrap_or(0),
                    thread,
                    author_name,
                })
                .collect();

            Ok(ThreadPage {
                threads,
                total,
                page: pagination.page(),
                limit: pagination.limit(),
            })
        })
        .await
    }

    pub async fn create_thread(
        &self,
        user: AuthenticatedUser,
        course_id: Uuid,
        req: CreateThreadRequest,
    ) -> ApiResult<ForumThread> {
        require_non_empty("title", &req.title)?;
        require_non_empty("body", &req.body)?;

        let thread = run_blocking(&self.db, move |conn| {
            require_access(conn, &user, course_id)?;

            let now = Utc::now();
            let thread = ForumThread {
                id: Uuid::new_v4(),
                course_id,
                author_id: user.user_id,
                title: req.title.trim().to_string(),
                body: req.body,
                is_pinned: false,
                created_at: now,
                updated_at: now,
            };
            diesel::insert_into(forum_threads::table)
                .values(&thread)
                .execute(conn)?;
            Ok(thread)
        })
        .await?;

        info!("Thread {} opened in course {}", thread.id, course_id);
        Ok(thread)
    }

    /// Thread with every post, oldest first.
    pub async fn get_thread(&self, user: AuthenticatedUser, thread_id: Uuid) -> ApiResult<ThreadDetail> {
        run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_thread(conn, thread_id)?;
            require_access(conn, &user, course_id)?;

            let thread = load_thread(conn, thread_id)?;
            let author_name = author_name(conn, thread.author_id)?;

            let posts = forum_posts::table
                .inner_join(users::table.on(users::id.eq(forum_posts::author_id)))
                .filter(forum_posts::thread_id.eq(thread_id))
                .order(forum_posts::created_at.asc())
                .select((ForumPost::as_select(), users::name))
                .load::<(ForumPost, String)>(conn)?
                .into_iter()
                .map(|(post, author_name)| PostView { post, author_name })
                .collect();

            Ok(ThreadDetail {
                thread,
                author_name,
                posts,
            })
        })
        .await
    }

    pub async fn delete_thread(&self, user: AuthenticatedUser, thread_id: Uuid) -> ApiResult<()> {
        run_blocking(&self.db, move |conn| {
            let thread = load_thread(conn, thread_id)?;
            let owner_id = course_owner(conn, thread.course_id)?;
            if !can_remove(&user, thread.author_id, owner_id) {
                return Err(ApiError::forbidden(
                    "Only the author, the course instructor or an admin can delete this thread",
                ));
            }
            diesel::delete(forum_threads::table.find(thread_id)).execute(conn)?;
            Ok(())
        })
        .await?;

        info!("Thread {thread_id} deleted");
        Ok(())
    }

    pub async fn set_pinned(
        &self,
        user: AuthenticatedUser,
        thread_id: Uuid,
        pinned: bool,
    ) -> ApiResult<ForumThread> {
        run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_thread(conn, thread_id)?;
            require_owner(conn, &user, course_id)?;

            Ok(diesel::update(forum_threads::table.find(thread_id))
                .set((
                    forum_threads::is_pinned.eq(pinned),
                    forum_threads::updated_at.eq(Utc::now()),
                ))
                .returning(ForumThread::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn create_post(
        &self,
        user: AuthenticatedUser,
        thread_id: Uuid,
        req: CreatePostRequest,
    ) -> ApiResult<PostView> {
        require_non_empty("body", &req.body)?;

        run_blocking(&self.db, move |conn| {
            let course_id = course_id_for_thread(conn, thread_id)?;
            require_access(conn, &user, course_id)?;

            let now = Utc::now();
            let post = ForumPost {
                id: Uuid::new_v4(),
                thread_id,
                author_id: user.user_id,
                body: req.body,
                created_at: now,
                updated_at: now,
            };
            diesel::insert_into(forum_posts::table)
                .values(&post)
                .execute(conn)?;

            let author_name = author_name(conn, post.author_id)?;
            Ok(PostView { post, author_name })
        })
        .await
    }

    pub async fn update_post(
        &self,
        user: AuthenticatedUser,
        post_id: Uuid,
        req: UpdatePostRequest,
    ) -> ApiResult<ForumPost> {
        require_non_empty("body", &req.body)?;

        run_blocking(&self.db, move |conn| {
            let post = load_post(conn, post_id)?;
            if post.author_id != user.user_id {
                return Err(ApiError::forbidden("Only the author can edit this post"));
            }

            Ok(diesel::update(forum_posts::table.find(post_id))
                .set((
                    forum_posts::body.eq(req.body),
                    forum_posts::updated_at.eq(Utc::now()),
                ))
                .returning(ForumPost::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn delete_post(&self, user: AuthenticatedUser, post_id: Uuid) -> ApiResult<()> {
        run_blocking(&self.db, move |conn| {
            let post = load_post(conn, post_id)?;
            let course_id = course_id_for_post(conn, post_id)?;
            let owner_id = course_owner(conn, course_id)?;
            if !can_remove(&user, post.author_id, owner_id) {
                return Err(ApiError::forbidden(
                    "Only the author, the course instructor or an admin can delete this post",
                ));
            }
            diesel::delete(forum_posts::table.find(post_id)).execute(conn)?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::Role;

    #[test]
    fn test_author_can_remove_own_content() {
        let author = Uuid::new_v4();
        let user = AuthenticatedUser::new(author, Role::Student);
        assert!(can_remove(&user, author, Uuid::new_v4()));
    }

    #[test]
    fn test_course_owner_and_admin_can_remove() {
        let owner = Uuid::new_v4();
        let instructor = AuthenticatedUser::new(owner, Role::Instructor);
        let admin = AuthenticatedUser::new(Uuid::new_v4(), Role::Admin);
        assert!(can_remove(&instructor, Uuid::new_v4(), owner));
        assert!(can_remove(&admin, Uuid::new_v4(), owner));
    }

    #[test]
    fn test_other_users_cannot_remove() {
        let student = AuthenticatedUser::new(Uuid::new_v4(), Role::Student);
        assert!(!can_remove(&student, Uuid::new_v4(), Uuid::new_v4()));
        let other_instructor = AuthenticatedUser::new(Uuid::new_v4(), Role::Instructor);
        assert!(!can_remove(&other_instructor, Uuid::new_v4(), Uuid::new_v4()));
    }

    #[test]
    fn test_anonymous_never_removes() {
        assert!(!can_remove(&AuthenticatedUser::anonymous(), Uuid::nil(), Uuid::new_v4()));
    }
}
