use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde_json::json;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::comment::Comment;
use crate::domain::errors::DomainError;
use crate::domain::ports::CommentRepository;
use crate::schema::{order_comment_reads, order_comments};

use super::models::{CommentReadRow, CommentRow, NewCommentRow};
use super::outbox::{record_order_event, OrderEvent};
use super::queries::{lock_order, order_exists, share_lock_order};

pub struct DieselCommentRepository {
    pool: DbPool,
}

impl DieselCommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            order_id: row.order_id,
            author_id: row.author_id,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// Upserts the viewer's read cursor for the thread.
fn mark_read(conn: &mut PgConnection, order_id: Uuid, user_id: Uuid) -> QueryResult<()> {
    let now = Utc::now();
    diesel::insert_into(order_comment_reads::table)
        .values(&CommentReadRow {
            order_id,
            user_id,
            last_read_at: now,
        })
        .on_conflict((order_comment_reads::order_id, order_comment_reads::user_id))
        .do_update()
        .set(order_comment_reads::last_read_at.eq(now))
        .execute(conn)?;
    Ok(())
}

impl CommentRepository for DieselCommentRepository {
    fn post(
        &self,
        order_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Result<Comment, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // Waits for any reader stamping a cursor, so created_at always
            // lands after cursors set before this comment was visible.
            lock_order(conn, order_id)?;

            let row = diesel::insert_into(order_comments::table)
                .values(&NewCommentRow {
                    id: Uuid::new_v4(),
                    order_id,
                    author_id,
                    content,
                    created_at: Utc::now(),
                })
                .returning(CommentRow::as_returning())
                .get_result(conn)?;

            // posting counts as reading the thread
            mark_read(conn, order_id, author_id)?;

            record_order_event(
                conn,
                order_id,
                OrderEvent::CommentPosted,
                json!({
                    "order_id": order_id,
                    "comment_id": row.id,
                    "author_id": author_id
                }),
            )?;

            Ok(Comment::from(row))
        })
    }

    fn list_and_mark_read(
        &self,
        order_id: Uuid,
        viewer: Uuid,
    ) -> Result<Vec<Comment>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            share_lock_order(conn, order_id)?;

            let comments = order_comments::table
                .filter(order_comments::order_id.eq(order_id))
                .order((order_comments::created_at.asc(), order_comments::id.asc()))
                .select(CommentRow::as_select())
                .load(conn)?
                .into_iter()
                .map(Comment::from)
                .collect();

            mark_read(conn, order_id, viewer)?;
            Ok(comments)
        })
    }

    fn unread_count(&self, order_id: Uuid, viewer: Uuid) -> Result<i64, DomainError> {
        let mut conn = self.pool.get()?;

        order_exists(&mut conn, order_id)?;

        let cursor = order_comment_reads::table
            .find((order_id, viewer))
            .select(order_comment_reads::last_read_at)
            .first::<chrono::DateTime<Utc>>(&mut conn)
            .optional()?;

        let mut query = order_comments::table
            .filter(order_comments::order_id.eq(order_id))
            .filter(order_comments::author_id.ne(viewer))
            .into_boxed();
        if let Some(last_read_at) = cursor {
            query = query.filter(order_comments::created_at.gt(last_read_at));
        }

        Ok(query.count().get_result(&mut conn)?)
    }
}
