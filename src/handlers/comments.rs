use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Actor, Comments};
use crate::domain::comment::Comment;
use crate::errors::AppError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PostCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(c: Comment) -> Self {
        CommentResponse {
            id: c.id,
            order_id: c.order_id,
            author_id: c.author_id,
            content: c.content,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

/// GET /orders/{id}/comments
///
/// Lists the thread oldest first. Viewing moves the caller's read cursor.
#[utoipa::path(
    get,
    path = "/orders/{id}/comments",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Comment thread", body = Vec<CommentResponse>),
        (status = 404, description = "Order not found"),
    ),
    tag = "comments"
)]
pub async fn list_comments(
    service: web::Data<Comments>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let comments = web::block(move || service.thread(order_id, actor.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<CommentResponse> = comments.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /orders/{id}/comments
#[utoipa::path(
    post,
    path = "/orders/{id}/comments",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = PostCommentRequest,
    responses(
        (status = 201, description = "Comment posted", body = CommentResponse),
        (status = 400, description = "Blank content"),
        (status = 404, description = "Order not found"),
    ),
    tag = "comments"
)]
pub async fn post_comment(
    service: web::Data<Comments>,
    actor: Actor,
    path: web::Path<Uuid>,
    body: web::Json<PostCommentRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let content = body.into_inner().content;

    let comment = web::block(move || service.post(order_id, actor.0, &content))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(CommentResponse::from(comment)))
}

/// GET /orders/{id}/comments/unread
#[utoipa::path(
    get,
    path = "/orders/{id}/comments/unread",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Comments by others since the caller last read the thread", body = UnreadCountResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "comments"
)]
pub async fn unread_count(
    service: web::Data<Comments>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let unread_count = web::block(move || service.unread_count(order_id, actor.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(UnreadCountResponse { unread_count }))
}
