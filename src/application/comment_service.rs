use uuid::Uuid;

use crate::domain::comment::{normalize_content, Comment};
use crate::domain::errors::DomainError;
use crate::domain::ports::CommentRepository;

pub struct CommentService<R> {
    repo: R,
}

impl<R: CommentRepository> CommentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn post(&self, order_id: Uuid, author: Uuid, content: &str) -> Result<Comment, DomainError> {
        let content = normalize_content(content).ok_or_else(|| {
            DomainError::InvalidInput("comment content must not be empty".to_string())
        })?;
        self.repo.post(order_id, author, content)
    }

    /// Returns the thread and marks it read for `viewer`.
    pub fn thread(&self, order_id: Uuid, viewer: Uuid) -> Result<Vec<Comment>, DomainError> {
        self.repo.list_and_mark_read(order_id, viewer)
    }

    pub fn unread_count(&self, order_id: Uuid, viewer: Uuid) -> Result<i64, DomainError> {
        self.repo.unread_count(order_id, viewer)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;

    #[derive(Default)]
    struct RecordingComments {
        posted: Mutex<Vec<String>>,
    }

    impl CommentRepository for RecordingComments {
        fn post(
            &self,
            order_id: Uuid,
            author_id: Uuid,
            content: String,
        ) -> Result<Comment, DomainError> {
            self.posted.lock().unwrap().push(content.clone());
            Ok(Comment {
                id: Uuid::new_v4(),
                order_id,
                author_id,
                content,
                created_at: Utc::now(),
            })
        }

        fn list_and_mark_read(
            &self,
            _order_id: Uuid,
            _viewer: Uuid,
        ) -> Result<Vec<Comment>, DomainError> {
            Ok(vec![])
        }

        fn unread_count(&self, _order_id: Uuid, _viewer: Uuid) -> Result<i64, DomainError> {
            Ok(0)
        }
    }

    #[test]
    fn posts_trimmed_content() {
        let svc = CommentService::new(RecordingComments::default());
        let comment = svc
            .post(Uuid::new_v4(), Uuid::new_v4(), "  chargement prévu lundi \n")
            .unwrap();
        assert_eq!(comment.content, "chargement prévu lundi");
    }

    #[test]
    fn blank_comment_never_reaches_the_store() {
        let svc = CommentService::new(RecordingComments::default());
        let err = svc.post(Uuid::new_v4(), Uuid::new_v4(), " \t ").unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
        assert!(svc.repo.posted.lock().unwrap().is_empty());
    }
}
