use async_trait::async_trait;

use crate::types::{
    Article, ArticleFilter, ArticleId, ArticleUpdate, NewArticle, NewUser, Note, NoteId, User,
    UserId,
};
use crate::Result;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn find_by_id(&self, id: ArticleId) -> Result<Option<Article>>;

    /// First article matching the filter, lowest id first
    async fn find_one(&self, filter: &ArticleFilter) -> Result<Option<Article>>;

    /// Every matching article, newest first
    async fn find_all(&self, filter: &ArticleFilter) -> Result<Vec<Article>>;

    async fn create(&self, article: NewArticle) -> Result<Article>;

    /// Applies the update and returns the stored row. Fails with `NotFound` for unknown ids.
    async fn update(&self, id: ArticleId, update: &ArticleUpdate) -> Result<Article>;

    /// Removes the article together with its notes.
    async fn delete(&self, id: ArticleId) -> Result<()>;
}

#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Notes of an article, oldest first
    async fn list_by_article(&self, article_id: ArticleId) -> Result<Vec<Note>>;

    async fn find_note(&self, id: NoteId) -> Result<Option<Note>>;

    async fn create_note(&self, article_id: ArticleId, content: &str) -> Result<Note>;

    async fn update_note(&self, id: NoteId, content: &str) -> Result<Note>;

    async fn delete_note(&self, id: NoteId) -> Result<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: UserId) -> Result<Option<User>>;

    /// Looks the user up by email, inserting it on first sight.
    async fn find_or_create_user(&self, user: NewUser) -> Result<User>;
}
