use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use nf_core::{
    Article, ArticleFilter, ArticleId, ArticleStore, ArticleUpdate, Error, NewArticle, NewUser,
    Note, NoteId, NoteStore, Result, User, UserId, UserStore,
};
use tokio::sync::RwLock;

use crate::{StorageBackend, StorageConfig};

#[derive(Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
    notes: Vec<Note>,
    users: Vec<User>,
    last_article_id: ArticleId,
    last_note_id: NoteId,
    last_user_id: UserId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn article_mut(&mut self, id: ArticleId) -> Result<&mut Article> {
        self.articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::not_found("Article not found"))
    }

    fn note_mut(&mut self, id: NoteId) -> Result<&mut Note> {
        self.notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| Error::not_found("Note not found"))
    }
}

/// Process-local storage; everything is lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn new(_config: &StorageConfig) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStore for MemoryStorage {
    async fn find_by_id(&self, id: ArticleId) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.articles.iter().find(|a| a.id == id).cloned())
    }

    async fn find_one(&self, filter: &ArticleFilter) -> Result<Option<Article>> {
        let store = self.store.read().await;
        Ok(store.articles.iter().find(|a| filter.matches(a)).cloned())
    }

    async fn find_all(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        let mut articles: Vec<Article> = store
            .articles
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        articles.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(articles)
    }

    async fn create(&self, article: NewArticle) -> Result<Article> {
        let mut store = self.store.write().await;
        store.last_article_id += 1;
        let article = Article::from_new(store.last_article_id, article, Utc::now());
        store.articles.push(article.clone());
        Ok(article)
    }

    async fn update(&self, id: ArticleId, update: &ArticleUpdate) -> Result<Article> {
        let mut store = self.store.write().await;
        let article = store.article_mut(id)?;
        article.apply(update, Utc::now());
        Ok(article.clone())
    }

    async fn delete(&self, id: ArticleId) -> Result<()> {
        let mut store = self.store.write().await;
        let before = store.articles.len();
        store.articles.retain(|a| a.id != id);
        if store.articles.len() == before {
            return Err(Error::not_found("Article not found"));
        }
        store.notes.retain(|n| n.article_id != id);
        Ok(())
    }
}

#[async_trait]
impl NoteStore for MemoryStorage {
    async fn list_by_article(&self, article_id: ArticleId) -> Result<Vec<Note>> {
        let store = self.store.read().await;
        let mut notes: Vec<Note> = store
            .notes
            .iter()
            .filter(|n| n.article_id == article_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(notes)
    }

    async fn find_note(&self, id: NoteId) -> Result<Option<Note>> {
        let store = self.store.read().await;
        Ok(store.notes.iter().find(|n| n.id == id).cloned())
    }

    async fn create_note(&self, article_id: ArticleId, content: &str) -> Result<Note> {
        let mut store = self.store.write().await;
        if !store.articles.iter().any(|a| a.id == article_id) {
            return Err(Error::not_found("Article not found"));
        }
        store.last_note_id += 1;
        let now = Utc::now();
        let note = Note {
            id: store.last_note_id,
            article_id,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        store.notes.push(note.clone());
        Ok(note)
    }

    async fn update_note(&self, id: NoteId, content: &str) -> Result<Note> {
        let mut store = self.store.write().await;
        let note = store.note_mut(id)?;
        note.content = content.to_string();
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    async fn delete_note(&self, id: NoteId) -> Result<()> {
        let mut store = self.store.write().await;
        let before = store.notes.len();
        store.notes.retain(|n| n.id != id);
        if store.notes.len() == before {
            return Err(Error::not_found("Note not found"));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStorage {
    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_or_create_user(&self, user: NewUser) -> Result<User> {
        let mut store = self.store.write().await;
        if let Some(existing) = store.users.iter().find(|u| u.email == user.email) {
            return Ok(existing.clone());
        }
        store.last_user_id += 1;
        let user = User {
            id: store.last_user_id,
            email: user.email,
            name: user.name,
            picture: user.picture,
            created_at: Utc::now(),
        };
        store.users.push(user.clone());
        Ok(user)
    }
}
