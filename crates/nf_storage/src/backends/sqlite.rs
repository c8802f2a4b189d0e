use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use nf_core::{
    Article, ArticleFilter, ArticleId, ArticleStore, ArticleUpdate, Error, NewArticle, NewUser,
    Note, NoteId, NoteStore, Result, User, UserId, UserStore,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::debug;

use crate::{StorageBackend, StorageConfig};

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        name TEXT,
        picture TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        source_id TEXT,
        url TEXT NOT NULL,
        title TEXT,
        image_url TEXT,
        published_at TEXT,
        summary TEXT,
        sentiment TEXT,
        keywords TEXT,
        tags TEXT,
        impact TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS articles_user_url ON articles (user_id, url)",
    r#"
    CREATE TABLE IF NOT EXISTS notes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        article_id INTEGER NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS notes_article ON notes (article_id)",
];

fn storage_error(context: &'static str) -> impl Fn(sqlx::Error) -> Error {
    move |e| Error::Storage(format!("{}: {}", context, e))
}

fn article_from_row(row: &SqliteRow) -> sqlx::Result<Article> {
    Ok(Article {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        source_id: row.try_get("source_id")?,
        url: row.try_get("url")?,
        title: row.try_get("title")?,
        image_url: row.try_get("image_url")?,
        published_at: row.try_get("published_at")?,
        summary: row.try_get("summary")?,
        sentiment: row.try_get("sentiment")?,
        keywords: row.try_get("keywords")?,
        tags: row.try_get("tags")?,
        impact: row.try_get("impact")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn note_from_row(row: &SqliteRow) -> sqlx::Result<Note> {
    Ok(Note {
        id: row.try_get("id")?,
        article_id: row.try_get("article_id")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn user_from_row(row: &SqliteRow) -> sqlx::Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        picture: row.try_get("picture")?,
        created_at: row.try_get("created_at")?,
    })
}

fn filtered_articles(filter: &ArticleFilter) -> QueryBuilder<'static, Sqlite> {
    let mut query = QueryBuilder::new("SELECT * FROM articles WHERE 1 = 1");
    if let Some(id) = filter.id {
        query.push(" AND id = ").push_bind(id);
    }
    if let Some(user_id) = filter.user_id {
        query.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(url) = &filter.url {
        query.push(" AND url = ").push_bind(url.clone());
    }
    query
}

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be writable at the configured path"
    }

    async fn new(config: &StorageConfig) -> Result<Self> {
        Self::new_with_path(&config.path).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Storage(format!("Failed to create database directory: {}", e))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(storage_error("Failed to connect to database"))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("Failed to run migration {}: {}", i, e)))?;
        }
        debug!(path = %db_path.display(), "SQLite storage ready");

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }
}

#[async_trait]
impl ArticleStore for SQLiteStorage {
    async fn find_by_id(&self, id: ArticleId) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(storage_error("Failed to load article"))?;
        row.as_ref()
            .map(article_from_row)
            .transpose()
            .map_err(storage_error("Failed to decode article"))
    }

    async fn find_one(&self, filter: &ArticleFilter) -> Result<Option<Article>> {
        let mut query = filtered_articles(filter);
        query.push(" ORDER BY id ASC LIMIT 1");
        let row = query
            .build()
            .fetch_optional(&*self.pool)
            .await
            .map_err(storage_error("Failed to find article"))?;
        row.as_ref()
            .map(article_from_row)
            .transpose()
            .map_err(storage_error("Failed to decode article"))
    }

    async fn find_all(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let mut query = filtered_articles(filter);
        query.push(" ORDER BY created_at DESC, id DESC");
        let rows = query
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(storage_error("Failed to list articles"))?;
        rows.iter()
            .map(article_from_row)
            .collect::<sqlx::Result<Vec<_>>>()
            .map_err(storage_error("Failed to decode article"))
    }

    async fn create(&self, article: NewArticle) -> Result<Article> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO articles
            (user_id, source_id, url, title, image_url, published_at, summary, sentiment,
             keywords, tags, impact, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(article.user_id)
        .bind(&article.source_id)
        .bind(&article.url)
        .bind(&article.title)
        .bind(&article.image_url)
        .bind(article.published_at)
        .bind(&article.summary)
        .bind(&article.sentiment)
        .bind(&article.keywords)
        .bind(&article.tags)
        .bind(&article.impact)
        .bind(now)
        .bind(now)
        .execute(&*self.pool)
        .await
        .map_err(storage_error("Failed to store article"))?;

        Ok(Article::from_new(result.last_insert_rowid(), article, now))
    }

    async fn update(&self, id: ArticleId, update: &ArticleUpdate) -> Result<Article> {
        let result = sqlx::query(
            r#"
            UPDATE articles SET
                summary = COALESCE(?, summary),
                sentiment = COALESCE(?, sentiment),
                keywords = COALESCE(?, keywords),
                impact = COALESCE(?, impact),
                image_url = COALESCE(?, image_url),
                tags = COALESCE(?, tags),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.summary)
        .bind(&update.sentiment)
        .bind(&update.keywords)
        .bind(&update.impact)
        .bind(&update.image_url)
        .bind(&update.tags)
        .bind(Utc::now())
        .bind(id)
        .execute(&*self.pool)
        .await
        .map_err(storage_error("Failed to update article"))?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found("Article not found"));
        }
        self.find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found("Article not found"))
    }

    async fn delete(&self, id: ArticleId) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(storage_error("Failed to start transaction"))?;
        sqlx::query("DELETE FROM notes WHERE article_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error("Failed to delete notes"))?;
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage_error("Failed to delete article"))?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found("Article not found"));
        }
        tx.commit()
            .await
            .map_err(storage_error("Failed to commit delete"))
    }
}

#[async_trait]
impl NoteStore for SQLiteStorage {
    async fn list_by_article(&self, article_id: ArticleId) -> Result<Vec<Note>> {
        let rows = sqlx::query("SELECT * FROM notes WHERE article_id = ? ORDER BY created_at ASC, id ASC")
            .bind(article_id)
            .fetch_all(&*self.pool)
            .await
            .map_err(storage_error("Failed to list notes"))?;
        rows.iter()
            .map(note_from_row)
            .collect::<sqlx::Result<Vec<_>>>()
            .map_err(storage_error("Failed to decode note"))
    }

    async fn find_note(&self, id: NoteId) -> Result<Option<Note>> {
        let row = sqlx::query("SELECT * FROM notes WHERE id = ?")
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(storage_error("Failed to load note"))?;
        row.as_ref()
            .map(note_from_row)
            .transpose()
            .map_err(storage_error("Failed to decode note"))
    }

    async fn create_note(&self, article_id: ArticleId, content: &str) -> Result<Note> {
        if self.find_by_id(article_id).await?.is_none() {
            return Err(Error::not_found("Article not found"));
        }
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO notes (article_id, content, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(article_id)
        .bind(content)
        .bind(now)
        .bind(now)
        .execute(&*self.pool)
        .await
        .map_err(storage_error("Failed to store note"))?;

        Ok(Note {
            id: result.last_insert_rowid(),
            article_id,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_note(&self, id: NoteId, content: &str) -> Result<Note> {
        let result = sqlx::query("UPDATE notes SET content = ?, updated_at = ? WHERE id = ?")
            .bind(content)
            .bind(Utc::now())
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(storage_error("Failed to update note"))?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found("Note not found"));
        }
        self.find_note(id)
            .await?
            .ok_or_else(|| Error::not_found("Note not found"))
    }

    async fn delete_note(&self, id: NoteId) -> Result<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(storage_error("Failed to delete note"))?;
        if result.rows_affected() == 0 {
            return Err(Error::not_found("Note not found"));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for SQLiteStorage {
    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(storage_error("Failed to load user"))?;
        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(storage_error("Failed to decode user"))
    }

    async fn find_or_create_user(&self, user: NewUser) -> Result<User> {
        sqlx::query(
            "INSERT OR IGNORE INTO users (email, name, picture, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.picture)
        .bind(Utc::now())
        .execute(&*self.pool)
        .await
        .map_err(storage_error("Failed to store user"))?;

        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(&user.email)
            .fetch_one(&*self.pool)
            .await
            .map_err(storage_error("Failed to load user"))?;
        user_from_row(&row).map_err(storage_error("Failed to decode user"))
    }
}
