//! Stand-ins for the pipeline's collaborators.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nf_core::{
    Article, ArticleFilter, ArticleId, ArticleStore, ArticleUpdate, Error, NewArticle, Result,
    TextExtractor, TextGenerator,
};

pub const VALID_REPLY: &str = r#"{"bullets":["First point","Second point"],"sentiment":"positive","keywords":["economy","budget"],"impact":"Medium - Affects public spending"}"#;

/// Replies with queued answers in order, repeating the last one once the queue runs dry.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    fail: bool,
}

impl ScriptedModel {
    pub fn replying(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            ..Default::default()
        })
    }

    pub fn valid() -> Arc<Self> {
        Self::replying(&[VALID_REPLY])
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().ok().and_then(|p| p.last().cloned())
    }
}

#[async_trait]
impl TextGenerator for ScriptedModel {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if self.fail {
            return Err(Error::Inference("connection reset by peer".to_string()));
        }
        let mut replies = self
            .replies
            .lock()
            .map_err(|_| Error::Inference("poisoned".to_string()))?;
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        };
        Ok(reply.unwrap_or_else(|| VALID_REPLY.to_string()))
    }
}

/// Serves fixed page texts; unknown urls have no readable content.
#[derive(Debug, Default)]
pub struct CannedExtractor {
    pages: HashMap<String, String>,
    calls: AtomicUsize,
    fail: bool,
}

impl CannedExtractor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_pages(pages: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            pages: pages
                .iter()
                .map(|(url, text)| (url.to_string(), text.to_string()))
                .collect(),
            ..Default::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextExtractor for CannedExtractor {
    async fn extract(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Extraction(format!("connection refused: {}", url)));
        }
        Ok(self.pages.get(url).cloned().unwrap_or_default())
    }
}

/// Counts writes going through to the wrapped store.
pub struct RecordingStore {
    inner: Arc<dyn ArticleStore>,
    creates: AtomicUsize,
    updates: AtomicUsize,
}

impl RecordingStore {
    pub fn new(inner: Arc<dyn ArticleStore>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            creates: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
        })
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArticleStore for RecordingStore {
    async fn find_by_id(&self, id: ArticleId) -> Result<Option<Article>> {
        self.inner.find_by_id(id).await
    }

    async fn find_one(&self, filter: &ArticleFilter) -> Result<Option<Article>> {
        self.inner.find_one(filter).await
    }

    async fn find_all(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        self.inner.find_all(filter).await
    }

    async fn create(&self, article: NewArticle) -> Result<Article> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create(article).await
    }

    async fn update(&self, id: ArticleId, update: &ArticleUpdate) -> Result<Article> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(id, update).await
    }

    async fn delete(&self, id: ArticleId) -> Result<()> {
        self.inner.delete(id).await
    }
}
