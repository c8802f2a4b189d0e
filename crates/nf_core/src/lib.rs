pub mod error;
pub mod extraction;
pub mod models;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use extraction::TextExtractor;
pub use models::TextGenerator;
pub use storage::{ArticleStore, NoteStore, UserStore};
pub use types::*;

pub mod prelude {
    pub use crate::{ArticleStore, NoteStore, TextExtractor, TextGenerator, UserStore};
    pub use crate::{Error, Result};
    pub use crate::types::*;
}
