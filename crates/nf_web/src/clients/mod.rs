pub mod google;
pub mod news;

pub use google::{GoogleProfile, GoogleTokenVerifier, IdentityVerifier};
pub use news::{NewsApiClient, NewsItem, NewsSearch, NewsSource};
