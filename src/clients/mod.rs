pub mod http;
pub mod mikan;

pub use http::{Fetch, FetchError, HttpClient, fetch_with_retry};
pub use mikan::{DetailInfo, MikanScraper, ReleaseDate};
