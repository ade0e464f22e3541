pub mod cache;
pub mod client;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod labels;
pub mod links;
pub mod normalize;
#[cfg(feature = "render")]
mod render;
pub mod search;

pub use cache::SearchCache;
pub use client::SiteClient;
pub use enrich::{assemble, carfax_lookup, CarfaxReport};
pub use error::ScrapeError;
pub use links::extract_detail_links;
pub use search::search;
