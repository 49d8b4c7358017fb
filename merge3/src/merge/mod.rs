pub mod cursor;
pub mod relevance;
pub mod rowmerge;
pub mod driver;
