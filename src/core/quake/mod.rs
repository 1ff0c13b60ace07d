pub mod fetcher;
pub mod parser;
pub mod query;
pub mod source;
pub mod types;
