pub mod aggregation;
pub mod config;
pub mod content;
pub mod content_cache;
pub mod integrations;
pub mod logger;
pub mod paginator;
pub mod post_processor;
pub mod query;
pub mod query_string;
pub mod render;
pub mod server;
pub mod text_utils;
pub mod util;
pub mod view;
#[cfg(test)]
mod test_data;
