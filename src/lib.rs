pub mod api_client;
pub mod api_source;
pub mod batch;
pub mod compare;
pub mod config;
pub mod csv_source;
pub mod error;
pub mod export;
pub mod form;
pub mod http_cache;
pub mod http_client;
pub mod insight;
pub mod logging;
pub mod model;
pub mod report;
pub mod source;
pub mod store;
pub mod team_names;
