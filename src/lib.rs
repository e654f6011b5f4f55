pub mod api;
pub mod config;
pub mod data_models;
pub mod es_client;
pub mod error;
pub mod indexer;
pub mod markdown;
pub mod project;
pub mod query_engine;
pub mod render;
pub mod widget;
