//! Content-based movie recommendations over the TMDB 5000 corpus.
//!
//! The corpus (movie table, similarity matrix, metadata index) is built
//! offline or at startup, loaded once, and served read-only over HTTP.

pub mod api;
pub mod config;
pub mod corpus;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
