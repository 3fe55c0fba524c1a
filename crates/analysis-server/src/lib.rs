//! HTTP surface of the memory analysis service

pub mod api;
pub mod config;
