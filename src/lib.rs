pub mod admin;
pub mod aggregate;
pub mod config;
pub mod content;
pub mod error;
pub mod export;
pub mod logger;
pub mod pages;
pub mod portfolio;
pub mod query_string;
pub mod render;
pub mod repository;
pub mod server;
pub mod slug;
pub mod text_utils;
mod view;
#[cfg(test)]
mod test_data;
