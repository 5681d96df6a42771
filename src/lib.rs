//! Order intake server library.
//!
//! Accepts order submissions of `.ab1` sequencing files, stores them under a
//! per-order directory and records the order and its file list in the database.

pub mod api;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod services;
