//! # Nested Comments Backend
//!
//! Threaded comments for a blog-post viewer.
//!
//! This crate provides the REST backend that persists posts, comments, likes and
//! users, plus the client-side pieces that talk to it: a transport client, an
//! async state helper, the post state container that rebuilds the comment tree
//! and plain-text views.
//!
//! ## Architecture
//!
//! - [`api`]: Wire types (DTOs) shared by the server and the client
//! - [`models`]: Persistence records and identifier newtypes
//! - [`db`]: Repository pattern, backends and the service layer
//! - [`http`]: Axum-based HTTP server and request handlers
//! - [`client`]: reqwest transport client with error normalization
//! - [`state`]: Async state tracking and the post state container
//! - [`view`]: Text rendering of posts, comment trees and comment forms

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod db;
pub mod models;

#[cfg(feature = "http-server")]
pub mod http;

#[cfg(feature = "http-client")]
pub mod client;

#[cfg(feature = "http-client")]
pub mod state;

#[cfg(feature = "http-client")]
pub mod view;
