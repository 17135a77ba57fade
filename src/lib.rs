//! Folio Server Library
//!
//! Self-hosted DOCX to EPUB conversion service with an offline-first asset
//! cache. The binary in `main.rs` wires these modules into an axum service.
//!
//! # Modules
//!
//! - `convert`: intake and conversion pipeline (DOCX -> HTML -> EPUB)
//! - `cache`: versioned, cache-first store for the page shell and pinned
//!   external assets
//! - `routes`: HTTP surface for both components

pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod routes;
pub mod state;
