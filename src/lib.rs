//! optable - paginated, type-filterable operations table for ledger explorers
//!
//! # Architecture
//!
//! ## Records & Sources
//! - [`record`] - Operation records, paging cursors, operation types
//! - [`source`] - Query builder, pages, and record sources (Horizon, SQLite, memory)
//!
//! ## Fetching
//! - [`fetcher`] - Filtered record fetcher and cursor navigation
//! - [`filter`] - Type filter carried in URL query strings
//!
//! ## Presentation
//! - [`table`] - Terminal table rendering
//! - [`export`] - CSV export
//! - [`api`] - REST API
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`cli`] - CLI utilities

#![forbid(unsafe_code)]

// ============================================================================
// Records & Sources
// ============================================================================
pub mod record;
pub mod source;

// ============================================================================
// Fetching
// ============================================================================
pub mod fetcher;
pub mod filter;

// ============================================================================
// Presentation
// ============================================================================
pub mod export;
pub mod table;

#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod cli;
pub mod config;
pub mod error;
