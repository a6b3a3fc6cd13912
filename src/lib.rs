//! Contact Quality API Library
//!
//! This library analyzes batches of contact records and reports a
//! data-quality summary (missing fields, duplicates, company frequency,
//! severity and email-domain categories), serves it over HTTP and renders
//! it as a bar chart. It also cleans contact lists (duplicate, invalid,
//! incomplete and similar contacts) and converts them between JSON, CSV and
//! vCard.
//!
//! # Modules
//!
//! - `api`: API-layer components.
//! - `core`: Analysis logic, models and shared errors.
//! - `analysis`: Missing-field predicate, row classifiers and aggregation.
//! - `chart`: PNG bar chart rendering.
//! - `cleaning`: Contact list cleaning and flagging.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `export`: CSV import and CSV/JSON/vCard export.
//! - `handlers`: HTTP request handlers and router assembly.
//! - `models`: Contact table and summary models.
//! - `summary_store`: Single-slot store of the latest summary.

pub mod api;
pub mod core;

pub mod analysis;
pub mod chart;
pub mod cleaning;
pub mod config;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod models;
pub mod summary_store;
