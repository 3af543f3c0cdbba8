//! Core models for rbpmaps.
//!
//! This crate holds the types every other rbpmaps crate speaks in:
//!
//! - [`GenomicInterval`](models::GenomicInterval) and [`Strand`](models::Strand)
//! - [`Feature`](models::Feature): one or more intervals describing an event (a site, a skipped exon, ...)
//! - [`WindowSpec`](models::WindowSpec): how far windows reach around a feature
//! - [`RbpMapsError`](errors::RbpMapsError): the shared error type
//!
//! plus readers for the annotation files features are loaded from.
//!
//! # Example
//!
//! ```no_run
//! use rbpmaps_core::annotation::read_features;
//! use rbpmaps_core::models::EventType;
//!
//! let records = read_features("SE.MATS.JC.txt", EventType::SkippedExon).unwrap();
//! let n_ok = records.iter().filter(|r| r.is_ok()).count();
//! ```

pub mod annotation;
pub mod errors;
pub mod models;
pub mod utils;

// re-exports
pub use errors::{RbpMapsError, Result};
