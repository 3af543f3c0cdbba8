//! Splice-site aligned density maps.
//!
//! A [`CoordinateProjector`] turns one feature window into a fixed-width
//! vector, an [`EventLayout`] names the windows an event type is cut into,
//! and a [`MatrixBuilder`] stacks the windows of many features into one
//! [`DensityMatrix`] per region:
//!
//! ```text
//! features -> EventLayout -> CoordinateProjector -> SignalSource
//!          -> MatrixBuilder -> RegionMatrices -> normalization / stats
//! ```
//!
//! Windows keep their width whatever the feature looks like: bases that
//! can't (or shouldn't) be read are padded with the sentinel.

pub mod builder;
pub mod layout;
pub mod matrix;
pub mod normalization;
pub mod persist;
pub mod projector;

// re-exports
pub use self::builder::{
    BuiltMaps, Conditions, Exclusion, ExclusionReason, MatrixBuilder, PairedNormalization,
    RowNormalization,
};
pub use self::layout::{EventLayout, Region, RegionRule};
pub use self::matrix::{DensityMatrix, RegionMatrices};
pub use self::projector::{CoordinateProjector, Projection, SiteKind, SiteQuery};
