//! Core business logic - framework-agnostic catalog and ingestion operations.
//!
//! Nothing in here knows about the command line. Every operation takes a
//! database handle and, where it reports diagnostics, an
//! [`observer::IngestionObserver`].

/// Inspecting and requeueing ingestion batches
pub mod batch;
/// Fragrance notes parsing
pub mod notes;
/// Diagnostics events and their receivers
pub mod observer;
/// Perfume catalog lookups and merges
pub mod perfume;
/// Seller listings, history and stale-listing deactivation
pub mod price;
/// Merging staged records into production
pub mod reconcile;
/// Seller registration and lookup
pub mod seller;
/// Writing parsed packets to the staging tables
pub mod staging;
