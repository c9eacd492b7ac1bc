//! Map view, tile management, and overlay reconciliation.
//!
//! The controller in this module is the core of the application: it owns the
//! single live map view, keeps the current readings dataset in sync with
//! background fetches, and reconciles the dataset onto marker overlays.

pub mod controller;
pub mod markers;
pub mod mercator;
pub mod tiles;

pub use controller::MapController;
