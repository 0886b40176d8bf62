//! Popreport - service-department performance report updater
//!
//! This library ingests dealership service exports (menu sales,
//! commodity add-ons, recommendations, technician hours, timecards),
//! aggregates them per staff member, and maps the aggregates onto fixed
//! cell positions of a shared performance grid for one calendar day.

pub mod actions;
pub mod aggregate;
pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod grid;
pub mod layout;
pub mod normalize;
pub mod table;
pub mod writer;
