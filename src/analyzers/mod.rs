//! Cleaning, joining and per-city aggregation.
//!
//! This module filters the vehicle table, attaches postal code coordinates,
//! rolls the result up by city and correlates the city averages with the
//! vehicle counts.

pub mod aggregate;
pub mod analyzer;
pub mod clean;
pub mod correlation;
pub mod grade;
pub mod join;
pub mod types;
pub mod utility;
