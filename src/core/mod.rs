//! Core admission-control functionality

pub mod admission;

pub use admission::{AdmissionControl, AdmissionDecision};
