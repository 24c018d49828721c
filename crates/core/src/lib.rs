//! Domain logic for the CLEA batch façade.
//!
//! Pure building blocks with no HTTP types: running the external batch
//! ([`batch`]) and browsing its output directory ([`bucket`]).

pub mod batch;
pub mod bucket;
