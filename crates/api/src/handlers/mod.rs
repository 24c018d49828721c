pub mod batch;
pub mod bucket;
