pub mod dataset;
pub mod export;
pub mod features;
pub mod sample_data;
pub mod stats;
pub mod store;
pub mod tier;
