pub mod anomaly;
pub mod error;
pub mod exceedance;
pub mod loader;
pub mod pipeline;
pub mod report;
pub mod rolling;
pub mod types;
pub mod validity;
pub mod window;
