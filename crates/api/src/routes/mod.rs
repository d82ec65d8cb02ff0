pub mod health;
pub mod metrics;
pub mod owner;
pub mod urls;
