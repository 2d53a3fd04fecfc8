pub mod client;

pub use client::{HealthClient, HealthyInstance, HttpHealthClient};
