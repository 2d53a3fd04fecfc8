pub mod service_resolver;

pub use service_resolver::{ServiceResolution, ServiceResolver};
