//! Ferrous Discovery Infrastructure Layer
//!
//! Concrete resolver variants and the transports they sit on.
pub mod dns;
pub mod registry;
pub mod resolver;

pub use resolver::{
    CachingServiceResolver, DnsServiceResolver, RegistryServiceResolver, Resolver,
    ResolverBuilder,
};
