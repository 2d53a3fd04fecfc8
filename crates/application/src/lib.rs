//! Ferrous Discovery Application Layer
pub mod ports;
