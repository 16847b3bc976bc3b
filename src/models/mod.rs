//! Data structures shared between the MRT decoder and the route aggregator.
mod asn;
mod attributes;
mod mrt;
mod network;

pub use asn::*;
pub use attributes::*;
pub use mrt::*;
pub use network::*;
