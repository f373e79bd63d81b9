//! Domain types and the ports the pipeline depends on.

pub mod envelope;
pub mod event;
pub mod ports;
pub mod record;
