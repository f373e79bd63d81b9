//! Application layer containing the pipeline orchestration.
//!
//! The [`coordinator::BatchCoordinator`] is the entry point used by the
//! transport adapters. It runs each record through the pure stages
//! ([`validator`], [`routing`], [`processor`]) and the [`recorder`], which
//! owns the durable audit trail.

pub mod coordinator;
pub mod processor;
pub mod recorder;
pub mod routing;
pub mod validator;
