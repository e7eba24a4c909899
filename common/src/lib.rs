//! Shared models and helpers for `linkr`.
//!
//! Everything in here is free of scan logic: the domain values exchanged between
//! the scan engine and its callers, the error taxonomy, the [`config::Config`]
//! value and the read-only interface enumeration.

pub mod config;
pub mod device;
pub mod error;
pub mod network;
pub mod scan;
