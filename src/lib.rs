//! Subtrack - Subscription Lifecycle Service
//!
//! This crate reconciles persisted subscription records against asynchronous
//! payment-processor events and direct user actions.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod test_utils;
