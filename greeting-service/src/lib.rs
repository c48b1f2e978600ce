//! Greeting Service - a greeting page with a visit counter.
//!
//! The greeting lives in PostgreSQL, the counter in Redis. Both stores are
//! verified during [`bootstrap`] before the router is built.

pub mod bootstrap;
pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
