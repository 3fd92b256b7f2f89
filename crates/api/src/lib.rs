//! HTTP API: routing, cookie transport and request/response mapping for the
//! session subsystem.

pub mod app;
pub mod context;
pub mod cookies;
pub mod middleware;
