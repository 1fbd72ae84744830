//! Runtime composition shell for independently deployed remote apps.
//!
//! ARCHITECTURE
//! ============
//! `remote` holds the route aggregation and component resolution subsystem.
//! `config`, `state`, `startup`, and `routes` wire it into an Axum service.

pub mod config;
pub mod remote;
pub mod routes;
pub mod startup;
pub mod state;
