// src/lib.rs — Library root for Arbor

pub mod api;
pub mod cli;
pub mod core;
pub mod infra;
pub mod provider;
pub mod tasks;
pub mod util;
