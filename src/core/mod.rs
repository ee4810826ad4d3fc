// src/core/mod.rs — Breadth-first thought search engine

pub mod config;
pub mod controller;
pub mod deadline;
pub mod eval_cache;
pub mod evaluator;
pub mod generator;
pub mod selector;
pub mod solver;
pub mod trace;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;
