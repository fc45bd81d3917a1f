// src/lib.rs

//! fischdex: Fisch wiki crawler and lookup engine.
//!
//! The crawl side (`pipeline`, `services`, `storage`) turns wiki pages into
//! keyed datasets on disk. The lookup side (`search`) loads those datasets
//! into read-only stores and resolves free-text queries against them.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod services;
pub mod storage;
pub mod utils;
