//! Collection execution.
//!
//! This module provides:
//! - [`Collection`]: a compiled, validated schema
//! - [`CollectionRunner`]: root listing fetch and concurrent item fan-out
//! - [`ItemEvaluator`]: the per-item evaluation plan

mod collection;
mod evaluator;


pub use collection::{
    collect, Collection, CollectionResult, CollectionRunner, ItemOutcome, ProgressSnapshot,
    RunProgress,
};
pub use evaluator::ItemEvaluator;
