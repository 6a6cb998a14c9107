//! Asynchronous implementations of core components
//!
//! This module provides thread-safe, concurrent counterparts of the core
//! categorization components using DashMap for locking.
//!
//! # Architecture
//!
//! - **AsyncTransactionStore**: Thread-safe transaction storage using DashMap
//! - **RuleCache**: Compiled rule snapshots per company, keyed by revision
//! - **BatchProcessor**: Spreads one company's run over tokio tasks
//! - **AsyncBatchCategorizer**: Orchestrates async categorization runs
//!
//! # Thread Safety
//!
//! All components are designed for safe concurrent access:
//! - Transactions are partitioned by id, so no two workers write the same one
//! - Rule snapshots are immutable and shared through `Arc`
//! - No global locks - fine-grained locking per entity

pub mod batch_processor;
pub mod categorizer;
pub mod rule_cache;
pub mod transaction_store;

pub use batch_processor::{BatchProcessor, BatchResults};
pub use categorizer::AsyncBatchCategorizer;
pub use rule_cache::RuleCache;
pub use transaction_store::AsyncTransactionStore;
