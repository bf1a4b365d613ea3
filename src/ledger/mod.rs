//! Ledger store implementations.
//!
//! The engine talks to `ports::store::LedgerStore`; this module provides the
//! in-memory implementation used by the binary and by tests.

pub mod memory;

pub use memory::MemoryLedger;
