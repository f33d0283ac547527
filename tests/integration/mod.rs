//! Integration tests for filesystem identity reconciliation

mod reconcile_local;
mod reconcile_memory;
mod identity_reuse;
