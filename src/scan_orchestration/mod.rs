//! Scan orchestration domain layer
//!
//! Pure business logic: entities, rule tables and the three detection stages.
//! Nothing in this module performs I/O.
pub mod domain;
pub mod policies;
pub mod services;
