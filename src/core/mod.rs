//! The reconciliation engine: pure rules over already-fetched records.
//! Everything here is deterministic and free of I/O so the rules can be
//! tested without a database.

pub mod access;
pub mod daily;
pub mod geofence;
pub mod leave_policy;
pub mod payroll;
pub mod summary;
pub mod workdays;
