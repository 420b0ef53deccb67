//! Isolation contract tests
//!
//! Privilege, fault propagation, gate audit and concurrent use of one gate.
