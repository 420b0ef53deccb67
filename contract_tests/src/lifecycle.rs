//! Lifecycle contract tests
//!
//! Construction, destruction and heap accounting of stub-owned objects.
