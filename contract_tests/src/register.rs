//! Arity and mutability contract tests
//!
//! Every supported arity (0-3) for mutating and read-only operations, void
//! and non-void, must give the same result through a stub as the same call
//! made directly on the privileged type.
