//! Free-function stub contract tests
