//! Property-based tests for classifier and ordering laws

mod classify_laws;
mod ordering_laws;
