//! Tests for the evaluator
//!
//! Organized by rule family, with shared helpers for running templates.

// Test helper functions
mod helpers;


mod strings;

mod include;
