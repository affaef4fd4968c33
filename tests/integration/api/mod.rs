//! API integration tests
//!
//! Integration tests for all document endpoints

mod documents_test;
mod generate_test;
