//! Integration tests for the harvest pipeline
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! load, fetch, extract and checkpoint cycle end-to-end.

mod pipeline_tests;
