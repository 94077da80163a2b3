//! Integration tests for stacktmpl-lib.

mod common;
mod pipeline_tests;
mod spec_tests;
