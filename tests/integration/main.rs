//! Integration tests: services and the HTTP router over a temporary data directory

mod api_tests;
mod common;
mod lending_tests;
