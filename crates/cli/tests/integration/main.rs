#![cfg(unix)]

mod common;
mod pipeline_tests;
