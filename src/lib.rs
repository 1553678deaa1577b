// ABOUTME: Root module for fanout - bounded-concurrency work distribution library.
// ABOUTME: Re-exports all public types from submodules.

pub mod config;
pub mod error;
pub mod executor;
pub mod limiter;
pub mod prelude;
pub mod retry;

pub use error::FanoutError;
