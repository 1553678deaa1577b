// ABOUTME: Rate limiting module - admission control for metered remote calls.
// ABOUTME: Contains the sliding-window rate limiter.

mod rate_limiter;

pub use rate_limiter::RateLimiter;
