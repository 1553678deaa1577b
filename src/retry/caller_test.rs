// ABOUTME: Tests for the retrying caller against a scripted flaky service.
// ABOUTME: Covers retry classes, validation, exhaustion, fatal aborts, and limiter gating.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_test::assert_ok;

use super::caller::RetryingCaller;
use super::policy::{Backoff, RetryPolicy};
use super::service::Service;
use crate::error::CallError;
use crate::limiter::RateLimiter;

/// Test service that replays a script of transport results and counts
/// invocations. Responses are chat-completion-shaped JSON bodies.
struct ScriptedService {
    script: Mutex<VecDeque<Result<Value, CallError>>>,
    invocations: AtomicU32,
}

impl ScriptedService {
    fn new(script: Vec<Result<Value, CallError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            invocations: AtomicU32::new(0),
        }
    }

    fn invocations(&self) -> u32 {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Service for ScriptedService {
    type Request = String;
    type Response = Value;
    type Payload = String;

    async fn invoke(&self, _request: &String) -> Result<Value, CallError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(CallError::Transient("script exhausted".to_string())))
    }

    fn extract(&self, response: Value) -> Result<String, CallError> {
        match response["choices"][0]["message"]["content"].as_str() {
            Some(content) if !content.is_empty() => Ok(content.to_string()),
            _ => Err(CallError::InvalidResponse(
                "response carries no completion content".to_string(),
            )),
        }
    }
}

fn valid_response(content: &str) -> Value {
    json!({ "choices": [ { "message": { "content": content } } ] })
}

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff: Backoff::Fixed(Duration::from_millis(10)),
    }
}

#[tokio::test]
async fn test_succeeds_after_two_transient_failures() {
    let service = ScriptedService::new(vec![
        Err(CallError::Transient("connection reset".to_string())),
        Err(CallError::RateLimited("quota hit".to_string())),
        Ok(valid_response("third time lucky")),
    ]);
    let caller = RetryingCaller::new(service).with_policy(fast_policy(3));

    let payload = assert_ok!(caller.call(&"prompt".to_string()).await);
    assert_eq!(payload, "third time lucky");
}

#[tokio::test]
async fn test_exhausted_after_all_attempts_fail() {
    let service = ScriptedService::new(vec![
        Err(CallError::Transient("down".to_string())),
        Err(CallError::Transient("still down".to_string())),
        Err(CallError::Transient("yep, down".to_string())),
    ]);
    let caller = RetryingCaller::new(service).with_policy(fast_policy(3));

    let err = caller.call(&"prompt".to_string()).await.unwrap_err();
    match err {
        CallError::Exhausted { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(source.to_string().contains("yep, down"));
        }
        other => panic!("Expected Exhausted, got {}", other),
    }
}

#[tokio::test]
async fn test_fatal_error_aborts_after_one_attempt() {
    let service = ScriptedService::new(vec![Err(CallError::Configuration(
        "API key not set".to_string(),
    ))]);
    let caller = RetryingCaller::new(ScriptedServiceRef(&service)).with_policy(RetryPolicy {
        max_attempts: 3,
        backoff: Backoff::Fixed(Duration::from_millis(200)),
    });

    let start = Instant::now();
    let err = caller.call(&"prompt".to_string()).await.unwrap_err();
    let elapsed = start.elapsed();

    assert!(matches!(err, CallError::Configuration(_)));
    assert_eq!(service.invocations(), 1, "Fatal errors consume no retries");
    assert!(
        elapsed < Duration::from_millis(100),
        "No backoff sleep should happen, took {:?}",
        elapsed
    );
}

/// Borrowing wrapper so a test can inspect the service after the caller
/// consumed it.
struct ScriptedServiceRef<'a>(&'a ScriptedService);

#[async_trait]
impl Service for ScriptedServiceRef<'_> {
    type Request = String;
    type Response = Value;
    type Payload = String;

    async fn invoke(&self, request: &String) -> Result<Value, CallError> {
        self.0.invoke(request).await
    }

    fn extract(&self, response: Value) -> Result<String, CallError> {
        self.0.extract(response)
    }
}

#[tokio::test]
async fn test_empty_choices_is_retried_not_false_success() {
    let service = ScriptedService::new(vec![
        Ok(json!({ "choices": [] })),
        Ok(valid_response("real content")),
    ]);
    let caller = RetryingCaller::new(ScriptedServiceRef(&service)).with_policy(fast_policy(3));

    let payload = assert_ok!(caller.call(&"prompt".to_string()).await);
    assert_eq!(payload, "real content");
    assert_eq!(service.invocations(), 2);
}

#[tokio::test]
async fn test_null_content_is_retried() {
    let service = ScriptedService::new(vec![
        Ok(json!({ "choices": [ { "message": { "content": null } } ] })),
        Ok(valid_response("recovered")),
    ]);
    let caller = RetryingCaller::new(service).with_policy(fast_policy(3));

    let payload = assert_ok!(caller.call(&"prompt".to_string()).await);
    assert_eq!(payload, "recovered");
}

#[tokio::test]
async fn test_shape_errors_alone_can_exhaust_budget() {
    let service = ScriptedService::new(vec![
        Ok(json!({ "choices": [] })),
        Ok(json!({ "choices": [] })),
    ]);
    let caller = RetryingCaller::new(service).with_policy(fast_policy(2));

    let err = caller.call(&"prompt".to_string()).await.unwrap_err();
    match err {
        CallError::Exhausted { attempts, source } => {
            assert_eq!(attempts, 2);
            assert!(matches!(*source, CallError::InvalidResponse(_)));
        }
        other => panic!("Expected Exhausted, got {}", other),
    }
}

#[tokio::test]
async fn test_backoff_delay_observed_between_attempts() {
    let service = ScriptedService::new(vec![
        Err(CallError::Transient("blip".to_string())),
        Ok(valid_response("ok")),
    ]);
    let caller = RetryingCaller::new(service).with_policy(RetryPolicy {
        max_attempts: 3,
        backoff: Backoff::Fixed(Duration::from_millis(80)),
    });

    let start = Instant::now();
    assert_ok!(caller.call(&"prompt".to_string()).await);
    let elapsed = start.elapsed();

    assert!(
        elapsed >= Duration::from_millis(80),
        "The retry should wait the backoff delay, took {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_limiter_gates_every_attempt() {
    let limiter = Arc::new(RateLimiter::with_window(1, Duration::from_millis(150)).unwrap());
    let service = ScriptedService::new(vec![
        Err(CallError::Transient("blip".to_string())),
        Ok(valid_response("ok")),
    ]);
    let caller = RetryingCaller::new(service)
        .with_policy(fast_policy(3))
        .with_limiter(limiter.clone());

    let start = Instant::now();
    assert_ok!(caller.call(&"prompt".to_string()).await);
    let elapsed = start.elapsed();

    // Second attempt had to wait for the first admission to expire
    assert!(
        elapsed >= Duration::from_millis(100),
        "Second attempt should be gated by the limiter, took {:?}",
        elapsed
    );
    assert!(limiter.in_window().await <= 1);
}

#[tokio::test]
async fn test_exhausted_display_names_attempts() {
    let err = CallError::Exhausted {
        attempts: 3,
        source: Box::new(CallError::Transient("no route".to_string())),
    };
    assert_eq!(
        err.to_string(),
        "gave up after 3 attempts: transient service error: no route"
    );
}
