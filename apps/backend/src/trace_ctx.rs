//! Task-local trace id for HTTP requests.
//!
//! `RequestTrace` scopes each request future with its trace id so that
//! `AppError::error_response` can stamp problem bodies without threading the
//! request through every call.

use tokio::task_local;

task_local! {
    static TRACE_ID: String;
}

const NO_TRACE: &str = "unknown";

/// Current request's trace id, or `"unknown"` outside a request scope.
pub fn trace_id() -> String {
    TRACE_ID
        .try_with(Clone::clone)
        .unwrap_or_else(|_| NO_TRACE.to_string())
}

pub async fn with_trace_id<F, R>(trace_id: String, future: F) -> R
where
    F: std::future::Future<Output = R>,
{
    TRACE_ID.scope(trace_id, future).await
}
