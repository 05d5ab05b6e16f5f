//! Usage: Bridge synchronous sqlite / filesystem work onto tokio's blocking pool.

/// Runs `f` on the blocking pool. A panicking or cancelled task is reported as
/// `TASK_JOIN_ERROR` through the caller's error type.
pub(crate) async fn run<T, E, F>(label: &'static str, f: F) -> Result<T, E>
where
    T: Send + 'static,
    E: From<String> + Send + 'static,
    F: FnOnce() -> Result<T, E> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(task = label, "阻塞任务执行失败: {}", err);
            Err(E::from(format!("TASK_JOIN_ERROR: {label}: {err}")))
        }
    }
}
