use tokio::task::JoinError;

/// Runs synchronous database work off the UI thread.
pub async fn run_blocking<F, T>(f: F) -> Result<T, JoinError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await
}
