//! Command execution helpers
//!
//! Provides utilities to reduce boilerplate when implementing commands with
//! timing and logging.

use std::future::Future;
use std::time::Instant;

use bydefeat_domain::Result as DomainResult;

use crate::utils::logging::log_command_execution;

/// Execute a command, timing it and logging the outcome
///
/// # Example
///
/// ```rust,ignore
/// let tracks = execute_logged("player::tracks", || async {
///     ctx.session.resume().await?;
///     Ok(ctx.session.state().playlist)
/// })
/// .await?;
/// ```
pub async fn execute_logged<F, Fut, T>(command_name: &str, command_fn: F) -> DomainResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let start = Instant::now();

    let result = command_fn().await;

    log_command_execution(command_name, start.elapsed(), result.as_ref().err());
    result
}

#[cfg(test)]
mod tests {
    use bydefeat_domain::ByDefeatError;

    use super::*;

    #[tokio::test]
    async fn test_result_is_passed_through() {
        let ok = execute_logged("test::ok", || async { Ok(7) }).await;
        assert_eq!(ok, Ok(7));

        let err: DomainResult<()> =
            execute_logged("test::err", || async { Err(ByDefeatError::RequestFailed(500)) }).await;
        assert_eq!(err, Err(ByDefeatError::RequestFailed(500)));
    }
}
