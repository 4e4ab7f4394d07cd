//! Operation and spawning abstractions.

use std::future::Future;

use async_trait::async_trait;

/// An opaque async call the scheduler throttles.
///
/// The scheduler never inspects the call. It hands over a clone of the
/// caller's context (typically a connection handle) and of the arguments on
/// every attempt, so a failed attempt can be retried with the same inputs.
///
/// Any `Fn(C, A) -> impl Future<Output = Result<T, E>>` implements this
/// trait, so closures and `async fn`s can be submitted directly.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use rpc_throttle::core::TaskOperation;
///
/// struct GetBalance;
///
/// #[async_trait]
/// impl TaskOperation<RpcClient, String> for GetBalance {
///     type Output = u64;
///     type Error = RpcError;
///
///     async fn call(&self, client: RpcClient, account: String) -> Result<u64, RpcError> {
///         client.get_balance(&account).await
///     }
/// }
/// ```
#[async_trait]
pub trait TaskOperation<C, A>: Send + Sync + 'static
where
    C: Send + 'static,
    A: Send + 'static,
{
    /// Value produced by a successful call.
    type Output: Send + 'static;
    /// Error produced by a failed call.
    type Error: Send + 'static;

    /// Perform one attempt of the call.
    async fn call(&self, context: C, args: A) -> Result<Self::Output, Self::Error>;
}

#[async_trait]
impl<C, A, F, Fut, T, E> TaskOperation<C, A> for F
where
    C: Send + 'static,
    A: Send + 'static,
    F: Fn(C, A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    async fn call(&self, context: C, args: A) -> Result<T, E> {
        (self)(context, args).await
    }
}

/// Abstraction for spawning task execution on a runtime.
pub trait Spawn {
    /// Spawn a detached future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
