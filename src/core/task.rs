//! Task handles and the type-erased jobs held in the pending queue.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::core::stats::SchedulerCounters;
use crate::core::{RetryPolicy, RetryState, TaskError, TaskOperation};

/// Identifier assigned to each submitted task, unique per scheduler.
pub type TaskId = u64;

/// Caller-side view of a submitted task.
///
/// Resolves once the task succeeds or terminally fails. Dropping the handle
/// detaches the task: it still runs when the quota allows, and its outcome
/// is discarded. Use `cancel` to withdraw a task that has not started.
#[derive(Debug)]
pub struct TaskHandle<T, E> {
    id: TaskId,
    outcome: oneshot::Receiver<Result<T, TaskError<E>>>,
}

impl<T, E> TaskHandle<T, E> {
    /// Identifier of the underlying task, usable with `cancel`.
    pub const fn id(&self) -> TaskId {
        self.id
    }
}

impl<T, E> Future for TaskHandle<T, E> {
    type Output = Result<T, TaskError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.outcome).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // Job dropped without reporting: the operation panicked or the runtime went away.
            Poll::Ready(Err(_)) => Poll::Ready(Err(TaskError::Aborted)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Why a queued task was withdrawn without running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Withdrawal {
    Cancelled,
    Shutdown,
}

/// Per-attempt execution settings shared by every task of a scheduler.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ExecutionPolicy {
    pub retry: RetryPolicy,
    pub attempt_timeout: Option<Duration>,
}

pub(crate) type JobFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A pending task with its operation, inputs and outcome slot erased.
pub(crate) trait QueuedTask: Send {
    fn id(&self) -> TaskId;

    fn withdraw(self: Box<Self>, reason: Withdrawal);

    /// Run all attempts and deliver the outcome.
    fn run(
        self: Box<Self>,
        policy: ExecutionPolicy,
        counters: Arc<SchedulerCounters>,
    ) -> JobFuture;
}

pub(crate) struct Job<C, A, O>
where
    C: Send + 'static,
    A: Send + 'static,
    O: TaskOperation<C, A>,
{
    id: TaskId,
    context: C,
    args: A,
    operation: O,
    outcome: oneshot::Sender<Result<O::Output, TaskError<O::Error>>>,
}

impl<C, A, O> Job<C, A, O>
where
    C: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
    O: TaskOperation<C, A>,
{
    /// Build a job and the handle its caller awaits.
    pub fn new(
        id: TaskId,
        context: C,
        operation: O,
        args: A,
    ) -> (Self, TaskHandle<O::Output, O::Error>) {
        let (tx, rx) = oneshot::channel();
        let job = Self {
            id,
            context,
            args,
            operation,
            outcome: tx,
        };
        (job, TaskHandle { id, outcome: rx })
    }

    async fn attempt(
        &self,
        attempt: u32,
        timeout: Option<Duration>,
        counters: &SchedulerCounters,
    ) -> Result<O::Output, TaskError<O::Error>> {
        let call = self.operation.call(self.context.clone(), self.args.clone());
        let Some(limit) = timeout else {
            return call.await.map_err(|error| TaskError::Operation {
                attempts: attempt,
                error,
            });
        };
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result.map_err(|error| TaskError::Operation {
                attempts: attempt,
                error,
            }),
            Err(_) => {
                SchedulerCounters::bump(&counters.timed_out);
                Err(TaskError::TimedOut {
                    attempts: attempt,
                    timeout: limit,
                })
            }
        }
    }

    async fn execute(self, policy: ExecutionPolicy, counters: Arc<SchedulerCounters>) {
        let mut state = RetryState::Pending;
        // Overwritten by the first attempt; validated policies allow at least one.
        let mut result = Err(TaskError::Aborted);
        while let Some(attempt) = state.next_attempt() {
            result = self.attempt(attempt, policy.attempt_timeout, &counters).await;
            state = match result {
                Ok(_) => RetryState::Succeeded { attempts: attempt },
                Err(_) => policy.retry.on_failure(attempt),
            };
            match state {
                RetryState::Succeeded { .. } => {
                    debug!(task_id = self.id, ?state, "task succeeded");
                }
                RetryState::Retrying { .. } => {
                    let delay = policy.retry.delay(attempt);
                    warn!(
                        task_id = self.id,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "attempt failed, retrying"
                    );
                    SchedulerCounters::bump(&counters.retried);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                RetryState::FailedFinal { .. } => {
                    warn!(task_id = self.id, ?state, "task failed, attempts exhausted");
                }
                RetryState::Pending => {}
            }
        }
        debug_assert!(state.is_terminal());

        if result.is_ok() {
            SchedulerCounters::bump(&counters.succeeded);
        } else {
            SchedulerCounters::bump(&counters.failed);
        }
        if self.outcome.send(result).is_err() {
            debug!(task_id = self.id, "handle dropped, outcome discarded");
        }
    }
}

impl<C, A, O> QueuedTask for Job<C, A, O>
where
    C: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
    O: TaskOperation<C, A>,
{
    fn id(&self) -> TaskId {
        self.id
    }

    fn withdraw(self: Box<Self>, reason: Withdrawal) {
        let error = match reason {
            Withdrawal::Cancelled => TaskError::Cancelled,
            Withdrawal::Shutdown => TaskError::Shutdown,
        };
        // A closed receiver means the caller already gave up on the task.
        let _ = self.outcome.send(Err(error));
    }

    fn run(
        self: Box<Self>,
        policy: ExecutionPolicy,
        counters: Arc<SchedulerCounters>,
    ) -> JobFuture {
        Box::pin((*self).execute(policy, counters))
    }
}
