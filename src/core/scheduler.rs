//! Sliding-window rate-limited scheduler.
//!
//! Tasks are admitted in submission order, and only while
//! `in_flight + completions_in_window < quota`. Admission is re-evaluated on
//! every submission, on every completion, and on a periodic tick of one
//! window length that drives the queue when no completion event will.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::Window;
use crate::core::stats::{SchedulerCounters, SchedulerStats};
use crate::core::task::{ExecutionPolicy, Job, QueuedTask, Withdrawal};
use crate::core::{
    CompletionWindow, ConfigError, RetryPolicy, SchedulerError, Spawn, TaskHandle, TaskId,
    TaskOperation,
};
use crate::runtime::TokioSpawner;

/// Values governing admission and execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerLimits {
    /// Maximum completions per window, also the bound on in-flight tasks.
    pub quota: u32,
    /// Length of the sliding window.
    pub window: Window,
    /// Retry policy applied to every task.
    pub retry: RetryPolicy,
    /// Optional limit on a single attempt.
    pub task_timeout: Option<Duration>,
    /// Optional bound on pending tasks; unbounded when `None`.
    pub max_queue_depth: Option<usize>,
}

impl SchedulerLimits {
    /// Limits with the default retry policy, no timeout and an unbounded queue.
    pub fn new(quota: u32, window: Window) -> Self {
        Self {
            quota,
            window,
            retry: RetryPolicy::default(),
            task_timeout: None,
            max_queue_depth: None,
        }
    }

    /// Validate limit values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quota == 0 {
            return Err(ConfigError::ZeroQuota);
        }
        self.retry.validate()?;
        if self.task_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.max_queue_depth == Some(0) {
            return Err(ConfigError::ZeroQueueDepth);
        }
        Ok(())
    }
}

/// Mutable bookkeeping, only ever touched under the scheduler lock.
struct SchedulerState {
    pending: VecDeque<Box<dyn QueuedTask>>,
    completions: CompletionWindow,
    in_flight: usize,
    timer_active: bool,
    /// Generation of the running timer; a timer whose epoch is stale exits.
    timer_epoch: u64,
    closed: bool,
}

impl SchedulerState {
    fn new(window: Duration) -> Self {
        Self {
            pending: VecDeque::new(),
            completions: CompletionWindow::new(window),
            in_flight: 0,
            timer_active: false,
            timer_epoch: 0,
            closed: false,
        }
    }

    /// Pop every task that may start now, in FIFO order, reserving a slot
    /// for each. Stops the timer once nothing is queued or running.
    fn admit(&mut self, quota: usize, now: Instant) -> Vec<Box<dyn QueuedTask>> {
        let mut admitted = Vec::new();
        while !self.pending.is_empty() && self.in_flight < quota {
            let recent = self.completions.prune(now);
            if recent + self.in_flight >= quota {
                let reopens_in = self
                    .completions
                    .next_expiry()
                    .map(|at| at.saturating_duration_since(now));
                debug!(
                    recent,
                    in_flight = self.in_flight,
                    queued = self.pending.len(),
                    ?reopens_in,
                    "admission blocked by window"
                );
                break;
            }
            let Some(task) = self.pending.pop_front() else {
                break;
            };
            self.in_flight += 1;
            admitted.push(task);
        }
        if self.pending.is_empty() && self.in_flight == 0 {
            self.stop_timer();
        }
        admitted
    }

    /// Record a completion and free its slot.
    fn release(&mut self, now: Instant) {
        self.completions.record(now);
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Mark a timer as running and return its epoch, unless one already runs.
    fn claim_timer(&mut self) -> Option<u64> {
        if self.timer_active {
            return None;
        }
        self.timer_active = true;
        self.timer_epoch += 1;
        Some(self.timer_epoch)
    }

    fn stop_timer(&mut self) {
        if self.timer_active {
            self.timer_active = false;
            self.timer_epoch += 1;
            debug!("timer stopped, scheduler idle");
        }
    }
}

struct Shared<S> {
    limits: SchedulerLimits,
    quota: usize,
    policy: ExecutionPolicy,
    state: Mutex<SchedulerState>,
    counters: Arc<SchedulerCounters>,
    next_id: AtomicU64,
    spawner: S,
}

impl<S> Shared<S>
where
    S: Spawn + Send + Sync + 'static,
{
    /// Admit what the quota allows and launch it.
    fn dispatch(self: &Arc<Self>) {
        let admitted = {
            let mut state = self.state.lock();
            state.admit(self.quota, Instant::now())
        };
        for task in admitted {
            self.launch(task);
        }
    }

    fn launch(self: &Arc<Self>, task: Box<dyn QueuedTask>) {
        let id = task.id();
        debug!(task_id = id, "task admitted");
        let run = task.run(self.policy, Arc::clone(&self.counters));
        let slot = Slot {
            shared: Arc::clone(self),
            id,
            released: false,
        };
        self.spawner.spawn(async move {
            run.await;
            slot.complete();
        });
    }

    fn start_timer(self: &Arc<Self>, epoch: u64) {
        let period = self.limits.window.as_duration();
        let weak: Weak<Self> = Arc::downgrade(self);
        debug!(
            epoch,
            period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
            "timer started"
        );
        self.spawner.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // Scheduler dropped.
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                {
                    let state = shared.state.lock();
                    if !state.timer_active || state.timer_epoch != epoch {
                        return;
                    }
                }
                shared.dispatch();
            }
        });
    }
}

/// Slot held by a running task; frees it on completion or when dropped.
struct Slot<S>
where
    S: Spawn + Send + Sync + 'static,
{
    shared: Arc<Shared<S>>,
    id: TaskId,
    released: bool,
}

impl<S> Slot<S>
where
    S: Spawn + Send + Sync + 'static,
{
    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut state = self.shared.state.lock();
        state.release(Instant::now());
    }

    /// Free the slot and let the queue advance straight away.
    fn complete(mut self) {
        self.release();
        debug!(task_id = self.id, "task completed");
        self.shared.dispatch();
    }
}

impl<S> Drop for Slot<S>
where
    S: Spawn + Send + Sync + 'static,
{
    // Reached without `complete` only if the task future was dropped early;
    // the periodic timer picks up the queue from here.
    fn drop(&mut self) {
        if !self.released {
            warn!(task_id = self.id, "task dropped before completing");
            self.release();
        }
    }
}

/// Rate-limited FIFO scheduler for asynchronous calls.
///
/// At most `quota` tasks complete per sliding `window`, and at most `quota`
/// run concurrently. Excess submissions wait in a FIFO queue. Each instance
/// is independent; clones share the same queue and quota.
///
/// # Example
///
/// ```rust,ignore
/// use rpc_throttle::core::RateLimitedScheduler;
///
/// let scheduler = RateLimitedScheduler::new(10, "1s")?;
/// let handle = scheduler.submit(client.clone(), get_balance, account)?;
/// let lamports = handle.await?;
/// ```
pub struct RateLimitedScheduler<S = TokioSpawner>
where
    S: Spawn + Send + Sync + 'static,
{
    shared: Arc<Shared<S>>,
}

impl<S> Clone for RateLimitedScheduler<S>
where
    S: Spawn + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl RateLimitedScheduler<TokioSpawner> {
    /// Scheduler allowing `quota` completions per `window` (e.g. `"10s"`),
    /// with the default retry policy.
    ///
    /// Spawns onto the runtime current at construction; fails with
    /// [`ConfigError::NoRuntime`] when called outside one.
    pub fn new(quota: u32, window: &str) -> Result<Self, ConfigError> {
        let limits = SchedulerLimits::new(quota, Window::parse(window)?);
        limits.validate()?;
        Self::with_spawner(limits, TokioSpawner::current()?)
    }
}

impl<S> RateLimitedScheduler<S>
where
    S: Spawn + Send + Sync + 'static,
{
    /// Scheduler from explicit limits and spawner.
    pub fn with_spawner(limits: SchedulerLimits, spawner: S) -> Result<Self, ConfigError> {
        limits.validate()?;
        let quota = usize::try_from(limits.quota).unwrap_or(usize::MAX);
        let policy = ExecutionPolicy {
            retry: limits.retry,
            attempt_timeout: limits.task_timeout,
        };
        let state = SchedulerState::new(limits.window.as_duration());
        Ok(Self {
            shared: Arc::new(Shared {
                limits,
                quota,
                policy,
                state: Mutex::new(state),
                counters: Arc::new(SchedulerCounters::default()),
                next_id: AtomicU64::new(1),
                spawner,
            }),
        })
    }

    /// Limits this scheduler enforces.
    pub fn limits(&self) -> &SchedulerLimits {
        &self.shared.limits
    }

    /// Queue `operation(context, args)` and return a handle to its outcome.
    ///
    /// Returns immediately; the task starts as soon as the quota allows.
    /// `context` and `args` are cloned for every attempt.
    pub fn submit<C, A, O>(
        &self,
        context: C,
        operation: O,
        args: A,
    ) -> Result<TaskHandle<O::Output, O::Error>, SchedulerError>
    where
        C: Clone + Send + Sync + 'static,
        A: Clone + Send + Sync + 'static,
        O: TaskOperation<C, A>,
    {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (job, handle) = Job::new(id, context, operation, args);

        let timer_epoch = {
            let mut state = self.shared.state.lock();
            if state.closed {
                return Err(SchedulerError::Shutdown);
            }
            if let Some(max_depth) = self.shared.limits.max_queue_depth {
                if state.pending.len() >= max_depth {
                    warn!(task_id = id, max_depth, "task rejected: queue full");
                    return Err(SchedulerError::QueueFull { max_depth });
                }
            }
            state.pending.push_back(Box::new(job));
            state.claim_timer()
        };
        SchedulerCounters::bump(&self.shared.counters.submitted);
        debug!(task_id = id, "task enqueued");

        if let Some(epoch) = timer_epoch {
            self.shared.start_timer(epoch);
        }
        self.shared.dispatch();
        Ok(handle)
    }

    /// Withdraw a task that has not been admitted yet.
    ///
    /// Its handle resolves to [`TaskError::Cancelled`](crate::core::TaskError::Cancelled).
    /// Returns `false` if the task already started, finished or is unknown.
    pub fn cancel(&self, id: TaskId) -> bool {
        let task = {
            let mut state = self.shared.state.lock();
            let Some(index) = state.pending.iter().position(|t| t.id() == id) else {
                return false;
            };
            let task = state.pending.remove(index);
            if state.pending.is_empty() && state.in_flight == 0 {
                state.stop_timer();
            }
            task
        };
        let Some(task) = task else {
            return false;
        };
        SchedulerCounters::bump(&self.shared.counters.cancelled);
        debug!(task_id = id, "task cancelled");
        task.withdraw(Withdrawal::Cancelled);
        true
    }

    /// Stop accepting tasks and reject everything still queued.
    ///
    /// Running tasks finish normally. Later submissions fail with
    /// [`SchedulerError::Shutdown`].
    pub fn shutdown(&self) {
        let drained: Vec<_> = {
            let mut state = self.shared.state.lock();
            state.closed = true;
            state.stop_timer();
            state.pending.drain(..).collect()
        };
        info!(rejected = drained.len(), "scheduler shut down");
        for task in drained {
            SchedulerCounters::bump(&self.shared.counters.cancelled);
            task.withdraw(Withdrawal::Shutdown);
        }
    }

    /// Whether `shutdown` has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Snapshot of queue, window and lifetime counters.
    pub fn stats(&self) -> SchedulerStats {
        let mut stats = {
            let mut state = self.shared.state.lock();
            let recent_completions = state.completions.prune(Instant::now());
            SchedulerStats {
                quota: self.shared.limits.quota,
                queued: state.pending.len(),
                in_flight: state.in_flight,
                recent_completions,
                timer_active: state.timer_active,
                ..SchedulerStats::default()
            }
        };
        self.shared.counters.fill(&mut stats);
        stats
    }
}
