//! Task orchestration primitives.
//!
//! Two families live here:
//!
//! - [`execute_all`] / [`execute_seq`] reproduce the platform's callback
//!   contract exactly. They run on a single thread, have no error channel,
//!   and a task that never calls back stalls the whole combinator.
//! - [`try_execute_all`] / [`try_execute_seq`] are the future-based
//!   counterparts. They stop at the first `Err` and drop all outstanding
//!   work, which the callback contract cannot express.

use futures::future::{try_join_all, BoxFuture};
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

/// One-shot completion callback handed to each task.
pub type Callback<T> = Box<dyn FnOnce(T)>;

/// Task for [`execute_all`]: must invoke its callback exactly once.
pub type ParallelTask<T> = Box<dyn FnOnce(Callback<T>)>;

/// Task for [`execute_seq`]: receives the previous result (`None` for the
/// first task) and must invoke its callback exactly once.
pub type SequentialTask<T> = Box<dyn FnOnce(Option<T>, Callback<T>)>;

/// Task for [`try_execute_seq`].
pub type TrySequentialTask<'a, T, E> =
    Box<dyn FnOnce(Option<T>) -> BoxFuture<'a, Result<T, E>> + Send + 'a>;

/// Box a closure as a [`ParallelTask`].
pub fn parallel_task<T, F>(f: F) -> ParallelTask<T>
where
    F: FnOnce(Callback<T>) + 'static,
{
    Box::new(f)
}

/// Box a closure as a [`SequentialTask`].
pub fn sequential_task<T, F>(f: F) -> SequentialTask<T>
where
    F: FnOnce(Option<T>, Callback<T>) + 'static,
{
    Box::new(f)
}

/// Box an async closure as a [`TrySequentialTask`].
pub fn try_sequential_task<'a, T, E, F, Fut>(f: F) -> TrySequentialTask<'a, T, E>
where
    F: FnOnce(Option<T>) -> Fut + Send + 'a,
    Fut: Future<Output = Result<T, E>> + Send + 'a,
{
    Box::new(move |previous| Box::pin(f(previous)))
}

struct Gather<T> {
    slots: Vec<Option<T>>,
    remaining: usize,
    on_done: Option<Box<dyn FnOnce(Vec<T>)>>,
}

/// Start every task at once and collect their results in task order.
///
/// Each task is invoked immediately, without waiting for earlier ones.
/// Results are slotted by task index, so `on_done` always sees them in input
/// order whatever order the callbacks arrive in. `on_done` fires exactly
/// once, after the last callback; with no tasks it fires synchronously with
/// an empty vector.
///
/// A task that never calls back means `on_done` never fires. A panicking
/// task unwinds through this call.
pub fn execute_all<T, F>(tasks: Vec<ParallelTask<T>>, on_done: F)
where
    T: 'static,
    F: FnOnce(Vec<T>) + 'static,
{
    let total = tasks.len();
    tracing::debug!(tasks = total, "executing tasks in parallel");

    if total == 0 {
        on_done(Vec::new());
        return;
    }

    let state = Rc::new(RefCell::new(Gather {
        slots: (0..total).map(|_| None).collect(),
        remaining: total,
        on_done: Some(Box::new(on_done)),
    }));

    for (index, task) in tasks.into_iter().enumerate() {
        let state = Rc::clone(&state);
        task(Box::new(move |result| complete(&state, index, result)));
    }
}

fn complete<T>(state: &RefCell<Gather<T>>, index: usize, result: T) {
    // Release the borrow before calling out; on_done may start new work.
    let finished = {
        let mut gather = state.borrow_mut();
        gather.slots[index] = Some(result);
        gather.remaining -= 1;
        tracing::trace!(index, remaining = gather.remaining, "parallel task completed");

        if gather.remaining > 0 {
            None
        } else {
            let results: Vec<T> = gather.slots.drain(..).flatten().collect();
            gather.on_done.take().map(|on_done| (on_done, results))
        }
    };

    if let Some((on_done, results)) = finished {
        tracing::debug!(results = results.len(), "all parallel tasks completed");
        on_done(results);
    }
}

/// Run tasks one after another, threading each result into the next task.
///
/// The first task receives `None`; task *n+1* is only invoked from inside
/// task *n*'s callback. `on_done` receives the last task's result, or `None`
/// immediately when there are no tasks.
///
/// Same failure semantics as [`execute_all`]: no error channel. Each task
/// that calls back synchronously nests one more `run_next` frame, so a very
/// long chain of synchronous tasks (on the order of 10^5) can overflow the
/// stack.
pub fn execute_seq<T, F>(tasks: Vec<SequentialTask<T>>, on_done: F)
where
    T: 'static,
    F: FnOnce(Option<T>) + 'static,
{
    tracing::debug!(tasks = tasks.len(), "executing tasks in sequence");
    run_next(tasks.into_iter(), None, Box::new(on_done));
}

fn run_next<T: 'static>(
    mut remaining: std::vec::IntoIter<SequentialTask<T>>,
    previous: Option<T>,
    on_done: Box<dyn FnOnce(Option<T>)>,
) {
    match remaining.next() {
        Some(task) => {
            tracing::trace!(left = remaining.len(), "starting sequential task");
            task(
                previous,
                Box::new(move |result| run_next(remaining, Some(result), on_done)),
            );
        }
        None => {
            tracing::debug!("sequence completed");
            on_done(previous);
        }
    }
}

/// Await all futures concurrently, returning results in input order.
///
/// The futures are polled on the caller's task. On the first `Err` the
/// remaining futures are dropped, cancelling their outstanding work.
pub async fn try_execute_all<I, F, T, E>(tasks: I) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let results = try_join_all(tasks).await;
    match &results {
        Ok(values) => tracing::debug!(results = values.len(), "all parallel tasks succeeded"),
        Err(_) => tracing::debug!("parallel task failed, remaining tasks cancelled"),
    }
    results
}

/// Run async tasks in order, threading each result into the next.
///
/// Stops at the first `Err` without starting later tasks. Returns the last
/// result, or `None` when `tasks` is empty.
pub async fn try_execute_seq<'a, T, E>(
    tasks: Vec<TrySequentialTask<'a, T, E>>,
) -> Result<Option<T>, E> {
    let total = tasks.len();
    let mut previous = None;

    for (index, task) in tasks.into_iter().enumerate() {
        match task(previous.take()).await {
            Ok(result) => previous = Some(result),
            Err(e) => {
                tracing::debug!(index, total, "sequential task failed, sequence aborted");
                return Err(e);
            }
        }
    }

    Ok(previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    type Pending = Rc<RefCell<Vec<Option<Callback<&'static str>>>>>;

    fn deferred_tasks(count: usize) -> (Vec<ParallelTask<&'static str>>, Pending) {
        let pending: Pending = Rc::new(RefCell::new((0..count).map(|_| None).collect()));
        let tasks = (0..count)
            .map(|index| {
                let pending = Rc::clone(&pending);
                parallel_task(move |callback| pending.borrow_mut()[index] = Some(callback))
            })
            .collect();
        (tasks, pending)
    }

    fn fire(pending: &Pending, index: usize, value: &'static str) {
        let callback = pending.borrow_mut()[index]
            .take()
            .expect("callback already fired");
        callback(value);
    }

    #[test]
    fn test_execute_all_preserves_order_under_permuted_completion() {
        let (tasks, pending) = deferred_tasks(3);
        let done: Rc<RefCell<Option<Vec<&str>>>> = Rc::new(RefCell::new(None));

        let sink = Rc::clone(&done);
        execute_all(tasks, move |results| *sink.borrow_mut() = Some(results));

        // A slow, B fast, C medium.
        fire(&pending, 1, "B");
        assert!(done.borrow().is_none());
        fire(&pending, 2, "C");
        assert!(done.borrow().is_none());
        fire(&pending, 0, "A");

        assert_eq!(done.borrow().clone(), Some(vec!["A", "B", "C"]));
    }

    #[test]
    fn test_execute_all_starts_every_task_before_any_completes() {
        let (tasks, pending) = deferred_tasks(4);
        execute_all(tasks, |_| {});
        assert!(pending.borrow().iter().all(Option::is_some));
    }

    #[test]
    fn test_execute_all_synchronous_tasks() {
        let calls = Rc::new(Cell::new(0));
        let done = Rc::new(RefCell::new(Vec::new()));

        let tasks: Vec<ParallelTask<usize>> = (0..5)
            .map(|i| parallel_task(move |callback: Callback<usize>| callback(i * i)))
            .collect();

        let (counter, sink) = (Rc::clone(&calls), Rc::clone(&done));
        execute_all(tasks, move |results| {
            counter.set(counter.get() + 1);
            *sink.borrow_mut() = results;
        });

        assert_eq!(calls.get(), 1);
        assert_eq!(*done.borrow(), vec![0, 1, 4, 9, 16]);
    }

    #[test]
    fn test_execute_all_empty_is_synchronous() {
        let done = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&done);
        execute_all(Vec::<ParallelTask<u8>>::new(), move |results| {
            *sink.borrow_mut() = Some(results)
        });
        assert_eq!(done.borrow().clone(), Some(Vec::new()));
    }

    #[test]
    fn test_execute_all_stalls_without_callback() {
        let (tasks, pending) = deferred_tasks(2);
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        execute_all(tasks, move |_| flag.set(true));

        fire(&pending, 0, "only one");
        assert!(!fired.get());
    }

    #[test]
    fn test_execute_seq_threads_results() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let tasks: Vec<SequentialTask<u32>> = (1..=3)
            .map(|i| {
                let seen = Rc::clone(&seen);
                sequential_task(move |previous: Option<u32>, callback: Callback<u32>| {
                    seen.borrow_mut().push(previous);
                    callback(i * 10);
                })
            })
            .collect();

        let done = Rc::new(Cell::new(None));
        let sink = Rc::clone(&done);
        execute_seq(tasks, move |last| sink.set(last));

        assert_eq!(*seen.borrow(), vec![None, Some(10), Some(20)]);
        assert_eq!(done.get(), Some(30));
    }

    #[test]
    fn test_execute_seq_waits_for_previous_callback() {
        let parked: Rc<RefCell<Option<Callback<u32>>>> = Rc::new(RefCell::new(None));
        let second_started = Rc::new(Cell::new(false));

        let park = Rc::clone(&parked);
        let started = Rc::clone(&second_started);
        let tasks: Vec<SequentialTask<u32>> = vec![
            sequential_task(move |_, callback| *park.borrow_mut() = Some(callback)),
            sequential_task(move |previous: Option<u32>, callback: Callback<u32>| {
                started.set(true);
                callback(previous.unwrap_or_default() + 1);
            }),
        ];

        let done = Rc::new(Cell::new(None));
        let sink = Rc::clone(&done);
        execute_seq(tasks, move |last| sink.set(last));
        assert!(!second_started.get());

        let callback = parked.borrow_mut().take().expect("first task parked");
        callback(41);

        assert!(second_started.get());
        assert_eq!(done.get(), Some(42));
    }

    #[test]
    fn test_execute_seq_empty() {
        let done = Rc::new(Cell::new(Some(1)));
        let sink = Rc::clone(&done);
        execute_seq(Vec::<SequentialTask<i32>>::new(), move |last| sink.set(last));
        assert_eq!(done.get(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_execute_all_orders_by_index() {
        let delays = [30u64, 10, 20];
        let tasks = delays.iter().enumerate().map(|(index, delay)| async move {
            tokio::time::sleep(Duration::from_millis(*delay)).await;
            Ok::<_, String>(index)
        });

        let results = try_execute_all(tasks).await.unwrap();
        assert_eq!(results, vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_execute_all_cancels_on_first_error() {
        let slow_finished = Arc::new(AtomicBool::new(false));

        let tasks = (0..2).map(|index| {
            let slow_finished = Arc::clone(&slow_finished);
            async move {
                if index == 1 {
                    return Err("auth failed".to_string());
                }
                tokio::time::sleep(Duration::from_secs(60)).await;
                slow_finished.store(true, Ordering::SeqCst);
                Ok(index)
            }
        });

        let result = try_execute_all(tasks).await;
        assert_eq!(result, Err("auth failed".to_string()));
        assert!(!slow_finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_try_execute_all_empty() {
        let tasks: Vec<futures::future::Ready<Result<u8, ()>>> = Vec::new();
        assert_eq!(try_execute_all(tasks).await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_try_execute_seq_threads_results() {
        let tasks: Vec<TrySequentialTask<'static, u32, String>> = vec![
            try_sequential_task(|previous: Option<u32>| async move {
                assert_eq!(previous, None);
                Ok(10)
            }),
            try_sequential_task(|previous: Option<u32>| async move {
                assert_eq!(previous, Some(10));
                Ok(20)
            }),
            try_sequential_task(|previous: Option<u32>| async move { Ok(previous.unwrap_or(0) + 10) }),
        ];

        assert_eq!(try_execute_seq(tasks).await, Ok(Some(30)));
    }

    #[tokio::test]
    async fn test_try_execute_seq_stops_at_first_error() {
        let started = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<TrySequentialTask<'static, u32, String>> = (0..3)
            .map(|index| {
                let started = Arc::clone(&started);
                try_sequential_task(move |_previous: Option<u32>| async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    if index == 1 {
                        Err(format!("task {index} failed"))
                    } else {
                        Ok(index)
                    }
                })
            })
            .collect();

        assert_eq!(try_execute_seq(tasks).await, Err("task 1 failed".to_string()));
        assert_eq!(started.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_try_execute_seq_empty() {
        let tasks: Vec<TrySequentialTask<'static, u32, ()>> = Vec::new();
        assert_eq!(try_execute_seq(tasks).await, Ok(None));
    }
}
