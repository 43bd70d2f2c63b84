//! Per-thread trampolines for settlement and teardown.
//!
//! Settling a cell can settle the cells chained behind it, and dropping a
//! pending cell can drop the cells chained behind it. Done recursively,
//! either walk uses one stack frame group per link and a long chain
//! overflows the stack. Both walks are flattened here: the outermost call
//! on a thread owns a work list and drains it in a loop, nested calls only
//! append to that list.

use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::thread::LocalKey;

/// A reaction bound to the outcome it will receive.
pub(crate) type Job = Box<dyn FnOnce()>;

thread_local! {
    /// Jobs waiting to run. `Some` while a drain is in progress.
    static JOBS: RefCell<Option<VecDeque<Job>>> = const { RefCell::new(None) };

    /// Reaction queues of dropped cells. `Some` while a drain is in progress.
    static RETIRED: RefCell<Option<Vec<Box<dyn Any>>>> = const { RefCell::new(None) };
}

/// Runs `jobs` in order, after every job already queued on this thread.
///
/// When no drain is in progress, this call becomes the drain and returns
/// once the queue is empty, including jobs queued by the jobs it runs.
/// Otherwise the jobs are appended and the function returns immediately.
pub(crate) fn schedule(jobs: impl IntoIterator<Item = Job>) {
    let mut jobs = jobs.into_iter();

    let owner = JOBS.try_with(|queue| {
        let mut queue = queue.borrow_mut();
        match queue.as_mut() {
            Some(pending) => {
                pending.extend(jobs.by_ref());
                false
            }
            None => {
                *queue = Some(jobs.by_ref().collect());
                true
            }
        }
    });

    match owner {
        Ok(true) => {
            let _drain = Drain(&JOBS);
            while let Some(job) = pop(&JOBS, VecDeque::pop_front) {
                job();
            }
        }
        Ok(false) => {}
        // Thread-local storage is being torn down; there is no queue to
        // hand the jobs to.
        Err(_) => jobs.for_each(|job| job()),
    }
}

/// Drops `garbage` without recursing into other retired values.
///
/// Dropping a reaction queue drops the capabilities it holds, which can drop
/// further cells and their queues. Those arrive here again and are parked
/// until the outermost call gets to them.
pub(crate) fn retire(garbage: Box<dyn Any>) {
    let mut garbage = Some(garbage);

    let owner = RETIRED.try_with(|pile| {
        let mut pile = pile.borrow_mut();
        match pile.as_mut() {
            Some(parked) => {
                parked.extend(garbage.take());
                false
            }
            None => {
                *pile = Some(Vec::new());
                true
            }
        }
    });

    if !matches!(owner, Ok(true)) {
        return;
    }

    let _drain = Drain(&RETIRED);
    drop(garbage);
    while let Some(next) = pop(&RETIRED, Vec::pop) {
        drop(next);
    }
}

fn pop<C, T>(key: &'static LocalKey<RefCell<Option<C>>>, take: fn(&mut C) -> Option<T>) -> Option<T> {
    key.try_with(|slot| slot.borrow_mut().as_mut().and_then(take))
        .ok()
        .flatten()
}

/// Ends a drain, including when a job unwinds.
struct Drain<C: 'static>(&'static LocalKey<RefCell<Option<C>>>);

impl<C: 'static> Drop for Drain<C> {
    fn drop(&mut self) {
        // Leftovers are only possible after a panic. They are dropped after
        // the borrow is released because dropping them may re-enter.
        let leftover = self.0.try_with(|slot| slot.borrow_mut().take());
        drop(leftover);
    }
}
