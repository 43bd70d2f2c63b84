use deferred::{Deferred, Reason};
use std::future::{Future, IntoFuture};
use std::pin::pin;
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};
use std::thread::{self, Thread};
use std::time::Duration;

struct ThreadWaker(Thread);

impl Wake for ThreadWaker {
    fn wake(self: Arc<Self>) {
        self.0.unpark();
    }
}

fn block_on<F: Future>(future: F) -> F::Output {
    let waker = Waker::from(Arc::new(ThreadWaker(thread::current())));
    let mut cx = Context::from_waker(&waker);
    let mut future = pin!(future);

    loop {
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(output) => return output,
            Poll::Pending => thread::park(),
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn test_await_settled_cell() {
    let d = Deferred::<i32, String>::resolve(7);

    assert_eq!(block_on(async { d.await }), Ok(7));
}

#[test]
fn test_await_rejection() {
    let d = Deferred::<i32, String>::reject("refused".into());

    assert_eq!(block_on(d.into_future()), Err("refused".to_string()));
}

#[test]
fn test_await_cell_settled_from_another_thread() {
    init_tracing();

    let (d, resolve, _) = Deferred::<String, Reason>::pending();

    let worker = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        resolve.resolve("from worker".to_string());
    });

    let value = block_on(async move { d.map(|s| s.len()).await });
    worker.join().unwrap();

    assert_eq!(value, Ok(11));
}

#[test]
fn test_await_same_cell_twice() {
    let (d, resolve, _) = Deferred::<u8, String>::pending();

    let first = d.clone();
    let second = d.clone();

    thread::spawn(move || resolve.resolve(3));

    let (a, b) = block_on(async move { (first.await, second.await) });

    assert_eq!(a, Ok(3));
    assert_eq!(b, Ok(3));
}

#[test]
fn test_wait_blocks_until_settled() {
    let (d, _, reject) = Deferred::<i32, String>::pending();

    let worker = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        reject.reject("timed out".into());
    });

    assert_eq!(d.wait(), Err("timed out".to_string()));
    worker.join().unwrap();
}

#[test]
fn test_wait_on_settled_cell_returns_immediately() {
    let d = Deferred::<i32, String>::resolve(1).map(|v| v + 1);

    assert_eq!(d.wait(), Ok(2));
    assert_eq!(d.wait(), Ok(2));
}
