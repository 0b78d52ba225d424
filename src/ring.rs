//! The request/reply ring pair the FTL worker polls. Per §5, host requests
//! arrive through a single-producer/single-consumer lockless ring per
//! poller and completions go back out on a reply ring; the worker dequeues,
//! services a request fully, then enqueues its completion before dequeuing
//! the next one. `ArrayQueue` is lock-free and bounded, matching that shape
//! without pulling in a hand-rolled ring buffer.

use std::sync::Arc;

use crossbeam_queue::ArrayQueue;

use crate::api::{Completion, Request};

pub struct RequestRing {
    queue: Arc<ArrayQueue<Request>>,
}

impl RequestRing {
    pub fn new(capacity: usize) -> Self { RequestRing { queue: Arc::new(ArrayQueue::new(capacity)) } }

    pub fn handle(&self) -> RequestRingHandle { RequestRingHandle { queue: self.queue.clone() } }

    /// Non-blocking push from the producer side. Returns the request back
    /// on failure (ring full) rather than dropping it — the core never
    /// drops accepted requests, and an unaccepted one was never the core's
    /// to drop.
    pub fn push(&self, req: Request) -> Result<(), Request> { self.queue.push(req) }

    /// Polled with a busy loop by the worker; `None` means the ring is
    /// momentarily empty.
    pub fn pop(&self) -> Option<Request> { self.queue.pop() }

    pub fn is_empty(&self) -> bool { self.queue.is_empty() }
}

/// A cloneable producer-side handle, for callers that enqueue from outside
/// the worker's own scope (e.g. a test harness feeding a workload).
#[derive(Clone)]
pub struct RequestRingHandle {
    queue: Arc<ArrayQueue<Request>>,
}

impl RequestRingHandle {
    pub fn push(&self, req: Request) -> Result<(), Request> { self.queue.push(req) }
}

pub struct ReplyRing {
    queue: ArrayQueue<Completion>,
}

impl ReplyRing {
    pub fn new(capacity: usize) -> Self { ReplyRing { queue: ArrayQueue::new(capacity) } }

    pub fn push(&self, c: Completion) -> Result<(), Completion> { self.queue.push(c) }

    pub fn pop(&self) -> Option<Completion> { self.queue.pop() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_ordering_is_preserved() {
        let ring = RequestRing::new(4);
        ring.push(Request::write(0, 1, 0)).unwrap();
        ring.push(Request::write(1, 1, 0)).unwrap();
        assert_eq!(ring.pop().unwrap().slba, 0);
        assert_eq!(ring.pop().unwrap().slba, 1);
        assert!(ring.pop().is_none());
    }

    #[test]
    fn full_ring_returns_the_request_rather_than_dropping_it() {
        let ring = RequestRing::new(1);
        ring.push(Request::write(0, 1, 0)).unwrap();
        let rejected = ring.push(Request::write(1, 1, 0));
        assert!(rejected.is_err());
    }
}
