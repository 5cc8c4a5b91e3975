use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;

/// Which path made the map ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadySource {
    Idle,
    Fallback,
}

struct LatchInner {
    fired: Option<ReadySource>,
    tx: Option<oneshot::Sender<ReadySource>>,
}

/// Single-fire latch shared by the idle listener and the fallback timer.
/// The first `fire` resolves the receiver; later calls are ignored.
#[derive(Clone)]
pub struct ReadyLatch {
    inner: Rc<RefCell<LatchInner>>,
}

impl ReadyLatch {
    pub fn new() -> (Self, oneshot::Receiver<ReadySource>) {
        let (tx, rx) = oneshot::channel();
        let latch = Self {
            inner: Rc::new(RefCell::new(LatchInner {
                fired: None,
                tx: Some(tx),
            })),
        };
        (latch, rx)
    }

    /// Returns true only for the call that won.
    pub fn fire(&self, source: ReadySource) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.fired.is_some() {
            return false;
        }
        inner.fired = Some(source);
        if let Some(tx) = inner.tx.take() {
            let _ = tx.send(source);
        }
        true
    }

    pub fn fired(&self) -> Option<ReadySource> {
        self.inner.borrow().fired
    }
}
