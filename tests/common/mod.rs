//! Scripted backend and single-threaded runtime harness for controller tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use dualscore::backend::{AdapterError, AudioBackend, PlaybackState, ResolveError, StopMode};

/// Every call the controller makes, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Resolve(String),
    Instantiate(u64),
    Start(u64),
    Stop(u64, StopMode),
    Release(u64),
    SetParameter(u64, String, f32),
    SetVolume(u64, f32),
}

#[derive(Debug, Default)]
pub struct MockBackend {
    pub ops: RefCell<Vec<Op>>,
    next_id: Cell<u64>,
    /// Number of leading resolves to fail with `NotFound`; `u32::MAX` means
    /// every resolve fails.
    pub resolve_failures: Cell<u32>,
    states: RefCell<HashMap<u64, PlaybackState>>,
    params: RefCell<HashMap<(u64, String), f32>>,
}

pub struct MockInstance {
    pub id: u64,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn always_not_found() -> Self {
        let backend = Self::default();
        backend.resolve_failures.set(u32::MAX);
        backend
    }

    pub fn failing_resolves(n: u32) -> Self {
        let backend = Self::default();
        backend.resolve_failures.set(n);
        backend
    }

    pub fn set_state(&self, id: u64, state: PlaybackState) {
        self.states.borrow_mut().insert(id, state);
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.borrow().clone()
    }

    pub fn starts(&self) -> usize {
        self.count(|op| matches!(op, Op::Start(_)))
    }

    pub fn resolves(&self) -> usize {
        self.count(|op| matches!(op, Op::Resolve(_)))
    }

    pub fn resolves_of(&self, path: &str) -> usize {
        self.count(|op| matches!(op, Op::Resolve(p) if p == path))
    }

    pub fn releases(&self) -> usize {
        self.count(|op| matches!(op, Op::Release(_)))
    }

    pub fn count(&self, pred: impl Fn(&Op) -> bool) -> usize {
        self.ops.borrow().iter().filter(|op| pred(op)).count()
    }

    pub fn position(&self, pred: impl Fn(&Op) -> bool) -> Option<usize> {
        self.ops.borrow().iter().position(|op| pred(op))
    }
}

impl AudioBackend for MockBackend {
    type Descriptor = String;
    type Instance = MockInstance;

    fn resolve_event(&self, path: &str) -> Result<String, ResolveError> {
        self.ops.borrow_mut().push(Op::Resolve(path.to_owned()));
        let left = self.resolve_failures.get();
        if left > 0 {
            if left != u32::MAX {
                self.resolve_failures.set(left - 1);
            }
            return Err(ResolveError::NotFound);
        }
        Ok(path.to_owned())
    }

    fn instantiate(&self, _descriptor: &String) -> Result<MockInstance, AdapterError> {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.ops.borrow_mut().push(Op::Instantiate(id));
        self.states.borrow_mut().insert(id, PlaybackState::Stopped);
        Ok(MockInstance { id })
    }

    fn start(&self, instance: &MockInstance) -> Result<(), AdapterError> {
        self.ops.borrow_mut().push(Op::Start(instance.id));
        self.states
            .borrow_mut()
            .insert(instance.id, PlaybackState::Playing);
        Ok(())
    }

    fn stop(&self, instance: &MockInstance, mode: StopMode) -> Result<(), AdapterError> {
        self.ops.borrow_mut().push(Op::Stop(instance.id, mode));
        self.states
            .borrow_mut()
            .insert(instance.id, PlaybackState::Stopped);
        Ok(())
    }

    fn release(&self, instance: MockInstance) {
        self.ops.borrow_mut().push(Op::Release(instance.id));
        self.states
            .borrow_mut()
            .insert(instance.id, PlaybackState::Invalid);
    }

    fn set_parameter(
        &self,
        instance: &MockInstance,
        name: &str,
        value: f32,
    ) -> Result<(), AdapterError> {
        self.ops
            .borrow_mut()
            .push(Op::SetParameter(instance.id, name.to_owned(), value));
        self.params
            .borrow_mut()
            .insert((instance.id, name.to_owned()), value);
        // End parameters do not stop anything here; tests flip states
        // explicitly to simulate fade completion.
        Ok(())
    }

    fn get_parameter(&self, instance: &MockInstance, name: &str) -> Result<f32, AdapterError> {
        Ok(self
            .params
            .borrow()
            .get(&(instance.id, name.to_owned()))
            .copied()
            .unwrap_or(0.0))
    }

    fn playback_state(&self, instance: &MockInstance) -> PlaybackState {
        self.states
            .borrow()
            .get(&instance.id)
            .copied()
            .unwrap_or(PlaybackState::Invalid)
    }

    fn set_volume(&self, instance: &MockInstance, value: f32) -> Result<(), AdapterError> {
        self.ops
            .borrow_mut()
            .push(Op::SetVolume(instance.id, value));
        Ok(())
    }
}

/// Runs a future on a paused-time current-thread runtime inside a `LocalSet`,
/// the environment the controller's spawned tasks expect.
pub fn run_local<F: Future>(fut: F) -> F::Output {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("runtime");
    let local = tokio::task::LocalSet::new();
    local.block_on(&rt, fut)
}

/// Lets spawned controller tasks run; paused time advances instantly.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}
