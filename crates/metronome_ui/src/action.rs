//! Shared, re-runnable actions.

use parking_lot::Mutex;
use std::sync::Arc;

/// Action shared between a consumer and the items it registers.
pub type Action = Arc<Mutex<dyn FnMut() + Send>>;

pub(crate) fn shared(action: impl FnMut() + Send + 'static) -> Action {
    Arc::new(Mutex::new(action))
}

pub(crate) fn run(action: &Action) {
    let mut guard = action.lock();
    let callback: &mut (dyn FnMut() + Send) = &mut *guard;
    callback();
}
