use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::{AdapterError, AudioBackend, PlaybackState, ResolveError, StopMode};
use crate::registry::{END_FADE_PARAM, END_SECTION_PARAM};

/// Backend that produces no audio but keeps instance state coherent.
///
/// Lets the rest of the game run with music disabled (CI, `--no-audio`
/// launches, audio-device failures) without callers noticing: every event
/// resolves, every instance starts, and end parameters "finish" instantly
/// since there is nothing to fade.
#[derive(Debug, Default)]
pub struct NullBackend;

#[derive(Debug)]
pub struct NullInstance {
    state: Cell<PlaybackState>,
    params: RefCell<HashMap<String, f32>>,
    volume: Cell<f32>,
}

impl NullInstance {
    fn new() -> Self {
        Self {
            state: Cell::new(PlaybackState::Stopped),
            params: RefCell::new(HashMap::new()),
            volume: Cell::new(1.0),
        }
    }
}

impl AudioBackend for NullBackend {
    type Descriptor = String;
    type Instance = NullInstance;

    fn resolve_event(&self, path: &str) -> Result<String, ResolveError> {
        Ok(path.to_owned())
    }

    fn instantiate(&self, _descriptor: &String) -> Result<NullInstance, AdapterError> {
        Ok(NullInstance::new())
    }

    fn start(&self, instance: &NullInstance) -> Result<(), AdapterError> {
        instance.state.set(PlaybackState::Playing);
        Ok(())
    }

    fn stop(&self, instance: &NullInstance, _mode: StopMode) -> Result<(), AdapterError> {
        instance.state.set(PlaybackState::Stopped);
        Ok(())
    }

    fn release(&self, instance: NullInstance) {
        instance.state.set(PlaybackState::Invalid);
    }

    fn set_parameter(
        &self,
        instance: &NullInstance,
        name: &str,
        value: f32,
    ) -> Result<(), AdapterError> {
        instance.params.borrow_mut().insert(name.to_owned(), value);
        // No audio to fade, so an end request stops the instance right away.
        if (name == END_FADE_PARAM || name == END_SECTION_PARAM) && value >= 1.0 {
            instance.state.set(PlaybackState::Stopped);
        }
        Ok(())
    }

    fn get_parameter(&self, instance: &NullInstance, name: &str) -> Result<f32, AdapterError> {
        Ok(instance.params.borrow().get(name).copied().unwrap_or(0.0))
    }

    fn playback_state(&self, instance: &NullInstance) -> PlaybackState {
        instance.state.get()
    }

    fn set_volume(&self, instance: &NullInstance, value: f32) -> Result<(), AdapterError> {
        instance.volume.set(value);
        Ok(())
    }
}
