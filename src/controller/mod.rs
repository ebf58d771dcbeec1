//! The playback controller: decides what plays, when, and how it is changed
//! or stopped.
//!
//! One controller per running game session, constructed by the composition
//! root and cloned (cheaply) into whoever needs music control. All suspending
//! work (start retries while banks load, fade-out polls, the volume
//! subscription) runs on `spawn_local`, so the calling thread never stalls
//! for a retry budget or a fade tail.

mod session;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::backend::{AudioBackend, PlaybackState, ResolveError, StopMode};
use crate::error::MusicError;
use crate::registry::{
    ControlScheme, EventRegistry, LOOP_INDEX_PARAM, ThemeRegistry, loop_index_for_name,
};
use crate::settings::{PrefStore, SOUNDTRACK_SIDE_KEY, SoundtrackSide};
use session::Session;

/// Resolve/instantiate attempts before a start is declared failed.
const MAX_START_ATTEMPTS: u32 = 10;
/// Delay between start attempts while waiting for banks to load.
const RETRY_DELAY: Duration = Duration::from_millis(500);
/// How often a graceful stop checks whether the fade has finished.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

struct Shared<B: AudioBackend> {
    backend: B,
    events: EventRegistry,
    themes: ThemeRegistry,
    prefs: RefCell<PrefStore>,
    session: RefCell<Session<B::Instance>>,
    /// Bumped by every start request and every stop. A suspended start task
    /// re-checks this after each await and abandons itself once superseded,
    /// so two retry loops never race to bind an instance.
    generation: Cell<u64>,
}

pub struct MusicController<B: AudioBackend + 'static> {
    shared: Rc<Shared<B>>,
    volume_task: Rc<RefCell<Option<JoinHandle<()>>>>,
}

impl<B: AudioBackend + 'static> Clone for MusicController<B> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
            volume_task: Rc::clone(&self.volume_task),
        }
    }
}

impl<B: AudioBackend + 'static> MusicController<B> {
    pub fn new(
        backend: B,
        events: EventRegistry,
        themes: ThemeRegistry,
        prefs: PrefStore,
    ) -> Self {
        Self {
            shared: Rc::new(Shared {
                backend,
                events,
                themes,
                prefs: RefCell::new(prefs),
                session: RefCell::new(Session::new()),
                generation: Cell::new(0),
            }),
            volume_task: Rc::new(RefCell::new(None)),
        }
    }

    pub fn backend(&self) -> &B {
        &self.shared.backend
    }

    /// Plays a theme on the preferred soundtrack side, starting at the given
    /// loop region.
    ///
    /// Unregistered names are played as literal event ids rather than
    /// rejected; handy for cues that never made it into the table, but the
    /// warning below is worth watching for in shipping builds.
    pub fn play_theme(&self, name: &str, start_loop: u32) {
        let side = self.soundtrack_side();
        let event_id = match self.shared.themes.resolve(name, side) {
            Ok(resolved) => {
                if resolved.fallback {
                    tracing::info!(
                        theme = name,
                        side = %side,
                        event = %resolved.event_id,
                        "side not recorded for this theme, using the other side"
                    );
                }
                resolved.event_id
            }
            Err(err) => {
                tracing::warn!(theme = name, %err, "not in theme table, playing as a literal event id");
                name.to_owned()
            }
        };
        self.shared.session.borrow_mut().theme = Some(name.to_owned());
        self.start_event(event_id, start_loop);
    }

    /// Stops the current theme and forgets it.
    pub fn stop_theme(&self, immediate: bool) {
        self.shared.session.borrow_mut().theme = None;
        self.stop_current(immediate);
    }

    /// Plays a raw event id, bypassing theme and side resolution.
    pub fn play_music(&self, event_id: &str, start_loop: u32) {
        self.shared.session.borrow_mut().theme = None;
        self.start_event(event_id.to_owned(), start_loop);
    }

    pub fn stop_current_music(&self, immediate: bool) {
        self.stop_current(immediate);
    }

    /// Switches the active looped event to another loop region.
    pub fn set_loop(&self, index: u32) {
        let session = self.shared.session.borrow();
        let (Some(instance), Some(event_id)) =
            (session.instance.as_ref(), session.event.as_deref())
        else {
            let err = MusicError::InvalidOperation("loop change with no music playing".to_owned());
            tracing::warn!(index, %err, "ignored");
            return;
        };
        let scheme = self.shared.events.config_for(event_id);
        if !scheme.is_looped() {
            let err = MusicError::InvalidOperation(format!("{event_id} has no loop regions"));
            tracing::warn!(index, %err, "ignored");
            return;
        }
        let clamped = scheme.clamp_loop(index);
        if clamped != index {
            tracing::debug!(event = event_id, index, clamped, "loop index out of range, clamped");
        }
        if let Err(err) = self
            .shared
            .backend
            .set_parameter(instance, LOOP_INDEX_PARAM, clamped as f32)
        {
            tracing::warn!(event = event_id, clamped, %err, "failed to change loop region");
        }
    }

    /// [`MusicController::set_loop`] by authored region letter (`a`..`d`).
    pub fn set_loop_by_name(&self, name: &str) {
        match loop_index_for_name(name) {
            Some(index) => self.set_loop(index),
            None => tracing::warn!(name, "unknown loop region name, ignoring"),
        }
    }

    /// Escape hatch: sets any named parameter on the active instance.
    pub fn set_parameter(&self, name: &str, value: f32) {
        let session = self.shared.session.borrow();
        let Some(instance) = session.instance.as_ref() else {
            let err = MusicError::InvalidOperation("parameter set with no music playing".to_owned());
            tracing::warn!(name, value, %err, "ignored");
            return;
        };
        if let Err(err) = self.shared.backend.set_parameter(instance, name, value) {
            tracing::warn!(name, value, %err, "failed to set parameter");
        }
    }

    /// Stores the published volume and pushes it to the active instance.
    ///
    /// With nothing active the value is kept and applied at the next start.
    pub fn apply_volume(&self, volume: f32) {
        apply_volume(&self.shared, volume);
    }

    /// Applies volume changes from the settings publisher until the sender
    /// drops or [`MusicController::shutdown`] runs. The receiver's current
    /// value is applied immediately.
    pub fn subscribe_volume(&self, mut volume_rx: watch::Receiver<f32>) {
        self.apply_volume(*volume_rx.borrow_and_update());
        let shared = Rc::clone(&self.shared);
        let task = tokio::task::spawn_local(async move {
            while volume_rx.changed().await.is_ok() {
                let volume = *volume_rx.borrow_and_update();
                apply_volume(&shared, volume);
            }
        });
        if let Some(old) = self.volume_task.borrow_mut().replace(task) {
            old.abort();
        }
    }

    pub fn is_playing(&self) -> bool {
        let session = self.shared.session.borrow();
        session.instance.as_ref().is_some_and(|instance| {
            matches!(
                self.shared.backend.playback_state(instance),
                PlaybackState::Playing | PlaybackState::Starting
            )
        })
    }

    pub fn soundtrack_side(&self) -> SoundtrackSide {
        let raw = self
            .shared
            .prefs
            .borrow()
            .get(SOUNDTRACK_SIDE_KEY, SoundtrackSide::A.as_str());
        SoundtrackSide::parse(&raw).unwrap_or_default()
    }

    /// Persists a new soundtrack side; if a theme is active it restarts on
    /// the new side at the loop region the old instance was in.
    pub fn set_soundtrack_side(&self, side: &str) {
        let Some(side) = SoundtrackSide::parse(side) else {
            tracing::warn!(side, "ignoring soundtrack side, expected \"A\" or \"B\"");
            return;
        };
        if side == self.soundtrack_side() {
            return;
        }
        {
            let mut prefs = self.shared.prefs.borrow_mut();
            prefs.set(SOUNDTRACK_SIDE_KEY, side.as_str());
            if let Err(err) = prefs.flush() {
                tracing::warn!(%err, "failed to persist soundtrack side");
            }
        }
        tracing::info!(side = %side, "soundtrack side changed");

        let (theme, loop_index) = {
            let session = self.shared.session.borrow();
            let loop_index = session
                .instance
                .as_ref()
                .and_then(|instance| {
                    self.shared
                        .backend
                        .get_parameter(instance, LOOP_INDEX_PARAM)
                        .ok()
                })
                .map(|v| v.max(0.0) as u32)
                .unwrap_or(0);
            (session.theme.clone(), loop_index)
        };
        if let Some(theme) = theme {
            self.play_theme(&theme, loop_index);
        }
    }

    pub fn toggle_soundtrack_side(&self) {
        self.set_soundtrack_side(self.soundtrack_side().other().as_str());
    }

    /// Hard teardown: cancels pending work and releases the active instance
    /// synchronously.
    pub fn shutdown(&self) {
        if let Some(task) = self.volume_task.borrow_mut().take() {
            task.abort();
        }
        self.shared.session.borrow_mut().theme = None;
        self.stop_current(true);
        tracing::debug!("music controller shut down");
    }

    fn start_event(&self, event_id: String, start_loop: u32) {
        {
            let session = self.shared.session.borrow();
            if session.event.as_deref() == Some(event_id.as_str())
                && let Some(instance) = session.instance.as_ref()
                && matches!(
                    self.shared.backend.playback_state(instance),
                    PlaybackState::Playing | PlaybackState::Starting
                )
            {
                tracing::debug!(event = %event_id, "already playing, ignoring restart");
                return;
            }
        }

        // The outgoing track gets its fade before the new one binds.
        self.stop_current(false);

        let generation = bump(&self.shared.generation);
        let shared = Rc::clone(&self.shared);
        tokio::task::spawn_local(async move {
            if let Err(err) = start_with_retry(&shared, event_id, start_loop, generation).await {
                tracing::error!(%err, "music will not play");
            }
        });
    }

    fn stop_current(&self, immediate: bool) {
        // A stop supersedes any in-flight start as well.
        bump(&self.shared.generation);

        let taken = self.shared.session.borrow_mut().take_active();
        let Some((instance, event_id)) = taken else {
            return;
        };

        if immediate {
            if let Err(err) = self.shared.backend.stop(&instance, StopMode::Immediate) {
                tracing::warn!(%err, "immediate stop failed");
            }
            self.shared.backend.release(instance);
            return;
        }

        let scheme = event_id
            .as_deref()
            .map(|id| self.shared.events.config_for(id))
            .unwrap_or(ControlScheme::SimpleFade);
        if let Err(err) = self
            .shared
            .backend
            .set_parameter(&instance, scheme.end_parameter(), 1.0)
        {
            // Can't request the fade; better a hard cut than a leak.
            tracing::warn!(%err, "fade-out request failed, stopping immediately");
            let _ = self.shared.backend.stop(&instance, StopMode::Immediate);
            self.shared.backend.release(instance);
            return;
        }
        tracing::debug!(event = event_id.as_deref().unwrap_or("?"), "fade-out requested");

        let shared = Rc::clone(&self.shared);
        tokio::task::spawn_local(async move {
            loop {
                tokio::time::sleep(STOP_POLL_INTERVAL).await;
                match shared.backend.playback_state(&instance) {
                    PlaybackState::Stopped | PlaybackState::Invalid => break,
                    PlaybackState::Playing | PlaybackState::Starting => {}
                }
            }
            shared.backend.release(instance);
        });
    }
}

fn apply_volume<B: AudioBackend>(shared: &Shared<B>, volume: f32) {
    let volume = volume.clamp(0.0, 1.0);
    let mut session = shared.session.borrow_mut();
    session.volume = volume;
    if let Some(instance) = session.instance.as_ref()
        && let Err(err) = shared.backend.set_volume(instance, volume)
    {
        tracing::warn!(volume, %err, "failed to apply volume");
    }
}

/// The start protocol: resolve → instantiate → configure → start, retrying
/// while the backend's banks are still loading.
async fn start_with_retry<B: AudioBackend + 'static>(
    shared: &Rc<Shared<B>>,
    event_id: String,
    start_loop: u32,
    generation: u64,
) -> Result<(), MusicError> {
    let path = qualified_path(&event_id);

    let mut attempt = 1u32;
    let instance = loop {
        match try_instantiate(&shared.backend, &path) {
            Ok(instance) => break instance,
            Err(err) if !err.is_transient() => return Err(err),
            Err(err) => {
                if attempt >= MAX_START_ATTEMPTS {
                    tracing::warn!(path = %path, attempts = attempt, %err, "giving up on start");
                    return Err(MusicError::StartFailed {
                        path,
                        attempts: attempt,
                    });
                }
                tracing::debug!(path = %path, attempt, %err, "event not ready, will retry");
                attempt += 1;
                tokio::time::sleep(RETRY_DELAY).await;
                if shared.generation.get() != generation {
                    tracing::debug!(path = %path, "superseded while waiting, abandoning start");
                    return Ok(());
                }
            }
        }
    };

    if shared.generation.get() != generation {
        tracing::debug!(path = %path, "superseded after instantiation, discarding instance");
        shared.backend.release(instance);
        return Ok(());
    }

    let scheme = shared.events.config_for(&event_id);
    if scheme.is_looped() {
        // The region must be selected before the first buffer plays, or the
        // listener hears a jump.
        let index = scheme.clamp_loop(start_loop);
        if let Err(err) = shared
            .backend
            .set_parameter(&instance, LOOP_INDEX_PARAM, index as f32)
        {
            tracing::warn!(path = %path, index, %err, "failed to preselect loop region");
        }
    }

    let volume = shared.session.borrow().volume;
    if let Err(err) = shared.backend.set_volume(&instance, volume) {
        tracing::warn!(path = %path, volume, %err, "failed to apply volume before start");
    }

    if let Err(err) = shared.backend.start(&instance) {
        shared.backend.release(instance);
        tracing::warn!(path = %path, %err, "start command failed");
        return Err(MusicError::StartFailed {
            path,
            attempts: attempt,
        });
    }

    let mut session = shared.session.borrow_mut();
    session.instance = Some(instance);
    session.event = Some(event_id);
    tracing::info!(path = %path, attempt, "music started");
    Ok(())
}

fn try_instantiate<B: AudioBackend>(backend: &B, path: &str) -> Result<B::Instance, MusicError> {
    let descriptor = backend.resolve_event(path).map_err(|err| match err {
        ResolveError::NotFound => MusicError::AssetNotReady {
            path: path.to_owned(),
        },
        ResolveError::Backend(e) => MusicError::Adapter(e),
    })?;
    // Some backends hand out a descriptor slightly before instantiation
    // works; an instantiation failure retries like a missing asset.
    backend.instantiate(&descriptor).map_err(MusicError::Adapter)
}

fn bump(generation: &Cell<u64>) -> u64 {
    let next = generation.get().wrapping_add(1);
    generation.set(next);
    next
}

/// Event ids are stored bare; the backend wants a fully-qualified path.
fn qualified_path(event_id: &str) -> String {
    if event_id.contains(":/") {
        event_id.to_owned()
    } else {
        format!("event:/{event_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_ids_get_the_event_prefix() {
        assert_eq!(qualified_path("Music/Main"), "event:/Music/Main");
        assert_eq!(qualified_path("event:/Music/Main"), "event:/Music/Main");
        assert_eq!(qualified_path("snapshot:/Duck"), "snapshot:/Duck");
    }

    #[test]
    fn generation_bump_is_monotonic_per_call() {
        let generation = Cell::new(0u64);
        assert_eq!(bump(&generation), 1);
        assert_eq!(bump(&generation), 2);
        assert_eq!(generation.get(), 2);
    }
}
