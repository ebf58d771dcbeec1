/// Mutable heart of the controller: at most one live instance at a time.
#[derive(Debug)]
pub(crate) struct Session<I> {
    /// The one active backend instance, exclusively owned here.
    pub instance: Option<I>,
    /// Event id bound to `instance`. Cleared the moment a stop is issued so
    /// the next start is never blocked by an outgoing fade tail.
    pub event: Option<String>,
    /// Theme last requested through the theme-level API; raw event playback
    /// leaves this unset.
    pub theme: Option<String>,
    /// Last volume received from the settings publisher, applied to every
    /// newly started instance.
    pub volume: f32,
}

impl<I> Session<I> {
    pub fn new() -> Self {
        Self {
            instance: None,
            event: None,
            theme: None,
            volume: 1.0,
        }
    }

    /// Takes the active instance and its event id, leaving the session with
    /// nothing bound.
    pub fn take_active(&mut self) -> Option<(I, Option<String>)> {
        let instance = self.instance.take()?;
        Some((instance, self.event.take()))
    }
}
