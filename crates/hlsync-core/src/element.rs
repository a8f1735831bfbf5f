//! Native media element seam

use crate::{events::EventSink, Error, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use url::Url;

/// The platform's media element (a `<video>` tag, a native player view, ...)
///
/// Setters take effect immediately; the element reports resulting state
/// changes through the subscribed [`EventSink`] as [`ElementEvent`]s.
///
/// [`ElementEvent`]: crate::events::ElementEvent
pub trait MediaElement: Send {
    fn src(&self) -> Option<Url>;
    fn set_src(&mut self, url: &Url);

    fn current_time(&self) -> f64;
    /// The element clamps out-of-range positions itself
    fn set_current_time(&mut self, seconds: f64);

    /// Zero until metadata is loaded
    fn duration(&self) -> f64;

    fn volume(&self) -> f64;
    fn set_volume(&mut self, volume: f64);

    fn muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);

    /// May be refused by the platform (autoplay policy and similar)
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);

    /// Whether the element can play `mime` without an engine
    fn can_play_type(&self, mime: &str) -> bool;

    /// Register the listener that receives element events
    fn subscribe(&mut self, sink: EventSink);

    /// Drop every registered listener
    fn unsubscribe(&mut self);
}

/// Element handle shared between the mirror and the engine it is attached to
pub type SharedElement = Arc<Mutex<dyn MediaElement>>;

/// Wrap an element for use by a mirror
pub fn shared<E: MediaElement + 'static>(element: E) -> SharedElement {
    Arc::new(Mutex::new(element))
}

pub(crate) fn lock(element: &SharedElement) -> Result<MutexGuard<'_, dyn MediaElement + 'static>> {
    element
        .lock()
        .map_err(|_| Error::ElementUnavailable("media element lock poisoned".into()))
}
