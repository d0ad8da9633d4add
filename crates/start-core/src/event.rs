//! Editor lifecycle notifications.
//!
//! Events go out over a `tokio::sync::broadcast` channel. Emitting never
//! blocks and never fails; an editor with no subscribers just drops them.

use tokio::sync::broadcast;

use crate::extension::EditorId;

/// Events emitted by an [`Editor`](crate::Editor).
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// The editor was attached to a host element
    Mounted(EditorId),
    /// The document was replaced wholesale
    ContentReplaced(EditorId),
    /// Extensions were added after construction
    ExtensionsAdded(EditorId, Vec<String>),
    /// The editor was destroyed
    Destroyed(EditorId),
}

impl EditorEvent {
    /// The editor that emitted the event.
    pub fn editor(&self) -> EditorId {
        match self {
            EditorEvent::Mounted(id)
            | EditorEvent::ContentReplaced(id)
            | EditorEvent::ExtensionsAdded(id, _)
            | EditorEvent::Destroyed(id) => *id,
        }
    }

    /// After this event the emitting editor sends nothing more.
    pub fn is_final(&self) -> bool {
        matches!(self, EditorEvent::Destroyed(_))
    }
}

/// Broadcast channel shared by one or more editors.
///
/// Pass a clone through [`EditorOptions::events`](crate::EditorOptions) to
/// have several editors report on the same bus.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EditorEvent>,
}

impl EventBus {
    pub const CAPACITY: usize = 256;

    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(Self::CAPACITY);
        Self { sender }
    }

    pub fn emit(&self, event: EditorEvent) {
        tracing::trace!(editor = %event.editor(), ?event, "editor event");
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    /// Every future event from every editor on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.sender.subscribe()
    }

    /// Future events of one editor only.
    pub fn subscribe_to(&self, editor: EditorId) -> EditorEvents {
        EditorEvents {
            editor,
            receiver: self.sender.subscribe(),
            done: false,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}

/// Events of a single editor, ending after its `Destroyed` event.
pub struct EditorEvents {
    editor: EditorId,
    receiver: broadcast::Receiver<EditorEvent>,
    done: bool,
}

impl EditorEvents {
    pub fn editor(&self) -> EditorId {
        self.editor
    }

    /// Waits for the editor's next event. Lagged events are skipped.
    pub async fn next(&mut self) -> Option<EditorEvent> {
        while !self.done {
            match self.receiver.recv().await {
                Ok(event) if event.editor() == self.editor => {
                    self.done = event.is_final();
                    return Some(event);
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(editor = %self.editor, "missed {} editor events", n);
                }
                Err(broadcast::error::RecvError::Closed) => self.done = true,
            }
        }
        None
    }

    /// Drains what is already queued without waiting.
    pub fn drain(&mut self) -> Vec<EditorEvent> {
        let mut events = Vec::new();
        while !self.done {
            match self.receiver.try_recv() {
                Ok(event) if event.editor() == self.editor => {
                    self.done = event.is_final();
                    events.push(event);
                }
                Ok(_) | Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => break,
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let id = EditorId::new();

        bus.emit(EditorEvent::Mounted(id));

        assert_eq!(rx.recv().await.unwrap(), EditorEvent::Mounted(id));
    }

    #[tokio::test]
    async fn test_subscription_filters_by_editor() {
        let bus = EventBus::new();
        let a = EditorId::new();
        let b = EditorId::new();
        let mut events = bus.subscribe_to(a);

        bus.emit(EditorEvent::Mounted(b));
        bus.emit(EditorEvent::ExtensionsAdded(a, vec!["x".into()]));
        bus.emit(EditorEvent::Destroyed(b));
        bus.emit(EditorEvent::Destroyed(a));
        bus.emit(EditorEvent::Mounted(a));

        assert_eq!(
            events.next().await,
            Some(EditorEvent::ExtensionsAdded(a, vec!["x".into()]))
        );
        assert_eq!(events.next().await, Some(EditorEvent::Destroyed(a)));
        assert_eq!(events.next().await, None);
    }

    #[tokio::test]
    async fn test_subscription_ends_when_bus_dropped() {
        let bus = EventBus::new();
        let id = EditorId::new();
        let mut events = bus.subscribe_to(id);

        bus.emit(EditorEvent::ContentReplaced(id));
        drop(bus);

        assert_eq!(events.next().await, Some(EditorEvent::ContentReplaced(id)));
        assert_eq!(events.next().await, None);
    }

    #[test]
    fn test_drain_stops_at_destroyed() {
        let bus = EventBus::new();
        let id = EditorId::new();
        let mut events = bus.subscribe_to(id);
        bus.emit(EditorEvent::Mounted(id));
        bus.emit(EditorEvent::Destroyed(id));
        bus.emit(EditorEvent::Mounted(id));

        assert_eq!(events.drain(), [EditorEvent::Mounted(id), EditorEvent::Destroyed(id)]);
        assert!(events.drain().is_empty());
    }

    #[test]
    fn test_emit_without_subscribers() {
        EventBus::new().emit(EditorEvent::Destroyed(EditorId::new()));
    }
}
