//! Observer events emitted by the dataset model.

use std::sync::mpsc::{channel, Receiver, Sender};

/// Changes of the dataset model, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetEvent {
    /// A dataset was opened.
    Opened,
    /// The dataset was closed.
    Closed,
    /// The active source was replaced, features and metadata together.
    SourceChanged(String),
    /// The list of source names was re-read.
    SourceNamesUpdated,
    /// The active source no longer has a backing directory.
    SourceInvalidated(String),
    /// The selected column index changed.
    SelectedColumnChanged(Option<usize>),
    /// Another module was selected for the frame view.
    TrackChanged(String),
    /// The inspected patch of the selected module changed.
    PatchIndexChanged(usize),
}

/// Fan-out of [`DatasetEvent`]s to any number of subscribers.
///
/// Subscribers whose receiver was dropped are forgotten on the next emit.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<DatasetEvent>>,
}

impl EventBus {
    /// Registers a new subscriber.
    pub fn subscribe(&mut self) -> Receiver<DatasetEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Delivers `event` to every live subscriber.
    pub fn emit(&mut self, event: &DatasetEvent) {
        log::debug!("dataset event {event:?}");
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
