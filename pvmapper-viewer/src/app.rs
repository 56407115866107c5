//! Inspector host: the dataset model and everything that reacts to it.
//!
//! A presentation layer owns one [`Inspector`] and calls
//! [`update`](Inspector::update) once per frame of its event loop.

use std::sync::mpsc::Receiver;

use crate::pipeline::AnalysisJobRunner;
use crate::state::{DatasetEvent, DatasetModel};
use crate::viewer::{map_signal, FrameSettings, FrameView, MapBridge, MapSettings, MapSignal};

/// Main inspector state.
pub struct Inspector {
    /// The dataset model.
    model: DatasetModel,
    /// Source frame view.
    frame: FrameView,
    /// Map renderer bridge.
    map: MapBridge,
    /// Analysis job runner.
    jobs: AnalysisJobRunner,
    /// Model events not applied yet.
    events: Receiver<DatasetEvent>,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new(FrameSettings::default(), MapSettings::default())
    }
}

impl Inspector {
    /// Creates an inspector with a closed dataset.
    #[must_use]
    pub fn new(frame: FrameSettings, map: MapSettings) -> Self {
        let mut model = DatasetModel::new();
        let events = model.subscribe();
        Self {
            model,
            frame: FrameView::new(frame),
            map: MapBridge::new(map),
            jobs: AnalysisJobRunner::new(),
            events,
        }
    }

    /// The dataset model.
    #[must_use]
    pub fn model(&self) -> &DatasetModel {
        &self.model
    }

    /// Mutable access to the dataset model.
    pub fn model_mut(&mut self) -> &mut DatasetModel {
        &mut self.model
    }

    /// The frame view.
    #[must_use]
    pub fn frame(&self) -> &FrameView {
        &self.frame
    }

    /// Mutable access to the frame view settings.
    pub fn frame_mut(&mut self) -> &mut FrameView {
        &mut self.frame
    }

    /// The map bridge.
    #[must_use]
    pub fn map(&self) -> &MapBridge {
        &self.map
    }

    /// Replaces the map coloring.
    pub fn set_map_settings(&mut self, settings: MapSettings) -> Option<MapSignal> {
        self.map.set_settings(settings)
    }

    /// Handles a module click from the map renderer.
    ///
    /// # Errors
    /// Returns `MalformedData` if the request carries no track id.
    pub fn update_images(&mut self, request: &str) -> pvmapper_core::Result<()> {
        self.map.update_images(&mut self.model, request)
    }

    /// The analysis job runner and the model it reports to.
    pub fn jobs_mut(&mut self) -> (&mut AnalysisJobRunner, &mut DatasetModel) {
        (&mut self.jobs, &mut self.model)
    }

    /// The analysis job runner.
    #[must_use]
    pub fn jobs(&self) -> &AnalysisJobRunner {
        &self.jobs
    }

    /// Applies job messages and model events, then re-renders the frame
    /// view if needed.
    ///
    /// Returns the map notifications to forward to the renderer, collapsed
    /// so that consecutive duplicates appear once.
    pub fn update(&mut self) -> Vec<MapSignal> {
        self.jobs.poll(&mut self.model);

        let mut signals: Vec<MapSignal> = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            self.frame.handle_event(&event);
            if let Some(signal) = map_signal(&event) {
                if signals.last() != Some(&signal) {
                    signals.push(signal);
                }
            }
        }
        self.frame.refresh(&self.model);
        signals
    }
}
