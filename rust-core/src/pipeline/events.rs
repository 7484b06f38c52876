//! Publish/subscribe notifications from the analysis context

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use log::debug;

use crate::regions::RegionId;
use crate::spectrum::SpectralAnalysis;

/// Events emitted while frames are analyzed.
#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    /// A region's series gained a sample.
    SeriesUpdated { region: RegionId, timestamp: f64 },
    /// A line region produced a new profile.
    ProfileUpdated {
        region: RegionId,
        profile: Arc<Vec<f64>>,
    },
    /// Spectrum and peaks were recomputed for a region.
    SpectrumUpdated {
        region: RegionId,
        analysis: Arc<SpectralAnalysis>,
    },
    /// A region was removed and its data discarded.
    RegionRemoved { region: RegionId },
}

impl AnalysisEvent {
    pub fn region(&self) -> &RegionId {
        match self {
            AnalysisEvent::SeriesUpdated { region, .. }
            | AnalysisEvent::ProfileUpdated { region, .. }
            | AnalysisEvent::SpectrumUpdated { region, .. }
            | AnalysisEvent::RegionRemoved { region } => region,
        }
    }
}

/// Fan-out of events to any number of subscribers
///
/// Subscribers that dropped their receiver are pruned on the next publish.
#[derive(Debug, Default, Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<AnalysisEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<AnalysisEvent> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    pub fn publish(&self, event: AnalysisEvent) {
        let Ok(mut subscribers) = self.subscribers.lock() else {
            return;
        };
        let before = subscribers.len();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        if subscribers.len() < before {
            debug!("Dropped {} closed subscriber(s)", before - subscribers.len());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}
