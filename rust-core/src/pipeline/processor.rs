//! RHEED processor: acquisition and analysis off the caller's thread
//!
//! The acquisition thread pulls frames from a `FrameSource` into a bounded
//! ring buffer; the analysis thread aggregates every region, publishes
//! events, writes the sink record and periodically recomputes spectra.
//! Callers only mutate regions and read results.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use ndarray::Array2;

use super::buffer::{FrameConsumer, FrameProducer, FrameRingBuffer};
use super::events::{AnalysisEvent, EventBus};
use super::sink::FrameSink;
use crate::camera::{FrameRateMeter, FrameSource};
use crate::config::AnalysisConfig;
use crate::error::{Result, RheedError};
use crate::frame::Frame;
use crate::regions::{
    aggregate_frame, AggregatedSample, ChannelSelection, Region, RegionId, RegionKind, RegionSet,
    Shape,
};
use crate::series::{SampleValue, SeriesSnapshot};
use crate::spectrum::{SpectralAnalysis, SpectrumAnalyzer, SpectrumConfig};

const IDLE_SLEEP: Duration = Duration::from_micros(100);

/// Counters describing processor throughput
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProcessorStats {
    /// Frames read from the source
    pub frames_acquired: u64,

    /// Frames aggregated by the analysis context
    pub frames_processed: u64,

    /// Frames discarded because the queue was full
    pub frames_dropped: u64,

    /// Measured acquisition rate (frames per second)
    pub frame_rate: f64,
}

/// State shared between the caller and the worker threads
///
/// Region events are published while holding the `spectra` lock. Removal
/// holds the same lock from marking the region removed until its
/// `RegionRemoved` event is out, so no event for a region follows it.
struct Shared {
    regions: RegionSet,
    analyzer: Mutex<SpectrumAnalyzer>,
    spectra: Mutex<HashMap<RegionId, Arc<SpectralAnalysis>>>,
    events: EventBus,
    sink: Mutex<Option<Box<dyn FrameSink>>>,
    spectrum_interval: AtomicU64,
    frames_acquired: AtomicU64,
    frames_processed: AtomicU64,
    frames_dropped: AtomicU64,
    frame_rate: Mutex<FrameRateMeter>,
}

impl Shared {
    fn analyze_frame(&self, frame: &Frame) -> Vec<AggregatedSample> {
        let regions = self.regions.active();
        let samples = aggregate_frame(frame, &regions);

        {
            let _published = self.spectra.lock().unwrap_or_else(PoisonError::into_inner);
            for aggregated in &samples {
                let removed = regions
                    .iter()
                    .find(|r| r.id() == &aggregated.region)
                    .map_or(true, |r| r.is_removed());
                if removed {
                    continue;
                }
                self.events.publish(AnalysisEvent::SeriesUpdated {
                    region: aggregated.region.clone(),
                    timestamp: aggregated.sample.timestamp,
                });
                if let SampleValue::Profile(profile) = &aggregated.sample.value {
                    self.events.publish(AnalysisEvent::ProfileUpdated {
                        region: aggregated.region.clone(),
                        profile: Arc::new(profile.clone()),
                    });
                }
            }
        }

        if let Ok(mut sink) = self.sink.lock() {
            if let Some(sink) = sink.as_mut() {
                if let Err(e) = sink.write_frame(frame.timestamp(), &samples) {
                    warn!("Failed to write frame record: {}", e);
                }
            }
        }

        let processed = self.frames_processed.fetch_add(1, Ordering::SeqCst) + 1;
        let interval = self.spectrum_interval.load(Ordering::SeqCst).max(1);
        if processed % interval == 0 {
            self.refresh_spectra();
        }

        samples
    }

    fn analyze_region(&self, region: &Region) -> Option<Arc<SpectralAnalysis>> {
        let snapshot = region.series().snapshot()?;
        let analysis = {
            let mut analyzer = self.analyzer.lock().ok()?;
            analyzer.analyze(&snapshot)?
        };
        let analysis = Arc::new(analysis);

        let mut spectra = self.spectra.lock().ok()?;
        if region.is_removed() {
            return None;
        }
        spectra.insert(region.id().clone(), Arc::clone(&analysis));
        self.events.publish(AnalysisEvent::SpectrumUpdated {
            region: region.id().clone(),
            analysis: Arc::clone(&analysis),
        });
        Some(analysis)
    }

    fn refresh_spectra(&self) {
        for region in self.regions.active() {
            if region.kind() == RegionKind::Line {
                continue;
            }
            if self.analyze_region(&region).is_none() {
                debug!("No spectrum for region '{}' yet", region.id());
            }
        }
    }
}

/// Real-time RHEED analysis engine
pub struct RheedProcessor {
    shared: Arc<Shared>,
    config: AnalysisConfig,
    running: Arc<AtomicBool>,
    acquisition_done: Arc<AtomicBool>,
    acquisition_thread: Option<JoinHandle<()>>,
    analysis_thread: Option<JoinHandle<()>>,
}

impl RheedProcessor {
    /// Create an idle processor
    pub fn new(config: AnalysisConfig) -> Self {
        let shared = Shared {
            regions: RegionSet::new(),
            analyzer: Mutex::new(SpectrumAnalyzer::new(config.spectrum.clone())),
            spectra: Mutex::new(HashMap::new()),
            events: EventBus::new(),
            sink: Mutex::new(None),
            spectrum_interval: AtomicU64::new(config.pipeline.spectrum_interval_frames as u64),
            frames_acquired: AtomicU64::new(0),
            frames_processed: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            frame_rate: Mutex::new(FrameRateMeter::new()),
        };

        Self {
            shared: Arc::new(shared),
            config,
            running: Arc::new(AtomicBool::new(false)),
            acquisition_done: Arc::new(AtomicBool::new(false)),
            acquisition_thread: None,
            analysis_thread: None,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Start acquiring from `source` and analyzing on a worker thread
    ///
    /// # Errors
    /// `AlreadyRunning` if a previous run has not been stopped
    pub fn start(&mut self, source: Box<dyn FrameSource>) -> Result<()> {
        if self.acquisition_thread.is_some() || self.analysis_thread.is_some() {
            return Err(RheedError::AlreadyRunning);
        }

        let rb = FrameRingBuffer::new(self.config.pipeline.frame_queue_capacity);
        let (producer, consumer) = rb.split();

        self.running.store(true, Ordering::SeqCst);
        self.acquisition_done.store(false, Ordering::SeqCst);
        if let Ok(mut meter) = self.shared.frame_rate.lock() {
            meter.reset();
        }

        info!(
            "Starting processor on '{}' (queue {} frames)",
            source.name(),
            self.config.pipeline.frame_queue_capacity
        );

        let shared = Arc::clone(&self.shared);
        let running = Arc::clone(&self.running);
        let done = Arc::clone(&self.acquisition_done);
        let block_when_full = self.config.pipeline.block_when_full;
        self.acquisition_thread = Some(std::thread::spawn(move || {
            acquisition_loop(source, producer, &shared, &running, block_when_full);
            done.store(true, Ordering::SeqCst);
        }));

        let shared = Arc::clone(&self.shared);
        let running = Arc::clone(&self.running);
        let done = Arc::clone(&self.acquisition_done);
        self.analysis_thread = Some(std::thread::spawn(move || {
            analysis_loop(consumer, &shared, &running, &done);
        }));

        Ok(())
    }

    /// Stop both threads, discarding queued frames
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.join_threads();
    }

    /// Wait for a finite source to be fully analyzed
    ///
    /// Blocks forever on a source that never ends; use `stop` for those.
    pub fn wait(&mut self) {
        self.join_threads();
        self.running.store(false, Ordering::SeqCst);
    }

    fn join_threads(&mut self) {
        let was_running = self.acquisition_thread.is_some();
        if let Some(handle) = self.acquisition_thread.take() {
            if handle.join().is_err() {
                error!("Acquisition thread panicked");
            }
        }
        if let Some(handle) = self.analysis_thread.take() {
            if handle.join().is_err() {
                error!("Analysis thread panicked");
            }
        }
        if was_running {
            let stats = self.stats();
            info!(
                "Processor stopped: {} acquired, {} processed, {} dropped",
                stats.frames_acquired, stats.frames_processed, stats.frames_dropped
            );
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.acquisition_done.load(Ordering::SeqCst)
    }

    /// Run one analysis step on the caller's thread
    pub fn process_frame(&self, frame: &Frame) -> Vec<AggregatedSample> {
        self.shared.analyze_frame(frame)
    }

    /// Define a new region
    pub fn add_region(
        &self,
        id: impl Into<RegionId>,
        shape: Shape,
        channel: ChannelSelection,
    ) -> Result<()> {
        let region = Region::new(id.into(), shape, channel, self.config.line_scan.max_width)?;
        self.shared.regions.add(region)?;
        Ok(())
    }

    /// Remove a region and discard its series, line scan and spectrum
    pub fn remove_region(&self, id: &RegionId) -> Result<()> {
        let mut spectra = self
            .shared
            .spectra
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.shared.regions.remove(id)?;
        spectra.remove(id);
        self.shared
            .events
            .publish(AnalysisEvent::RegionRemoved { region: id.clone() });
        Ok(())
    }

    /// Remove every region
    pub fn clear_regions(&self) {
        let mut spectra = self
            .shared
            .spectra
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for id in self.shared.regions.clear() {
            spectra.remove(&id);
            self.shared
                .events
                .publish(AnalysisEvent::RegionRemoved { region: id });
        }
    }

    /// Move or resize a region, keeping its data
    pub fn update_shape(&self, id: &RegionId, shape: Shape) -> Result<()> {
        self.shared.regions.update_shape(id, shape)
    }

    pub fn regions(&self) -> Vec<Arc<Region>> {
        self.shared.regions.active()
    }

    pub fn subscribe(&self) -> std::sync::mpsc::Receiver<AnalysisEvent> {
        self.shared.events.subscribe()
    }

    /// Scalar view of a region's series
    pub fn series(&self, id: &RegionId) -> Option<SeriesSnapshot> {
        self.shared.regions.get(id)?.series().snapshot()
    }

    /// Most recently computed spectrum of a region
    pub fn spectrum(&self, id: &RegionId) -> Option<Arc<SpectralAnalysis>> {
        self.shared.spectra.lock().ok()?.get(id).cloned()
    }

    /// Compute a region's spectrum now
    ///
    /// # Returns
    /// `Ok(None)` if the series cannot be analyzed yet
    pub fn analyze_region(&self, id: &RegionId) -> Result<Option<Arc<SpectralAnalysis>>> {
        let region = self
            .shared
            .regions
            .get(id)
            .ok_or_else(|| RheedError::UnknownRegion(id.to_string()))?;
        Ok(self.shared.analyze_region(&region))
    }

    /// Recompute spectra for every rectangle and ellipse
    pub fn refresh_spectra(&self) {
        self.shared.refresh_spectra();
    }

    /// Line-scan image of a line region as `(position, time)`
    pub fn line_scan(&self, id: &RegionId) -> Option<Array2<f64>> {
        Some(self.shared.regions.get(id)?.line_scan()?.to_array())
    }

    pub fn latest_profile(&self, id: &RegionId) -> Option<Vec<f64>> {
        self.shared.regions.get(id)?.series().latest_profile()
    }

    /// Replace the spectrum settings
    pub fn update_spectrum_config(&mut self, config: SpectrumConfig) {
        if let Ok(mut analyzer) = self.shared.analyzer.lock() {
            analyzer.update_config(config.clone());
        }
        self.config.spectrum = config;
    }

    /// Change how often spectra are recomputed
    pub fn set_spectrum_interval(&mut self, frames: usize) {
        let frames = frames.max(1);
        self.shared
            .spectrum_interval
            .store(frames as u64, Ordering::SeqCst);
        self.config.pipeline.spectrum_interval_frames = frames;
    }

    /// Write one record per analyzed frame to `sink`
    pub fn set_sink(&self, sink: Box<dyn FrameSink>) {
        if let Ok(mut guard) = self.shared.sink.lock() {
            *guard = Some(sink);
        }
    }

    /// Detach and return the current sink
    pub fn take_sink(&self) -> Option<Box<dyn FrameSink>> {
        self.shared.sink.lock().ok()?.take()
    }

    pub fn stats(&self) -> ProcessorStats {
        ProcessorStats {
            frames_acquired: self.shared.frames_acquired.load(Ordering::SeqCst),
            frames_processed: self.shared.frames_processed.load(Ordering::SeqCst),
            frames_dropped: self.shared.frames_dropped.load(Ordering::SeqCst),
            frame_rate: self
                .shared
                .frame_rate
                .lock()
                .map(|meter| meter.fps())
                .unwrap_or(0.0),
        }
    }
}

impl Default for RheedProcessor {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl Drop for RheedProcessor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn acquisition_loop(
    mut source: Box<dyn FrameSource>,
    mut producer: FrameProducer,
    shared: &Shared,
    running: &AtomicBool,
    block_when_full: bool,
) {
    let started = Instant::now();

    while running.load(Ordering::SeqCst) {
        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("Source '{}' exhausted", source.name());
                return;
            }
            Err(e) => {
                error!("Failed to read frame from '{}': {}", source.name(), e);
                return;
            }
        };

        shared.frames_acquired.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut meter) = shared.frame_rate.lock() {
            meter.record(started.elapsed().as_secs_f64());
        }

        let mut pending = frame;
        loop {
            match producer.push(pending) {
                Ok(()) => break,
                Err(rejected) if block_when_full && running.load(Ordering::SeqCst) => {
                    pending = rejected;
                    std::thread::sleep(IDLE_SLEEP);
                }
                Err(rejected) => {
                    let dropped = shared.frames_dropped.fetch_add(1, Ordering::SeqCst) + 1;
                    if dropped == 1 || dropped % 100 == 0 {
                        warn!(
                            "Frame queue full, dropped frame at t={} ({} dropped so far)",
                            rejected.timestamp(),
                            dropped
                        );
                    }
                    break;
                }
            }
        }
    }
}

fn analysis_loop(
    mut consumer: FrameConsumer,
    shared: &Shared,
    running: &AtomicBool,
    acquisition_done: &AtomicBool,
) {
    while running.load(Ordering::SeqCst) {
        if let Some(frame) = consumer.pop() {
            shared.analyze_frame(&frame);
        } else if acquisition_done.load(Ordering::SeqCst) {
            // Nothing can arrive any more
            if consumer.is_empty() {
                break;
            }
        } else {
            std::thread::sleep(IDLE_SLEEP);
        }
    }
    shared.refresh_spectra();
}
