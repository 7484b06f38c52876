//! Frame acquisition, analysis threading and result delivery

pub mod buffer;
pub mod events;
pub mod sink;
pub mod processor;

pub use buffer::{FrameConsumer, FrameProducer, FrameRingBuffer};
pub use events::{AnalysisEvent, EventBus};
pub use sink::{CsvFrameSink, FrameSink};
pub use processor::{ProcessorStats, RheedProcessor};
