//! Time series storage and the helpers every analysis stage pairs data with

pub mod snip;
pub mod cutoff;
pub mod buffer;

pub use snip::{snip, snip_vecs};
pub use cutoff::apply_cutoffs;
pub use buffer::{Sample, SampleValue, Series, SeriesSnapshot, SharedSeries};
