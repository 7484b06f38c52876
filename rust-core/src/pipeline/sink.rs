//! Per-frame record output

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::error::{Result, RheedError};
use crate::regions::AggregatedSample;
use crate::series::SampleValue;

/// Receives one record per analyzed frame
pub trait FrameSink: Send {
    fn write_frame(&mut self, timestamp: f64, samples: &[AggregatedSample]) -> Result<()>;
}

/// Delimited text sink
///
/// Each row is the frame timestamp followed by a `region, kind, value`
/// triple for every region that produced a sample. Line profiles are written
/// as one `;`-joined field. Rows are flushed as they are written.
pub struct CsvFrameSink<W: Write> {
    writer: Writer<W>,
    rows: usize,
}

impl<W: Write> CsvFrameSink<W> {
    pub fn new(inner: W) -> Self {
        let writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(inner);
        Self { writer, rows: 0 }
    }

    /// Rows written so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and return the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| RheedError::Io(e.into_error()))
    }
}

impl CsvFrameSink<File> {
    /// Create (or truncate) a file sink
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

fn format_value(value: &SampleValue) -> String {
    match value {
        SampleValue::Scalar(v) => v.to_string(),
        SampleValue::Profile(profile) => profile
            .iter()
            .map(f64::to_string)
            .collect::<Vec<_>>()
            .join(";"),
    }
}

impl<W: Write + Send> FrameSink for CsvFrameSink<W> {
    fn write_frame(&mut self, timestamp: f64, samples: &[AggregatedSample]) -> Result<()> {
        let mut record = Vec::with_capacity(1 + 3 * samples.len());
        record.push(timestamp.to_string());
        for sample in samples {
            record.push(sample.region.to_string());
            record.push(sample.kind.to_string());
            record.push(format_value(&sample.sample.value));
        }

        self.writer.write_record(&record)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::{RegionId, RegionKind};
    use crate::series::Sample;

    #[test]
    fn test_rows_hold_region_triples() {
        let mut sink = CsvFrameSink::new(Vec::new());
        let samples = vec![
            AggregatedSample {
                region: RegionId::from("blue"),
                kind: RegionKind::Rectangle,
                sample: Sample::scalar(0.5, 12.25),
            },
            AggregatedSample {
                region: RegionId::from("red"),
                kind: RegionKind::Line,
                sample: Sample::profile(0.5, vec![1.0, 2.5, 3.0]),
            },
        ];

        sink.write_frame(0.5, &samples).unwrap();
        sink.write_frame(0.6, &[]).unwrap();
        assert_eq!(sink.rows(), 2);

        let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "0.5,blue,rectangle,12.25,red,line,1;2.5;3");
        assert_eq!(lines[1], "0.6");
    }
}
