//! Progressive reveal of a task's description
//!
//! A completed [`TaskRecord`] is expanded into snapshots whose description
//! grows by `chunk_size` characters per frame, so the client can render a
//! typing effect instead of the card popping in whole:
//!
//! - frame 0: every field final, description empty
//! - frames 1..=k: description is the first `min(len, i * chunk_size)` chars;
//!   frame k carries the full text and is the complete record itself
//!
//! An empty description gives exactly two frames: the empty snapshot and the
//! final record.

use std::time::Duration;

use futures::Stream;

use crate::config::RevealConfig;
use crate::utils::{char_len, truncate_str};

use super::types::TaskRecord;

#[derive(Debug, Clone)]
pub struct RevealEncoder {
    chunk_size: usize,
    frame_delay: Duration,
}

impl RevealEncoder {
    pub fn new(chunk_size: usize, frame_delay: Duration) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            frame_delay,
        }
    }

    pub fn from_config(config: &RevealConfig) -> Self {
        Self::new(config.chunk_size, Duration::from_millis(config.frame_delay_ms))
    }

    /// Same framing, no pacing
    pub fn without_delay(mut self) -> Self {
        self.frame_delay = Duration::ZERO;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn frame_delay(&self) -> Duration {
        self.frame_delay
    }

    /// Number of frames produced for a description of `chars` characters
    pub fn frame_count(&self, chars: usize) -> usize {
        if chars == 0 {
            2
        } else {
            chars.div_ceil(self.chunk_size) + 1
        }
    }

    /// Lazy, unpaced frame sequence for `record`
    pub fn frames(&self, record: &TaskRecord) -> RevealFrames {
        let total_chars = char_len(&record.description);
        RevealFrames {
            record: record.clone(),
            chunk_size: self.chunk_size,
            total_chars,
            count: self.frame_count(total_chars),
            index: 0,
        }
    }

    /// Frame sequence with the inter-frame delay applied between prefix
    /// frames. Dropping the stream mid-sleep stops it cleanly.
    pub fn reveal(&self, record: &TaskRecord) -> impl Stream<Item = TaskRecord> + Send + 'static {
        let frames = self.frames(record);
        let delay = self.frame_delay;

        async_stream::stream! {
            for (i, frame) in frames.enumerate() {
                if i >= 2 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                yield frame;
            }
        }
    }
}

impl Default for RevealEncoder {
    fn default() -> Self {
        Self::from_config(&RevealConfig::default())
    }
}

/// Iterator over the reveal frames of one record
#[derive(Debug, Clone)]
pub struct RevealFrames {
    record: TaskRecord,
    chunk_size: usize,
    total_chars: usize,
    count: usize,
    index: usize,
}

impl Iterator for RevealFrames {
    type Item = TaskRecord;

    fn next(&mut self) -> Option<TaskRecord> {
        if self.index >= self.count {
            return None;
        }
        let i = self.index;
        self.index += 1;

        if i == 0 {
            return Some(self.record.with_description(""));
        }

        let prefix_len = (i * self.chunk_size).min(self.total_chars);
        if prefix_len == self.total_chars {
            Some(self.record.clone())
        } else {
            Some(
                self.record
                    .with_description(truncate_str(&self.record.description, prefix_len)),
            )
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RevealFrames {}
