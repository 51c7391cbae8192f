//! Plan stream transport
//!
//! Turns a [`PlannerLoop`] into the ordered frame stream written to one
//! client. Frames for task *i* are all produced before the planner is asked
//! for task *i + 1*, and exactly one status frame ends a run that was not
//! cancelled.
//!
//! Cancellation has two sources. Dropping the stream (the client went away)
//! drops the in-flight oracle call with it. Cancelling the token stops the
//! stream at the next oracle await or pacing sleep. Neither writes an error
//! frame.

use futures::{Stream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::planning::{PlanEvent, PlannerLoop, RevealEncoder};

use super::types::WireEvent;

pub struct StreamTransport {
    encoder: RevealEncoder,
    cancel: CancellationToken,
}

/// Logs when a stream goes away before its terminal frame
struct CloseGuard {
    terminated: bool,
}

impl Drop for CloseGuard {
    fn drop(&mut self) {
        if !self.terminated {
            tracing::debug!("Plan stream closed before completion");
        }
    }
}

impl StreamTransport {
    pub fn new(encoder: RevealEncoder, cancel: CancellationToken) -> Self {
        Self { encoder, cancel }
    }

    /// Frame stream for one planning run
    pub fn events(self, planner: PlannerLoop) -> impl Stream<Item = WireEvent> + Send + 'static {
        let Self { encoder, cancel } = self;

        async_stream::stream! {
            let mut planner = planner;
            let mut guard = CloseGuard { terminated: false };

            'run: loop {
                let event = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        tracing::debug!("Plan stream cancelled while awaiting the oracle");
                        break 'run;
                    }
                    event = planner.next_event() => event,
                };

                match event {
                    Some(PlanEvent::Task(record)) => {
                        let frames = encoder.reveal(&record);
                        futures::pin_mut!(frames);

                        loop {
                            let frame = tokio::select! {
                                biased;
                                _ = cancel.cancelled() => {
                                    tracing::debug!("Plan stream cancelled during reveal of {}", record.id);
                                    break 'run;
                                }
                                frame = frames.next() => frame,
                            };

                            match frame {
                                Some(_) if cancel.is_cancelled() => break 'run,
                                Some(frame) => yield WireEvent::Task(frame),
                                None => break,
                            }
                        }
                    }
                    Some(PlanEvent::Completed { capped }) => {
                        tracing::info!(
                            "Plan stream completed with {} tasks{}",
                            planner.state().len(),
                            if capped { " (capped)" } else { "" }
                        );
                        guard.terminated = true;
                        yield WireEvent::completed();
                        break 'run;
                    }
                    Some(PlanEvent::Failed(e)) => {
                        tracing::warn!(
                            "Plan stream ended with error after {} tasks: {}",
                            planner.state().len(),
                            e
                        );
                        guard.terminated = true;
                        yield WireEvent::error(e.public_detail());
                        break 'run;
                    }
                    None => {
                        guard.terminated = true;
                        break 'run;
                    }
                }
            }
        }
    }
}

/// Write a frame stream as server-push frames to `writer`, flushing after
/// each frame. Returns the number of frames written.
pub async fn write_sse<S, W>(events: S, writer: &mut W) -> anyhow::Result<usize>
where
    S: Stream<Item = WireEvent>,
    W: AsyncWrite + Unpin,
{
    futures::pin_mut!(events);
    let mut written = 0;

    while let Some(event) = events.next().await {
        writer.write_all(event.to_sse_frame().as_bytes()).await?;
        writer.flush().await?;
        written += 1;
    }

    Ok(written)
}
