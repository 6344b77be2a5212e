//! Adaptive read loop for unframed device output.
//!
//! Interactive shells give no length prefix and no terminator, so the
//! end of a response is inferred: stop when a prompt marker settles,
//! when output goes idle, or when the per-response ceiling is reached.

use std::time::Duration;

use bytes::BytesMut;
use log::{debug, trace};
use tokio::time::Instant;

use super::{DeviceChannel, PromptMarkers, READ_CHUNK_SIZE, Timing};
use crate::error::Result;

/// Why a read ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadEnd {
    /// A prompt marker was sighted and no more data followed it.
    PromptSettled,

    /// Some output arrived, then nothing for longer than the idle
    /// threshold.
    IdleGap,

    /// The per-response ceiling was reached.
    Ceiling,
}

/// Outcome of one adaptive read.
#[derive(Debug)]
pub struct ReadOutcome {
    /// Decoded and trimmed response text.
    pub text: String,

    /// Why the read ended.
    pub ended: ReadEnd,

    /// How long the read took.
    pub elapsed: Duration,
}

/// Collect one response from the channel.
///
/// Polls for chunks until one of three conditions ends the read:
///
/// 1. A marker appears in the buffer tail and the channel stays quiet
///    for `settle_delay` afterwards ([`ReadEnd::PromptSettled`]).
/// 2. Output has arrived but then stops for longer than
///    `idle_threshold` ([`ReadEnd::IdleGap`]).
/// 3. `max_wait` elapses ([`ReadEnd::Ceiling`]). A silent device ends
///    here with empty text.
///
/// Raw bytes are accumulated and decoded once at the end, so multi-byte
/// sequences split across chunk boundaries never produce stray
/// replacement characters in marker checks.
pub async fn read_to_idle<C: DeviceChannel>(
    channel: &mut C,
    markers: &PromptMarkers,
    timing: &Timing,
) -> Result<ReadOutcome> {
    let start = Instant::now();
    let mut buf = BytesMut::with_capacity(READ_CHUNK_SIZE);
    let mut last_data = start;

    let ended = 'read: loop {
        let remaining = timing.max_wait.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            break ReadEnd::Ceiling;
        }

        let wait = timing.poll_interval.min(remaining);
        match channel.read_chunk(READ_CHUNK_SIZE, wait).await? {
            Some(chunk) => {
                trace!("read chunk: {} bytes", chunk.len());
                buf.extend_from_slice(&chunk);
                last_data = Instant::now();

                // A marker in the tail usually means the prompt is back,
                // but it can also appear mid-output. Only stop once the
                // device is quiet behind it.
                while markers.seen_in_tail(&buf) {
                    if timing.max_wait.saturating_sub(start.elapsed()).is_zero() {
                        break 'read ReadEnd::Ceiling;
                    }
                    match channel.read_chunk(READ_CHUNK_SIZE, timing.settle_delay).await? {
                        Some(more) => {
                            trace!("marker settle: {} more bytes", more.len());
                            buf.extend_from_slice(&more);
                            last_data = Instant::now();
                        }
                        None => break 'read ReadEnd::PromptSettled,
                    }
                }
            }
            None => {
                if !buf.is_empty() && last_data.elapsed() > timing.idle_threshold {
                    break ReadEnd::IdleGap;
                }
            }
        }
    };

    let elapsed = start.elapsed();
    debug!(
        "read finished: {:?} after {:?}, {} bytes",
        ended,
        elapsed,
        buf.len()
    );

    let text = String::from_utf8_lossy(&buf).trim().to_string();
    Ok(ReadOutcome {
        text,
        ended,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use bytes::Bytes;

    use super::*;
    use crate::error::{ChannelError, Error};

    /// Channel that delivers scripted chunks at fixed virtual-time
    /// offsets from its creation.
    struct ScriptedChannel {
        started: Instant,
        events: VecDeque<(Duration, Bytes)>,
        sent: Vec<String>,
    }

    impl ScriptedChannel {
        fn new(events: Vec<(u64, &'static [u8])>) -> Self {
            Self {
                started: Instant::now(),
                events: events
                    .into_iter()
                    .map(|(ms, data)| (Duration::from_millis(ms), Bytes::from_static(data)))
                    .collect(),
                sent: Vec::new(),
            }
        }
    }

    impl DeviceChannel for ScriptedChannel {
        async fn read_chunk(&mut self, max: usize, wait: Duration) -> Result<Option<Bytes>> {
            let deadline = Instant::now() + wait;
            if let Some((offset, _)) = self.events.front() {
                let arrival = self.started + *offset;
                if arrival <= deadline {
                    tokio::time::sleep_until(arrival).await;
                    let (offset, mut data) = self.events.pop_front().unwrap();
                    if data.len() > max {
                        let chunk = data.split_to(max);
                        self.events.push_front((offset, data));
                        return Ok(Some(chunk));
                    }
                    return Ok(Some(data));
                }
            }
            tokio::time::sleep_until(deadline).await;
            Ok(None)
        }

        async fn send_line(&mut self, line: &str) -> Result<()> {
            self.sent.push(line.to_string());
            Ok(())
        }

        async fn close(self) -> Result<()> {
            Ok(())
        }
    }

    /// Channel whose reads always fail.
    struct BrokenChannel;

    impl DeviceChannel for BrokenChannel {
        async fn read_chunk(&mut self, _max: usize, _wait: Duration) -> Result<Option<Bytes>> {
            Err(Error::Channel(ChannelError::Closed))
        }

        async fn send_line(&mut self, _line: &str) -> Result<()> {
            Err(Error::Channel(ChannelError::Closed))
        }

        async fn close(self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_ends_on_idle_gap() {
        let mut channel = ScriptedChannel::new(vec![(0, b"alpha beta\n")]);
        let markers = PromptMarkers::default();
        let timing = Timing::default();

        let outcome = read_to_idle(&mut channel, &markers, &timing).await.unwrap();

        assert_eq!(outcome.text, "alpha beta");
        assert_eq!(outcome.ended, ReadEnd::IdleGap);
        assert!(outcome.elapsed > timing.idle_threshold);
        assert!(outcome.elapsed < timing.max_wait);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_ends_on_prompt_marker() {
        let mut channel = ScriptedChannel::new(vec![(0, b"Interface status\nSwitch1#")]);
        let markers = PromptMarkers::default();
        let timing = Timing::default();

        let outcome = read_to_idle(&mut channel, &markers, &timing).await.unwrap();

        assert_eq!(outcome.text, "Interface status\nSwitch1#");
        assert_eq!(outcome.ended, ReadEnd::PromptSettled);
        // Marker plus settle check is far faster than the idle gap
        assert!(outcome.elapsed < timing.idle_threshold);
    }

    #[tokio::test(start_paused = true)]
    async fn test_marker_sighting_waits_for_trailing_data() {
        let mut channel = ScriptedChannel::new(vec![
            (0, b"lines 1-10 --More-- >"),
            (50, b"\nlines 11-20\nSwitch1#"),
        ]);
        let markers = PromptMarkers::default();
        let timing = Timing::default();

        let outcome = read_to_idle(&mut channel, &markers, &timing).await.unwrap();

        // The early marker sighting must not cut off the second chunk
        assert!(outcome.text.contains("lines 11-20"));
        assert!(outcome.text.ends_with("Switch1#"));
        assert_eq!(outcome.ended, ReadEnd::PromptSettled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_channel_hits_ceiling_with_empty_text() {
        let mut channel = ScriptedChannel::new(vec![]);
        let markers = PromptMarkers::default();
        let timing = Timing::default();

        let outcome = read_to_idle(&mut channel, &markers, &timing).await.unwrap();

        assert!(outcome.text.is_empty());
        assert_eq!(outcome.ended, ReadEnd::Ceiling);
        assert!(outcome.elapsed >= timing.max_wait);
        // Overshoot is bounded by one poll
        assert!(outcome.elapsed <= timing.max_wait + timing.poll_interval);
    }

    #[tokio::test(start_paused = true)]
    async fn test_steady_stream_without_marker_hits_ceiling() {
        let events: Vec<(u64, &'static [u8])> =
            (0..60).map(|i| (i * 50, b"data ".as_slice())).collect();
        let mut channel = ScriptedChannel::new(events);
        let markers = PromptMarkers::default();
        let timing = Timing::default();

        let outcome = read_to_idle(&mut channel, &markers, &timing).await.unwrap();

        assert_eq!(outcome.ended, ReadEnd::Ceiling);
        assert!(outcome.text.starts_with("data"));
        assert!(outcome.elapsed >= timing.max_wait);
        assert!(outcome.elapsed <= timing.max_wait + timing.poll_interval);
    }

    #[tokio::test(start_paused = true)]
    async fn test_marker_flood_is_cut_off_at_ceiling() {
        // A marker-bearing chunk every 60ms: each settle read finds more
        // data, so the read stays in the settle path the whole time.
        let events: Vec<(u64, &'static [u8])> =
            (0..60).map(|i| (i * 60, b"Switch1# ".as_slice())).collect();
        let mut channel = ScriptedChannel::new(events);
        let markers = PromptMarkers::default();
        let timing = Timing::default();

        let outcome = read_to_idle(&mut channel, &markers, &timing).await.unwrap();

        assert_eq!(outcome.ended, ReadEnd::Ceiling);
        assert!(outcome.text.starts_with("Switch1#"));
        assert!(outcome.elapsed >= timing.max_wait);
        // The settle path must also stop at the ceiling, give or take
        // one settle read
        assert!(outcome.elapsed <= timing.max_wait + timing.settle_delay);
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_is_trimmed_and_decoded_lossily() {
        let mut channel = ScriptedChannel::new(vec![(0, b"  ok \xff done\nRouter>  ")]);
        let markers = PromptMarkers::default();
        let timing = Timing::default();

        let outcome = read_to_idle(&mut channel, &markers, &timing).await.unwrap();

        assert!(outcome.text.starts_with("ok"));
        assert!(outcome.text.ends_with("Router>"));
        // Invalid UTF-8 becomes a replacement character, not an error
        assert!(outcome.text.contains('\u{FFFD}'));
    }

    #[tokio::test(start_paused = true)]
    async fn test_large_burst_is_consumed_across_chunks() {
        const BIG: &[u8] = &[b'x'; 10_000];
        let mut channel = ScriptedChannel::new(vec![(0, BIG), (10, b"\nSwitch1#")]);
        let markers = PromptMarkers::default();
        let timing = Timing::default();

        let outcome = read_to_idle(&mut channel, &markers, &timing).await.unwrap();

        assert_eq!(outcome.text.len(), BIG.len() + "\nSwitch1#".len());
        assert_eq!(outcome.ended, ReadEnd::PromptSettled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_propagates_channel_error() {
        let outcome = read_to_idle(
            &mut BrokenChannel,
            &PromptMarkers::default(),
            &Timing::default(),
        )
        .await;

        assert!(matches!(
            outcome,
            Err(Error::Channel(ChannelError::Closed))
        ));
    }
}
