// Wavecast
// Copyright (c) 2026 The Project Wavecast Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `buffer` module implements the producer/consumer queue of sample vectors
//! that joins a device thread to a worker thread.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::sample::IqSample;

struct QueueState {
    vectors: VecDeque<Vec<IqSample>>,
    /// Total queued length in samples, not vectors.
    samples: usize,
    ended: bool,
}

/// A FIFO of sample vectors with an end-of-stream marker.
///
/// The queue does not bound or drop; if the producer outpaces the consumer the
/// queue grows, and the consumer is expected to watch
/// [`queued_samples`](SampleQueue::queued_samples) for overrun.
pub struct SampleQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl SampleQueue {
    pub fn new() -> SampleQueue {
        SampleQueue {
            state: Mutex::new(QueueState {
                vectors: VecDeque::new(),
                samples: 0,
                ended: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Appends a sample vector. Pushes after the end marker are discarded.
    pub fn push(&self, samples: Vec<IqSample>) {
        let mut state = self.state.lock().unwrap();

        if state.ended {
            return;
        }

        state.samples += samples.len();
        state.vectors.push_back(samples);
        self.available.notify_all();
    }

    /// Marks the end of the stream. Queued vectors remain pullable.
    pub fn push_end(&self) {
        let mut state = self.state.lock().unwrap();
        state.ended = true;
        self.available.notify_all();
    }

    /// Removes and returns the oldest vector, blocking while the queue is empty.
    ///
    /// Once the end marker is reached and the queue has drained, an empty vector
    /// is returned.
    pub fn pull(&self) -> Vec<IqSample> {
        let mut state = self.state.lock().unwrap();

        loop {
            if let Some(samples) = state.vectors.pop_front() {
                state.samples -= samples.len();
                return samples;
            }

            if state.ended {
                return Vec::new();
            }

            state = self.available.wait(state).unwrap();
        }
    }

    /// As [`pull`](SampleQueue::pull), but gives up after `timeout` so that the
    /// caller may observe a stop flag. Returns `None` on timeout.
    pub fn pull_timeout(&self, timeout: Duration) -> Option<Vec<IqSample>> {
        let mut state = self.state.lock().unwrap();

        loop {
            if let Some(samples) = state.vectors.pop_front() {
                state.samples -= samples.len();
                return Some(samples);
            }

            if state.ended {
                return Some(Vec::new());
            }

            let (next, result) = self.available.wait_timeout(state, timeout).unwrap();
            state = next;

            if result.timed_out() && state.vectors.is_empty() && !state.ended {
                return None;
            }
        }
    }

    /// The current queue length in samples.
    pub fn queued_samples(&self) -> usize {
        self.state.lock().unwrap().samples
    }

    /// Blocks until at least `min_samples` samples are queued, the stream ends, or
    /// `timeout` elapses. Returns `true` only if the fill level was reached.
    pub fn wait_min_fill(&self, min_samples: usize, timeout: Duration) -> bool {
        let mut state = self.state.lock().unwrap();

        loop {
            if state.samples >= min_samples {
                return true;
            }

            if state.ended {
                return false;
            }

            let (next, result) = self.available.wait_timeout(state, timeout).unwrap();
            state = next;

            if result.timed_out() {
                return state.samples >= min_samples;
            }
        }
    }
}

impl Default for SampleQueue {
    fn default() -> Self {
        SampleQueue::new()
    }
}
