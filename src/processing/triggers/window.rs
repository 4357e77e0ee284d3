use serde::Serialize;

use crate::processing::buffers::{ChannelBufferStore, ChannelId};
use crate::processing::{Sample, ANALYSIS_WINDOW_LEN, TRIGGER_CYCLE_LENGTH};

// CYCLE COMPONENT -------------------------------------------------------------

/// Counts accepted batches modulo the cycle length.
#[derive(Debug, Clone)]
pub struct IngestionCycle {
    count: usize,
    length: usize,
}

impl IngestionCycle {
    pub fn new(length: usize) -> Self {
        Self {
            count: 0,
            length: length.max(1),
        }
    }

    pub fn value(&self) -> usize {
        self.count
    }

    /// Advances by one batch. Returns `true` when the counter wrapped to zero,
    /// i.e. this batch completed a cycle.
    pub fn advance(&mut self) -> bool {
        self.count = (self.count + 1) % self.length;
        self.count == 0
    }
}

impl Default for IngestionCycle {
    fn default() -> Self {
        Self::new(TRIGGER_CYCLE_LENGTH)
    }
}

// WINDOW COMPONENT ------------------------------------------------------------

/// Trailing slice of every channel, serialised as the analysis request body
/// `{"matrices": [[...], ...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisWindow {
    pub matrices: Vec<Vec<Sample>>,
}

impl AnalysisWindow {
    pub fn channel(&self, channel: ChannelId) -> &[Sample] {
        &self.matrices[channel.index()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// At least one channel is short; nothing is dispatched this cycle.
    InsufficientData { channel: ChannelId, length: usize },
    Ready(AnalysisWindow),
}

// TRIGGER COMPONENT -----------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WindowTrigger {
    cycle: IngestionCycle,
    window_len: usize,
}

impl WindowTrigger {
    pub fn new(cycle_length: usize, window_len: usize) -> Self {
        Self {
            cycle: IngestionCycle::new(cycle_length),
            window_len,
        }
    }

    pub fn cycle(&self) -> &IngestionCycle {
        &self.cycle
    }

    /// Records one accepted batch and evaluates the buffers when the cycle
    /// completes.
    pub fn on_batch(&mut self, store: &ChannelBufferStore) -> Option<Evaluation> {
        if self.cycle.advance() {
            Some(self.evaluate(store))
        } else {
            None
        }
    }

    /// All-or-nothing: a single short channel blocks the whole window.
    pub fn evaluate(&self, store: &ChannelBufferStore) -> Evaluation {
        if let Some(channel) = ChannelId::all().find(|&c| store.length(c) < self.window_len) {
            return Evaluation::InsufficientData {
                channel,
                length: store.length(channel),
            };
        }

        let matrices = ChannelId::all()
            .map(|channel| store.tail(channel, self.window_len).to_vec())
            .collect();
        Evaluation::Ready(AnalysisWindow { matrices })
    }
}

impl Default for WindowTrigger {
    fn default() -> Self {
        Self::new(TRIGGER_CYCLE_LENGTH, ANALYSIS_WINDOW_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_store(per_channel: usize) -> ChannelBufferStore {
        let mut store = ChannelBufferStore::new();
        for channel in ChannelId::all() {
            let offset = (channel.index() * 1_000_000) as Sample;
            let samples: Vec<Sample> = (0..per_channel).map(|v| offset + v as Sample).collect();
            store.append(channel, &samples);
        }
        store
    }

    #[test]
    fn cycle_wraps_every_fourth_batch() {
        let mut cycle = IngestionCycle::default();
        let wraps: Vec<bool> = (0..8).map(|_| cycle.advance()).collect();
        assert_eq!(
            wraps,
            vec![false, false, false, true, false, false, false, true]
        );
        assert_eq!(cycle.value(), 0);
    }

    #[test]
    fn cycle_value_stays_below_length() {
        let mut cycle = IngestionCycle::new(4);
        let values: Vec<usize> = (0..6)
            .map(|_| {
                cycle.advance();
                cycle.value()
            })
            .collect();
        assert_eq!(values, vec![1, 2, 3, 0, 1, 2]);
    }

    #[test]
    fn short_channel_blocks_evaluation() {
        let mut store = filled_store(ANALYSIS_WINDOW_LEN);
        let trigger = WindowTrigger::default();
        assert!(matches!(trigger.evaluate(&store), Evaluation::Ready(_)));

        let mut short = ChannelBufferStore::new();
        for channel in ChannelId::all() {
            let len = if channel.index() == 3 {
                ANALYSIS_WINDOW_LEN - 1
            } else {
                ANALYSIS_WINDOW_LEN
            };
            short.append(channel, &vec![0.0; len]);
        }
        assert_eq!(
            trigger.evaluate(&short),
            Evaluation::InsufficientData {
                channel: ChannelId::new(3).unwrap(),
                length: ANALYSIS_WINDOW_LEN - 1,
            }
        );

        store = ChannelBufferStore::new();
        assert!(matches!(
            trigger.evaluate(&store),
            Evaluation::InsufficientData { length: 0, .. }
        ));
    }

    #[test]
    fn window_is_the_trailing_slice_of_each_channel() {
        let store = filled_store(24_000);
        let trigger = WindowTrigger::default();

        let Evaluation::Ready(window) = trigger.evaluate(&store) else {
            panic!("expected a ready window");
        };
        assert_eq!(window.matrices.len(), 6);
        for channel in ChannelId::all() {
            let samples = window.channel(channel);
            assert_eq!(samples.len(), ANALYSIS_WINDOW_LEN);
            assert_eq!(samples, store.tail(channel, ANALYSIS_WINDOW_LEN));
            let offset = (channel.index() * 1_000_000) as Sample;
            assert_eq!(samples[0], offset + 3_000.0);
            assert_eq!(samples[ANALYSIS_WINDOW_LEN - 1], offset + 23_999.0);
        }
    }

    #[test]
    fn on_batch_only_evaluates_when_the_cycle_completes() {
        let store = filled_store(ANALYSIS_WINDOW_LEN);
        let mut trigger = WindowTrigger::default();

        assert!(trigger.on_batch(&store).is_none());
        assert!(trigger.on_batch(&store).is_none());
        assert!(trigger.on_batch(&store).is_none());
        assert!(matches!(trigger.on_batch(&store), Some(Evaluation::Ready(_))));
        assert!(trigger.on_batch(&store).is_none());
    }

    #[test]
    fn window_serialises_as_matrices() {
        let window = AnalysisWindow {
            matrices: vec![vec![1.0], vec![2.0]],
        };
        assert_eq!(
            serde_json::to_string(&window).unwrap(),
            r#"{"matrices":[[1.0],[2.0]]}"#
        );
    }
}
