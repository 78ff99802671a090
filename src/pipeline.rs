//! Producer/consumer pipeline over a [`BoundedChannel`].
//!
//! One producer context walks the source sequence and `put`s each item; one
//! consumer context performs a counted receive loop and appends to its own
//! destination. The channel is the only shared mutable state. Both contexts
//! report what they did through an ordered event log.

use std::fmt;
use std::thread;
use std::time::Duration;

use crossbeam::channel::unbounded;

use crate::channel::{BoundedChannel, ChannelError};

/// Errors that abort a pipeline run.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("{0} context panicked")]
    WorkerPanicked(&'static str),
}

/// Lifecycle of a pipeline run. `Complete` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Running,
    Complete,
    Failed,
}

/// One entry in the observable run log, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent<T> {
    Produced(T),
    Consumed(T),
}

impl<T: fmt::Display> fmt::Display for PipelineEvent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineEvent::Produced(item) => write!(f, "produced {}", item),
            PipelineEvent::Consumed(item) => write!(f, "consumed {}", item),
        }
    }
}

/// Tuning knobs for a run. The delays only exist to make blocking observable
/// in the event log; leave them `None` in tests that assert on results.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub capacity: usize,
    pub producer_delay: Option<Duration>,
    pub consumer_delay: Option<Duration>,
    /// Bound on the final drain wait; `None` waits indefinitely.
    pub join_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacity: 3,
            producer_delay: None,
            consumer_delay: None,
            join_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct PipelineReport<T> {
    /// Items in the order the consumer received them.
    pub destination: Vec<T>,
    /// Interleaved producer/consumer events in arrival order.
    pub events: Vec<PipelineEvent<T>>,
    /// Whether the destination matches the source element-for-element.
    pub success: bool,
}

/// Drives one producer and one consumer against a shared [`BoundedChannel`].
#[derive(Debug)]
pub struct Pipeline<T> {
    source: Vec<T>,
    config: PipelineConfig,
    state: PipelineState,
    failure: Option<String>,
}

impl<T> Pipeline<T>
where
    T: Send + Sync + Clone + PartialEq,
{
    /// Create a pipeline over `source`. Capacity is validated here so a bad
    /// configuration never reaches the running state.
    pub fn new(source: Vec<T>, config: PipelineConfig) -> Result<Self, PipelineError> {
        if config.capacity < 1 {
            return Err(ChannelError::InvalidCapacity(config.capacity).into());
        }
        Ok(Self {
            source,
            config,
            state: PipelineState::Init,
            failure: None,
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Cause of failure, set when the run ends in [`PipelineState::Failed`].
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn source(&self) -> &[T] {
        &self.source
    }

    /// Run the producer and consumer to completion and report the outcome.
    pub fn run(&mut self) -> Result<PipelineReport<T>, PipelineError> {
        // An empty source completes without spawning anything or blocking.
        if self.source.is_empty() {
            self.state = PipelineState::Complete;
            return Ok(PipelineReport {
                destination: Vec::new(),
                events: Vec::new(),
                success: true,
            });
        }

        self.state = PipelineState::Running;
        match self.run_workers() {
            Ok(report) => {
                self.state = PipelineState::Complete;
                Ok(report)
            }
            Err(err) => {
                self.state = PipelineState::Failed;
                self.failure = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn run_workers(&self) -> Result<PipelineReport<T>, PipelineError> {
        let channel = BoundedChannel::new(self.config.capacity)?;
        let (event_tx, event_rx) = unbounded();
        let expected = self.source.len();

        let destination = thread::scope(|s| {
            let producer_tx = event_tx.clone();
            let producer = s.spawn(|| {
                let tx = producer_tx;
                for item in self.source.iter().cloned() {
                    // Emitted before the (possibly blocking) put, so each
                    // item's produced event always precedes its consumed one.
                    let _ = tx.send(PipelineEvent::Produced(item.clone()));
                    channel.put(item);
                    if let Some(delay) = self.config.producer_delay {
                        thread::sleep(delay);
                    }
                }
                channel.finish();
            });

            let consumer_tx = event_tx.clone();
            let consumer = s.spawn(|| {
                let tx = consumer_tx;
                let mut destination = Vec::with_capacity(expected);
                // Counted receive loop: exactly one get per source item.
                for _ in 0..expected {
                    let item = channel.get()?;
                    let _ = tx.send(PipelineEvent::Consumed(item.clone()));
                    destination.push(item);
                    channel.task_done();
                    if let Some(delay) = self.config.consumer_delay {
                        thread::sleep(delay);
                    }
                }
                Ok::<_, ChannelError>(destination)
            });

            let produced = producer.join();
            if produced.is_err() {
                // A dead producer never calls finish(); signal completion so
                // the consumer's get() returns and the scope can exit.
                channel.finish();
            }
            let consumed = consumer.join();

            produced.map_err(|_| PipelineError::WorkerPanicked("producer"))?;
            let destination =
                consumed.map_err(|_| PipelineError::WorkerPanicked("consumer"))??;

            // Both contexts are done; confirm every put was acknowledged.
            match self.config.join_timeout {
                Some(timeout) => channel.join_timeout(timeout)?,
                None => channel.join(),
            }

            Ok::<_, PipelineError>(destination)
        })?;

        drop(event_tx);
        let events: Vec<_> = event_rx.try_iter().collect();
        let success = destination == self.source;

        Ok(PipelineReport {
            destination,
            events,
            success,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::vec;
    use proptest::prelude::*;

    fn run(source: Vec<i32>, capacity: usize) -> PipelineReport<i32> {
        let config = PipelineConfig {
            capacity,
            ..PipelineConfig::default()
        };
        let mut pipeline = Pipeline::new(source, config).unwrap();
        let report = pipeline.run().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Complete);
        report
    }

    #[test]
    fn test_basic_transfer() {
        let source = vec![1, 2, 3, 4, 5];
        let report = run(source.clone(), 2);

        assert!(report.success);
        assert_eq!(report.destination, source);
    }

    #[test]
    fn test_empty_source_completes_immediately() {
        let report = run(Vec::new(), 2);

        assert!(report.success);
        assert!(report.destination.is_empty());
        assert!(report.events.is_empty());
    }

    #[test]
    fn test_single_item() {
        let report = run(vec![42], 1);

        assert_eq!(report.destination, vec![42]);
        // Exactly one put and one get.
        assert_eq!(
            report.events.iter().filter(|e| matches!(e, PipelineEvent::Produced(_))).count(),
            1
        );
        assert_eq!(
            report.events.iter().filter(|e| matches!(e, PipelineEvent::Consumed(_))).count(),
            1
        );
    }

    #[test]
    fn test_fifty_items_small_capacity() {
        let source: Vec<i32> = (1..=50).collect();
        let report = run(source.clone(), 3);

        assert_eq!(report.destination.len(), 50);
        assert_eq!(report.destination, source);
        assert_eq!(report.events.len(), 100);
    }

    #[test]
    fn test_stress_ordering_preserved() {
        let source: Vec<i32> = (1..=100).collect();
        for _ in 0..10 {
            let report = run(source.clone(), 10);
            assert!(report.success);
            assert_eq!(report.destination, source);
        }
    }

    #[test]
    fn test_each_item_produced_before_consumed() {
        let source: Vec<i32> = (0..20).collect();
        let report = run(source.clone(), 1);

        for item in &source {
            let produced = report
                .events
                .iter()
                .position(|e| *e == PipelineEvent::Produced(*item))
                .unwrap();
            let consumed = report
                .events
                .iter()
                .position(|e| *e == PipelineEvent::Consumed(*item))
                .unwrap();
            assert!(produced < consumed, "item {} consumed before produced", item);
        }
    }

    #[test]
    fn test_slow_consumer_backpressure() {
        // A slow consumer must throttle the producer, not lose items.
        let source: Vec<i32> = (0..10).collect();
        let config = PipelineConfig {
            capacity: 2,
            producer_delay: None,
            consumer_delay: Some(Duration::from_millis(2)),
            ..PipelineConfig::default()
        };
        let mut pipeline = Pipeline::new(source.clone(), config).unwrap();
        let report = pipeline.run().unwrap();

        assert!(report.success);
        assert_eq!(report.destination, source);
    }

    #[test]
    fn test_invalid_capacity_rejected_at_construction() {
        let err = Pipeline::new(vec![1], PipelineConfig {
            capacity: 0,
            ..PipelineConfig::default()
        })
        .unwrap_err();

        assert_eq!(err, PipelineError::Channel(ChannelError::InvalidCapacity(0)));
    }

    #[test]
    fn test_state_lifecycle() {
        let mut pipeline =
            Pipeline::new(vec![1, 2, 3], PipelineConfig::default()).unwrap();
        assert_eq!(pipeline.state(), PipelineState::Init);
        assert_eq!(pipeline.failure(), None);

        pipeline.run().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Complete);
        assert_eq!(pipeline.failure(), None);
        assert_eq!(pipeline.source(), &[1, 2, 3]);
    }

    proptest! {
        #[test]
        fn prop_destination_equals_source(
            source in vec(any::<i32>(), 0..40),
            capacity in 1usize..=8,
        ) {
            let report = run(source.clone(), capacity);
            prop_assert!(report.success);
            prop_assert_eq!(report.destination, source);
        }
    }
}
