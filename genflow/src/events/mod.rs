//! Progress sink trait and implementations.

mod progress;

pub use progress::{CollectingProgressSink, NoOpProgressSink, ProgressSink, TracingProgressSink};
