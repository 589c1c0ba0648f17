//! JSON record sink: a `tracing-subscriber` layer that runs record processors
//! before writing each event as one JSON line.

use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::record::LogRecord;

/// A record transform invoked synchronously, on the emitting task, before a
/// record is written.
pub trait RecordProcessor: Send + Sync + 'static {
    /// Identity used to reject duplicate registration on the same chain.
    fn name(&self) -> &str;

    fn process(&self, record: &mut LogRecord);
}

type Processors = Arc<Vec<Arc<dyn RecordProcessor>>>;

/// Shared, append-only list of processors attached to one sink.
///
/// Cheap to clone (Arc). Processors can be pushed after the subscriber has
/// been installed; readers take a snapshot and never hold the lock while a
/// processor runs.
#[derive(Clone, Default)]
pub struct ProcessorChain {
    inner: Arc<RwLock<Processors>>,
}

impl ProcessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `processor` unless one with the same name is already attached.
    ///
    /// Returns `true` when the processor was added.
    pub fn push(&self, processor: Arc<dyn RecordProcessor>) -> bool {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if guard.iter().any(|p| p.name() == processor.name()) {
            return false;
        }
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push(processor);
        *guard = Arc::new(next);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.snapshot().iter().any(|p| p.name() == name)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every processor over `record`, in registration order.
    ///
    /// A panicking processor is skipped; the record is still written.
    pub fn apply(&self, record: &mut LogRecord) {
        for processor in self.snapshot().iter() {
            let _ = panic::catch_unwind(AssertUnwindSafe(|| processor.process(record)));
        }
    }

    fn snapshot(&self) -> Processors {
        Arc::clone(&self.inner.read().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Layer that serializes every event as a JSON [`LogRecord`].
pub struct JsonSink<W = fn() -> io::Stderr> {
    channel: String,
    processors: ProcessorChain,
    writer: W,
}

impl JsonSink {
    /// A sink writing to stderr.
    pub fn new(channel: impl Into<String>, processors: ProcessorChain) -> Self {
        Self {
            channel: channel.into(),
            processors,
            writer: io::stderr,
        }
    }
}

impl<W> JsonSink<W> {
    /// Replace the output writer, e.g. with a file or an in-memory buffer.
    pub fn with_writer<W2>(self, writer: W2) -> JsonSink<W2>
    where
        W2: for<'w> MakeWriter<'w> + 'static,
    {
        JsonSink {
            channel: self.channel,
            processors: self.processors,
            writer,
        }
    }

    pub fn processors(&self) -> &ProcessorChain {
        &self.processors
    }
}

impl<S, W> Layer<S> for JsonSink<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut record = LogRecord::from_event(event, &self.channel);
        record.span = ctx.event_span(event).map(|span| span.name().to_string());

        self.processors.apply(&mut record);

        // Write failures are the writer's concern; never propagate into the caller
        let Ok(line) = record.to_json_line() else {
            return;
        };
        let mut writer = self.writer.make_writer_for(event.metadata());
        let _ = writer.write_all(line.as_bytes());
    }
}
