// Fan-out writer: one write, every sink (console + job log)

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// A destination of the fan-out writer
pub type Sink = Box<dyn Write + Send>;

/// Forwards each write and flush to all sinks in order.
///
/// Every sink receives the full buffer (`write_all`), so sinks never drift
/// apart on partial writes. A sink that fails is detached and the remaining
/// sinks keep receiving output; the call only fails once no sink is left.
#[derive(Default)]
pub struct FanOutWriter {
    sinks: Vec<Sink>,
}

impl FanOutWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Sink) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn push(&mut self, sink: Sink) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl FanOutWriter {
    fn for_each_sink(&mut self, mut op: impl FnMut(&mut Sink) -> io::Result<()>) -> io::Result<()> {
        if self.sinks.is_empty() {
            return Ok(());
        }

        let mut last_error = None;
        self.sinks.retain_mut(|sink| match op(sink) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Output sink failed, detaching it");
                last_error = Some(e);
                false
            }
        });

        match last_error {
            Some(e) if self.sinks.is_empty() => Err(e),
            _ => Ok(()),
        }
    }
}

impl Write for FanOutWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.for_each_sink(|sink| sink.write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.for_each_sink(|sink| sink.flush())
    }
}

/// Cloneable in-memory sink; all clones share one buffer
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let bytes = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_every_sink_receives_every_write() {
        let console = SharedBuffer::new();
        let file = SharedBuffer::new();
        let mut writer = FanOutWriter::new()
            .with_sink(Box::new(console.clone()))
            .with_sink(Box::new(file.clone()));

        writeln!(writer, "Start processing").unwrap();
        writer.write_all(b"partial").unwrap();
        writer.flush().unwrap();

        assert_eq!(writer.len(), 2);
        assert_eq!(console.contents(), "Start processing\npartial");
        assert_eq!(file.contents(), console.contents());
    }

    #[test]
    fn test_failing_sink_is_detached() {
        let file = SharedBuffer::new();
        let mut writer = FanOutWriter::new()
            .with_sink(Box::new(BrokenSink))
            .with_sink(Box::new(file.clone()));

        writer.write_all(b"line\n").unwrap();
        writer.write_all(b"more\n").unwrap();

        assert_eq!(writer.len(), 1);
        assert_eq!(file.contents(), "line\nmore\n");
    }

    #[test]
    fn test_error_when_every_sink_failed() {
        let mut writer = FanOutWriter::new().with_sink(Box::new(BrokenSink));

        let err = writer.write_all(b"line\n").unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(writer.is_empty());
    }

    #[test]
    fn test_empty_writer_accepts_writes() {
        let mut writer = FanOutWriter::new();
        assert!(writer.is_empty());
        assert_eq!(writer.write(b"dropped").unwrap(), 7);
    }
}
