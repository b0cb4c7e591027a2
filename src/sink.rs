//! Destinations for rendered change events.
//!
//! A sink may be shared by several concurrently running watches, so every
//! implementation delivers each call to [`Sink::write`] as one uninterrupted block.

use std::{
    io::{self, Write},
    sync::Arc,
    thread,
};

use crossbeam::channel;
use parking_lot::Mutex;

/// Accepts one rendered event per call.
pub trait Sink: Send + Sync {
    /// Delivers `text`, which may span several lines. A newline is appended.
    fn write(&self, text: &str) -> io::Result<()>;
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn write(&self, text: &str) -> io::Result<()> {
        (**self).write(text)
    }
}

impl<S: Sink + ?Sized> Sink for &S {
    fn write(&self, text: &str) -> io::Result<()> {
        (**self).write(text)
    }
}

/// Writes to an [`io::Write`] under a lock.
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl WriterSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write(&self, text: &str) -> io::Result<()> {
        let mut writer = self.writer.lock();
        writer.write_all(text.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

/// Hands rendered text to a dedicated writer thread.
///
/// Writers never contend on the output itself, only on the channel.
/// Dropping every clone of the sink closes the channel; the thread then
/// drains what is left and exits, returning its writer.
#[derive(Clone)]
pub struct ChannelSink {
    sender: channel::Sender<String>,
}

impl ChannelSink {
    /// Spawns the writer thread.
    pub fn spawn<W>(mut writer: W) -> (Self, thread::JoinHandle<io::Result<W>>)
    where
        W: Write + Send + 'static,
    {
        let (sender, receiver) = channel::unbounded::<String>();
        let handle = thread::spawn(move || {
            for text in receiver {
                writer.write_all(text.as_bytes())?;
                writer.write_all(b"\n")?;
                writer.flush()?;
            }
            Ok(writer)
        });
        (Self { sender }, handle)
    }
}

impl Sink for ChannelSink {
    fn write(&self, text: &str) -> io::Result<()> {
        self.sender
            .send(text.to_owned())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "sink writer thread has exited"))
    }
}

const CHANGE_TARGET: &str = "kube_diffwatch::change";

/// Emits one `log` record per event, multi-line events included.
#[derive(Debug, Clone, Copy)]
pub struct LogSink {
    level: log::Level,
}

impl LogSink {
    pub fn new(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(log::Level::Info)
    }
}

impl Sink for LogSink {
    fn write(&self, text: &str) -> io::Result<()> {
        log::log!(target: CHANGE_TARGET, self.level, "{text}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_sink_appends_newlines() {
        let sink = WriterSink::new(Vec::new());
        sink.write("add a").unwrap();
        sink.write("upd b diff:\n  x: 1 -> 2").unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "add a\nupd b diff:\n  x: 1 -> 2\n");
    }

    #[test]
    fn writer_sink_keeps_blocks_whole_across_threads() {
        let sink = Arc::new(WriterSink::new(Vec::new()));
        let threads: Vec<_> = (0..4)
            .map(|t| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for i in 0..50 {
                        sink.write(&format!("upd {t}-{i} diff:\n  a: {i} -> {t}")).unwrap();
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        let out = String::from_utf8(Arc::into_inner(sink).unwrap().into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 400);
        for pair in lines.chunks(2) {
            let header = pair[0].strip_prefix("upd ").unwrap().strip_suffix(" diff:").unwrap();
            let (t, i) = header.split_once('-').unwrap();
            assert_eq!(pair[1], format!("  a: {i} -> {t}"));
        }
    }

    #[test]
    fn channel_sink_drains_on_close() {
        let (sink, handle) = ChannelSink::spawn(Vec::new());
        let clone = sink.clone();
        sink.write("one").unwrap();
        clone.write("two").unwrap();
        drop(sink);
        drop(clone);
        let out = handle.join().unwrap().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "one\ntwo\n");
    }

    struct Capture {
        records: Mutex<Vec<String>>,
    }

    impl log::Log for Capture {
        fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
            metadata.target() == CHANGE_TARGET
        }

        fn log(&self, record: &log::Record<'_>) {
            if self.enabled(record.metadata()) {
                self.records.lock().push(record.args().to_string());
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: Capture = Capture {
        records: Mutex::new(Vec::new()),
    };

    #[test]
    fn log_sink_keeps_blocks_whole_across_threads() {
        log::set_logger(&CAPTURE).unwrap();
        log::set_max_level(log::LevelFilter::Trace);

        let sink = Arc::new(LogSink::default());
        let threads: Vec<_> = (0..4)
            .map(|t| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for i in 0..200 {
                        sink.write(&format!("upd {t}-{i} diff:\n  a: {i} -> {t}")).unwrap();
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        let records = CAPTURE.records.lock();
        assert_eq!(records.len(), 800);
        for record in records.iter() {
            let (header, body) = record.split_once('\n').unwrap();
            let (t, i) = header
                .strip_prefix("upd ")
                .and_then(|h| h.strip_suffix(" diff:"))
                .and_then(|h| h.split_once('-'))
                .unwrap();
            assert_eq!(body, format!("  a: {i} -> {t}"));
        }
    }
}
