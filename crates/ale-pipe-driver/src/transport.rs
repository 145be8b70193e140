//! Line transports for the fifo protocol
//!
//! Provides LineReader/LineWriter traits that the session is generic over,
//! with wrappers for any `BufRead`/`Write` pair (child pipes, in-memory
//! scripts) and a reader that gives up after a timeout.

use ale_pipe_core::{ProtocolError, Result};
use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// Trait for reading newline-terminated lines from the simulator
pub trait LineReader {
    /// Read one line without its terminator. `Ok(None)` at end of stream.
    fn read_line(&mut self) -> Result<Option<String>>;
}

/// Trait for writing newline-terminated lines to the simulator
pub trait LineWriter {
    /// Write `line` plus a newline and flush
    fn write_line(&mut self, line: &str) -> Result<()>;
}

/// Blocking reader over any `BufRead`
pub struct StreamReader<R>(pub R);

impl<R: BufRead> LineReader for StreamReader<R> {
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self
            .0
            .read_line(&mut line)
            .map_err(|e| ProtocolError::Io(format!("Read failed: {}", e)))?;
        if n == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }
}

/// Writer over any `Write`
pub struct StreamWriter<W>(pub W);

impl<W: Write> LineWriter for StreamWriter<W> {
    fn write_line(&mut self, line: &str) -> Result<()> {
        self.0
            .write_all(line.as_bytes())
            .map_err(|e| ProtocolError::Io(format!("Write failed: {}", e)))?;
        self.0
            .write_all(b"\n")
            .map_err(|e| ProtocolError::Io(format!("Write newline failed: {}", e)))?;
        self.0
            .flush()
            .map_err(|e| ProtocolError::Io(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}

/// Reader that fails with [`ProtocolError::Timeout`] when no line arrives
/// in time.
///
/// A pump thread owns the underlying stream and forwards each line over a
/// channel of depth one. It exits at end of stream, on a read error, or
/// when this reader is dropped and its next send fails.
pub struct TimedLineReader {
    rx: Receiver<Result<Option<String>>>,
    timeout: Duration,
    _pump: JoinHandle<()>,
}

impl TimedLineReader {
    /// Start pumping lines from `reader`
    pub fn spawn<R>(reader: R, timeout: Duration) -> Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        let mut source = StreamReader(reader);
        let pump = thread::Builder::new()
            .name("ale-pipe-reader".into())
            .spawn(move || {
                loop {
                    let next = source.read_line();
                    let done = !matches!(next, Ok(Some(_)));
                    if tx.send(next).is_err() || done {
                        break;
                    }
                }
                debug!("Reader pump exiting");
            })
            .map_err(|e| ProtocolError::Io(format!("Failed to start reader thread: {}", e)))?;

        Ok(Self {
            rx,
            timeout,
            _pump: pump,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl LineReader for TimedLineReader {
    fn read_line(&mut self) -> Result<Option<String>> {
        match self.rx.recv_timeout(self.timeout) {
            Ok(next) => next,
            Err(RecvTimeoutError::Timeout) => Err(ProtocolError::Timeout(self.timeout)),
            // Pump already reported end of stream or an error
            Err(RecvTimeoutError::Disconnected) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};

    #[test]
    fn test_stream_reader_strips_terminators() {
        let mut reader = StreamReader(Cursor::new(b"160-210\r\n\nDIE".to_vec()));
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("160-210"));
        assert_eq!(reader.read_line().unwrap().as_deref(), Some(""));
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("DIE"));
        assert_eq!(reader.read_line().unwrap(), None);
    }

    #[test]
    fn test_stream_writer_appends_newline() {
        let mut writer = StreamWriter(Vec::new());
        writer.write_line("1,18").unwrap();
        writer.write_line("0,18").unwrap();
        assert_eq!(writer.0, b"1,18\n0,18\n");
    }

    #[test]
    fn test_timed_reader_forwards_lines() {
        let source = Cursor::new(b"a\nb\n".to_vec());
        let mut reader = TimedLineReader::spawn(source, Duration::from_secs(5)).unwrap();
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("a"));
        assert_eq!(reader.read_line().unwrap().as_deref(), Some("b"));
        assert_eq!(reader.read_line().unwrap(), None);
        // Stays at end of stream once the pump is gone
        assert_eq!(reader.read_line().unwrap(), None);
    }

    /// Source that stays silent long enough to trip the timeout
    struct Stall;

    impl Read for Stall {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            thread::sleep(Duration::from_millis(500));
            Ok(0)
        }
    }

    #[test]
    fn test_timed_reader_times_out() {
        let mut reader =
            TimedLineReader::spawn(BufReader::new(Stall), Duration::from_millis(20)).unwrap();
        match reader.read_line() {
            Err(ProtocolError::Timeout(d)) => assert_eq!(d, Duration::from_millis(20)),
            other => panic!("Expected Timeout, got {:?}", other),
        }
    }
}
