use std::io::{Read, Write};
use std::time::{Duration, Instant};

use log::{debug, trace};
use serialport::SerialPort;

use crate::config::Timing;
use crate::console;
use crate::Error;

/// Byte stream connected to the bridge console.
pub trait Port: Read + Write {
    /// Number of bytes that can be read without blocking.
    fn bytes_available(&mut self) -> Result<usize, Error>;
}

impl Port for Box<dyn SerialPort> {
    fn bytes_available(&mut self) -> Result<usize, Error> {
        Ok(self.bytes_to_read()? as usize)
    }
}

/// Scrubbed console text gathered by [`Session::read_until`].
#[derive(Debug, Clone)]
pub struct Capture {
    pub text: String,
    /// Whether the stop condition matched before the deadline.
    pub matched: bool,
}

/// Command/response plumbing over the console byte stream.
///
/// Incoming bytes accumulate in a frame that is cleared before every
/// command, so a response never carries output from the previous one.
pub struct Session<P> {
    port: P,
    frame: String,
    timing: Timing,
}

impl<P: Port> Session<P> {
    pub fn new(port: P, timing: Timing) -> Self {
        Self {
            port,
            frame: String::new(),
            timing,
        }
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Pull whatever is waiting on the port into the frame.
    fn poll(&mut self) -> Result<usize, Error> {
        let available = self.port.bytes_available()?;
        if available == 0 {
            return Ok(0);
        }

        let mut chunk = vec![0u8; available];
        let bytes_read = self.port.read(&mut chunk)?;
        chunk.truncate(bytes_read);
        trace!("<- {:?}", String::from_utf8_lossy(&chunk));

        // Undecodable bytes are dropped rather than replaced.
        let text: String = String::from_utf8_lossy(&chunk)
            .chars()
            .filter(|&c| c != char::REPLACEMENT_CHARACTER)
            .collect();

        // A read can end inside an escape sequence, so chunks are only
        // classified for the log. Scrubbing runs over the whole frame.
        trace!("chunk classified as {:?}", console::classify(&text));
        self.frame.push_str(&text);
        Ok(bytes_read)
    }

    /// Poll until `done` accepts the scrubbed frame or `timeout` elapses.
    ///
    /// Returns early on a match; otherwise returns what arrived by the
    /// deadline. The sleep between polls never runs past the deadline.
    pub fn read_until(
        &mut self,
        mut done: impl FnMut(&str) -> bool,
        timeout: Duration,
    ) -> Result<Capture, Error> {
        let deadline = Instant::now() + timeout;
        loop {
            self.poll()?;
            let text = console::scrub(&self.frame);
            if done(&text) {
                return Ok(Capture {
                    text,
                    matched: true,
                });
            }

            let now = Instant::now();
            if now >= deadline {
                trace!("deadline reached with {text:?}");
                return Ok(Capture {
                    text,
                    matched: false,
                });
            }
            std::thread::sleep(self.timing.poll_interval.min(deadline - now));
        }
    }

    /// Discard anything received so far.
    pub fn flush_pending(&mut self) -> Result<(), Error> {
        while self.poll()? > 0 {}
        if !self.frame.is_empty() {
            trace!("discarding {:?}", self.frame);
        }
        self.frame.clear();
        Ok(())
    }

    /// Send one console line, terminated with CRLF.
    pub fn write_command(&mut self, command: &str) -> Result<(), Error> {
        self.flush_pending()?;
        debug!("-> {command:?}");
        self.port.write_all(command.as_bytes())?;
        self.port.write_all(b"\r\n")?;
        self.port.flush()?;
        Ok(())
    }

    /// Send `command` and read its output until `done` or `timeout`.
    pub fn transact(
        &mut self,
        command: &str,
        done: impl FnMut(&str) -> bool,
        timeout: Duration,
    ) -> Result<Capture, Error> {
        self.write_command(command)?;
        self.read_until(done, timeout)
    }

    #[cfg(test)]
    pub(crate) fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}
