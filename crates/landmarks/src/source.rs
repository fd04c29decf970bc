//! Landmark sources
//!
//! The detector itself is external; sources here only deliver its output.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::landmark::LandmarkFrame;
use crate::LandmarkError;

/// Anything that yields landmark frames in capture order
pub trait LandmarkSource {
    /// Next frame, `Ok(None)` once the stream is exhausted
    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>, LandmarkError>;
}

/// JSON-lines landmark stream (one `LandmarkFrame` object per line)
pub struct JsonlSource<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> JsonlSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Lines consumed so far
    pub fn lines_read(&self) -> usize {
        self.line
    }
}

impl JsonlSource<BufReader<File>> {
    /// Open a recorded landmark stream
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LandmarkError> {
        let path = path.as_ref();
        info!("Opening landmark stream {}", path.display());
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl JsonlSource<BufReader<std::io::Stdin>> {
    /// Read landmark frames piped in from the detector process
    pub fn stdin() -> Self {
        Self::new(BufReader::new(std::io::stdin()))
    }
}

impl<R: BufRead> LandmarkSource for JsonlSource<R> {
    fn next_frame(&mut self) -> Result<Option<LandmarkFrame>, LandmarkError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }

            return serde_json::from_str(text)
                .map(Some)
                .map_err(|e| LandmarkError::Decode {
                    line: self.line,
                    message: e.to_string(),
                });
        }
    }
}

/// Async landmark service for tokio
///
/// Runs a blocking source on its own thread and hands frames to the async
/// frame loop through a bounded channel.
pub struct LandmarkService {
    receiver: mpsc::Receiver<LandmarkFrame>,
}

impl LandmarkService {
    /// Spawn the reader thread
    pub fn spawn<S>(mut source: S, capacity: usize) -> Self
    where
        S: LandmarkSource + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<LandmarkFrame>(capacity.max(1));

        std::thread::spawn(move || {
            loop {
                match source.next_frame() {
                    Ok(Some(frame)) => {
                        if tx.blocking_send(frame).is_err() {
                            debug!("Landmark receiver dropped");
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("Landmark stream ended");
                        break;
                    }
                    Err(e @ LandmarkError::Decode { .. }) => {
                        warn!("Skipping frame: {}", e);
                    }
                    Err(e) => {
                        warn!("Landmark source failed: {}", e);
                        break;
                    }
                }
            }
        });

        Self { receiver: rx }
    }

    /// Receive next landmark frame, `None` when the source is done
    pub async fn next(&mut self) -> Option<LandmarkFrame> {
        self.receiver.recv().await
    }
}
