//! Recovers the server internals versions (`v1_16_R3` style package names) a plugin
//! was compiled against, without parsing the class file format.
//!
//! Every `.class` entry is streamed byte by byte. Printable bytes feed a bounded
//! sliding window; whenever the window ends with one of [`MARKERS`], the following
//! printable bytes are captured up to the next `/`. Non-printable bytes are dropped
//! entirely, so a marker split by constant-pool length prefixes still matches.
//!
//! While a capture is open, further marker matches are ignored. The window and
//! any open capture are reset at the start of each class entry, and a capture
//! still open when the entry ends is discarded.

use std::collections::{BTreeSet, VecDeque};
use std::io::{self, Read};

use crate::archive::Archive;
use crate::error::Result;

pub const MARKERS: [&[u8]; 2] = [b"net/minecraft/server/v", b"org/bukkit/craftbukkit/v"];

pub const WINDOW_CAPACITY: usize = 500;

const READ_CHUNK: usize = 8 * 1024;

/// Fixed-capacity byte window; the oldest byte is evicted on overflow.
#[derive(Debug)]
struct SlidingWindow {
    bytes: VecDeque<u8>,
    capacity: usize,
}

impl SlidingWindow {
    fn new(capacity: usize) -> Self {
        Self {
            bytes: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, byte: u8) {
        if self.bytes.len() == self.capacity {
            self.bytes.pop_front();
        }
        self.bytes.push_back(byte);
    }

    fn ends_with(&self, suffix: &[u8]) -> bool {
        suffix.len() <= self.bytes.len()
            && self
                .bytes
                .iter()
                .rev()
                .zip(suffix.iter().rev())
                .all(|(a, b)| a == b)
    }

    fn clear(&mut self) {
        self.bytes.clear();
    }
}

/// Streaming marker matcher. One instance can be reused across class entries
/// via [`TokenScanner::reset`].
#[derive(Debug)]
pub struct TokenScanner {
    window: SlidingWindow,
    capture: Option<Vec<u8>>,
    found: BTreeSet<String>,
}

impl Default for TokenScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenScanner {
    pub fn new() -> Self {
        Self {
            window: SlidingWindow::new(WINDOW_CAPACITY),
            capture: None,
            found: BTreeSet::new(),
        }
    }

    pub fn feed(&mut self, byte: u8) {
        if !is_printable(byte) {
            return;
        }
        self.window.push(byte);

        if let Some(token) = self.capture.as_mut() {
            if byte == b'/' {
                let token = std::mem::take(token);
                self.capture = None;
                if !token.is_empty() {
                    self.found.insert(String::from_utf8_lossy(&token).into_owned());
                }
            } else {
                token.push(byte);
            }
            return;
        }

        if MARKERS.iter().any(|marker| self.window.ends_with(marker)) {
            self.capture = Some(Vec::new());
        }
    }

    pub fn feed_slice(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.feed(b);
        }
    }

    pub fn feed_reader<R: Read + ?Sized>(&mut self, reader: &mut R) -> io::Result<()> {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            self.feed_slice(&buf[..n]);
        }
    }

    /// Ends the current class entry: drops any open capture and empties the window.
    pub fn reset(&mut self) {
        self.window.clear();
        self.capture = None;
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    pub fn into_tokens(self) -> BTreeSet<String> {
        self.found
    }
}

/// Printable in the ASCII sense: graphic characters plus space and the
/// whitespace controls `\t \n \r \x0b \x0c`.
pub fn is_printable(byte: u8) -> bool {
    byte.is_ascii_graphic() || matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Union of version tokens across every class entry of `archive`.
pub fn scan_archive(archive: &mut Archive) -> Result<BTreeSet<String>> {
    let mut scanner = TokenScanner::new();
    archive.for_each_class_entry(|_name, reader| {
        scanner.reset();
        let res = scanner.feed_reader(reader);
        scanner.reset();
        res
    })?;
    Ok(scanner.into_tokens())
}

/// Tokens found in a single byte stream, as if it were one class entry.
pub fn scan_bytes(bytes: &[u8]) -> BTreeSet<String> {
    let mut scanner = TokenScanner::new();
    scanner.feed_slice(bytes);
    scanner.into_tokens()
}
