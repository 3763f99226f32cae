use std::fmt::{self, Display};

use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ChunksError(err) => Display::fmt(err, f),
            Error::InvalidPayload => {
                f.write_str("the event stream is not valid UTF-8")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ChunksError(err) => Some(err),
            Error::InvalidPayload => None,
        }
    }
}

/// A type for reading server-sent events from a chunk stream.
///
/// Only `data` fields are delivered. Comments and all other fields are
/// skipped. Multiple `data` lines in one event are
/// joined with a line feed.
pub struct Sse {
    // Raw bytes are buffered so that a multi-byte character split across
    // two chunks is decoded only once it is complete.
    buf: Vec<u8>,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            chunks,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Drain complete events from the buffer first.
            while let Some(block) = self.take_event_block() {
                if let Some(event) = parse_event(&block)? {
                    return Ok(Some(event));
                }
            }

            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::ChunksError)?
            else {
                // Abort if no more data available. A trailing partial
                // event is dropped.
                if !self.buf.is_empty() {
                    debug!("dropping {} trailing bytes", self.buf.len());
                    self.buf.clear();
                }
                return Ok(None);
            };
            self.buf.extend_from_slice(&bytes);
        }
    }

    /// Removes the first complete event block from the buffer.
    ///
    /// end-of-line = ( cr lf / lf ), an event ends with an empty line.
    fn take_event_block(&mut self) -> Option<Vec<u8>> {
        let (idx, delim_len) = find_event_end(&self.buf)?;
        let block = self.buf[..idx].to_vec();
        self.buf.drain(..idx + delim_len);
        Some(block)
    }
}

fn find_event_end(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = find(buf, b"\n\n").map(|idx| (idx, 2));
    let crlf = find(buf, b"\r\n\r\n").map(|idx| (idx, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

#[inline]
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

// event = *( comment / field ) end-of-line
// field = 1*name-char [ colon [ space ] *any-char ] end-of-line
fn parse_event(block: &[u8]) -> Result<Option<String>, Error> {
    let Ok(block) = str::from_utf8(block) else {
        return Err(Error::InvalidPayload);
    };

    let mut data: Option<String> = None;
    for line in block.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        // A line without a colon is a field with an empty value.
        let (name, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match name {
            "data" => {
                let data = data.get_or_insert_default();
                if !data.is_empty() {
                    data.push('\n');
                }
                data.push_str(value);
            }
            "event" | "id" | "retry" => {}
            _ => trace!("ignoring field: {name}"),
        }
    }
    Ok(data)
}
