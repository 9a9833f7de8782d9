//! Buffered SSE framing shared by the consumer session and the upstream
//! provider transport.
//!
//! Frames are buffered as raw bytes and only decoded once the blank-line
//! delimiter has arrived, so a multi-byte UTF-8 character split across two
//! network chunks is reassembled instead of corrupted.

/// Incremental decoder that turns byte chunks into complete frames.
///
/// Whatever trails the last delimiter stays in the buffer; if the stream ends
/// first it is discarded with the decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    /// Appends a chunk and returns the text of all newly completed frames.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some((idx, delim_len)) = find_frame_delimiter(&self.buf) {
            let frame_bytes = self.buf[..idx].to_vec();
            self.buf.drain(..idx + delim_len);
            frames.push(String::from_utf8_lossy(&frame_bytes).into_owned());
        }
        frames
    }
}

fn find_frame_delimiter(buf: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i + 1 < buf.len() {
        if buf[i] == b'\n' && buf[i + 1] == b'\n' {
            return Some((i, 2));
        }
        if i + 3 < buf.len()
            && buf[i] == b'\r'
            && buf[i + 1] == b'\n'
            && buf[i + 2] == b'\r'
            && buf[i + 3] == b'\n'
        {
            return Some((i, 4));
        }
        i += 1;
    }
    None
}

/// Extracts the payload of a single-line `data:` frame.
///
/// Frames that do not begin with `data:` (bare `event:` lines, comments)
/// carry no payload and yield `None`. At most one space after the prefix is
/// treated as framing, not payload.
pub fn data_payload(frame: &str) -> Option<String> {
    let rest = frame.trim().strip_prefix("data:")?;
    Some(rest.strip_prefix(' ').unwrap_or(rest).to_string())
}

/// Joins every `data:` line of a multi-line frame, SSE-style.
///
/// Used for upstream provider streams, which interleave `event:` name lines
/// with their data lines inside one frame.
pub(crate) fn frame_data_lines(frame: &str) -> Option<String> {
    let mut data_lines: Vec<&str> = Vec::new();
    for raw_line in frame.split('\n') {
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }
    if data_lines.is_empty() {
        return None;
    }
    Some(data_lines.join("\n"))
}
