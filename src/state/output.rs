//! Per-session output buffering and pagination.
//!
//! Writes accumulate in a fixed-capacity buffer between ticks. At each tick
//! the buffer is drained into one outbound chunk. Long output is split into
//! pages; the reader presses return for the next page, and anything else
//! abandons the rest.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

/// The buffer would have grown past its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("output buffer overflow ({capacity} bytes)")]
pub struct Overflow {
    pub capacity: usize,
}

/// What the reader asked for since the last flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum PageRequest {
    #[default]
    None,
    Next,
    Abandon,
}

#[derive(Debug)]
pub struct OutputBuffer {
    /// Unflushed bytes; its length is the cursor.
    buf: Vec<u8>,
    capacity: usize,
    page_lines: usize,
    /// Text still to be paged out.
    held: Vec<u8>,
    held_total_lines: usize,
    shown_lines: usize,
    request: PageRequest,
}

impl OutputBuffer {
    pub fn new(capacity: usize, page_lines: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            page_lines: page_lines.max(1),
            held: Vec::new(),
            held_total_lines: 0,
            shown_lines: 0,
            request: PageRequest::None,
        }
    }

    /// Append text. On overflow the buffer is emptied and the caller is
    /// expected to drop the connection.
    pub fn write(&mut self, text: &str) -> Result<(), Overflow> {
        if self.buf.len() + text.len() > self.capacity {
            self.clear();
            return Err(Overflow {
                capacity: self.capacity,
            });
        }
        self.buf.extend_from_slice(text.as_bytes());
        Ok(())
    }

    /// Bytes written since the last flush.
    pub fn cursor(&self) -> usize {
        self.buf.len()
    }

    /// True when a flush would put something on the wire.
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty() || self.request != PageRequest::None
    }

    /// True while pages are waiting for the reader.
    pub fn is_paging(&self) -> bool {
        !self.held.is_empty()
    }

    /// The reader pressed return: send the next page at the next flush.
    pub fn request_next_page(&mut self) {
        if self.is_paging() {
            self.request = PageRequest::Next;
        }
    }

    /// The reader typed something else: drop the remaining pages at the
    /// next flush.
    pub fn abandon_pages(&mut self) {
        if self.is_paging() {
            self.request = PageRequest::Abandon;
        }
    }

    /// Discard everything, including held pages.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.reset_paging();
    }

    /// Drain buffered output into one outbound chunk and reset the cursor.
    ///
    /// `prompt` is appended after regular output and after the last page.
    /// Returns `None` when there is nothing to send.
    pub fn take_flush(&mut self, prompt: &str) -> Option<Bytes> {
        match std::mem::take(&mut self.request) {
            PageRequest::Abandon => self.reset_paging(),
            PageRequest::Next => return Some(self.next_page(prompt)),
            PageRequest::None => {}
        }

        if self.is_paging() && self.held.len() + self.buf.len() > self.capacity {
            // Held pages count against the same capacity; drop them.
            self.reset_paging();
        }

        if self.is_paging() {
            // New output while paging queues up behind the held pages.
            if !self.buf.is_empty() {
                self.held_total_lines += count_lines(&self.buf);
                self.held.extend_from_slice(&self.buf);
                self.buf.clear();
            }
            return None;
        }

        if self.buf.is_empty() {
            return None;
        }

        let lines = count_lines(&self.buf);
        if lines <= self.page_lines {
            let mut out = BytesMut::with_capacity(self.buf.len() + prompt.len());
            out.put_slice(&self.buf);
            out.put_slice(prompt.as_bytes());
            self.buf.clear();
            return Some(out.freeze());
        }

        self.held.extend_from_slice(&self.buf);
        self.buf.clear();
        self.held_total_lines = lines;
        self.shown_lines = 0;
        Some(self.next_page(prompt))
    }

    /// Drain everything unpaginated, for a final flush before close.
    pub fn take_all(&mut self) -> Option<Bytes> {
        let mut out = BytesMut::with_capacity(self.held.len() + self.buf.len());
        out.put_slice(&self.held);
        out.put_slice(&self.buf);
        self.clear();
        if out.is_empty() {
            None
        } else {
            Some(out.freeze())
        }
    }

    fn next_page(&mut self, prompt: &str) -> Bytes {
        let Some(end) = end_of_line(&self.held, self.page_lines) else {
            let mut out = BytesMut::with_capacity(self.held.len() + prompt.len());
            out.put_slice(&self.held);
            out.put_slice(prompt.as_bytes());
            self.reset_paging();
            return out.freeze();
        };

        self.shown_lines += self.page_lines;
        let percent = self.shown_lines * 100 / self.held_total_lines.max(1);
        let mut out = BytesMut::with_capacity(end + 48);
        out.put_slice(&self.held[..end]);
        out.put_slice(format!("[ Press return to continue ({percent}%) ]\r\n").as_bytes());
        self.held.drain(..end);
        out.freeze()
    }

    fn reset_paging(&mut self) {
        self.held.clear();
        self.held_total_lines = 0;
        self.shown_lines = 0;
        self.request = PageRequest::None;
    }
}

/// Lines in `bytes`, counting an unterminated tail as a line.
fn count_lines(bytes: &[u8]) -> usize {
    let newlines = bytes.iter().filter(|&&b| b == b'\n').count();
    match bytes.last() {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    }
}

/// Offset just past the `n`th newline, if there are more bytes after it.
fn end_of_line(bytes: &[u8], n: usize) -> Option<usize> {
    let (index, _) = bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'\n')
        .nth(n - 1)?;
    let end = index + 1;
    (end < bytes.len()).then_some(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPT: &str = "\r\n> ";

    fn numbered(lines: usize) -> String {
        (1..=lines).map(|i| format!("line {i}\r\n")).collect()
    }

    #[test]
    fn empty_buffer_flushes_nothing() {
        let mut out = OutputBuffer::new(1024, 5);
        assert!(!out.has_pending());
        assert_eq!(out.take_flush(PROMPT), None);
    }

    #[test]
    fn short_output_flushes_whole_with_prompt() {
        let mut out = OutputBuffer::new(1024, 5);
        out.write("X\r\n").unwrap();
        out.write("Y\r\n").unwrap();
        assert_eq!(out.cursor(), 6);
        let chunk = out.take_flush(PROMPT).unwrap();
        assert_eq!(&chunk[..], b"X\r\nY\r\n\r\n> ");
        assert_eq!(out.cursor(), 0);
        assert_eq!(out.take_flush(PROMPT), None);
    }

    #[test]
    fn overflow_clears_and_reports() {
        let mut out = OutputBuffer::new(8, 5);
        out.write("12345").unwrap();
        assert_eq!(out.write("6789"), Err(Overflow { capacity: 8 }));
        assert_eq!(out.cursor(), 0);
    }

    #[test]
    fn long_output_is_paged() {
        let mut out = OutputBuffer::new(4096, 5);
        out.write(&numbered(12)).unwrap();

        let first = out.take_flush(PROMPT).unwrap();
        assert_eq!(
            std::str::from_utf8(&first).unwrap(),
            format!("{}[ Press return to continue (41%) ]\r\n", numbered(5))
        );
        assert!(out.is_paging());
        assert!(!out.has_pending());
        assert_eq!(out.take_flush(PROMPT), None);

        out.request_next_page();
        let second = out.take_flush(PROMPT).unwrap();
        assert!(second.starts_with(b"line 6\r\n"));
        assert!(second.ends_with(b"[ Press return to continue (83%) ]\r\n"));

        out.request_next_page();
        let last = out.take_flush(PROMPT).unwrap();
        assert_eq!(&last[..], b"line 11\r\nline 12\r\n\r\n> ");
        assert!(!out.is_paging());
    }

    #[test]
    fn abandoning_drops_held_pages_at_next_flush() {
        let mut out = OutputBuffer::new(4096, 5);
        out.write(&numbered(12)).unwrap();
        out.take_flush(PROMPT).unwrap();

        out.abandon_pages();
        assert!(out.is_paging());
        out.write("fresh\r\n").unwrap();
        assert_eq!(&out.take_flush(PROMPT).unwrap()[..], b"fresh\r\n\r\n> ");
        assert!(!out.is_paging());
    }

    #[test]
    fn output_during_paging_waits_behind_pages() {
        let mut out = OutputBuffer::new(4096, 5);
        out.write(&numbered(7)).unwrap();
        out.take_flush(PROMPT).unwrap();

        out.write("late\r\n").unwrap();
        assert_eq!(out.take_flush(PROMPT), None);
        assert_eq!(out.cursor(), 0);

        out.request_next_page();
        assert_eq!(
            &out.take_flush(PROMPT).unwrap()[..],
            b"line 6\r\nline 7\r\nlate\r\n\r\n> "
        );
    }

    #[test]
    fn held_pages_are_dropped_when_late_output_would_overflow() {
        let mut out = OutputBuffer::new(64, 2);
        out.write("a\r\nb\r\nc\r\nd\r\n").unwrap();
        out.take_flush(PROMPT).unwrap();
        assert!(out.is_paging());

        let late = format!("{}\r\n", "x".repeat(58));
        out.write(&late).unwrap();
        assert!(out.has_pending());
        let chunk = out.take_flush(PROMPT).unwrap();
        assert_eq!(chunk, Bytes::from(format!("{late}{PROMPT}")));
        assert!(!out.is_paging());
    }

    #[test]
    fn take_all_ignores_pagination() {
        let mut out = OutputBuffer::new(4096, 5);
        out.write(&numbered(7)).unwrap();
        out.take_flush(PROMPT).unwrap();
        out.write("bye\r\n").unwrap();
        assert_eq!(&out.take_all().unwrap()[..], b"line 6\r\nline 7\r\nbye\r\n");
        assert_eq!(out.take_all(), None);
    }

    #[test]
    fn count_lines_handles_tails() {
        assert_eq!(count_lines(b""), 0);
        assert_eq!(count_lines(b"a"), 1);
        assert_eq!(count_lines(b"a\r\n"), 1);
        assert_eq!(count_lines(b"a\r\nb"), 2);
    }
}
