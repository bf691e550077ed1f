// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Virtual terminal wrapper: feeds raw PTY bytes into an `avt::Vt` VT100
//! emulator and renders the current screen as a newline-joined string, per
//! spec.md §4.1 (`ReadScreen`).

/// Terminal-emulated screen backed by `avt`.
pub struct TerminalScreen {
    vt: avt::Vt,
    /// Buffer for incomplete UTF-8 trailing bytes between `feed()` calls —
    /// PTY reads can split a multi-byte rune across chunk boundaries.
    utf8_buf: [u8; 3],
    utf8_buf_len: u8,
}

impl TerminalScreen {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { vt: avt::Vt::new(cols as usize, rows as usize), utf8_buf: [0; 3], utf8_buf_len: 0 }
    }

    /// Feed raw bytes read from the PTY master into the emulator.
    pub fn feed(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        let buf_len = self.utf8_buf_len as usize;
        let owned: Vec<u8>;
        let input = if buf_len == 0 {
            data
        } else {
            owned = [&self.utf8_buf[..buf_len], data].concat();
            self.utf8_buf_len = 0;
            &owned
        };

        let tail = incomplete_utf8_tail_len(input);
        let (to_feed, to_buffer) = input.split_at(input.len() - tail);

        if !to_buffer.is_empty() {
            self.utf8_buf[..to_buffer.len()].copy_from_slice(to_buffer);
            self.utf8_buf_len = to_buffer.len() as u8;
        }

        if !to_feed.is_empty() {
            let s = String::from_utf8_lossy(to_feed);
            let _ = self.vt.feed_str(&s);
        }
    }

    /// Render the current screen as a newline-joined string, trailing
    /// whitespace-only lines collapsed to empty (the emulator pads every
    /// row to the terminal width).
    pub fn render(&self) -> String {
        self.vt.view().map(|line| line.text().trim_end().to_string()).collect::<Vec<_>>().join("\n")
    }

    /// Resize the underlying virtual terminal.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        let _ = self.vt.resize(cols as usize, rows as usize);
    }
}

/// Returns the number of trailing bytes that form an incomplete UTF-8
/// sequence, so they can be buffered and prepended to the next `feed`.
fn incomplete_utf8_tail_len(data: &[u8]) -> usize {
    let len = data.len();
    for i in 1..=len.min(3) {
        let byte = data[len - i];
        if byte < 0x80 {
            return 0;
        }
        if byte >= 0xC0 {
            let expected = if byte < 0xE0 {
                2
            } else if byte < 0xF0 {
                3
            } else {
                4
            };
            return if i < expected { i } else { 0 };
        }
    }
    0
}

#[cfg(test)]
#[path = "screen_tests.rs"]
mod tests;
