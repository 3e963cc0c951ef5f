//-
// Copyright (c) 2026, the mboxscan authors
//
// This file is part of mboxscan.
//
// Mboxscan is free software: you can redistribute it and/or modify it under
// the terms of  the GNU General Public  License as published by  the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Mboxscan is distributed in the hope that  it will be useful,  but WITHOUT
// ANY  WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or
// FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for
// more details.
//
// You should have received a copy of the GNU General Public License along
// with mboxscan. If not, see <http://www.gnu.org/licenses/>.

//! Line-oriented cursor over a buffered reader.
//!
//! All parsing layers share one `LineStream` per archive, so nested scans
//! (the multipart walker in particular) always observe the same advancing
//! position. The one-line peek is what lets the simple-body scanner stop at
//! the next message marker without consuming it.

use std::io::{self, BufRead};

/// A pull-based line cursor with one line of lookahead.
///
/// Lines are returned without their terminator; both "\n" and "\r\n" are
/// recognised. A line at end of input without any terminator is still
/// returned.
#[derive(Debug)]
pub struct LineStream<R> {
    reader: R,
    peeked: Option<Option<Vec<u8>>>,
}

impl<R: BufRead> LineStream<R> {
    pub fn new(reader: R) -> Self {
        LineStream {
            reader,
            peeked: None,
        }
    }

    /// Returns the next line, consuming it. `None` at end of input.
    pub fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        match self.peeked.take() {
            Some(line) => Ok(line),
            None => self.read_raw(),
        }
    }

    /// Returns the next line without consuming it. `None` at end of input.
    pub fn peek_line(&mut self) -> io::Result<Option<&[u8]>> {
        if self.peeked.is_none() {
            self.peeked = Some(self.read_raw()?);
        }

        Ok(match self.peeked {
            Some(ref line) => line.as_deref(),
            None => None,
        })
    }

    fn read_raw(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        let n = self.reader.read_until(b'\n', &mut line)?;
        if 0 == n {
            return Ok(None);
        }

        if line.ends_with(b"\n") {
            line.pop();
            if line.ends_with(b"\r") {
                line.pop();
            }
        }

        Ok(Some(line))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn stream(data: &[u8]) -> LineStream<io::Cursor<Vec<u8>>> {
        LineStream::new(io::Cursor::new(data.to_vec()))
    }

    #[test]
    fn splits_unix_lines() {
        let mut s = stream(b"foo\nbar\n");
        assert_eq!(Some(b"foo".to_vec()), s.next_line().unwrap());
        assert_eq!(Some(b"bar".to_vec()), s.next_line().unwrap());
        assert_eq!(None, s.next_line().unwrap());
    }

    #[test]
    fn splits_dos_lines() {
        let mut s = stream(b"foo\r\nbar\r\n");
        assert_eq!(Some(b"foo".to_vec()), s.next_line().unwrap());
        assert_eq!(Some(b"bar".to_vec()), s.next_line().unwrap());
        assert_eq!(None, s.next_line().unwrap());
    }

    #[test]
    fn final_line_without_terminator() {
        let mut s = stream(b"foo\nbar");
        assert_eq!(Some(b"foo".to_vec()), s.next_line().unwrap());
        assert_eq!(Some(b"bar".to_vec()), s.next_line().unwrap());
        assert_eq!(None, s.next_line().unwrap());
    }

    #[test]
    fn blank_lines_preserved() {
        let mut s = stream(b"foo\n\nbar\n");
        assert_eq!(Some(b"foo".to_vec()), s.next_line().unwrap());
        assert_eq!(Some(b"".to_vec()), s.next_line().unwrap());
        assert_eq!(Some(b"bar".to_vec()), s.next_line().unwrap());
    }

    #[test]
    fn peek_does_not_consume() {
        let mut s = stream(b"foo\nbar\n");
        assert_eq!(Some(b"foo" as &[u8]), s.peek_line().unwrap());
        assert_eq!(Some(b"foo" as &[u8]), s.peek_line().unwrap());
        assert_eq!(Some(b"foo".to_vec()), s.next_line().unwrap());
        assert_eq!(Some(b"bar" as &[u8]), s.peek_line().unwrap());
        assert_eq!(Some(b"bar".to_vec()), s.next_line().unwrap());
        assert_eq!(None, s.peek_line().unwrap());
        assert_eq!(None, s.next_line().unwrap());
    }
}
