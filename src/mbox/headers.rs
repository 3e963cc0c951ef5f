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

//! Header block parsing.
//!
//! A header block is the run of lines from the current cursor position up
//! to a blank line. There is deliberately no RFC 5322 grammar here: a line
//! is `name: value` if the text before its first colon is free of
//! whitespace, CR, LF, and colons; everything else is a continuation of
//! whatever value came last.

use std::collections::HashMap;
use std::io::BufRead;

use crate::mime::encoded_word::decode_header_text;
use crate::support::error::Error;
use crate::support::line_stream::LineStream;

pub const CONTENT_TYPE: &str = "CONTENT-TYPE";
pub const CONTENT_TRANSFER_ENCODING: &str = "CONTENT-TRANSFER-ENCODING";
pub const CONTENT_DISPOSITION: &str = "CONTENT-DISPOSITION";
pub const CONTENT_ID: &str = "CONTENT-ID";

/// One header name with all of its values, in order of appearance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub values: Vec<String>,
}

/// Header name → ordered values, with names normalised to upper case.
///
/// Repeated occurrences of a name append further values; continuation
/// lines extend the most recently added value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderMap(HashMap<String, Vec<String>>);

impl HeaderMap {
    /// Look up a header by name (any case). `None` means the header was
    /// not present at all.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0.get(&normalise(name)).map(Vec::as_slice)
    }

    /// The first value of a header, if present.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&normalise(name))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All headers, in no particular order.
    pub fn to_headers(&self) -> Vec<Header> {
        self.0
            .iter()
            .map(|(name, values)| Header {
                name: name.clone(),
                values: values.clone(),
            })
            .collect()
    }

    fn push_value(&mut self, name: String, value: String) {
        self.0.entry(name).or_insert_with(Vec::new).push(value);
    }

    fn extend_last(&mut self, name: &str, extra: &str) -> bool {
        match self.0.get_mut(name).and_then(|v| v.last_mut()) {
            Some(last) => {
                last.push_str(extra);
                true
            },
            None => false,
        }
    }
}

fn normalise(name: &str) -> String {
    name.to_ascii_uppercase()
}

fn is_header_name(name: &[u8]) -> bool {
    !name
        .iter()
        .any(|&b| b' ' == b || b'\t' == b || b'\r' == b || b'\n' == b || b':' == b)
}

/// Parse a header block, consuming lines up to and including the blank
/// terminator (or the end of input).
///
/// Every consumed line, the blank terminator included, is appended to
/// `content` — the owning message's line buffer — so raw reconstruction
/// and section indices stay consistent.
pub(crate) fn parse_header_block<R: BufRead>(
    stream: &mut LineStream<R>,
    content: &mut Vec<Vec<u8>>,
) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::default();
    let mut current_name: Option<String> = None;

    while let Some(line) = stream.next_line()? {
        if line.is_empty() {
            content.push(line);
            break;
        }

        let split = match memchr::memchr(b':', &line) {
            Some(idx) if is_header_name(&line[..idx]) => Some(idx),
            _ => None,
        };

        match split {
            Some(idx) => {
                let name = normalise(&String::from_utf8_lossy(&line[..idx]));
                let value = decode_header_text(&String::from_utf8_lossy(
                    &line[idx + 1..],
                ));
                headers.push_value(name.clone(), value);
                current_name = Some(name);
            },
            None => {
                let extra =
                    decode_header_text(&String::from_utf8_lossy(&line));
                let attached = match current_name {
                    Some(ref name) => headers.extend_last(name, &extra),
                    None => false,
                };
                if !attached {
                    return Err(Error::Format(
                        "header continuation with no preceding header"
                            .to_owned(),
                    ));
                }
            },
        }

        content.push(line);
    }

    Ok(headers)
}

#[cfg(test)]
mod test {
    use std::io;

    use super::*;

    fn parse(data: &[u8]) -> (HeaderMap, Vec<Vec<u8>>) {
        let mut stream = LineStream::new(io::Cursor::new(data.to_vec()));
        let mut content = Vec::new();
        let headers = parse_header_block(&mut stream, &mut content).unwrap();
        (headers, content)
    }

    #[test]
    fn simple_headers() {
        let (headers, content) =
            parse(b"Subject: hello\nX-Tag: v\n\nbody\n");
        assert_eq!(Some("hello"), headers.first("Subject"));
        assert_eq!(Some("v"), headers.first("x-tag"));
        // Stops at the blank line, which is consumed and recorded
        assert_eq!(3, content.len());
        assert_eq!(b"" as &[u8], &content[2][..]);
    }

    #[test]
    fn name_lookup_is_case_normalised() {
        let (headers, _) = parse(b"conTENT-type: text/plain\n\n");
        assert_eq!(Some("text/plain"), headers.first("Content-Type"));
        assert_eq!(Some("text/plain"), headers.first("CONTENT-TYPE"));
    }

    #[test]
    fn repeated_header_appends_values() {
        let (headers, _) = parse(b"Received: a\nReceived: b\n\n");
        assert_eq!(
            &["a".to_owned(), "b".to_owned()] as &[String],
            headers.get("Received").unwrap()
        );
    }

    #[test]
    fn continuation_extends_last_value_without_separator() {
        let (headers, _) =
            parse(b"Subject: hello\n world\nX-Other: x\n\n");
        assert_eq!(Some("helloworld"), headers.first("Subject"));
        assert_eq!(Some("x"), headers.first("X-Other"));
    }

    #[test]
    fn continuation_attaches_to_most_recent_name() {
        let (headers, _) =
            parse(b"A: one\nB: two\n more\nA: three\n four\n\n");
        assert_eq!(Some("twomore"), headers.first("B"));
        assert_eq!(
            &["one".to_owned(), "threefour".to_owned()] as &[String],
            headers.get("A").unwrap()
        );
    }

    #[test]
    fn multi_line_continuation_concatenates_all_segments() {
        let (headers, _) = parse(b"Subject: a\n b\n c\n d\n\n");
        assert_eq!(Some("abcd"), headers.first("Subject"));
    }

    #[test]
    fn name_with_embedded_space_is_a_continuation() {
        let (headers, _) = parse(b"Subject: hello\nnot a: header\n\n");
        // "not a" contains a space, so the whole line is a continuation
        assert_eq!(Some("hellonot a: header"), headers.first("Subject"));
    }

    #[test]
    fn continuation_without_header_is_an_error() {
        let mut stream =
            LineStream::new(io::Cursor::new(b"no colon here\n\n".to_vec()));
        let mut content = Vec::new();
        match parse_header_block(&mut stream, &mut content) {
            Err(Error::Format(_)) => (),
            r => panic!("unexpected result: {:?}", r),
        }
    }

    #[test]
    fn encoded_words_are_decoded_in_values() {
        let (headers, _) =
            parse(b"Subject: =?ISO-8859-1?Q?Andr=E9?= says hi\n\n");
        assert_eq!(Some("Andr\u{e9} says hi"), headers.first("Subject"));
    }

    #[test]
    fn end_of_input_terminates_block() {
        let (headers, content) = parse(b"Subject: hi");
        assert_eq!(Some("hi"), headers.first("Subject"));
        assert_eq!(1, content.len());
    }
}
