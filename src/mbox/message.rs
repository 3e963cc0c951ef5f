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

//! The parsed message model.
//!
//! A `Message` owns a line buffer (every line read for it after the marker
//! line, terminators stripped) and the body/attachment sections are views
//! into that buffer: a header set plus a start/end index pair. Nothing is
//! copied out of the buffer until a body or attachment is materialised.

use std::collections::HashMap;
use std::io::BufRead;

use chrono::prelude::*;

use super::attachment::Attachment;
use super::framing;
use super::headers::{
    self, Header, HeaderMap, CONTENT_TRANSFER_ENCODING, CONTENT_TYPE,
};
use super::walker;
use crate::mime::content_encoding::{
    self, parse_content_transfer_encoding, ContentTransferEncoding,
};
use crate::mime::content_type;
use crate::support::error::Error;
use crate::support::line_stream::LineStream;

/// A view of one part of a message: the part's own headers plus the range
/// of buffer lines holding its content.
///
/// `start..end` excludes the delimiter line that ended the part and the
/// blank line separating the part's headers from its content. Invariant:
/// `start <= end <= ` buffer length.
#[derive(Clone, Debug)]
pub(crate) struct Section {
    pub(crate) headers: HeaderMap,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

/// One message out of an mbox archive.
#[derive(Clone, Debug)]
pub struct Message {
    pub(crate) sender: String,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) headers: HeaderMap,
    pub(crate) bodies: HashMap<String, Section>,
    pub(crate) attachments: Vec<Section>,
    pub(crate) content: Vec<Vec<u8>>,
}

impl Message {
    /// Parse the next message from the stream.
    ///
    /// Scans forward to the next message marker; `Error::EndOfData` if the
    /// stream runs out first.
    pub(crate) fn read_from<R: BufRead>(
        stream: &mut LineStream<R>,
    ) -> Result<Message, Error> {
        let start_line = loop {
            match stream.next_line()? {
                None => return Err(Error::EndOfData),
                Some(line) if framing::is_message_start(&line) => break line,
                Some(_) => (),
            }
        };

        let (sender, timestamp) = framing::parse_message_start(&start_line)?;
        let mut msg = Message {
            sender,
            timestamp,
            headers: HeaderMap::default(),
            bodies: HashMap::new(),
            attachments: Vec::new(),
            content: Vec::new(),
        };

        msg.headers =
            headers::parse_header_block(stream, &mut msg.content)?;

        let content_type_value = msg
            .headers
            .first(CONTENT_TYPE)
            .map(str::to_owned)
            .ok_or(Error::MissingHeader("Content-Type"))?;
        let bare = content_type::bare_mime_type(&content_type_value);

        if content_type::is_multipart(&bare) {
            let boundary = content_type::boundary_param(&content_type_value)
                .ok_or(Error::MissingBoundary)?;
            let mut delim = Vec::with_capacity(boundary.len() + 2);
            delim.extend_from_slice(b"--");
            delim.extend_from_slice(boundary.as_bytes());
            walker::walk_multipart(stream, &mut msg, &delim)?;
        } else {
            msg.parse_simple_body(stream, bare)?;
        }

        Ok(msg)
    }

    /// A non-multipart body: everything up to the next message marker (not
    /// consumed) or the end of input, as one section keyed by the bare
    /// mime type.
    fn parse_simple_body<R: BufRead>(
        &mut self,
        stream: &mut LineStream<R>,
        bare_mime_type: String,
    ) -> Result<(), Error> {
        let start = self.content.len();

        loop {
            let at_end = match stream.peek_line()? {
                None => true,
                Some(line) => framing::is_message_start(line),
            };
            if at_end {
                break;
            }
            if let Some(line) = stream.next_line()? {
                self.content.push(line);
            }
        }

        let section = Section {
            headers: HeaderMap::default(),
            start,
            end: self.content.len(),
        };
        self.bodies.insert(bare_mime_type, section);
        Ok(())
    }

    /// The id parsed from the message marker line.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// All values of one header, `None` if the message doesn't carry it.
    pub fn header(&self, name: &str) -> Option<&[String]> {
        self.headers.get(name)
    }

    /// Every top-level header of the message, in no particular order.
    pub fn headers(&self) -> Vec<Header> {
        self.headers.to_headers()
    }

    /// The mime types for which a body section was recorded.
    pub fn body_mime_types(&self) -> impl Iterator<Item = &str> {
        self.bodies.keys().map(String::as_str)
    }

    /// Materialise the body recorded under `mime_type` (e.g.
    /// `"text/plain"`).
    ///
    /// `Ok(None)` when no such body exists. The raw line range is
    /// concatenated without separators and decoded according to the
    /// effective transfer encoding; malformed base64/quoted-printable
    /// payloads surface as `Error::Decode`.
    pub fn body(&self, mime_type: &str) -> Result<Option<Vec<u8>>, Error> {
        let section =
            match self.bodies.get(&mime_type.to_ascii_lowercase()) {
                Some(section) => section,
                None => return Ok(None),
            };

        let raw = self.concat_section(section);
        content_encoding::decode(
            self.effective_transfer_encoding(section),
            &raw,
        )
        .map(Some)
    }

    /// Project the attachment sections into self-contained values.
    pub fn attachments(&self) -> Vec<Attachment> {
        self.attachments
            .iter()
            .map(|section| Attachment::project(self, section))
            .collect()
    }

    /// The message's full recorded text: every buffered line joined with
    /// `\n`. The marker line is not part of the buffer.
    pub fn raw_contents(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (i, line) in self.content.iter().enumerate() {
            if i > 0 {
                out.push(b'\n');
            }
            out.extend_from_slice(line);
        }
        out
    }

    /// The transfer encoding governing a section: its own
    /// Content-Transfer-Encoding header if present, else the message's
    /// top-level one, else identity.
    pub(crate) fn effective_transfer_encoding(
        &self,
        section: &Section,
    ) -> ContentTransferEncoding {
        self.effective_transfer_encoding_value(section)
            .map(parse_content_transfer_encoding)
            .unwrap_or_default()
    }

    pub(crate) fn effective_transfer_encoding_value<'a>(
        &'a self,
        section: &'a Section,
    ) -> Option<&'a str> {
        section
            .headers
            .first(CONTENT_TRANSFER_ENCODING)
            .or_else(|| self.headers.first(CONTENT_TRANSFER_ENCODING))
    }

    pub(crate) fn concat_section(&self, section: &Section) -> Vec<u8> {
        let mut out = Vec::new();
        for line in &self.content[section.start..section.end] {
            out.extend_from_slice(line);
        }
        out
    }
}
