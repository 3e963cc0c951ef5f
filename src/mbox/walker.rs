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

//! The multipart section walker.
//!
//! Sections are classified by their headers: a part without a
//! Content-Disposition header is main content (keyed by bare mime type,
//! last writer wins), a part with one is an attachment. A main-content
//! part whose Content-Type begins with `multipart/alternative` recurses
//! with the alternative's own boundary, then resynchronises on the outer
//! boundary.
//!
//! Every call, nested ones included, borrows the *same* line stream, so
//! the outer walk resumes wherever the inner walk's cursor stopped. End of
//! input anywhere simply ends the walk; a truncated archive yields the
//! sections scanned so far rather than an error.

use std::io::BufRead;

use log::warn;

use super::headers::{
    self, HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE,
};
use super::message::{Message, Section};
use crate::mime::content_type::{
    self, MULTIPART_ALTERNATIVE,
};
use crate::support::error::Error;
use crate::support::line_stream::LineStream;

/// Walk one multipart body delimited by `boundary` (already carrying its
/// `--` prefix), recording sections into `msg`.
pub(crate) fn walk_multipart<R: BufRead>(
    stream: &mut LineStream<R>,
    msg: &mut Message,
    boundary: &[u8],
) -> Result<(), Error> {
    // Skip the preamble. It is discarded, not buffered: nothing between
    // the headers and the opening boundary is content.
    loop {
        match stream.next_line()? {
            None => return Ok(()),
            Some(ref line) if line.as_slice() == boundary => break,
            Some(_) => (),
        }
    }

    loop {
        if stream.peek_line()?.is_none() {
            return Ok(());
        }

        let section_headers =
            headers::parse_header_block(stream, &mut msg.content)?;
        let last = parse_section(stream, msg, boundary, section_headers)?;
        if last {
            return Ok(());
        }
    }
}

/// Parse one section starting just past its header block. Returns true if
/// the line that stopped the scan was the terminal boundary.
fn parse_section<R: BufRead>(
    stream: &mut LineStream<R>,
    msg: &mut Message,
    boundary: &[u8],
    section_headers: HeaderMap,
) -> Result<bool, Error> {
    if section_headers.contains(CONTENT_DISPOSITION) {
        let (section, last) =
            scan_section(stream, msg, boundary, section_headers)?;
        msg.attachments.push(section);
        return Ok(last);
    }

    let content_type_value = section_headers
        .first(CONTENT_TYPE)
        .map(str::to_owned)
        .ok_or(Error::MissingHeader("Content-Type"))?;

    if content_type_value.starts_with(MULTIPART_ALTERNATIVE) {
        parse_alternative(stream, msg, boundary, &content_type_value)
    } else {
        let (section, last) =
            scan_section(stream, msg, boundary, section_headers)?;
        msg.bodies.insert(
            content_type::bare_mime_type(&content_type_value),
            section,
        );
        Ok(last)
    }
}

/// A nested `multipart/alternative` part. Its discovered parts land in the
/// same message maps as everything else; afterwards the scan picks the
/// outer boundary back up.
fn parse_alternative<R: BufRead>(
    stream: &mut LineStream<R>,
    msg: &mut Message,
    outer_boundary: &[u8],
    content_type_value: &str,
) -> Result<bool, Error> {
    match content_type::boundary_param(content_type_value) {
        None => {
            // No boundary to recurse on: the part is corrupt. Swallow its
            // raw lines up to the next outer boundary rather than fail the
            // whole message.
            warn!(
                "multipart/alternative section without a boundary; \
                 skipping to the next enclosing boundary"
            );
            skip_to_boundary(stream, msg, outer_boundary)
        },
        Some(alt) => {
            let mut alt_boundary = Vec::with_capacity(alt.len() + 2);
            alt_boundary.extend_from_slice(b"--");
            alt_boundary.extend_from_slice(alt.as_bytes());
            walk_multipart(stream, msg, &alt_boundary)?;
            // The lines between the alternative's terminal boundary and
            // the next outer boundary are envelope, not content.
            skip_to_boundary(stream, msg, outer_boundary)
        },
    }
}

/// Scan one section's content lines up to (excluding) the next line that
/// starts with `boundary`. Returns the recorded section and whether the
/// stopping line was terminal.
fn scan_section<R: BufRead>(
    stream: &mut LineStream<R>,
    msg: &mut Message,
    boundary: &[u8],
    section_headers: HeaderMap,
) -> Result<(Section, bool), Error> {
    let start = msg.content.len();

    loop {
        let line = match stream.next_line()? {
            None => {
                // Truncated input: close the section at the buffer end and
                // end the walk.
                return Ok((
                    Section {
                        headers: section_headers,
                        start,
                        end: msg.content.len(),
                    },
                    true,
                ));
            },
            Some(line) => line,
        };

        let hit = line.starts_with(boundary);
        let terminal = is_final_boundary(&line, boundary);
        msg.content.push(line);

        if hit {
            let end = msg.content.len() - 1;
            return Ok((
                Section {
                    headers: section_headers,
                    start,
                    end,
                },
                terminal,
            ));
        }
    }
}

/// Discard (but buffer) lines up to the next line starting with
/// `boundary`. Returns true if that line was terminal or input ran out.
fn skip_to_boundary<R: BufRead>(
    stream: &mut LineStream<R>,
    msg: &mut Message,
    boundary: &[u8],
) -> Result<bool, Error> {
    loop {
        let line = match stream.next_line()? {
            None => return Ok(true),
            Some(line) => line,
        };

        let hit = line.starts_with(boundary);
        let terminal = is_final_boundary(&line, boundary);
        msg.content.push(line);

        if hit {
            return Ok(terminal);
        }
    }
}

fn is_final_boundary(line: &[u8], boundary: &[u8]) -> bool {
    line.len() == boundary.len() + 2
        && line.starts_with(boundary)
        && line.ends_with(b"--")
}
