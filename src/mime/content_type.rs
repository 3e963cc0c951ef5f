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

//! Content-Type value analysis.
//!
//! This deliberately stops far short of a full RFC 2045 parameter parser:
//! the bare type is whatever precedes the first `;`, and the two parameters
//! the archive walk needs (`boundary`, `charset`) are picked out by pattern
//! match, optionally quoted, terminated by a quote or the end of the value.

use lazy_static::lazy_static;
use regex::Regex;

pub const MULTIPART_MIXED: &str = "multipart/mixed";
pub const MULTIPART_RELATED: &str = "multipart/related";
pub const MULTIPART_ALTERNATIVE: &str = "multipart/alternative";
pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";

lazy_static! {
    static ref BOUNDARY: Regex =
        Regex::new(r#"boundary="?([^"\r\n]+)"?"#).unwrap();
    static ref CHARSET: Regex =
        Regex::new(r#"charset="?([^"\r\n]+)"?"#).unwrap();
}

/// Extract the bare mime type from a Content-Type value: the text before
/// the first `;`, trimmed and ASCII-lowercased.
///
/// Lowercasing makes the result usable both for classification and as the
/// body lookup key.
pub fn bare_mime_type(value: &str) -> String {
    let bare = match value.find(';') {
        Some(idx) => &value[..idx],
        None => value,
    };
    bare.trim_matches(|c: char| ' ' == c || '\t' == c)
        .to_ascii_lowercase()
}

/// Extract the `boundary=` parameter value, if any.
pub fn boundary_param(value: &str) -> Option<String> {
    BOUNDARY
        .captures(value)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Extract the `charset=` parameter value, if any.
pub fn charset_param(value: &str) -> Option<String> {
    CHARSET
        .captures(value)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Whether a *message-level* bare mime type makes the message multipart.
///
/// Only `multipart/mixed` and `multipart/related` count here;
/// `multipart/alternative` is recognised by the section walker when it
/// shows up nested inside one of those, never at the top level.
pub fn is_multipart(bare_mime_type: &str) -> bool {
    MULTIPART_MIXED == bare_mime_type || MULTIPART_RELATED == bare_mime_type
}
