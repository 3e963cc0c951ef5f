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

//! Attachments projected out of a message's attachment sections.
//!
//! An attachment is either *named* (the usual `Content-Disposition:
//! attachment; filename=...` file) or *inline* (referenced from another
//! part by its Content-ID). Both share the same payload shape and decode
//! through the same transfer-encoding machinery as bodies. Metadata
//! extraction never fails: the name filters of the reader must be able to
//! evaluate any message without producing an error.

use lazy_static::lazy_static;
use regex::Regex;

use super::headers::{
    HeaderMap, CONTENT_DISPOSITION, CONTENT_ID, CONTENT_TYPE,
};
use super::message::{Message, Section};
use crate::mime::content_encoding::{
    self, parse_content_transfer_encoding,
};
use crate::mime::content_type;
use crate::support::error::Error;

lazy_static! {
    static ref FILENAME: Regex =
        Regex::new(r#"filename="?([^"\r\n]+)"?"#).unwrap();
    // Anchored after a separator so it cannot match inside "filename="
    static ref NAME: Regex =
        Regex::new(r#"(?:^|[;\s])name="?([^"\r\n]+)"?"#).unwrap();
}

/// What kind of attachment a section is, with the metadata specific to
/// that kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttachmentKind {
    /// A file-like attachment: `filename` from the Content-Disposition,
    /// `name` from the Content-Type.
    Named {
        filename: Option<String>,
        name: Option<String>,
    },
    /// A part referenced by Content-ID from elsewhere in the message.
    Inline { content_id: String },
}

/// One attachment, detached from the owning message.
#[derive(Clone, Debug)]
pub struct Attachment {
    headers: HeaderMap,
    mime_type: String,
    transfer_encoding: Option<String>,
    raw: Vec<u8>,
    kind: AttachmentKind,
}

impl Attachment {
    /// Project a message's attachment section into a self-contained value.
    pub(crate) fn project(msg: &Message, section: &Section) -> Self {
        let mime_type = section
            .headers
            .first(CONTENT_TYPE)
            .map(|ct| content_type::bare_mime_type(ct))
            .unwrap_or_else(|| "application/octet-stream".to_owned());

        let transfer_encoding = msg
            .effective_transfer_encoding_value(section)
            .map(str::to_owned);

        let kind = match section.headers.first(CONTENT_ID) {
            Some(content_id) => AttachmentKind::Inline {
                content_id: strip_angles(content_id.trim()).to_owned(),
            },
            None => AttachmentKind::Named {
                filename: section
                    .headers
                    .first(CONTENT_DISPOSITION)
                    .and_then(|v| capture(&FILENAME, v)),
                name: section
                    .headers
                    .first(CONTENT_TYPE)
                    .and_then(|v| capture(&NAME, v)),
            },
        };

        Attachment {
            headers: section.headers.clone(),
            mime_type,
            transfer_encoding,
            raw: msg.concat_section(section),
            kind,
        }
    }

    /// The part's own header set, disposition header included.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The effective transfer encoding value, `None` when neither the part
    /// nor the message declared one.
    pub fn transfer_encoding(&self) -> Option<&str> {
        self.transfer_encoding.as_deref()
    }

    pub fn kind(&self) -> &AttachmentKind {
        &self.kind
    }

    /// The disposition filename, for named attachments that carry one.
    pub fn filename(&self) -> Option<&str> {
        match self.kind {
            AttachmentKind::Named {
                filename: Some(ref f),
                ..
            } => Some(f),
            _ => None,
        }
    }

    /// The Content-Type `name` parameter, for named attachments that
    /// carry one.
    pub fn name(&self) -> Option<&str> {
        match self.kind {
            AttachmentKind::Named { name: Some(ref n), .. } => Some(n),
            _ => None,
        }
    }

    pub fn content_id(&self) -> Option<&str> {
        match self.kind {
            AttachmentKind::Inline { ref content_id } => Some(content_id),
            _ => None,
        }
    }

    /// The payload exactly as it sits in the archive (transfer encoding
    /// not undone).
    pub fn raw_content(&self) -> &[u8] {
        &self.raw
    }

    /// The payload with its transfer encoding undone, through the same
    /// decode path as message bodies.
    pub fn decoded(&self) -> Result<Vec<u8>, Error> {
        let cte = self
            .transfer_encoding
            .as_deref()
            .map(parse_content_transfer_encoding)
            .unwrap_or_default();
        content_encoding::decode(cte, &self.raw)
    }

    /// Every name this attachment is known by, for name filtering.
    pub(crate) fn name_candidates(&self) -> Vec<&str> {
        match self.kind {
            AttachmentKind::Named {
                ref filename,
                ref name,
            } => filename
                .iter()
                .chain(name.iter())
                .map(String::as_str)
                .collect(),
            AttachmentKind::Inline { ref content_id } => {
                vec![content_id.as_str()]
            },
        }
    }
}

fn capture(regex: &Regex, value: &str) -> Option<String> {
    regex
        .captures(value)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}

fn strip_angles(value: &str) -> &str {
    if value.starts_with('<') && value.ends_with('>') && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
