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

//! Message framing: the `From `/`>From ` marker lines that delimit
//! messages in an mbox archive.
//!
//! Note that body lines which themselves begin with the literal marker are
//! not unescaped here, and a producer that failed to quote them will cause
//! the next message to start early. That mirrors the mboxo/mboxrd
//! ambiguity inherent to the format.

use chrono::prelude::*;

use crate::support::error::Error;

const MBOXO_PREFIX: &[u8] = b"From ";
const MBOXRD_PREFIX: &[u8] = b">From ";

/// The fixed asctime-style timestamp format of the marker line, e.g.
/// `Thu Jul  3 12:00:00 2025`. No other format is attempted.
const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Whether this line starts a new message.
pub fn is_message_start(line: &[u8]) -> bool {
    line.starts_with(MBOXO_PREFIX) || line.starts_with(MBOXRD_PREFIX)
}

/// Parse a message-start line into the sender id and timestamp.
pub fn parse_message_start(
    line: &[u8],
) -> Result<(String, DateTime<Utc>), Error> {
    let rest = if line.starts_with(MBOXO_PREFIX) {
        &line[MBOXO_PREFIX.len()..]
    } else if line.starts_with(MBOXRD_PREFIX) {
        &line[MBOXRD_PREFIX.len()..]
    } else {
        return Err(Error::Format("not a message start line".to_owned()));
    };

    let space = memchr::memchr(b' ', rest).ok_or_else(|| {
        Error::Format("missing ' ' after sender id".to_owned())
    })?;
    let sender = String::from_utf8_lossy(&rest[..space]).into_owned();

    let timestamp = String::from_utf8_lossy(&rest[space + 1..]).into_owned();
    let timestamp = timestamp.trim_start_matches(' ');
    let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .map_err(|e| {
            Error::Format(format!("invalid timestamp {:?}: {}", timestamp, e))
        })?;

    Ok((sender, Utc.from_utc_datetime(&timestamp)))
}
