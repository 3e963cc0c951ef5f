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

use std::borrow::Cow;
use std::str;

use crate::support::error::Error;

/// Decodes quoted-printable encoding, as described by RFC 2045.
///
/// Encoded bytes and soft line endings are both handled, the latter by
/// discarding. UNIX line endings are handled as well as DOS line endings.
/// 8-bit characters are passed through, including invalid UTF-8.
///
/// Malformed escapes (`=` followed by anything that is neither two hex
/// digits nor a line ending, or a dangling `=` at the end of input) are an
/// error. Callers that must degrade gracefully discard the error and keep
/// the input verbatim; the body materializer surfaces it.
pub fn qp_decode(s: &[u8]) -> Result<Cow<[u8]>, Error> {
    let mut split = s.split(|&b| b'=' == b);
    // The first fragment precedes any escape. If it is the whole input,
    // nothing needs transforming.
    let prefix = match split.next() {
        Some(prefix) if prefix.len() == s.len() => return Ok(Cow::Borrowed(s)),
        Some(prefix) => prefix,
        None => return Ok(Cow::Borrowed(s)),
    };

    let mut transformed = Vec::with_capacity(s.len());
    transformed.extend_from_slice(prefix);

    for element in split {
        // Each element is the text following one '='.
        if b'\n' == *element.first().unwrap_or(&0) {
            // Soft line break with UNIX ending, discard
            transformed.extend_from_slice(&element[1..]);
            continue;
        }

        if element.starts_with(b"\r\n") {
            // Soft line break with DOS ending, discard
            transformed.extend_from_slice(&element[2..]);
            continue;
        }

        if element.len() < 2 {
            return Err(Error::Decode(
                "incomplete quoted-printable escape".to_owned(),
            ));
        }

        let encoded = &element[..2];
        match str::from_utf8(encoded)
            .ok()
            .and_then(|e| u8::from_str_radix(e, 16).ok())
        {
            Some(byte) => {
                transformed.push(byte);
                transformed.extend_from_slice(&element[2..]);
            },
            None => {
                return Err(Error::Decode(format!(
                    "invalid quoted-printable escape ={}",
                    String::from_utf8_lossy(encoded)
                )));
            },
        }
    }

    Ok(Cow::Owned(transformed))
}
