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

//! Content-Transfer-Encoding resolution and payload decoding.

use std::borrow::Cow;

use super::quoted_printable::qp_decode;
use crate::support::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentTransferEncoding {
    SevenBit,
    EightBit,
    Binary,
    Base64,
    QuotedPrintable,
}

impl Default for ContentTransferEncoding {
    fn default() -> Self {
        ContentTransferEncoding::SevenBit
    }
}

/// Parse a Content-Transfer-Encoding header value.
///
/// Unrecognised values collapse to `SevenBit`; every encoding other than
/// base64 and quoted-printable is an identity transform here anyway.
pub fn parse_content_transfer_encoding(
    value: &str,
) -> ContentTransferEncoding {
    let value = value.trim();
    if value.eq_ignore_ascii_case("base64") {
        ContentTransferEncoding::Base64
    } else if value.eq_ignore_ascii_case("quoted-printable") {
        ContentTransferEncoding::QuotedPrintable
    } else if value.eq_ignore_ascii_case("8bit") {
        ContentTransferEncoding::EightBit
    } else if value.eq_ignore_ascii_case("binary") {
        ContentTransferEncoding::Binary
    } else {
        ContentTransferEncoding::SevenBit
    }
}

/// Decode a raw payload according to its transfer encoding.
///
/// Base64 uses the standard alphabet and is strict; malformed base64 and
/// malformed quoted-printable both surface as `Error::Decode`. Identity
/// encodings return the payload unchanged.
pub fn decode(
    cte: ContentTransferEncoding,
    raw: &[u8],
) -> Result<Vec<u8>, Error> {
    match cte {
        ContentTransferEncoding::Base64 => {
            base64::decode(raw).map_err(|e| Error::Decode(e.to_string()))
        },
        ContentTransferEncoding::QuotedPrintable => {
            qp_decode(raw).map(Cow::into_owned)
        },
        _ => Ok(raw.to_vec()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_content_transfer_encoding() {
        use super::ContentTransferEncoding as CTE;

        assert_eq!(CTE::Base64, parse_content_transfer_encoding("base64"));
        assert_eq!(CTE::Base64, parse_content_transfer_encoding(" Base64 "));
        assert_eq!(
            CTE::QuotedPrintable,
            parse_content_transfer_encoding("quoted-printable")
        );
        assert_eq!(CTE::EightBit, parse_content_transfer_encoding("8BIT"));
        assert_eq!(CTE::Binary, parse_content_transfer_encoding("binary"));
        assert_eq!(CTE::SevenBit, parse_content_transfer_encoding("7bit"));
        assert_eq!(CTE::SevenBit, parse_content_transfer_encoding("x-wat"));
        assert_eq!(CTE::SevenBit, parse_content_transfer_encoding(""));
    }

    #[test]
    fn decode_identity_passthrough() {
        let raw = b"foo\xFEbar" as &[u8];
        assert_eq!(
            raw,
            &decode(ContentTransferEncoding::SevenBit, raw).unwrap()[..]
        );
        assert_eq!(
            raw,
            &decode(ContentTransferEncoding::Binary, raw).unwrap()[..]
        );
    }

    #[test]
    fn decode_base64() {
        assert_eq!(
            b"hello world" as &[u8],
            &decode(ContentTransferEncoding::Base64, b"aGVsbG8gd29ybGQ=")
                .unwrap()[..]
        );
    }

    #[test]
    fn decode_base64_malformed() {
        match decode(ContentTransferEncoding::Base64, b"not!base64") {
            Err(Error::Decode(_)) => (),
            r => panic!("unexpected result: {:?}", r),
        }
    }

    #[test]
    fn decode_quoted_printable() {
        assert_eq!(
            b"na\xEFve" as &[u8],
            &decode(ContentTransferEncoding::QuotedPrintable, b"na=EFve")
                .unwrap()[..]
        );
    }

    #[test]
    fn decode_quoted_printable_malformed() {
        match decode(ContentTransferEncoding::QuotedPrintable, b"bad=Z") {
            Err(Error::Decode(_)) => (),
            r => panic!("unexpected result: {:?}", r),
        }
    }
}
