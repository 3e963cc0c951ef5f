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

use encoding_rs::Encoding;
use lazy_static::lazy_static;
use regex::Regex;

use super::quoted_printable::qp_decode;

lazy_static! {
    // The optional leading/trailing groups capture a parameter-quote
    // prefix/suffix (`name="` ... `"`); whatever they match is preserved
    // verbatim around the decoded text.
    static ref ENCODED_WORD: Regex = Regex::new(
        r#"^([A-Za-z0-9*-]+=")?=\?([A-Za-z0-9-]+)\?([QqBb])\?([A-Za-z0-9="_+./-]+)\?=(")?$"#
    )
    .unwrap();
}

/// Test if `word` resembles an RFC 2047 "encoded word".
///
/// This is the cheap shape test applied to every space-delimited token of a
/// header value: `=?` prefix, `?=` suffix, and a `?b?`/`?q?` encoding
/// marker strictly more than 4 characters away from either end. Tokens that
/// pass it still go through the full grammar (and may yet fail to decode).
fn is_encoded_word(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    if !lower.starts_with("=?") || !lower.ends_with("?=") {
        return false;
    }

    match lower.find("?b?").or_else(|| lower.find("?q?")) {
        Some(idx) => idx > 4 && lower.len() - 1 - idx > 4,
        None => false,
    }
}

/// Test if `word` (in its entirety) is an RFC 2047 encoded word, and if so,
/// decode it.
///
/// Returns `None` if it is not an encoded word or if it could not be
/// decoded. The distinction matters to the caller: whitespace is deleted
/// between adjacent encoded words, but must be left alone in all other
/// cases, so "decoded" and "kept verbatim" cannot share a return value.
///
/// Failures are never errors; the caller re-emits the original token.
pub fn ew_decode(word: &str) -> Option<String> {
    if !is_encoded_word(word) {
        return None;
    }

    let captures = ENCODED_WORD.captures(word)?;

    let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
    let charset = captures.get(2)?.as_str();
    let transfer_encoding = captures.get(3)?.as_str();
    let payload = captures.get(4)?.as_str();
    let suffix = captures.get(5).map(|m| m.as_str()).unwrap_or("");

    let content = decode_xfer(transfer_encoding, payload)?;
    let text = decode_charset(charset, &content)?;

    let mut result = String::with_capacity(prefix.len() + text.len() + suffix.len());
    result.push_str(prefix);
    result.push_str(&text);
    result.push_str(suffix);
    Some(result)
}

fn decode_xfer(xfer: &str, payload: &str) -> Option<Vec<u8>> {
    match xfer {
        "q" | "Q" => {
            // _ in the payload (before transfer decoding) stands for ASCII
            // space regardless of charset
            let payload = payload.replace('_', " ");
            qp_decode(payload.as_bytes()).ok().map(|c| c.into_owned())
        },
        "b" | "B" => base64::decode(payload).ok(),
        _ => None,
    }
}

fn decode_charset(charset: &str, content: &[u8]) -> Option<String> {
    let encoding = Encoding::for_label_no_replacement(charset.as_bytes())?;
    let (text, had_errors) = encoding.decode_with_bom_removal(content);
    if had_errors {
        None
    } else {
        Some(text.into_owned())
    }
}

/// Decode every encoded word inside one (already unfolded) header value.
///
/// The value is tokenized on ASCII spaces. Adjacent encoded words are
/// concatenated with nothing between them; a single space is emitted before
/// a plain token and before the first encoded word of a run. Leading space
/// in the final result is trimmed. A token that fails to decode is emitted
/// verbatim as a plain token.
pub fn decode_header_text(value: &str) -> String {
    let mut result = String::new();
    let mut prev_encoded = false;

    for token in value.split(' ') {
        match ew_decode(token) {
            Some(decoded) => {
                if !prev_encoded {
                    result.push(' ');
                }
                result.push_str(&decoded);
                prev_encoded = true;
            },
            None => {
                result.push(' ');
                result.push_str(token);
                prev_encoded = false;
            },
        }
    }

    result.trim_start_matches(' ').to_owned()
}
