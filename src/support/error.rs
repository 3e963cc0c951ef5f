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

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The message-start line or a header block is structurally invalid.
    #[error("malformed message: {0}")]
    Format(String),
    /// A header required to classify the message or a section is absent.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),
    /// A multipart Content-Type carried no extractable boundary parameter.
    #[error("multipart content without a boundary parameter")]
    MissingBoundary,
    /// A base64 or quoted-printable payload could not be decoded.
    #[error("payload decode failed: {0}")]
    Decode(String),
    /// The advisory lock on the archive was not acquired within the retry
    /// budget.
    #[error("could not lock archive after {attempts} attempt(s)")]
    Lock { attempts: u32 },
    /// The archive is exhausted. A sentinel rather than a failure; every
    /// scan that runs to completion ends with this.
    #[error("end of archive")]
    EndOfData,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Regex(#[from] regex::Error),
}
