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

//! Mboxscan reads Unix mbox archives — concatenated RFC-822/MIME messages
//! framed by `From `/`>From ` marker lines — and exposes each message's
//! sender id, timestamp, headers, and typed body/attachment sections,
//! without ever holding more than one parsed message at a time.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use mboxscan::{Error, MboxReader};
//!
//! # fn main() -> Result<(), Error> {
//! let mut reader =
//!     MboxReader::open("/var/mail/alice", 5, Duration::from_millis(200))?;
//! reader.with_header("X-Tag", "v");
//!
//! loop {
//!     match reader.read() {
//!         Ok(msg) => {
//!             println!("{}: {:?}", msg.sender(), msg.body("text/plain")?);
//!         },
//!         Err(Error::EndOfData) => break,
//!         Err(e) => return Err(e),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod mbox;
pub mod mime;
pub mod support;

pub use crate::mbox::attachment::{Attachment, AttachmentKind};
pub use crate::mbox::headers::{Header, HeaderMap};
pub use crate::mbox::message::Message;
pub use crate::mbox::reader::MboxReader;
pub use crate::support::error::Error;
