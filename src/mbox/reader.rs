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

//! The archive reader: opens and locks an mbox file, then hands out
//! messages one at a time, skipping any that fail the configured filters.
//!
//! A reader owns its file handle and the advisory lock on it exclusively;
//! it must not be driven from more than one thread, since the file cursor
//! and lock are single-owner state. Dropping the reader releases the lock.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader};
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::thread;
use std::time::Duration;

use chrono::prelude::*;
use log::trace;
use regex::Regex;

use super::attachment::Attachment;
use super::message::Message;
use crate::support::error::Error;
use crate::support::line_stream::LineStream;

/// The filter configuration applied by `read()`.
///
/// All configured predicates must hold for a message to be returned
/// (logical AND). Predicates are evaluated against fully parsed messages
/// and never produce errors themselves.
#[derive(Debug, Default)]
struct ReadFilter {
    after_time: Option<DateTime<Utc>>,
    before_time: Option<DateTime<Utc>>,
    headers: HashMap<String, String>,
    header_regexes: HashMap<String, Regex>,
    attachment_names: Vec<String>,
    attachment_name_regexes: Vec<Regex>,
}

impl ReadFilter {
    fn matches(&self, msg: &Message) -> bool {
        if let Some(after) = self.after_time {
            if msg.timestamp() < after {
                return false;
            }
        }

        if let Some(before) = self.before_time {
            if msg.timestamp() > before {
                return false;
            }
        }

        for (name, expected) in &self.headers {
            let found = msg
                .header(name)
                .map_or(false, |vs| vs.iter().any(|v| v == expected));
            if !found {
                return false;
            }
        }

        for (name, regex) in &self.header_regexes {
            let found = msg
                .header(name)
                .map_or(false, |vs| vs.iter().any(|v| regex.is_match(v)));
            if !found {
                return false;
            }
        }

        if !self.attachment_names.is_empty()
            || !self.attachment_name_regexes.is_empty()
        {
            let attachments = msg.attachments();
            for wanted in &self.attachment_names {
                if !any_name(&attachments, |n| n == wanted) {
                    return false;
                }
            }
            for regex in &self.attachment_name_regexes {
                if !any_name(&attachments, |n| regex.is_match(n)) {
                    return false;
                }
            }
        }

        true
    }
}

fn any_name(
    attachments: &[Attachment],
    mut pred: impl FnMut(&str) -> bool,
) -> bool {
    attachments
        .iter()
        .any(|a| a.name_candidates().into_iter().any(&mut pred))
}

/// A locked, filtering mbox archive reader.
pub struct MboxReader {
    stream: LineStream<BufReader<File>>,
    lock_retries: u32,
    lock_backoff: Duration,
    filter: ReadFilter,
}

impl MboxReader {
    /// Open `path` and take an exclusive advisory lock on it.
    ///
    /// A held lock is retried up to `lock_retries` times, sleeping
    /// `lock_backoff` between attempts, then fails with `Error::Lock`.
    pub fn open(
        path: impl AsRef<Path>,
        lock_retries: u32,
        lock_backoff: Duration,
    ) -> Result<Self, Error> {
        let stream =
            open_locked(path.as_ref(), lock_retries, lock_backoff)?;
        Ok(MboxReader {
            stream,
            lock_retries,
            lock_backoff,
            filter: ReadFilter::default(),
        })
    }

    /// Re-point the reader at another archive, re-opening and re-locking
    /// with the same retry budget. Filters are retained.
    pub fn set_file_path(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<(), Error> {
        self.stream = open_locked(
            path.as_ref(),
            self.lock_retries,
            self.lock_backoff,
        )?;
        Ok(())
    }

    /// Parse and return the next message satisfying every configured
    /// filter, discarding the ones that don't.
    ///
    /// `Error::EndOfData` signals an exhausted archive, not a failure.
    pub fn read(&mut self) -> Result<Message, Error> {
        loop {
            let msg = Message::read_from(&mut self.stream)?;
            if self.filter.matches(&msg) {
                return Ok(msg);
            }
            trace!(
                "skipping message from {} at {}",
                msg.sender(),
                msg.timestamp()
            );
        }
    }

    /// Only return messages with timestamp at or after `t` (inclusive).
    pub fn set_after_time(&mut self, t: DateTime<Utc>) -> &mut Self {
        self.filter.after_time = Some(t);
        self
    }

    /// Only return messages with timestamp at or before `t` (inclusive).
    pub fn set_before_time(&mut self, t: DateTime<Utc>) -> &mut Self {
        self.filter.before_time = Some(t);
        self
    }

    /// Require a header to be present with (at least) one value exactly
    /// equal to `value`. Repeatable per distinct name; a repeated name
    /// replaces the previous expectation for that name.
    pub fn with_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.filter
            .headers
            .insert(name.to_ascii_uppercase(), value.to_owned());
        self
    }

    /// Like `with_header`, but the value must match `pattern`. The pattern
    /// is compiled here so matching itself cannot fail.
    pub fn with_header_regex(
        &mut self,
        name: &str,
        pattern: &str,
    ) -> Result<&mut Self, Error> {
        let regex = Regex::new(pattern)?;
        self.filter
            .header_regexes
            .insert(name.to_ascii_uppercase(), regex);
        Ok(self)
    }

    /// Require at least one attachment whose filename, name, or content
    /// id equals `name`.
    pub fn with_attachment_name(&mut self, name: &str) -> &mut Self {
        self.filter.attachment_names.push(name.to_owned());
        self
    }

    /// Like `with_attachment_name`, with a regex.
    pub fn with_attachment_name_regex(
        &mut self,
        pattern: &str,
    ) -> Result<&mut Self, Error> {
        let regex = Regex::new(pattern)?;
        self.filter.attachment_name_regexes.push(regex);
        Ok(self)
    }

    /// Drop every configured filter.
    pub fn reset_filters(&mut self) -> &mut Self {
        self.filter = ReadFilter::default();
        self
    }
}

fn open_locked(
    path: &Path,
    lock_retries: u32,
    lock_backoff: Duration,
) -> Result<LineStream<BufReader<File>>, Error> {
    let file = File::open(path)?;
    acquire_lock(&file, lock_retries, lock_backoff)?;
    Ok(LineStream::new(BufReader::new(file)))
}

fn acquire_lock(
    file: &File,
    lock_retries: u32,
    lock_backoff: Duration,
) -> Result<(), Error> {
    let fd = file.as_raw_fd();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match nix::fcntl::flock(
            fd,
            nix::fcntl::FlockArg::LockExclusiveNonblock,
        ) {
            Ok(()) => return Ok(()),
            // EWOULDBLOCK is an alias for EAGAIN on every supported target
            Err(nix::Error::Sys(errno))
                if nix::errno::Errno::EAGAIN == errno =>
            {
                if attempts > lock_retries {
                    return Err(Error::Lock { attempts });
                }
                thread::sleep(lock_backoff);
            }
            Err(e) => {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::Other,
                    e,
                )));
            },
        }
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    const ARCHIVE: &[u8] = b"\
From alice Thu Jul  3 12:00:00 2025
Content-Type: text/plain
X-Tag: v

first message
From bob Fri Jul  4 09:00:00 2025
Content-Type: text/plain
X-Tag: other

second message
From carol Sat Jul  5 18:30:00 2025
Content-Type: text/plain
X-Tag: v

third message
";

    fn archive_file(data: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file.flush().unwrap();
        file
    }

    fn open(file: &NamedTempFile) -> MboxReader {
        MboxReader::open(file.path(), 0, Duration::from_millis(1)).unwrap()
    }

    #[test]
    fn reads_messages_in_order() {
        let file = archive_file(ARCHIVE);
        let mut reader = open(&file);
        assert_eq!("alice", reader.read().unwrap().sender());
        assert_eq!("bob", reader.read().unwrap().sender());
        assert_eq!("carol", reader.read().unwrap().sender());
        match reader.read() {
            Err(Error::EndOfData) => (),
            r => panic!("unexpected result: {:?}", r.map(|m| m.sender)),
        }
    }

    #[test]
    fn header_filter_skips_non_matching() {
        let file = archive_file(ARCHIVE);
        let mut reader = open(&file);
        reader.with_header("X-Tag", "v");
        assert_eq!("alice", reader.read().unwrap().sender());
        assert_eq!("carol", reader.read().unwrap().sender());
        match reader.read() {
            Err(Error::EndOfData) => (),
            r => panic!("unexpected result: {:?}", r.map(|m| m.sender)),
        }
    }

    #[test]
    fn header_filter_fails_when_header_absent() {
        let file = archive_file(ARCHIVE);
        let mut reader = open(&file);
        reader.with_header("X-Missing", "v");
        match reader.read() {
            Err(Error::EndOfData) => (),
            r => panic!("unexpected result: {:?}", r.map(|m| m.sender)),
        }
    }

    #[test]
    fn time_bounds_are_inclusive() {
        let file = archive_file(ARCHIVE);
        let mut reader = open(&file);
        reader
            .set_after_time(Utc.ymd(2025, 7, 4).and_hms(9, 0, 0))
            .set_before_time(Utc.ymd(2025, 7, 5).and_hms(18, 30, 0));
        assert_eq!("bob", reader.read().unwrap().sender());
        assert_eq!("carol", reader.read().unwrap().sender());
        match reader.read() {
            Err(Error::EndOfData) => (),
            r => panic!("unexpected result: {:?}", r.map(|m| m.sender)),
        }
    }

    #[test]
    fn combined_filters_are_anded() {
        let file = archive_file(ARCHIVE);
        let mut reader = open(&file);
        reader
            .set_after_time(Utc.ymd(2025, 7, 4).and_hms(0, 0, 0))
            .set_before_time(Utc.ymd(2025, 7, 6).and_hms(0, 0, 0))
            .with_header("X-Tag", "v");
        // alice matches the header but not the time range; bob the time
        // range but not the header
        assert_eq!("carol", reader.read().unwrap().sender());
    }

    #[test]
    fn header_regex_filter() {
        let file = archive_file(ARCHIVE);
        let mut reader = open(&file);
        reader.with_header_regex("X-Tag", "^oth").unwrap();
        assert_eq!("bob", reader.read().unwrap().sender());
        match reader.read() {
            Err(Error::EndOfData) => (),
            r => panic!("unexpected result: {:?}", r.map(|m| m.sender)),
        }
    }

    #[test]
    fn invalid_filter_regex_fails_at_registration() {
        let file = archive_file(ARCHIVE);
        let mut reader = open(&file);
        match reader.with_header_regex("X-Tag", "(unclosed") {
            Err(Error::Regex(_)) => (),
            Err(e) => panic!("unexpected error: {:?}", e),
            Ok(_) => panic!("bogus pattern accepted"),
        }
    }

    #[test]
    fn reset_filters_restores_unfiltered_reading() {
        let file = archive_file(ARCHIVE);
        let mut reader = open(&file);
        reader.with_header("X-Missing", "v");
        reader.reset_filters();
        assert_eq!("alice", reader.read().unwrap().sender());
    }

    #[test]
    fn attachment_name_filter() {
        let archive = archive_file(
            b"From alice Thu Jul  3 12:00:00 2025\n\
              Content-Type: text/plain\n\
              \n\
              no attachments here\n\
              From bob Fri Jul  4 09:00:00 2025\n\
              Content-Type: multipart/mixed; boundary=\"X\"\n\
              \n\
              --X\n\
              Content-Type: text/plain\n\
              \n\
              text\n\
              --X\n\
              Content-Disposition: attachment; filename=\"wanted.txt\"\n\
              \n\
              payload\n\
              --X--\n",
        );
        let mut reader = open(&archive);
        reader.with_attachment_name("wanted.txt");
        assert_eq!("bob", reader.read().unwrap().sender());

        let mut reader = open(&archive);
        reader.with_attachment_name_regex(r"\.txt$").unwrap();
        assert_eq!("bob", reader.read().unwrap().sender());

        let mut reader = open(&archive);
        reader.with_attachment_name("unrelated.bin");
        match reader.read() {
            Err(Error::EndOfData) => (),
            r => panic!("unexpected result: {:?}", r.map(|m| m.sender)),
        }
    }

    #[test]
    fn set_file_path_re_points_the_reader() {
        let first = archive_file(ARCHIVE);
        let second = archive_file(
            b"From dave Sun Jul  6 07:00:00 2025\n\
              Content-Type: text/plain\n\
              \n\
              other archive\n",
        );
        let mut reader = open(&first);
        assert_eq!("alice", reader.read().unwrap().sender());
        reader.set_file_path(second.path()).unwrap();
        assert_eq!("dave", reader.read().unwrap().sender());
    }

    #[test]
    fn held_lock_exhausts_retry_budget() {
        let file = archive_file(ARCHIVE);

        let holder = File::open(file.path()).unwrap();
        nix::fcntl::flock(
            holder.as_raw_fd(),
            nix::fcntl::FlockArg::LockExclusiveNonblock,
        )
        .unwrap();

        match MboxReader::open(file.path(), 2, Duration::from_millis(1)) {
            Err(Error::Lock { attempts: 3 }) => (),
            r => panic!(
                "unexpected result: {:?}",
                r.map(|_| "reader").map_err(|e| e.to_string())
            ),
        }
    }

    #[test]
    fn lock_released_within_retry_budget_succeeds() {
        let file = archive_file(ARCHIVE);

        let holder = File::open(file.path()).unwrap();
        nix::fcntl::flock(
            holder.as_raw_fd(),
            nix::fcntl::FlockArg::LockExclusiveNonblock,
        )
        .unwrap();

        let unlocker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            // Closing the descriptor releases the flock
            drop(holder);
        });

        let mut reader =
            MboxReader::open(file.path(), 100, Duration::from_millis(10))
                .unwrap();
        unlocker.join().unwrap();
        assert_eq!("alice", reader.read().unwrap().sender());
    }

    #[test]
    fn dropping_the_reader_releases_the_lock() {
        let file = archive_file(ARCHIVE);
        let reader = open(&file);
        drop(reader);
        // Immediately lockable again
        let _reader = open(&file);
    }
}
