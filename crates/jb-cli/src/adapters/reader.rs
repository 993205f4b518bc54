//! Reader backends.
//!
//! Both readers consume lines on a background thread so that `poll` never
//! blocks longer than its timeout.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use jb_core::{Reader, TagId};
use thiserror::Error;

/// Spawns a thread forwarding every line of `input` to the returned channel.
///
/// The channel disconnects when the input reaches end of file or fails.
fn spawn_line_pump<R>(name: &str, input: R) -> Result<Receiver<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            for line in input.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "reader input failed");
                        return;
                    }
                }
            }
            tracing::debug!("reader input closed");
        })
        .context("failed to spawn reader thread")?;
    Ok(rx)
}

/// Reads tag IDs typed on a terminal.
///
/// Each line is `tag_uid` or `tag_uid counter`. A bare tag counts as one
/// detection. With a counter the tag stays on the reader for that many more
/// polls, without waiting for input. An empty line, a malformed line or no
/// input before the timeout counts as nothing detected. Lines are consumed
/// one per poll, in the order they were typed.
#[derive(Debug)]
pub struct DryrunReader {
    lines: Receiver<String>,
    timeout: Duration,
    uid: Option<TagId>,
    counter: u32,
}

impl DryrunReader {
    /// Reads from the process's standard input.
    pub fn stdin(timeout: Duration) -> Result<Self> {
        println!("creating reader, type a tag ID, optionally followed by a number of polls");
        Self::from_input(BufReader::new(io::stdin()), timeout)
    }

    pub fn from_input<R>(input: R, timeout: Duration) -> Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        Ok(Self {
            lines: spawn_line_pump("dryrun-reader", input)?,
            timeout,
            uid: None,
            counter: 0,
        })
    }

    fn hold(&mut self, uid: Option<TagId>, counter: u32) -> Option<TagId> {
        self.uid = uid;
        self.counter = counter;
        self.uid.clone()
    }
}

/// Why a typed line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("invalid input, should be `tag_uid counter`, received: {0:?}")]
    Shape(Vec<String>),
    #[error("counter should be a non-negative integer, received: `{0}`")]
    Counter(String),
}

/// Splits a typed line into a tag and how many further polls to hold it.
///
/// Fields are separated by single spaces, so repeated spaces make empty
/// fields and the line is rejected.
pub fn parse_dryrun_input(line: &str) -> Result<Option<(TagId, u32)>, InputError> {
    let line = line.trim();
    let fields: Vec<&str> = line.split(' ').collect();
    let (uid, counter) = match fields.as_slice() {
        [uid] => (*uid, 0),
        [uid, counter] => {
            let counter = counter
                .parse::<u32>()
                .map_err(|_| InputError::Counter((*counter).to_string()))?;
            (*uid, counter)
        }
        _ => {
            return Err(InputError::Shape(
                fields.iter().map(ToString::to_string).collect(),
            ));
        }
    };
    Ok(TagId::new(uid).ok().map(|uid| (uid, counter)))
}

impl Reader for DryrunReader {
    fn poll(&mut self) -> Option<TagId> {
        if self.counter > 0 {
            self.counter -= 1;
            return self.uid.clone();
        }
        match self.lines.recv_timeout(self.timeout) {
            Ok(line) => match parse_dryrun_input(&line) {
                Ok(Some((uid, counter))) => self.hold(Some(uid), counter),
                Ok(None) => self.hold(None, 0),
                Err(err) => {
                    tracing::warn!(error = %err, "ignoring reader input");
                    self.hold(None, 0)
                }
            },
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Reads UIDs from an NFC reader exposed as a character device.
///
/// USB readers in continuous-read mode print the UID of the card on the
/// antenna as a hex line, repeatedly while it stays there. A poll returns
/// the latest UID printed since the previous poll.
#[derive(Debug)]
pub struct NfcReader {
    lines: Receiver<String>,
    closed: bool,
}

impl NfcReader {
    /// Opens the reader device.
    pub fn open(device: &Path) -> Result<Self> {
        let file = File::open(device)
            .with_context(|| format!("failed to open NFC reader at {}", device.display()))?;
        tracing::info!(device = %device.display(), "found NFC reader");
        Self::from_input(BufReader::new(file))
    }

    pub fn from_input<R>(input: R) -> Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        Ok(Self {
            lines: spawn_line_pump("nfc-reader", input)?,
            closed: false,
        })
    }
}

impl Reader for NfcReader {
    fn poll(&mut self) -> Option<TagId> {
        let mut latest = None;
        loop {
            match self.lines.try_recv() {
                Ok(line) => {
                    if let Some(uid) = normalize_uid(&line) {
                        latest = Some(uid);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.closed {
                        tracing::error!("NFC reader disconnected");
                        self.closed = true;
                    }
                    break;
                }
            }
        }
        latest
    }
}

/// Formats raw UID bytes as lowercase colon-separated hex, e.g. `04:f2:3d`.
pub fn format_uid(raw: &[u8]) -> String {
    let mut uid = String::with_capacity(raw.len() * 3);
    for (i, byte) in raw.iter().enumerate() {
        if i > 0 {
            uid.push(':');
        }
        let _ = write!(uid, "{byte:02x}");
    }
    uid
}

/// Turns a line printed by a reader into a tag ID.
///
/// Hex UIDs, with or without `:`, `-` or space separators, are normalised to
/// the [`format_uid`] form so that the same card always maps to the same
/// library key. Anything else is used as-is.
pub fn normalize_uid(line: &str) -> Option<TagId> {
    let line = line.trim();
    let digits: String = line
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | ' '))
        .collect();

    let is_hex = !digits.is_empty()
        && digits.len() % 2 == 0
        && digits.chars().all(|c| c.is_ascii_hexdigit());
    if !is_hex {
        return TagId::new(line).ok();
    }

    let raw: Option<Vec<u8>> = (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).ok())
        .collect();
    raw.and_then(|raw| TagId::new(format_uid(&raw)).ok())
}
