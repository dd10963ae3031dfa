/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! A reader for graphs in a Matrix-Market-like coordinate format.
//!
//! The format is line oriented. Lines starting with `%` are comments. The
//! first non-comment line is a header whose first whitespace-separated token
//! is the number of nodes; further tokens (usually, the number of columns and
//! of entries) are ignored. Every following non-comment, non-blank line
//! contains an arc as a pair of one-based node indices `source destination`;
//! further tokens (e.g., weights) are ignored.
//!
//! ```text
//! % A triangle plus a dangling node
//! 4 4 3
//! 1 2
//! 2 3
//! 3 1
//! ```
//!
//! Arcs are returned zero-based. Lines that do not start with two positive
//! integers are logged, skipped, and counted (see
//! [`num_discarded`](MtxReader::num_discarded)). Indices larger than the
//! number of nodes are returned as they are, as filtering them is up to the
//! consumer.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MtxError {
    #[error("I/O error while reading the graph: {0}")]
    Io(#[from] std::io::Error),
    #[error("The graph has no header line")]
    MissingHeader,
    #[error("Invalid header at line {line}: {text:?} does not start with a number of nodes")]
    InvalidHeader { line: usize, text: String },
}

/// A reader for the coordinate format described in the [module
/// documentation](self).
///
/// The header is parsed when the reader is created; arcs are then read
/// lazily by iterating over [`arcs`](Self::arcs).
///
/// # Examples
///
/// ```
/// use pagerank_rt::utils::mtx::MtxReader;
///
/// let text = "% comment\n3 3 2\n1 2\n3 1\nfoo bar\n";
/// let mut reader = MtxReader::new(text.as_bytes()).unwrap();
/// assert_eq!(reader.num_nodes(), 3);
/// let arcs = reader.arcs().collect::<Result<Vec<_>, _>>().unwrap();
/// assert_eq!(arcs, vec![(0, 1), (2, 0)]);
/// assert_eq!(reader.num_discarded(), 1);
/// ```
#[derive(Debug)]
pub struct MtxReader<R> {
    lines: Lines<R>,
    num_nodes: usize,
    line: usize,
    num_discarded: u64,
}

impl MtxReader<BufReader<File>> {
    /// Opens the file at `path` and parses its header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MtxError> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::new(file))
    }
}

impl<R: BufRead> MtxReader<R> {
    /// Creates a reader on `reader`, parsing the header.
    pub fn new(reader: R) -> Result<Self, MtxError> {
        let mut lines = reader.lines();
        let mut line = 0;
        loop {
            let Some(text) = lines.next().transpose()? else {
                return Err(MtxError::MissingHeader);
            };
            line += 1;
            if text.starts_with('%') {
                continue;
            }
            let num_nodes = text
                .split_ascii_whitespace()
                .next()
                .and_then(|token| token.parse::<usize>().ok());
            return match num_nodes {
                Some(num_nodes) => Ok(Self {
                    lines,
                    num_nodes,
                    line,
                    num_discarded: 0,
                }),
                None => Err(MtxError::InvalidHeader { line, text }),
            };
        }
    }

    /// Returns the number of nodes declared in the header.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Returns the number of malformed arc lines skipped so far.
    pub fn num_discarded(&self) -> u64 {
        self.num_discarded
    }

    /// Returns an iterator on the (zero-based) arcs.
    ///
    /// The iterator stops after returning an I/O error.
    pub fn arcs(&mut self) -> Arcs<'_, R> {
        Arcs {
            reader: self,
            failed: false,
        }
    }
}

/// Iterator over the arcs of an [`MtxReader`].
#[derive(Debug)]
pub struct Arcs<'a, R> {
    reader: &'a mut MtxReader<R>,
    failed: bool,
}

fn parse_arc(text: &str) -> Option<(usize, usize)> {
    let mut tokens = text.split_ascii_whitespace();
    let src = tokens.next()?.parse::<usize>().ok()?;
    let dst = tokens.next()?.parse::<usize>().ok()?;
    Some((src.checked_sub(1)?, dst.checked_sub(1)?))
}

impl<R: BufRead> Iterator for Arcs<'_, R> {
    type Item = Result<(usize, usize), MtxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let text = match self.reader.lines.next()? {
                Ok(text) => text,
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err.into()));
                }
            };
            self.reader.line += 1;
            if text.starts_with('%') || text.trim().is_empty() {
                continue;
            }
            match parse_arc(&text) {
                Some(arc) => return Some(Ok(arc)),
                None => {
                    self.reader.num_discarded += 1;
                    log::warn!(
                        "Skipping malformed arc at line {}: {:?}",
                        self.reader.line,
                        text
                    );
                }
            }
        }
    }
}
