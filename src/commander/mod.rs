// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Line based console reviewer.
//!
//! This module implements [`Reviewer`] on top of a line reader and a writer,
//! printing each prompt and parsing the reply into a verdict. Unrecognized
//! replies are reported and asked again. End of input quits, so that the
//! session writes its checkpoint.
//!
//! | Prompt      | Replies                                                  |
//! |-------------|----------------------------------------------------------|
//! | candidate   | `y` match, `n` no match, `e` examine, `s` save, `q` quit, Enter skips |
//! | unmatched   | `n` confirm no match, `m #` match with, `e #` examine, `s`, `q`, Enter skips |
//! | alignment   | `k` or Enter accept, `r # +#` revise, `m` force match, `x` force unmatch, `d` defer |

use std::io::{self, BufRead, StdinLock, Stdout, Write};

use anyhow::Result;

use crate::{
    actions::{
        AlbumVerdict, AlignmentPrompt, CandidatePrompt, CandidateVerdict, Reviewer, UnmatchedPrompt,
        UnmatchedVerdict,
    },
    decisions::MatchDecision,
    matching::{TrackPair, measure_similarity},
    model::{Album, Field, Matchable, Value, tail_segments},
    util::format::{format_score, format_time, format_value},
};

pub(crate) struct ConsoleReviewer<R, W> {
    input: R,
    output: W,
}

impl ConsoleReviewer<StdinLock<'static>, Stdout> {
    pub(crate) fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleReviewer<R, W> {
    pub(crate) fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prompts until `parse` accepts a reply. Returns `eof` at end of input.
    fn ask<T>(&mut self, prompt: &str, parse: impl Fn(&str) -> Option<T>, eof: T) -> Result<T> {
        loop {
            write!(self.output, "{prompt} > ")?;
            self.output.flush()?;

            let mut buffer = String::new();
            if self.input.read_line(&mut buffer)? == 0 {
                writeln!(self.output)?;
                return Ok(eof);
            }

            let buffer = buffer.trim();
            match parse(buffer) {
                Some(verdict) => return Ok(verdict),
                None => writeln!(self.output, "Unrecognized input: {buffer}")?,
            }
        }
    }

    fn print_rows(&mut self, heading: &str, rows: &[TrackPair]) -> Result<()> {
        writeln!(self.output, "  {heading}:")?;
        for (i, row) in rows.iter().enumerate() {
            let new = row
                .new
                .as_deref()
                .map(|p| tail_segments(p, 1))
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                self.output,
                "  {:>3} {:<50} {:<50} {}",
                i + 1,
                tail_segments(&row.old, 1),
                new,
                format_score(row.score)
            )?;
        }
        Ok(())
    }

    fn print_album(&mut self, label: &str, album: &Album) -> Result<()> {
        writeln!(self.output, "{label}: {}", album.path().display())?;
        for (field, value) in album.data().iter() {
            writeln!(self.output, "    {:<14} {}", field.as_str(), format_value(value))?;
        }
        for track in album.tracks().values() {
            let duration = match track.data().get(Field::Duration) {
                Value::Number(secs) => format_time(*secs as u64),
                _ => "--:--".to_string(),
            };
            writeln!(
                self.output,
                "    {duration} {:<40} {}",
                tail_segments(track.path(), 1),
                format_value(track.data().get(Field::Title))
            )?;
        }
        Ok(())
    }
}

impl<R: BufRead, W: Write> Reviewer for ConsoleReviewer<R, W> {
    fn review_candidate(&mut self, prompt: &CandidatePrompt<'_>) -> Result<CandidateVerdict> {
        writeln!(
            self.output,
            "\n[{}/{}] {} {}",
            prompt.position + 1,
            prompt.total,
            prompt.tier.label(),
            format_score(prompt.score)
        )?;
        writeln!(self.output, "  old: {}", prompt.old.present())?;
        writeln!(self.output, "  new: {}", prompt.candidate.present())?;

        self.ask(
            "[y]es [n]o [e]xamine [s]ave [q]uit, Enter skips",
            parse_candidate,
            CandidateVerdict::Quit,
        )
    }

    fn review_unmatched(&mut self, prompt: &UnmatchedPrompt<'_>) -> Result<UnmatchedVerdict> {
        writeln!(
            self.output,
            "\n[{}/{}] no match so far: {}",
            prompt.position + 1,
            prompt.total,
            prompt.old.present()
        )?;
        for (i, (score, album)) in prompt.options.iter().enumerate() {
            writeln!(self.output, "  {:>3} {} {}", i + 1, format_score(*score), album.present())?;
        }

        self.ask(
            "[n]o match confirmed, [m #] match, [e #] examine, [s]ave [q]uit, Enter skips",
            parse_unmatched,
            UnmatchedVerdict::Quit,
        )
    }

    fn review_alignment(&mut self, prompt: &AlignmentPrompt<'_>) -> Result<AlbumVerdict> {
        writeln!(self.output, "\n{} <> {}", prompt.old.present(), prompt.new.present())?;
        self.print_rows("aligned", &prompt.alignment.aligned)?;
        self.print_rows("misaligned", &prompt.alignment.misaligned)?;

        self.ask(
            "[k]eep, [r # +#] revise, force [m]atch, force unmatch [x], [d]efer",
            parse_alignment,
            AlbumVerdict::Defer,
        )
    }

    fn inspect(&mut self, old: &Album, new: &Album) -> Result<()> {
        self.print_album("old", old)?;
        self.print_album("new", new)?;

        let similarity = measure_similarity(old, new)?;
        if !similarity.is_comparable() {
            writeln!(self.output, "  no field is set on both sides")?;
        }
        for (field, n, weight) in &similarity.parts {
            writeln!(self.output, "    {:<14} {} x{weight}", field.as_str(), format_score(*n))?;
        }
        Ok(())
    }

    fn select_decisions(&mut self, found: &[&MatchDecision]) -> Result<Vec<usize>> {
        for (i, d) in found.iter().enumerate() {
            writeln!(self.output, "  {:>3} {}", i + 1, d)?;
        }
        self.ask("Numbers to remove, Enter for none", parse_selection, Vec::new())
    }
}

/// Parses a one-based option number into an index.
fn option(token: &str) -> Option<usize> {
    token.parse::<usize>().ok().filter(|n| *n > 0).map(|n| n - 1)
}

fn parse_candidate(buffer: &str) -> Option<CandidateVerdict> {
    let parts: Vec<&str> = buffer.split_whitespace().collect();

    match parts.as_slice() {
        [] => Some(CandidateVerdict::Skip),
        ["y"] => Some(CandidateVerdict::Match),
        ["n"] => Some(CandidateVerdict::NoMatch),
        ["e"] => Some(CandidateVerdict::Open),
        ["s"] => Some(CandidateVerdict::Save),
        ["q"] => Some(CandidateVerdict::Quit),
        _ => None,
    }
}

fn parse_unmatched(buffer: &str) -> Option<UnmatchedVerdict> {
    let parts: Vec<&str> = buffer.split_whitespace().collect();

    match parts.as_slice() {
        [] => Some(UnmatchedVerdict::Skip),
        ["n"] => Some(UnmatchedVerdict::ConfirmNoMatch),
        ["m", n] => option(n).map(UnmatchedVerdict::MatchWith),
        ["e", n] => option(n).map(UnmatchedVerdict::Open),
        ["s"] => Some(UnmatchedVerdict::Save),
        ["q"] => Some(UnmatchedVerdict::Quit),
        _ => None,
    }
}

fn parse_alignment(buffer: &str) -> Option<AlbumVerdict> {
    let parts: Vec<&str> = buffer.split_whitespace().collect();

    match parts.as_slice() {
        [] | ["k"] => Some(AlbumVerdict::Accept),
        ["m"] => Some(AlbumVerdict::ForceMatch),
        ["x"] => Some(AlbumVerdict::ForceUnmatch),
        ["d"] => Some(AlbumVerdict::Defer),
        ["r", rows @ ..] if !rows.is_empty() => {
            let mut to_misaligned = Vec::new();
            let mut to_aligned = Vec::new();
            for row in rows {
                match row.strip_prefix('+') {
                    Some(n) => to_aligned.push(option(n)?),
                    None => to_misaligned.push(option(row)?),
                }
            }
            Some(AlbumVerdict::Revise {
                to_misaligned,
                to_aligned,
            })
        }
        _ => None,
    }
}

fn parse_selection(buffer: &str) -> Option<Vec<usize>> {
    buffer.split_whitespace().map(option).collect()
}
