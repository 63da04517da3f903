use std::os::raw::c_int;

use pcre2_sys::{
    PCRE2_ERROR_DFA_WSSIZE, PCRE2_ERROR_NOMATCH, PCRE2_ERROR_PARTIAL,
    PCRE2_NO_UTF_CHECK, PCRE2_UNSET,
};

use crate::error::{Error, Result};
use crate::ffi;
use crate::options::MatchOptions;
use crate::regex::Regex;
use crate::replace::Replacement;

/// Which algorithm produced the current state.
#[derive(Debug)]
enum Mode {
    /// Standard matching: one longest leftmost match per step, group
    /// accessors address capturing parentheses.
    Standard,
    /// All-matches mode: a single exhausted step, group accessors address
    /// the matches found at the leftmost position, longest first.
    All,
}

/// A cursor over the non-overlapping matches of a regex in one subject.
///
/// Created by [`Regex::find`] or [`Regex::find_all`]; the first match
/// attempt has already run when the cursor is returned. The cursor pins the
/// regex it came from, so the regex handle may be dropped while the cursor
/// lives. The subject must outlive the cursor, which borrows it.
///
/// A cursor is a single-threaded object; calls on it are not synchronized.
#[derive(Debug)]
pub struct Matches<'s> {
    regex: Regex,
    subject: &'s [u8],
    options: MatchOptions,
    mode: Mode,
    match_data: ffi::MatchData,
    /// All-matches scratch space, grown geometrically on demand.
    workspace: Vec<c_int>,
    /// `[start0, end0, start1, end1, ...]`; −1 marks "did not participate".
    offsets: Vec<isize>,
    /// Raw result of the last attempt: an error code, the no-match or
    /// partial-match sentinel, or a non-negative match count.
    result: c_int,
    /// Byte position of the next attempt, −1 once exhausted.
    pos: isize,
}

impl<'s> Matches<'s> {
    pub(crate) fn new_standard(
        regex: Regex,
        subject: &'s [u8],
        start: usize,
        options: MatchOptions,
    ) -> Result<Matches<'s>> {
        validate_subject(&regex, subject, start)?;
        let match_data = ffi::MatchData::from_pattern(&regex.imp().code);
        let n_groups = regex.capture_count() + 1;
        let mut matches = Matches {
            match_data,
            workspace: Vec::new(),
            offsets: vec![-1; n_groups * 2],
            result: PCRE2_ERROR_NOMATCH,
            pos: start as isize,
            regex,
            subject,
            options,
            mode: Mode::Standard,
        };
        matches.next()?;
        Ok(matches)
    }

    pub(crate) fn new_all(
        regex: Regex,
        subject: &'s [u8],
        start: usize,
        options: MatchOptions,
    ) -> Result<Matches<'s>> {
        validate_subject(&regex, subject, start)?;
        let mut matches = Matches {
            match_data: ffi::MatchData::with_pairs(12),
            workspace: vec![0; 100],
            offsets: Vec::new(),
            result: PCRE2_ERROR_NOMATCH,
            pos: start as isize,
            regex,
            subject,
            options,
            mode: Mode::All,
        };
        let bits = matches.matcher_options();
        loop {
            let rc = matches.match_data.find_all(
                &matches.regex.imp().code,
                subject,
                start,
                bits,
                &mut matches.workspace,
            );
            if rc == PCRE2_ERROR_DFA_WSSIZE {
                let grown = matches.workspace.len() * 2;
                matches.workspace.resize(grown, 0);
            } else if rc == 0 {
                // Every offset pair was used: there are more matches than
                // the vector can hold.
                let pairs = matches.match_data.pairs() * 2;
                matches.match_data = ffi::MatchData::with_pairs(pairs);
            } else if ffi::is_match_error(rc) {
                return Err(match_error(&matches.regex, rc));
            } else {
                matches.result = rc;
                break;
            }
        }
        let set = if matches.result >= 0 {
            matches.result as usize
        } else if matches.result == PCRE2_ERROR_PARTIAL {
            1
        } else {
            0
        };
        matches.offsets = matches.match_data.ovector()[..set * 2]
            .iter()
            .map(|&v| if v == PCRE2_UNSET { -1 } else { v as isize })
            .collect();
        // Exhaust the cursor so that next() deterministically reports the
        // end of iteration.
        matches.pos = -1;
        Ok(matches)
    }

    /// Scans for the next match with the same subject and options.
    ///
    /// Returns whether a match was found. A zero-length match advances the
    /// cursor by one character (one byte for an opaque-bytes regex) so that
    /// iteration always makes progress.
    pub fn next(&mut self) -> Result<bool> {
        if self.pos < 0 {
            return Ok(false);
        }
        let len = self.subject.len();
        if self.pos as usize > len {
            // A zero-length match at the end of the subject leaves the
            // position one past it.
            self.pos = -1;
            self.result = PCRE2_ERROR_NOMATCH;
            return Ok(false);
        }
        let bits = self.matcher_options();
        let rc = self.match_data.find(
            &self.regex.imp().code,
            self.subject,
            self.pos as usize,
            bits,
        );
        if ffi::is_match_error(rc) {
            self.result = rc;
            return Err(match_error(&self.regex, rc));
        }
        self.result = rc;
        if rc == PCRE2_ERROR_NOMATCH {
            self.pos = -1;
            return Ok(false);
        }
        self.load_offsets();
        if self.pos == self.offsets[1] {
            self.pos = next_char_pos(
                self.subject,
                self.pos as usize,
                self.regex.is_utf(),
            ) as isize;
        } else {
            self.pos = self.offsets[1];
        }
        Ok(self.result >= 0)
    }

    /// Whether the last attempt found a match.
    pub fn matched(&self) -> bool {
        self.result >= 0
    }

    /// Number of matched substrings reported by the last attempt,
    /// including the whole match, or 0 if nothing matched.
    ///
    /// After [`Regex::find_all`] this is the number of matches found, not a
    /// count of parentheses.
    pub fn match_count(&self) -> usize {
        if self.result >= 0 {
            self.result as usize
        } else {
            0
        }
    }

    /// Whether the subject matched as far as it went but ended before the
    /// pattern could complete. Meaningful after [`Matches::next`] returned
    /// false and the state was created with [`MatchOptions::PARTIAL`].
    pub fn is_partial(&self) -> bool {
        self.result == PCRE2_ERROR_PARTIAL
    }

    /// Start and end byte offsets of group `n` (0 is the whole match).
    ///
    /// `(-1, -1)` reports a group that exists in the pattern but did not
    /// participate in the match, e.g. group 1 when `(a)?b` matches `"b"`.
    /// `None` means `n` does not address anything: past the pattern's
    /// groups in standard mode, past the reported matches in all-matches
    /// mode, or no match at all.
    pub fn group_span(&self, n: usize) -> Option<(isize, isize)> {
        if self.result < 0 {
            return None;
        }
        let limit = match self.mode {
            Mode::Standard => self.regex.capture_count() + 1,
            Mode::All => self.match_count(),
        };
        if n >= limit {
            return None;
        }
        Some((self.offsets[2 * n], self.offsets[2 * n + 1]))
    }

    /// Text of group `n`. A group that did not participate yields an empty
    /// slice; an unknown group yields `None`.
    pub fn group(&self, n: usize) -> Option<&'s [u8]> {
        let (start, end) = self.group_span(n)?;
        if start < 0 {
            return Some(b"");
        }
        Some(self.subject.get(start as usize..end as usize).unwrap_or(b""))
    }

    /// Text of the named group `name`, `None` if the pattern has no such
    /// group.
    pub fn group_by_name(&self, name: &str) -> Option<&'s [u8]> {
        self.group(self.regex.group_number(name)?)
    }

    /// Offsets of the named group `name`.
    pub fn group_span_by_name(&self, name: &str) -> Option<(isize, isize)> {
        self.group_span(self.regex.group_number(name)?)
    }

    /// All matched substrings of the last attempt, whole match first.
    pub fn groups(&self) -> Vec<&'s [u8]> {
        (0..self.match_count())
            .map(|n| self.group(n).unwrap_or(b""))
            .collect()
    }

    /// Expands the template against the current match, using the same
    /// syntax as [`Regex::replace`](crate::Regex::replace).
    pub fn expand_references(&self, template: &str) -> Result<Vec<u8>> {
        let replacement = Replacement::parse(template)?;
        let mut out = Vec::with_capacity(template.len());
        replacement.interpolate(self, &mut out);
        Ok(out)
    }

    /// The regex this cursor was created from.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// The subject being searched.
    pub fn subject(&self) -> &'s [u8] {
        self.subject
    }

    pub(crate) fn whole_span(&self) -> (isize, isize) {
        (self.offsets[0], self.offsets[1])
    }

    pub(crate) fn position(&self) -> isize {
        self.pos
    }

    fn matcher_options(&self) -> u32 {
        let combined = self.regex.imp().match_options | self.options;
        let mut bits = combined.to_matcher();
        if self.regex.is_utf() {
            bits |= PCRE2_NO_UTF_CHECK;
        }
        bits
    }

    fn load_offsets(&mut self) {
        let mut offsets = std::mem::take(&mut self.offsets);
        let set = if self.result >= 0 {
            self.result as usize
        } else if self.result == PCRE2_ERROR_PARTIAL {
            1
        } else {
            0
        };
        let ovec = self.match_data.ovector();
        for (i, slot) in offsets.iter_mut().enumerate() {
            *slot = if i < set * 2 && ovec[i] != PCRE2_UNSET {
                ovec[i] as isize
            } else {
                -1
            };
        }
        self.offsets = offsets;
    }
}

fn match_error(regex: &Regex, rc: c_int) -> Error {
    Error::Match {
        pattern: regex.pattern().to_string(),
        detail: ffi::error_message(rc),
    }
}

fn validate_subject(regex: &Regex, subject: &[u8], start: usize) -> Result<()> {
    assert!(
        start <= subject.len(),
        "start ({}) must be <= subject length ({})",
        start,
        subject.len()
    );
    if regex.is_utf() {
        // Checked once here; every match attempt then skips the recheck.
        if let Err(e) = std::str::from_utf8(subject) {
            return Err(Error::Match {
                pattern: regex.pattern().to_string(),
                detail: format!(
                    "invalid UTF-8 in subject at byte {}",
                    e.valid_up_to()
                ),
            });
        }
        assert!(
            start == subject.len() || (subject[start] & 0xC0) != 0x80,
            "start ({start}) must lie on a character boundary"
        );
    }
    Ok(())
}

/// Position of the character after `pos`, or `pos + 1` at the end of the
/// subject.
pub(crate) fn next_char_pos(subject: &[u8], pos: usize, utf: bool) -> usize {
    if !utf || pos >= subject.len() {
        return pos + 1;
    }
    let mut p = pos + 1;
    while p < subject.len() && (subject[p] & 0xC0) == 0x80 {
        p += 1;
    }
    p
}

/// Position of the character before `pos`. Undoes a `next_char_pos` step,
/// including the one-past-the-end case.
pub(crate) fn prev_char_pos(subject: &[u8], pos: usize, utf: bool) -> usize {
    if pos > subject.len() {
        return subject.len();
    }
    if !utf {
        return pos.saturating_sub(1);
    }
    let mut p = pos.saturating_sub(1);
    while p > 0 && (subject[p] & 0xC0) == 0x80 {
        p -= 1;
    }
    p
}
