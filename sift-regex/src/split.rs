use crate::error::Result;
use crate::matches::prev_char_pos;
use crate::options::MatchOptions;
use crate::regex::Regex;

impl Regex {
    /// Breaks `subject` on the pattern and returns the tokens between the
    /// separators. If the pattern contains capturing groups, their text is
    /// emitted after the token preceding each separator. A pattern that
    /// matches the empty string splits between characters.
    ///
    /// Splitting an empty subject yields an empty vector rather than a
    /// vector with one empty token; an empty vector is usually the more
    /// useful degenerate case.
    ///
    /// ```
    /// use sift_regex::Regex;
    ///
    /// let re = Regex::new(",")?;
    /// assert_eq!(re.split(b"a,b,c")?, vec![&b"a"[..], b"b", b"c"]);
    /// # Ok::<(), sift_regex::Error>(())
    /// ```
    pub fn split<'s>(&self, subject: &'s [u8]) -> Result<Vec<&'s [u8]>> {
        self.split_full(subject, 0, MatchOptions::default(), 0)
    }

    /// Like [`Regex::split`], with a starting offset, match options and a
    /// token limit. `max_tokens == 0` means no limit; with a limit, the
    /// remainder of the subject is returned unsplit as the last token.
    ///
    /// # Panics
    ///
    /// If `start` is out of bounds, or (in UTF-8 mode) not on a character
    /// boundary.
    pub fn split_full<'s>(
        &self,
        subject: &'s [u8],
        start: usize,
        options: MatchOptions,
        max_tokens: usize,
    ) -> Result<Vec<&'s [u8]>> {
        assert!(
            start <= subject.len(),
            "start ({}) must be <= subject length ({})",
            start,
            subject.len()
        );
        let max_tokens = if max_tokens == 0 { usize::MAX } else { max_tokens };
        let len = subject.len();

        if len - start == 0 {
            return Ok(Vec::new());
        }
        if max_tokens == 1 {
            return Ok(vec![&subject[start..]]);
        }

        let utf = self.is_utf();
        let mut tokens: Vec<&'s [u8]> = Vec::new();
        // Tokens that came from splitting; capture-group tokens do not
        // count against the limit.
        let mut token_count = 0;
        // Byte position just past the previous separator.
        let mut last_separator_end = start;
        // Was the previous separator zero bytes long?
        let mut last_match_is_empty = false;

        let mut m = self.find_at(subject, start, options)?;
        loop {
            if m.matched() {
                let (sep_start, sep_end) = m.whole_span();
                last_match_is_empty = sep_start == sep_end;

                // Skip an empty separator sitting at the end of the
                // previous one, e.g. the zero-width match that follows a
                // real separator immediately.
                if last_separator_end != sep_end as usize {
                    tokens.push(&subject[last_separator_end..sep_start as usize]);
                    token_count += 1;
                    for n in 1..m.match_count() {
                        tokens.push(m.group(n).unwrap_or(b""));
                    }
                }
            } else {
                // No further separator: copy what is left, unless an empty
                // separator already consumed the end of the subject.
                if !last_match_is_empty {
                    tokens.push(&subject[last_separator_end..len]);
                }
                break;
            }

            // Leave room for the unsplit remainder.
            if token_count >= max_tokens - 1 {
                let mut tail = m.position() as usize;
                if last_match_is_empty {
                    // The cursor already stepped one character past the
                    // empty separator; that character belongs to the tail.
                    tail = prev_char_pos(subject, tail, utf);
                }
                if len > tail {
                    tokens.push(&subject[tail..len]);
                }
                break;
            }

            last_separator_end = m.position() as usize;
            if last_match_is_empty {
                last_separator_end =
                    prev_char_pos(subject, last_separator_end, utf);
            }

            m.next()?;
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CompileOptions;

    fn split(pattern: &str, subject: &[u8]) -> Vec<Vec<u8>> {
        Regex::new(pattern)
            .unwrap()
            .split(subject)
            .unwrap()
            .into_iter()
            .map(<[u8]>::to_vec)
            .collect()
    }

    #[test]
    fn plain_separator() {
        assert_eq!(split(",", b"a,b,c"), [b"a", b"b", b"c"]);
    }

    #[test]
    fn whitespace_run_separator() {
        // `\s*` matches the space itself, so it acts as a separator there
        // and as a zero-width separator between the letters.
        assert_eq!(split(r"\s*", b"ab c"), [b"a", b"b", b"c"]);
    }

    #[test]
    fn empty_pattern_splits_between_characters() {
        // Adjacent zero-width separators do not produce spurious empty
        // tokens; every character becomes its own token.
        assert_eq!(split("", b"ab c"), [b"a", b"b", b" ", b"c"]);
    }

    #[test]
    fn no_match_returns_whole_subject() {
        assert_eq!(split("x", b"abc"), [b"abc".to_vec()]);
    }

    #[test]
    fn empty_subject_yields_no_tokens() {
        assert_eq!(split(",", b""), Vec::<Vec<u8>>::new());
        let re = Regex::new(",").unwrap();
        assert_eq!(
            re.split_full(b"ab", 2, MatchOptions::default(), 0).unwrap(),
            Vec::<&[u8]>::new()
        );
    }

    #[test]
    fn captures_become_tokens() {
        assert_eq!(
            split("([,;])", b"a,b;c"),
            [b"a", b",", b"b", b";", b"c"]
        );
    }

    #[test]
    fn max_tokens() {
        let re = Regex::new(",").unwrap();
        assert_eq!(
            re.split_full(b"a,b,c", 0, MatchOptions::default(), 2)
                .unwrap(),
            vec![&b"a"[..], b"b,c"]
        );
        assert_eq!(
            re.split_full(b"a,b,c", 0, MatchOptions::default(), 1)
                .unwrap(),
            vec![&b"a,b,c"[..]]
        );
        // A limit beyond the token count changes nothing.
        assert_eq!(
            re.split_full(b"a,b,c", 0, MatchOptions::default(), 10)
                .unwrap(),
            vec![&b"a"[..], b"b", b"c"]
        );
    }

    #[test]
    fn capture_tokens_do_not_count_against_the_limit() {
        let re = Regex::new("([,;])").unwrap();
        assert_eq!(
            re.split_full(b"a,b;c", 0, MatchOptions::default(), 2)
                .unwrap(),
            vec![&b"a"[..], b",", b"b;c"]
        );
    }

    #[test]
    fn max_tokens_with_empty_separator() {
        let re = Regex::new("").unwrap();
        assert_eq!(
            re.split_full(b"abc", 0, MatchOptions::default(), 2).unwrap(),
            vec![&b"a"[..], b"bc"]
        );
    }

    #[test]
    fn start_position() {
        let re = Regex::new(",").unwrap();
        assert_eq!(
            re.split_full(b"a,b,c", 2, MatchOptions::default(), 0)
                .unwrap(),
            vec![&b"b"[..], b"c"]
        );
    }

    #[test]
    fn separator_at_the_edges() {
        // Leading and trailing separators produce empty tokens.
        assert_eq!(split(",", b",a,"), [&b""[..], &b"a"[..], &b""[..]]);
    }

    #[test]
    fn multibyte_characters_stay_whole() {
        assert_eq!(
            split("", "aé".as_bytes()),
            [b"a".to_vec(), "é".as_bytes().to_vec()]
        );
    }

    #[test]
    fn raw_mode_splits_bytes() {
        let re = Regex::with_options(
            "",
            CompileOptions::RAW,
            MatchOptions::default(),
        )
        .unwrap();
        let tokens = re.split(b"ab").unwrap();
        assert_eq!(tokens, vec![&b"a"[..], b"b"]);
    }

    #[test]
    fn separators_rejoin_to_the_subject() {
        let subject = b"one-two--three";
        let re = Regex::new("-+").unwrap();
        let tokens = re.split(subject).unwrap();
        assert_eq!(tokens, vec![&b"one"[..], b"two", b"three"]);

        let mut seps = Vec::new();
        let mut m = re.find(subject).unwrap();
        while m.matched() {
            seps.push(m.group(0).unwrap());
            m.next().unwrap();
        }
        let mut rebuilt = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            rebuilt.extend_from_slice(token);
            if let Some(sep) = seps.get(i) {
                rebuilt.extend_from_slice(sep);
            }
        }
        assert_eq!(rebuilt, subject);
    }
}
