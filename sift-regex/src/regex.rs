use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;
use once_cell::sync::Lazy;

use crate::error::{Error, Result};
use crate::ffi;
use crate::matches::Matches;
use crate::options::{CompileOptions, MatchOptions};

/// One-shot capability probe: the matcher must have been built with UTF
/// decoding and Unicode property tables.
static UNICODE_SUPPORT: Lazy<bool> = Lazy::new(ffi::unicode_supported);

/// A compiled regular expression.
///
/// Compilation is the expensive step; once built, a `Regex` can be used any
/// number of times to search, split or replace text. Cloning is cheap
/// (reference counted) and a clone may be moved to another thread; match
/// state created from a regex keeps the compiled pattern alive even after
/// the caller drops its own handle.
///
/// # Example
///
/// ```
/// use sift_regex::Regex;
///
/// let re = Regex::new("[A-Z]+")?;
/// let mut m = re.find(b"Hello WORLD")?;
/// assert_eq!(m.group(0), Some(&b"H"[..]));
/// assert!(m.next()?);
/// assert_eq!(m.group(0), Some(&b"WORLD"[..]));
/// # Ok::<(), sift_regex::Error>(())
/// ```
#[derive(Clone)]
pub struct Regex {
    imp: Arc<RegexI>,
}

/// The shared internals of `Regex`, split out so that match states can pin
/// them with a strong reference.
pub(crate) struct RegexI {
    pub(crate) pattern: String,
    pub(crate) code: ffi::Code,
    pub(crate) compile_options: CompileOptions,
    pub(crate) match_options: MatchOptions,
    pub(crate) capture_count: usize,
    max_backref: usize,
    names: HashMap<String, usize>,
    studied: bool,
}

impl fmt::Debug for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Regex({:?})", self.imp.pattern)
    }
}

impl Regex {
    /// Compiles a pattern with default options.
    pub fn new(pattern: &str) -> Result<Regex> {
        Regex::with_options(pattern, CompileOptions::default(), MatchOptions::default())
    }

    /// Compiles a pattern.
    ///
    /// `match_options` become the defaults for every match run with this
    /// regex; per-call options are OR-ed on top of them.
    pub fn with_options(
        pattern: &str,
        options: CompileOptions,
        match_options: MatchOptions,
    ) -> Result<Regex> {
        if !*UNICODE_SUPPORT {
            log::error!("matcher built without Unicode support");
            return Err(Error::Compile {
                pattern: pattern.to_string(),
                offset: 0,
                message: "the matcher library was built without Unicode support"
                    .to_string(),
            });
        }

        let newline = options.newline_convention(match_options);
        let mut code = ffi::Code::new(pattern, options.to_matcher(), newline)
            .map_err(|e| Error::Compile {
                pattern: pattern.to_string(),
                offset: e.offset,
                message: e.message,
            })?;

        let studied = options.contains(CompileOptions::OPTIMIZE);
        if studied {
            code.jit_compile().map_err(|message| Error::Optimize {
                pattern: pattern.to_string(),
                message,
            })?;
            debug!("pattern {:?} studied", pattern);
        }

        let capture_count = code.capture_count();
        let max_backref = code.max_backref();
        let mut names = HashMap::new();
        for (name, number) in code.name_table() {
            // With duplicate names allowed, the first entry wins.
            names.entry(name).or_insert(number);
        }

        Ok(Regex {
            imp: Arc::new(RegexI {
                pattern: pattern.to_string(),
                code,
                compile_options: options,
                match_options,
                capture_count,
                max_backref,
                names,
                studied,
            }),
        })
    }

    /// The pattern this regex was compiled from.
    pub fn pattern(&self) -> &str {
        &self.imp.pattern
    }

    /// Number of capturing groups in the pattern, not counting group 0.
    pub fn capture_count(&self) -> usize {
        self.imp.capture_count
    }

    /// Highest backreference number used in the pattern, 0 if none.
    pub fn max_backref(&self) -> usize {
        self.imp.max_backref
    }

    /// The group number of the named group `name`, if the pattern has one.
    pub fn group_number(&self, name: &str) -> Option<usize> {
        self.imp.names.get(name).copied()
    }

    /// Whether the pattern was studied after compilation.
    pub fn is_studied(&self) -> bool {
        self.imp.studied
    }

    pub(crate) fn imp(&self) -> &RegexI {
        &self.imp
    }

    pub(crate) fn is_utf(&self) -> bool {
        self.imp.compile_options.is_utf()
    }

    /// Returns true if the regex matches anywhere in `subject`.
    pub fn is_match(&self, subject: &[u8]) -> Result<bool> {
        Ok(self.find(subject)?.matched())
    }

    /// Scans `subject` and returns a cursor positioned on the first match.
    ///
    /// Whether a match was found is reported by
    /// [`Matches::matched`]; further matches are visited with
    /// [`Matches::next`].
    pub fn find<'s>(&self, subject: &'s [u8]) -> Result<Matches<'s>> {
        self.find_at(subject, 0, MatchOptions::default())
    }

    /// Like [`Regex::find`], but starts the search at byte offset `start`
    /// with extra match options.
    ///
    /// Starting at `start` differs from searching `&subject[start..]`: the
    /// matcher can still see the preceding context, which matters for
    /// patterns beginning with a lookbehind or `\b`.
    ///
    /// # Panics
    ///
    /// If `start` is out of bounds, or (in UTF-8 mode) not on a character
    /// boundary.
    pub fn find_at<'s>(
        &self,
        subject: &'s [u8],
        start: usize,
        options: MatchOptions,
    ) -> Result<Matches<'s>> {
        Matches::new_standard(self.clone(), subject, start, options)
    }

    /// Retrieves all possible matches that start at the leftmost matching
    /// position, using the alternate all-matches algorithm.
    ///
    /// The standard algorithm reports only the longest leftmost match; this
    /// one reports every match beginning there, longest first. Group
    /// accessors on the returned cursor address those matches rather than
    /// capturing parentheses, and [`Matches::next`] always reports
    /// exhaustion.
    ///
    /// ```
    /// use sift_regex::Regex;
    ///
    /// let m = Regex::new("<.*>")?.find_all(b"<a> <b> <c>")?;
    /// assert_eq!(m.match_count(), 3);
    /// assert_eq!(m.group(0), Some(&b"<a> <b> <c>"[..]));
    /// assert_eq!(m.group(2), Some(&b"<a>"[..]));
    /// # Ok::<(), sift_regex::Error>(())
    /// ```
    pub fn find_all<'s>(&self, subject: &'s [u8]) -> Result<Matches<'s>> {
        self.find_all_at(subject, 0, MatchOptions::default())
    }

    /// Like [`Regex::find_all`], with a starting offset and extra match
    /// options.
    pub fn find_all_at<'s>(
        &self,
        subject: &'s [u8],
        start: usize,
        options: MatchOptions,
    ) -> Result<Matches<'s>> {
        Matches::new_all(self.clone(), subject, start, options)
    }

    /// One-shot convenience: compile `pattern` and test it against
    /// `subject`. Prefer [`Regex::new`] + [`Regex::is_match`] when the same
    /// pattern is used more than once.
    pub fn is_match_simple(
        pattern: &str,
        subject: &[u8],
        options: CompileOptions,
        match_options: MatchOptions,
    ) -> Result<bool> {
        Regex::with_options(pattern, options, MatchOptions::default())?
            .find_at(subject, 0, match_options)
            .map(|m| m.matched())
    }

    /// One-shot convenience: compile `pattern` and split `subject` on it.
    pub fn split_simple<'s>(
        pattern: &str,
        subject: &'s [u8],
        options: CompileOptions,
        match_options: MatchOptions,
    ) -> Result<Vec<&'s [u8]>> {
        Regex::with_options(pattern, options, MatchOptions::default())?
            .split_full(subject, 0, match_options, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn introspection() {
        let re = Regex::new(r"(?<year>\d{4})-(\d{2})").unwrap();
        assert_eq!(re.pattern(), r"(?<year>\d{4})-(\d{2})");
        assert_eq!(re.capture_count(), 2);
        assert_eq!(re.group_number("year"), Some(1));
        assert_eq!(re.group_number("month"), None);
        assert_eq!(re.max_backref(), 0);
        assert!(!re.is_studied());
    }

    #[test]
    fn max_backref() {
        let re = Regex::new(r"(a)(b)\2").unwrap();
        assert_eq!(re.max_backref(), 2);
    }

    #[test]
    fn compile_error() {
        let err = Regex::new("ab(").unwrap_err();
        match err {
            Error::Compile { pattern, offset, message } => {
                assert_eq!(pattern, "ab(");
                assert_eq!(offset, 3);
                assert!(!message.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn optimize_studies_the_pattern() {
        let re = Regex::with_options(
            "abc",
            CompileOptions::OPTIMIZE,
            MatchOptions::default(),
        )
        .unwrap();
        assert!(re.is_studied());
        assert!(re.is_match(b"xxabcxx").unwrap());
    }

    #[test]
    fn handle_is_shared() {
        let re = Regex::new("ab").unwrap();
        let clone = re.clone();
        drop(re);
        // The clone still works after the original handle is gone.
        assert!(clone.is_match(b"drab").unwrap());
    }

    #[test]
    fn caseless() {
        assert!(Regex::is_match_simple(
            "hello",
            b"HELLO",
            CompileOptions::CASELESS,
            MatchOptions::default()
        )
        .unwrap());
    }

    #[test]
    fn raw_matches_bytes_not_characters() {
        let subject = "é".as_bytes();
        let utf = Regex::new(".").unwrap().find(subject).unwrap();
        assert_eq!(utf.group_span(0), Some((0, 2)));
        let raw = Regex::with_options(
            ".",
            CompileOptions::RAW,
            MatchOptions::default(),
        )
        .unwrap()
        .find(subject)
        .unwrap();
        assert_eq!(raw.group_span(0), Some((0, 1)));
    }

    #[test]
    fn anchored_compile_option() {
        let re = Regex::with_options(
            "b",
            CompileOptions::ANCHORED,
            MatchOptions::default(),
        )
        .unwrap();
        assert!(!re.is_match(b"ab").unwrap());
        assert!(re.is_match(b"ba").unwrap());
    }

    #[test]
    fn ungreedy() {
        let re = Regex::with_options(
            "<.*>",
            CompileOptions::UNGREEDY,
            MatchOptions::default(),
        )
        .unwrap();
        let m = re.find(b"<a> <b>").unwrap();
        assert_eq!(m.group(0), Some(&b"<a>"[..]));
    }

    #[test]
    fn multiline_and_dotall() {
        let re = Regex::with_options(
            "^b",
            CompileOptions::MULTILINE,
            MatchOptions::default(),
        )
        .unwrap();
        assert!(re.is_match(b"a\nb").unwrap());
        assert!(!Regex::new("^b").unwrap().is_match(b"a\nb").unwrap());

        let re = Regex::with_options(
            "a.b",
            CompileOptions::DOTALL,
            MatchOptions::default(),
        )
        .unwrap();
        assert!(re.is_match(b"a\nb").unwrap());
    }

    #[test]
    fn duplicate_names() {
        let re = Regex::with_options(
            r"(?<n>a)|(?<n>b)",
            CompileOptions::DUPNAMES,
            MatchOptions::default(),
        )
        .unwrap();
        assert_eq!(re.group_number("n"), Some(1));
    }
}
