use bitflags::bitflags;
use pcre2_sys::{
    PCRE2_ANCHORED, PCRE2_CASELESS, PCRE2_DOLLAR_ENDONLY, PCRE2_DOTALL,
    PCRE2_DUPNAMES, PCRE2_EXTENDED, PCRE2_MULTILINE, PCRE2_NEWLINE_ANY,
    PCRE2_NEWLINE_CR, PCRE2_NEWLINE_CRLF, PCRE2_NEWLINE_LF,
    PCRE2_NO_AUTO_CAPTURE, PCRE2_NOTBOL, PCRE2_NOTEMPTY, PCRE2_NOTEOL,
    PCRE2_NO_UTF_CHECK, PCRE2_PARTIAL_SOFT, PCRE2_UCP, PCRE2_UNGREEDY,
    PCRE2_UTF,
};

bitflags! {
    /// Options that configure how a pattern is compiled.
    ///
    /// Unless [`CompileOptions::RAW`] is given, both the pattern and the
    /// subjects are treated as UTF-8 and character classes such as `\w` are
    /// Unicode-aware.
    ///
    /// Raw integers are rejected by [`CompileOptions::from_bits`] when they
    /// carry bits outside this set.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CompileOptions: u32 {
        /// Letters in the pattern match both upper- and lowercase letters.
        /// Corresponds to the `i` inline flag.
        const CASELESS = 1 << 0;
        /// `^` and `$` also match at internal line boundaries. Corresponds
        /// to the `m` inline flag.
        const MULTILINE = 1 << 1;
        /// `.` also matches newlines. Corresponds to the `s` inline flag.
        const DOTALL = 1 << 2;
        /// Unescaped whitespace in the pattern is ignored and `#` starts a
        /// comment. Corresponds to the `x` inline flag.
        const EXTENDED = 1 << 3;
        /// The pattern is forced to match only at the first position.
        const ANCHORED = 1 << 4;
        /// `$` matches only at the very end of the subject, never before a
        /// trailing newline.
        const DOLLAR_ENDONLY = 1 << 5;
        /// Quantifiers are lazy by default and `?` makes them greedy.
        const UNGREEDY = 1 << 6;
        /// Treat pattern and subjects as opaque bytes instead of UTF-8.
        const RAW = 1 << 7;
        /// Plain `(...)` groups do not capture; only named groups do.
        const NO_AUTO_CAPTURE = 1 << 8;
        /// Spend extra effort studying the compiled pattern so repeated
        /// matches run faster.
        const OPTIMIZE = 1 << 9;
        /// Allow several named groups to share one name.
        const DUPNAMES = 1 << 10;
        /// Only `\r` terminates a line.
        const NEWLINE_CR = 1 << 11;
        /// Only `\n` terminates a line.
        const NEWLINE_LF = 1 << 12;
        /// Only `\r\n` terminates a line.
        const NEWLINE_CRLF = Self::NEWLINE_CR.bits() | Self::NEWLINE_LF.bits();
    }
}

bitflags! {
    /// Options that configure a single match attempt.
    ///
    /// These can be stored on the compiled regex as defaults and combined
    /// with per-call options when a match state is created.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MatchOptions: u32 {
        /// The match is forced to start exactly at the starting position.
        const ANCHORED = 1 << 0;
        /// The start of the subject is not the beginning of a line, so `^`
        /// does not match there.
        const NOTBOL = 1 << 1;
        /// The end of the subject is not the end of a line, so `$` does not
        /// match there.
        const NOTEOL = 1 << 2;
        /// The empty string is not a valid match.
        const NOTEMPTY = 1 << 3;
        /// Report when the subject is a prefix of a string that could
        /// match, see [`Matches::is_partial`](crate::Matches::is_partial).
        const PARTIAL = 1 << 4;
        /// Only `\r` terminates a line.
        const NEWLINE_CR = 1 << 5;
        /// Only `\n` terminates a line.
        const NEWLINE_LF = 1 << 6;
        /// Only `\r\n` terminates a line.
        const NEWLINE_CRLF = Self::NEWLINE_CR.bits() | Self::NEWLINE_LF.bits();
        /// Any Unicode newline sequence terminates a line.
        const NEWLINE_ANY = 1 << 7;
    }
}

impl CompileOptions {
    /// Whether subjects are UTF-8 rather than opaque bytes.
    pub(crate) fn is_utf(self) -> bool {
        !self.contains(CompileOptions::RAW)
    }

    /// Translate to the matcher's compile-time bits. Every option is mapped
    /// by name; `RAW`, `OPTIMIZE` and the newline flags are handled
    /// elsewhere and never forwarded as raw values.
    pub(crate) fn to_matcher(self) -> u32 {
        let mut options = 0;
        if self.contains(CompileOptions::CASELESS) {
            options |= PCRE2_CASELESS;
        }
        if self.contains(CompileOptions::MULTILINE) {
            options |= PCRE2_MULTILINE;
        }
        if self.contains(CompileOptions::DOTALL) {
            options |= PCRE2_DOTALL;
        }
        if self.contains(CompileOptions::EXTENDED) {
            options |= PCRE2_EXTENDED;
        }
        if self.contains(CompileOptions::ANCHORED) {
            options |= PCRE2_ANCHORED;
        }
        if self.contains(CompileOptions::DOLLAR_ENDONLY) {
            options |= PCRE2_DOLLAR_ENDONLY;
        }
        if self.contains(CompileOptions::UNGREEDY) {
            options |= PCRE2_UNGREEDY;
        }
        if self.contains(CompileOptions::NO_AUTO_CAPTURE) {
            options |= PCRE2_NO_AUTO_CAPTURE;
        }
        if self.contains(CompileOptions::DUPNAMES) {
            options |= PCRE2_DUPNAMES;
        }
        if self.is_utf() {
            // Subjects are validated once per match state, so the matcher
            // does not need to recheck them. The pattern itself is a &str
            // and therefore already valid.
            options |= PCRE2_UTF | PCRE2_UCP | PCRE2_NO_UTF_CHECK;
        }
        options
    }

    /// Resolve the newline convention for the compile context. The compile
    /// options win over the default match options; when neither side names
    /// a convention, any newline sequence terminates a line.
    pub(crate) fn newline_convention(self, match_options: MatchOptions) -> u32 {
        match (
            self.contains(CompileOptions::NEWLINE_CR),
            self.contains(CompileOptions::NEWLINE_LF),
        ) {
            (true, true) => PCRE2_NEWLINE_CRLF,
            (true, false) => PCRE2_NEWLINE_CR,
            (false, true) => PCRE2_NEWLINE_LF,
            (false, false) => match (
                match_options.contains(MatchOptions::NEWLINE_CR),
                match_options.contains(MatchOptions::NEWLINE_LF),
            ) {
                (true, true) => PCRE2_NEWLINE_CRLF,
                (true, false) => PCRE2_NEWLINE_CR,
                (false, true) => PCRE2_NEWLINE_LF,
                (false, false) => PCRE2_NEWLINE_ANY,
            },
        }
    }
}

impl MatchOptions {
    /// Translate to the matcher's match-time bits. The newline flags have
    /// no match-time equivalent in the matcher; they only participate in
    /// the compile-time convention resolution above.
    pub(crate) fn to_matcher(self) -> u32 {
        let mut options = 0;
        if self.contains(MatchOptions::ANCHORED) {
            options |= PCRE2_ANCHORED;
        }
        if self.contains(MatchOptions::NOTBOL) {
            options |= PCRE2_NOTBOL;
        }
        if self.contains(MatchOptions::NOTEOL) {
            options |= PCRE2_NOTEOL;
        }
        if self.contains(MatchOptions::NOTEMPTY) {
            options |= PCRE2_NOTEMPTY;
        }
        if self.contains(MatchOptions::PARTIAL) {
            options |= PCRE2_PARTIAL_SOFT;
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_bits_are_rejected() {
        assert_eq!(
            CompileOptions::from_bits(CompileOptions::all().bits()),
            Some(CompileOptions::all())
        );
        assert_eq!(CompileOptions::from_bits(1 << 30), None);
        assert_eq!(MatchOptions::from_bits(1 << 30), None);
    }

    #[test]
    fn crlf_is_the_union_of_cr_and_lf() {
        assert_eq!(
            CompileOptions::NEWLINE_CR | CompileOptions::NEWLINE_LF,
            CompileOptions::NEWLINE_CRLF
        );
    }

    #[test]
    fn newline_convention_resolution() {
        let none = MatchOptions::default();
        assert_eq!(
            CompileOptions::default().newline_convention(none),
            PCRE2_NEWLINE_ANY
        );
        assert_eq!(
            CompileOptions::NEWLINE_CR.newline_convention(none),
            PCRE2_NEWLINE_CR
        );
        assert_eq!(
            CompileOptions::NEWLINE_LF.newline_convention(none),
            PCRE2_NEWLINE_LF
        );
        assert_eq!(
            CompileOptions::NEWLINE_CRLF.newline_convention(none),
            PCRE2_NEWLINE_CRLF
        );
        // The compile-time default match options may also pick the
        // convention, but compile options win.
        assert_eq!(
            CompileOptions::default()
                .newline_convention(MatchOptions::NEWLINE_CR),
            PCRE2_NEWLINE_CR
        );
        assert_eq!(
            CompileOptions::NEWLINE_LF
                .newline_convention(MatchOptions::NEWLINE_CR),
            PCRE2_NEWLINE_LF
        );
    }

    #[test]
    fn optimize_is_not_forwarded() {
        let bits = CompileOptions::OPTIMIZE.to_matcher();
        assert_eq!(bits & !CompileOptions::default().to_matcher(), 0);
    }
}
