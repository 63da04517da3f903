/*!
Replacement templates. A template is parsed once into a list of
interpolation atoms and can then be applied to any number of matches; the
parse never looks at a subject string.

The escape language is Perl's: `\1`/`\g<name>` backreferences, `\0` for the
whole match, control escapes, `\xHH`/`\x{HHHH}` code points, octal code
points, and the case-changing escapes `\l`, `\u`, `\L`, `\U`, `\E`.
*/

use logos::{Lexer, Logos};

use crate::error::{Error, Result};
use crate::matches::Matches;
use crate::options::MatchOptions;
use crate::regex::Regex;

#[derive(Logos, Clone, Copy, Debug, PartialEq)]
enum TemplateToken {
    /// Plain text up to the next backslash.
    #[regex(r"[^\\]+")]
    Text,

    /// A single-character escape, `\\` included.
    #[regex(r"\\[tnvrfab\\]")]
    Control,

    /// A case-change escape.
    #[regex(r"\\[luULE]")]
    Case,

    /// Start of a hex escape; the rest is context dependent.
    #[token(r"\x")]
    Hex,

    /// Start of a `\g<...>` reference.
    #[token(r"\g")]
    Group,

    /// A backslash followed by a digit: an octal code point or a numeric
    /// backreference, disambiguated by the digit values.
    #[regex(r"\\[0-9]")]
    Digit,

    /// A backslash that starts no known escape.
    #[token("\\")]
    Stray,
}

/// The case machine driven by `\l`, `\u`, `\L`, `\U` and `\E`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CaseMode {
    None,
    Lower,
    Upper,
    LowerOne,
    UpperOne,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Atom {
    /// Literal text, also produced by hex and octal escapes.
    Text(String),
    /// A literal control byte from a single-character escape.
    Char(u8),
    /// Backreference by group number; 0 is the whole match.
    Numeric(usize),
    /// Backreference by group name.
    Symbolic(String),
    /// Set the case machine.
    Case(CaseMode),
}

/// A parsed replacement template.
///
/// ```
/// use sift_regex::{Regex, Replacement};
///
/// let re = Regex::new(r"(\w+) (\w+)")?;
/// assert_eq!(re.replace(b"hello world", r"\2 \1")?, b"world hello");
///
/// // Parsing is independent of any subject; a template can be reused.
/// let swap = Replacement::parse(r"\2 \1")?;
/// assert_eq!(swap.template(), r"\2 \1");
/// # Ok::<(), sift_regex::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Replacement {
    template: String,
    atoms: Vec<Atom>,
}

fn fail(template: &str, offset: usize, detail: &str) -> Error {
    Error::Replace {
        template: template.to_string(),
        offset,
        detail: detail.to_string(),
    }
}

fn code_point(value: u32) -> char {
    char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn hex_value(b: u8) -> u32 {
    (b as char).to_digit(16).unwrap_or(0)
}

impl Replacement {
    /// Parses a template. Errors carry the byte offset of the offending
    /// character; a failed parse leaves nothing behind.
    pub fn parse(template: &str) -> Result<Replacement> {
        let mut atoms = Vec::new();
        let mut lex = TemplateToken::lexer(template);
        while let Some(token) = lex.next() {
            let token = match token {
                Ok(token) => token,
                Err(()) => {
                    return Err(fail(
                        template,
                        lex.span().start,
                        "unknown escape sequence",
                    ))
                }
            };
            match token {
                TemplateToken::Text => {
                    atoms.push(Atom::Text(lex.slice().to_string()));
                }
                TemplateToken::Control => {
                    let c = match lex.slice().as_bytes()[1] {
                        b't' => b'\t',
                        b'n' => b'\n',
                        b'v' => 0x0b,
                        b'r' => b'\r',
                        b'f' => 0x0c,
                        b'a' => 0x07,
                        b'b' => 0x08,
                        _ => b'\\',
                    };
                    atoms.push(Atom::Char(c));
                }
                TemplateToken::Case => {
                    let mode = match lex.slice().as_bytes()[1] {
                        b'l' => CaseMode::LowerOne,
                        b'u' => CaseMode::UpperOne,
                        b'L' => CaseMode::Lower,
                        b'U' => CaseMode::Upper,
                        _ => CaseMode::None,
                    };
                    atoms.push(Atom::Case(mode));
                }
                TemplateToken::Hex => {
                    let atom = parse_hex(&mut lex)
                        .map_err(|(offset, detail)| fail(template, offset, detail))?;
                    atoms.push(atom);
                }
                TemplateToken::Group => {
                    let atom = parse_group(&mut lex, template.len())
                        .map_err(|(offset, detail)| fail(template, offset, detail))?;
                    atoms.push(atom);
                }
                TemplateToken::Digit => {
                    atoms.push(parse_digits(&mut lex));
                }
                TemplateToken::Stray => {
                    let offset = lex.span().end;
                    if lex.remainder().is_empty() {
                        return Err(fail(template, offset, "stray final '\\'"));
                    }
                    return Err(fail(template, offset, "unknown escape sequence"));
                }
            }
        }
        Ok(Replacement {
            template: template.to_string(),
            atoms,
        })
    }

    /// The template text this value was parsed from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Appends the expansion of this template for the current match of `m`.
    pub(crate) fn interpolate(&self, m: &Matches<'_>, out: &mut Vec<u8>) {
        let mut case = CaseMode::None;
        for atom in &self.atoms {
            match atom {
                Atom::Text(text) => append_cased(out, text.as_bytes(), &mut case),
                Atom::Char(c) => {
                    match case {
                        CaseMode::None => out.push(*c),
                        CaseMode::Upper | CaseMode::UpperOne => {
                            push_cased(out, *c as char, true)
                        }
                        CaseMode::Lower | CaseMode::LowerOne => {
                            push_cased(out, *c as char, false)
                        }
                    }
                    if matches!(case, CaseMode::LowerOne | CaseMode::UpperOne) {
                        case = CaseMode::None;
                    }
                }
                Atom::Numeric(n) => {
                    if let Some(text) = m.group(*n) {
                        append_cased(out, text, &mut case);
                    }
                }
                Atom::Symbolic(name) => {
                    if let Some(text) = m.group_by_name(name) {
                        append_cased(out, text, &mut case);
                    }
                }
                Atom::Case(mode) => case = *mode,
            }
        }
    }
}

/// Hex escape bodies: `{H...}` or exactly two hex digits.
fn parse_hex(
    lex: &mut Lexer<'_, TemplateToken>,
) -> std::result::Result<Atom, (usize, &'static str)> {
    let rem = lex.remainder().as_bytes();
    let base = lex.span().end;
    if rem.first() == Some(&b'{') {
        let mut value: u32 = 0;
        let mut i = 1;
        loop {
            match rem.get(i) {
                Some(&b'}') if i > 1 => {
                    i += 1;
                    break;
                }
                Some(&b) if b.is_ascii_hexdigit() => {
                    value = value.wrapping_mul(16).wrapping_add(hex_value(b));
                    i += 1;
                }
                _ => return Err((base + i, "hexadecimal digit or '}' expected")),
            }
        }
        lex.bump(i);
        Ok(Atom::Text(code_point(value).to_string()))
    } else {
        let mut value: u32 = 0;
        for i in 0..2 {
            match rem.get(i) {
                Some(&b) if b.is_ascii_hexdigit() => {
                    value = value * 16 + hex_value(b);
                }
                _ => return Err((base + i, "hexadecimal digit expected")),
            }
        }
        lex.bump(2);
        Ok(Atom::Text(code_point(value).to_string()))
    }
}

/// `\g<...>` bodies: all digits is a numeric reference, all alphanumerics a
/// symbolic one; anything else is one of four distinct errors.
fn parse_group(
    lex: &mut Lexer<'_, TemplateToken>,
    template_len: usize,
) -> std::result::Result<Atom, (usize, &'static str)> {
    let rem = lex.remainder();
    let bytes = rem.as_bytes();
    let base = lex.span().end;
    if bytes.first() != Some(&b'<') {
        return Err((base, "missing '<' in symbolic reference"));
    }
    let Some(close) = bytes.iter().position(|&b| b == b'>') else {
        return Err((template_len, "unfinished symbolic reference"));
    };
    let name = &rem[1..close];
    if name.is_empty() {
        return Err((base + 1, "zero-length symbolic reference"));
    }
    let atom = if name.as_bytes()[0].is_ascii_digit() {
        let mut value = 0usize;
        for (i, b) in name.bytes().enumerate() {
            if !b.is_ascii_digit() {
                return Err((base + 1 + i, "digit expected"));
            }
            value = value.wrapping_mul(10).wrapping_add(usize::from(b - b'0'));
        }
        Atom::Numeric(value)
    } else {
        for (i, b) in name.bytes().enumerate() {
            if !b.is_ascii_alphanumeric() {
                return Err((base + 1 + i, "illegal symbolic reference"));
            }
        }
        Atom::Symbolic(name.to_string())
    };
    lex.bump(close + 1);
    Ok(atom)
}

/// Digit escape bodies. `\0` followed by a digit starts an octal escape;
/// otherwise up to three digits are read, and the value is an octal code
/// point when all three were octal digits, a decimal backreference
/// otherwise. A digit 8 or 9 forces decimal; decimal references stop after
/// two digits.
fn parse_digits(lex: &mut Lexer<'_, TemplateToken>) -> Atom {
    let first = lex.slice().as_bytes()[1];
    let tail = lex.remainder().as_bytes();
    let from_zero =
        first == b'0' && tail.first().is_some_and(|b| b.is_ascii_digit());
    let digit_at = |i: usize| -> Option<u8> {
        if from_zero {
            tail.get(i).copied()
        } else if i == 0 {
            Some(first)
        } else {
            tail.get(i - 1).copied()
        }
    };
    let mut base: u32 = if from_zero { 8 } else { 0 };
    let mut octal: u32 = 0;
    let mut decimal: u32 = 0;
    let mut taken = 0;
    while taken < 3 {
        let Some(b) = digit_at(taken).filter(|b| b.is_ascii_digit()) else {
            break;
        };
        let h = u32::from(b - b'0');
        if h > 7 {
            if base == 8 {
                break;
            }
            base = 10;
        }
        if taken == 2 && base == 10 {
            break;
        }
        octal = octal.wrapping_mul(8).wrapping_add(h);
        decimal = decimal.wrapping_mul(10).wrapping_add(h);
        taken += 1;
    }
    // The first digit is part of the token itself unless `\0` consumed it.
    lex.bump(if from_zero { taken } else { taken.saturating_sub(1) });
    if base == 8 || taken == 3 {
        Atom::Text(code_point(octal).to_string())
    } else {
        Atom::Numeric(decimal as usize)
    }
}

/// Appends `text` while applying the case machine: one-shot modes affect
/// exactly one emitted character and empty text leaves them armed.
fn append_cased(out: &mut Vec<u8>, text: &[u8], case: &mut CaseMode) {
    if text.is_empty() {
        return;
    }
    match *case {
        CaseMode::None => out.extend_from_slice(text),
        CaseMode::LowerOne | CaseMode::UpperOne => {
            let upper = *case == CaseMode::UpperOne;
            let decoded = String::from_utf8_lossy(text);
            let mut chars = decoded.chars();
            if let Some(c) = chars.next() {
                push_cased(out, c, upper);
            }
            out.extend_from_slice(chars.as_str().as_bytes());
            *case = CaseMode::None;
        }
        CaseMode::Lower | CaseMode::Upper => {
            let upper = *case == CaseMode::Upper;
            for c in String::from_utf8_lossy(text).chars() {
                push_cased(out, c, upper);
            }
        }
    }
}

fn push_cased(out: &mut Vec<u8>, c: char, upper: bool) {
    let mut buf = [0u8; 4];
    if upper {
        for u in c.to_uppercase() {
            out.extend_from_slice(u.encode_utf8(&mut buf).as_bytes());
        }
    } else {
        for l in c.to_lowercase() {
            out.extend_from_slice(l.encode_utf8(&mut buf).as_bytes());
        }
    }
}

/// Replacement drivers.
impl Regex {
    /// Replaces every match with the expansion of `replacement`, which may
    /// use the backreference syntax described on [`Replacement`].
    ///
    /// ```
    /// use sift_regex::Regex;
    ///
    /// let re = Regex::new("([a-z]+)")?;
    /// assert_eq!(
    ///     re.replace(b"foo BAR baz", r"\U\1\E!")?,
    ///     b"FOO! BAR BAZ!"
    /// );
    /// # Ok::<(), sift_regex::Error>(())
    /// ```
    pub fn replace(&self, subject: &[u8], replacement: &str) -> Result<Vec<u8>> {
        self.replace_full(subject, 0, replacement, MatchOptions::default())
    }

    /// Like [`Regex::replace`], with a starting offset and match options.
    /// The template is parsed once, before any matching runs.
    pub fn replace_full(
        &self,
        subject: &[u8],
        start: usize,
        replacement: &str,
        options: MatchOptions,
    ) -> Result<Vec<u8>> {
        let template = Replacement::parse(replacement)?;
        self.replace_eval(subject, start, options, |m, out| {
            template.interpolate(m, out);
            false
        })
    }

    /// Replaces every match with `replacement`, taken literally.
    pub fn replace_literal(
        &self,
        subject: &[u8],
        replacement: &[u8],
    ) -> Result<Vec<u8>> {
        self.replace_literal_full(subject, 0, replacement, MatchOptions::default())
    }

    /// Like [`Regex::replace_literal`], with a starting offset and match
    /// options.
    pub fn replace_literal_full(
        &self,
        subject: &[u8],
        start: usize,
        replacement: &[u8],
        options: MatchOptions,
    ) -> Result<Vec<u8>> {
        self.replace_eval(subject, start, options, |_, out| {
            out.extend_from_slice(replacement);
            false
        })
    }

    /// Replaces matches with whatever `eval` appends to the output buffer.
    ///
    /// `eval` runs once per match and returns whether to stop; the
    /// unmatched remainder of the subject is appended either way.
    pub fn replace_eval<F>(
        &self,
        subject: &[u8],
        start: usize,
        options: MatchOptions,
        mut eval: F,
    ) -> Result<Vec<u8>>
    where
        F: FnMut(&Matches<'_>, &mut Vec<u8>) -> bool,
    {
        let mut m = self.find_at(subject, start, options)?;
        let mut out = Vec::with_capacity(subject.len());
        let mut str_pos = 0;
        let mut done = false;
        while !done && m.matched() {
            let (match_start, match_end) = m.whole_span();
            out.extend_from_slice(&subject[str_pos..match_start as usize]);
            done = eval(&m, &mut out);
            str_pos = match_end as usize;
            m.next()?;
        }
        out.extend_from_slice(&subject[str_pos..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atoms(template: &str) -> Vec<Atom> {
        Replacement::parse(template).unwrap().atoms
    }

    fn parse_err(template: &str) -> (usize, String) {
        match Replacement::parse(template).unwrap_err() {
            Error::Replace { offset, detail, .. } => (offset, detail),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn literal_and_control_escapes() {
        assert_eq!(
            atoms("a\\n\\tb"),
            vec![
                Atom::Text("a".to_string()),
                Atom::Char(b'\n'),
                Atom::Char(b'\t'),
                Atom::Text("b".to_string()),
            ]
        );
        assert_eq!(atoms(r"\\"), vec![Atom::Char(b'\\')]);
        assert_eq!(
            atoms(r"\a\b\v\f\r"),
            vec![
                Atom::Char(0x07),
                Atom::Char(0x08),
                Atom::Char(0x0b),
                Atom::Char(0x0c),
                Atom::Char(b'\r'),
            ]
        );
    }

    #[test]
    fn case_escapes() {
        assert_eq!(
            atoms(r"\l\u\L\U\E"),
            vec![
                Atom::Case(CaseMode::LowerOne),
                Atom::Case(CaseMode::UpperOne),
                Atom::Case(CaseMode::Lower),
                Atom::Case(CaseMode::Upper),
                Atom::Case(CaseMode::None),
            ]
        );
    }

    #[test]
    fn hex_escapes() {
        assert_eq!(atoms(r"\x41"), vec![Atom::Text("A".to_string())]);
        assert_eq!(atoms(r"\x{1F600}"), vec![Atom::Text("😀".to_string())]);
        assert_eq!(atoms(r"\x{41}z"), vec![
            Atom::Text("A".to_string()),
            Atom::Text("z".to_string()),
        ]);
        assert_eq!(
            parse_err(r"\xg"),
            (2, "hexadecimal digit expected".to_string())
        );
        assert_eq!(
            parse_err(r"\x4"),
            (3, "hexadecimal digit expected".to_string())
        );
        assert_eq!(
            parse_err(r"\x{}"),
            (3, "hexadecimal digit or '}' expected".to_string())
        );
        assert_eq!(
            parse_err(r"\x{4z}"),
            (4, "hexadecimal digit or '}' expected".to_string())
        );
    }

    #[test]
    fn group_references() {
        assert_eq!(atoms(r"\g<1>"), vec![Atom::Numeric(1)]);
        assert_eq!(atoms(r"\g<12>"), vec![Atom::Numeric(12)]);
        assert_eq!(
            atoms(r"\g<word>"),
            vec![Atom::Symbolic("word".to_string())]
        );
        assert_eq!(
            parse_err(r"\g1"),
            (2, "missing '<' in symbolic reference".to_string())
        );
        assert_eq!(
            parse_err(r"\g<"),
            (3, "unfinished symbolic reference".to_string())
        );
        assert_eq!(
            parse_err(r"\g<ab"),
            (5, "unfinished symbolic reference".to_string())
        );
        assert_eq!(
            parse_err(r"\g<>"),
            (3, "zero-length symbolic reference".to_string())
        );
        assert_eq!(parse_err(r"\g<1a>"), (4, "digit expected".to_string()));
        assert_eq!(
            parse_err(r"\g<a!>"),
            (4, "illegal symbolic reference".to_string())
        );
    }

    #[test]
    fn digit_escapes() {
        // A bare \0 refers to the whole match...
        assert_eq!(atoms(r"\0"), vec![Atom::Numeric(0)]);
        // ...but \0 followed by a digit starts an octal escape.
        assert_eq!(atoms(r"\01"), vec![Atom::Text("\u{1}".to_string())]);
        assert_eq!(atoms(r"\0101"), vec![Atom::Text("A".to_string())]);
        assert_eq!(atoms(r"\08"), vec![
            Atom::Text("\0".to_string()),
            Atom::Text("8".to_string()),
        ]);
        // Three octal digits form a code point, fewer form a reference.
        assert_eq!(atoms(r"\101"), vec![Atom::Text("A".to_string())]);
        assert_eq!(atoms(r"\12"), vec![Atom::Numeric(12)]);
        assert_eq!(atoms(r"\1"), vec![Atom::Numeric(1)]);
        // An 8 or 9 anywhere forces a decimal reference.
        assert_eq!(atoms(r"\99"), vec![Atom::Numeric(99)]);
        assert_eq!(atoms(r"\999"), vec![
            Atom::Numeric(99),
            Atom::Text("9".to_string()),
        ]);
        assert_eq!(atoms(r"\118"), vec![
            Atom::Numeric(11),
            Atom::Text("8".to_string()),
        ]);
    }

    #[test]
    fn stray_and_unknown_escapes() {
        assert_eq!(parse_err("abc\\"), (4, "stray final '\\'".to_string()));
        assert_eq!(
            parse_err(r"\q"),
            (1, "unknown escape sequence".to_string())
        );
    }

    #[test]
    fn parsing_is_pure() {
        let a = Replacement::parse(r"a\U\1\E").unwrap();
        let b = Replacement::parse(r"a\U\1\E").unwrap();
        assert_eq!(a, b);
        assert_eq!(parse_err(r"\q"), parse_err(r"\q"));
    }

    #[test]
    fn swap_words() {
        let re = Regex::new(r"(\w+) (\w+)").unwrap();
        assert_eq!(
            re.replace(b"hello world", r"\2 \1").unwrap(),
            b"world hello"
        );
    }

    #[test]
    fn uppercase_matches() {
        let re = Regex::new("([a-z]+)").unwrap();
        assert_eq!(
            re.replace(b"foo BAR baz", r"\U\1\E!").unwrap(),
            b"FOO! BAR BAZ!"
        );
    }

    #[test]
    fn whole_match_reference() {
        let re = Regex::new("b+").unwrap();
        assert_eq!(re.replace(b"abbc", r"[\0]").unwrap(), b"a[bb]c");
    }

    #[test]
    fn symbolic_reference() {
        let re = Regex::new(r"(?<word>\w+)").unwrap();
        assert_eq!(re.replace(b"hi", r"\g<word>!").unwrap(), b"hi!");
    }

    #[test]
    fn missing_group_expands_to_nothing() {
        let re = Regex::new("a").unwrap();
        assert_eq!(re.replace(b"a", r"\1").unwrap(), b"");
        assert_eq!(re.replace(b"a", r"\g<nope>").unwrap(), b"");
    }

    #[test]
    fn one_shot_case_changes() {
        let re = Regex::new(r"(\w+)").unwrap();
        assert_eq!(re.replace(b"abc", r"\u\1").unwrap(), b"Abc");
        assert_eq!(re.replace(b"ABC", r"\l\1").unwrap(), b"aBC");
        assert_eq!(re.replace(b"ab cd", r"\u\1").unwrap(), b"Ab Cd");
    }

    #[test]
    fn one_shot_case_survives_empty_groups() {
        // Group 1 matches nothing, so the pending \u applies to group 2.
        let re = Regex::new("(x)?(b)").unwrap();
        assert_eq!(re.replace(b"b", r"\u\1\2").unwrap(), b"B");
    }

    #[test]
    fn one_shot_case_is_consumed_by_character_escapes() {
        let re = Regex::new("a").unwrap();
        assert_eq!(re.replace(b"a", r"\u\tz").unwrap(), b"\tz");
    }

    #[test]
    fn case_reset() {
        let re = Regex::new(r"(\w+)").unwrap();
        assert_eq!(re.replace(b"x", r"\Uab\Ecd").unwrap(), b"ABcd");
    }

    #[test]
    fn unicode_case_mapping() {
        let re = Regex::new("(.+)").unwrap();
        assert_eq!(
            re.replace("straße".as_bytes(), r"\U\1").unwrap(),
            "STRASSE".as_bytes()
        );
    }

    #[test]
    fn literal_replacement() {
        let re = Regex::new("b+").unwrap();
        assert_eq!(re.replace_literal(b"abc bbd", b"").unwrap(), b"ac d");
        // The replacement is not scanned for backreferences.
        assert_eq!(
            re.replace_literal(b"ab", br"\0").unwrap(),
            b"a\\0"
        );
    }

    #[test]
    fn eval_callback_can_stop() {
        let re = Regex::new("b+").unwrap();
        let out = re
            .replace_eval(b"abcbd", 0, MatchOptions::default(), |m, out| {
                assert_eq!(m.group(0), Some(&b"b"[..]));
                out.push(b'X');
                true
            })
            .unwrap();
        assert_eq!(out, b"aXcbd");
    }

    #[test]
    fn expand_references_on_a_match() {
        let re = Regex::new(r"(\w+) (\w+)").unwrap();
        let m = re.find(b"hello world").unwrap();
        assert_eq!(m.expand_references(r"\2-\1").unwrap(), b"world-hello");
    }

    #[test]
    fn start_position_keeps_the_head() {
        let re = Regex::new("a").unwrap();
        assert_eq!(
            re.replace_full(b"aaa", 1, "X", MatchOptions::default())
                .unwrap(),
            b"aXX"
        );
    }
}
