/// Escapes the characters that are special in a pattern, so that the
/// result matches `source` literally. Useful for building patterns from
/// user input.
///
/// A NUL byte has no escaped spelling of its own and becomes the two
/// characters `\0`. All other bytes, UTF-8 continuation bytes included,
/// are copied through untouched.
///
/// ```
/// use sift_regex::{escape, Regex};
///
/// assert_eq!(escape(b"a.b*c"), b"a\\.b\\*c");
///
/// let pattern = String::from_utf8(escape(b"1 + 1 = 2?")).unwrap();
/// let m = Regex::new(&pattern)?.find(b"1 + 1 = 2?")?;
/// assert_eq!(m.group_span(0), Some((0, 10)));
/// # Ok::<(), sift_regex::Error>(())
/// ```
pub fn escape(source: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(source.len() + 1);
    for &b in source {
        match b {
            b'\0' => {
                escaped.push(b'\\');
                escaped.push(b'0');
            }
            b'\\' | b'|' | b'(' | b')' | b'[' | b']' | b'{' | b'}' | b'^'
            | b'$' | b'*' | b'+' | b'?' | b'.' => {
                escaped.push(b'\\');
                escaped.push(b);
            }
            _ => escaped.push(b),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::escape;
    use crate::regex::Regex;

    #[test]
    fn specials_and_nul() {
        // Seven bytes in, ten bytes out; the NUL turns into `\0`.
        assert_eq!(escape(b"a.b*c\0d"), b"a\\.b\\*c\\0d");
    }

    #[test]
    fn non_special_bytes_pass_through() {
        assert_eq!(escape("aé9_".as_bytes()), "aé9_".as_bytes());
    }

    #[test]
    fn escaped_text_matches_itself_entirely() {
        for subject in [
            &b"a.b*c"[..],
            b"[hello]{world}",
            b"^start|end$",
            b"plain words",
            "caf\u{e9}+".as_bytes(),
        ] {
            let pattern =
                String::from_utf8(escape(subject)).unwrap();
            let re = Regex::new(&pattern).unwrap();
            let m = re.find(subject).unwrap();
            assert_eq!(
                m.group_span(0),
                Some((0, subject.len() as isize)),
                "pattern {pattern:?}"
            );
            // And the whole-subject match is the only one.
            let mut m = re.find(subject).unwrap();
            m.next().unwrap();
            assert!(!m.matched());
        }
    }

    #[test]
    fn double_escaping_escapes_the_backslashes() {
        let once = escape(b"a.b");
        assert_eq!(once, b"a\\.b");
        let twice = escape(&once);
        assert_eq!(twice, b"a\\\\\\.b");
    }
}
