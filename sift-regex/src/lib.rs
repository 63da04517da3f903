/*!
A Perl-compatible regular expression library.

A pattern is compiled once into a [`Regex`] and then used any number of
times to search, split or replace text. Searching goes through a stateful
cursor, [`Matches`], that walks the non-overlapping matches of a subject
and exposes capture groups by number and by name. Replacement templates
([`Replacement`]) support `\1`/`\g<name>` backreferences and case-changing
escapes, and are parsed independently of any subject.

Subjects are byte slices. By default both the pattern and the subjects are
treated as UTF-8 with Unicode-aware character classes; compile with
[`CompileOptions::RAW`] to match over opaque bytes instead.

# Examples

Iterate over matches:

```
use sift_regex::Regex;

let re = Regex::new(r"[0-9]{4}-[0-9]{2}-[0-9]{2}")?;
let hay = b"due 2024-03-14, slips to 2024-09-06";
let mut dates = Vec::new();
let mut m = re.find(hay)?;
while m.matched() {
    dates.push(m.group(0).unwrap());
    m.next()?;
}
assert_eq!(dates, vec![&b"2024-03-14"[..], b"2024-09-06"]);
# Ok::<(), sift_regex::Error>(())
```

Replace with backreferences:

```
use sift_regex::Regex;

let re = Regex::new(r"(\w+) (\w+)")?;
assert_eq!(re.replace(b"hello world", r"\2 \1")?, b"world hello");
# Ok::<(), sift_regex::Error>(())
```

Split on a pattern:

```
use sift_regex::Regex;

let re = Regex::new(r",\s*")?;
assert_eq!(re.split(b"a, b,c")?, vec![&b"a"[..], b"b", b"c"]);
# Ok::<(), sift_regex::Error>(())
```
*/

mod error;
mod escape;
mod ffi;
mod matches;
mod options;
mod regex;
mod replace;
mod split;

pub use crate::error::{Error, Result};
pub use crate::escape::escape;
pub use crate::matches::Matches;
pub use crate::options::{CompileOptions, MatchOptions};
pub use crate::regex::Regex;
pub use crate::replace::Replacement;
