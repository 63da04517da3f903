/*!
File-change event coalescing, plus the small I/O vocabulary its embedding
hosts share.

Raw file monitors (inotify, kqueue, `ReadDirectoryChangesW`) tend to
report a storm of `Changed` events while a file is being written. The
[`Coalescer`] sits between such a backend and the application: it lets one
`Changed` through per rate-limit window (800 ms by default), buffers the
rest, flushes the buffer ahead of any other event so downstream order
stays causal, and synthesizes a [`EventKind::ChangesDoneHint`] once a
burst has been quiet for two seconds.

The coalescer is deliberately free of I/O: the embedding loop owns the
clock, stamps each raw event with a monotonic millisecond time, and fires
due timers via [`Coalescer::advance`] guided by
[`Coalescer::next_deadline`]. That keeps the state machine deterministic
and independent of any particular main loop.

```
use sift_monitor::{Coalescer, Event, EventKind};
use std::path::Path;

let mut coalescer = Coalescer::builder().build();
let mut out: Vec<Event> = Vec::new();
let file = Path::new("build.log");

// A write burst: five raw change events 100 ms apart.
for now in [0, 100, 200, 300, 400] {
    coalescer.feed(file, None, EventKind::Changed, now, &mut |e| out.push(e));
}
assert_eq!(out.len(), 1); // rate limited

// The host loop wakes at the deadlines the coalescer publishes.
coalescer.advance(800, &mut |e| out.push(e));   // buffered change
coalescer.advance(2_400, &mut |e| out.push(e)); // quiescence hint
assert_eq!(out.last().unwrap().kind, EventKind::ChangesDoneHint);
```
*/

mod coalesce;
mod error;
mod event;
mod seekable;

pub use crate::coalesce::{Coalescer, DEFAULT_RATE_LIMIT_MS};
pub use crate::error::IoErrorKind;
pub use crate::event::{Event, EventKind};
pub use crate::seekable::{Cancellable, SeekOrigin, Seekable};
