use std::path::{Path, PathBuf};

use bon::bon;
use log::trace;

use crate::event::{Event, EventKind};

/// Minimum spacing between downstream `Changed` events, in milliseconds.
pub const DEFAULT_RATE_LIMIT_MS: u32 = 800;

/// Quiet period after which a `ChangesDoneHint` is synthesized.
const CHANGES_DONE_DELAY_MS: u64 = 2_000;

/// Rate-limits bursts of file-change events and synthesizes a terminal
/// [`EventKind::ChangesDoneHint`] once a burst goes quiet.
///
/// The coalescer owns no clock and no timers: the embedding loop stamps
/// every raw event with a monotonic millisecond time when it calls
/// [`Coalescer::feed`], fires due timers with [`Coalescer::advance`], and
/// learns when to wake up next from [`Coalescer::next_deadline`]. Events
/// leave through the sink callback, in causal order.
///
/// Within one rate-limit window at most one `Changed` is emitted; a
/// suppressed change is buffered and delivered when the window expires,
/// unless a different event arrives first, in which case the buffered
/// change is flushed ahead of it.
///
/// ```
/// use sift_monitor::{Coalescer, Event, EventKind};
/// use std::path::Path;
///
/// let mut coalescer = Coalescer::builder().build();
/// let mut out: Vec<Event> = Vec::new();
///
/// let f = Path::new("data.log");
/// coalescer.feed(f, None, EventKind::Changed, 0, &mut |e| out.push(e));
/// coalescer.feed(f, None, EventKind::Changed, 100, &mut |e| out.push(e));
/// assert_eq!(out.len(), 1); // the second change is buffered
///
/// coalescer.advance(800, &mut |e| out.push(e));
/// assert_eq!(out.len(), 2); // and delivered when the window expires
/// # assert_eq!(coalescer.next_deadline(), Some(2_100));
/// ```
pub struct Coalescer {
    cancelled: bool,
    rate_limit_ms: u32,
    /// When the last downstream `Changed` left, and for which file.
    last_sent_change_time: u64,
    last_sent_change_file: Option<PathBuf>,
    /// Deadline of the buffered suppressed change, at most one.
    delayed_change_due: Option<u64>,
    /// Deadline and file of the synthesized changes-done event.
    virtual_done: Option<(u64, PathBuf)>,
}

#[bon]
impl Coalescer {
    #[builder]
    pub fn new(
        /// Minimum spacing between downstream `Changed` events.
        #[builder(default = DEFAULT_RATE_LIMIT_MS)]
        rate_limit_ms: u32,
    ) -> Coalescer {
        Coalescer {
            cancelled: false,
            rate_limit_ms,
            last_sent_change_time: 0,
            last_sent_change_file: None,
            delayed_change_due: None,
            virtual_done: None,
        }
    }
}

impl Default for Coalescer {
    fn default() -> Coalescer {
        Coalescer::builder().build()
    }
}

impl Coalescer {
    /// Processes one raw event stamped with the current monotonic time.
    ///
    /// Anything due leaves through `sink` before this returns; nothing is
    /// emitted after [`Coalescer::cancel`].
    pub fn feed(
        &mut self,
        file: &Path,
        other_file: Option<&Path>,
        kind: EventKind,
        now_ms: u64,
        sink: &mut impl FnMut(Event),
    ) {
        if self.cancelled {
            return;
        }
        if !kind.is_change() {
            // Keep causality: a buffered change must precede this event.
            self.send_delayed_change_now(now_ms, sink);
            self.update_last_sent_change(None, 0);
            if kind == EventKind::ChangesDoneHint {
                // The real hint supersedes the synthesized one.
                self.cancel_virtual_changes_done();
            } else {
                self.send_virtual_changes_done_now(sink);
            }
            sink(Event {
                file: file.to_path_buf(),
                other_file: other_file.map(Path::to_path_buf),
                kind,
            });
        } else {
            let mut emit_now = true;
            if self.last_sent_change_file.is_some() {
                let since_last =
                    now_ms.saturating_sub(self.last_sent_change_time);
                let limit = u64::from(self.rate_limit_ms);
                if since_last < limit {
                    // Suppress this change but arm a timer so it still
                    // goes out if nothing else does first.
                    emit_now = false;
                    self.schedule_delayed_change(now_ms + (limit - since_last));
                }
            }
            if emit_now {
                sink(Event {
                    file: file.to_path_buf(),
                    other_file: other_file.map(Path::to_path_buf),
                    kind: EventKind::Changed,
                });
                self.cancel_delayed_change();
                self.update_last_sent_change(Some(file), now_ms);
            }
            // Re-arm the quiescence timer; a real hint cancels it, more
            // changes postpone it.
            self.cancel_virtual_changes_done();
            self.schedule_virtual_changes_done(file, now_ms);
        }
    }

    /// Fires every timer whose deadline has passed, in deadline order.
    pub fn advance(&mut self, now_ms: u64, sink: &mut impl FnMut(Event)) {
        if self.cancelled {
            return;
        }
        loop {
            let delayed = self.delayed_change_due.filter(|&due| due <= now_ms);
            let done = self
                .virtual_done
                .as_ref()
                .map(|&(due, _)| due)
                .filter(|&due| due <= now_ms);
            match (delayed, done) {
                (Some(a), Some(b)) if b < a => {
                    self.send_virtual_changes_done_now(sink)
                }
                (Some(_), _) => self.send_delayed_change_now(now_ms, sink),
                (None, Some(_)) => self.send_virtual_changes_done_now(sink),
                (None, None) => break,
            }
        }
    }

    /// The earliest pending deadline, if any timer is armed. The embedding
    /// loop should call [`Coalescer::advance`] no later than this.
    pub fn next_deadline(&self) -> Option<u64> {
        let done = self.virtual_done.as_ref().map(|&(due, _)| due);
        match (self.delayed_change_due, done) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Stops the coalescer. Idempotent; returns whether this call did the
    /// cancelling, so the embedding host knows to notify its backend.
    /// Pending timers are released and nothing is emitted afterwards.
    pub fn cancel(&mut self) -> bool {
        if self.cancelled {
            return false;
        }
        self.cancelled = true;
        self.cancel_delayed_change();
        self.cancel_virtual_changes_done();
        self.last_sent_change_file = None;
        trace!("change coalescer cancelled");
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn rate_limit_ms(&self) -> u32 {
        self.rate_limit_ms
    }

    /// Changes the spacing enforced between downstream `Changed` events.
    pub fn set_rate_limit_ms(&mut self, limit_ms: u32) {
        self.rate_limit_ms = limit_ms;
    }

    fn update_last_sent_change(&mut self, file: Option<&Path>, time_ms: u64) {
        self.last_sent_change_file = file.map(Path::to_path_buf);
        self.last_sent_change_time = time_ms;
    }

    fn send_delayed_change_now(
        &mut self,
        now_ms: u64,
        sink: &mut impl FnMut(Event),
    ) {
        if self.delayed_change_due.take().is_some() {
            // A delayed change only exists while a last-sent file is set.
            if let Some(file) = self.last_sent_change_file.clone() {
                sink(Event::new(file, EventKind::Changed));
                self.last_sent_change_time = now_ms;
            }
        }
    }

    fn schedule_delayed_change(&mut self, due_ms: u64) {
        // Only the first suppressed change arms the timer; later ones in
        // the same window ride along.
        if self.delayed_change_due.is_none() {
            self.delayed_change_due = Some(due_ms);
        }
    }

    fn cancel_delayed_change(&mut self) {
        self.delayed_change_due = None;
    }

    fn send_virtual_changes_done_now(&mut self, sink: &mut impl FnMut(Event)) {
        if let Some((_, file)) = self.virtual_done.take() {
            sink(Event::new(file, EventKind::ChangesDoneHint));
        }
    }

    fn schedule_virtual_changes_done(&mut self, file: &Path, now_ms: u64) {
        self.virtual_done =
            Some((now_ms + CHANGES_DONE_DELAY_MS, file.to_path_buf()));
    }

    fn cancel_virtual_changes_done(&mut self) {
        self.virtual_done = None;
    }
}
