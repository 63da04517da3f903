use std::path::PathBuf;

/// The kinds of change a file monitor backend can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The file's contents changed.
    Changed,
    /// A burst of changes is believed to be over. Backends that cannot
    /// tell emit nothing; the [`Coalescer`](crate::Coalescer) synthesizes
    /// this after a quiet period.
    ChangesDoneHint,
    /// The file was deleted.
    Deleted,
    /// The file was created.
    Created,
    /// Metadata such as permissions or timestamps changed.
    AttributeChanged,
    /// The volume holding the file is about to be unmounted.
    PreUnmount,
    /// The volume holding the file was unmounted.
    Unmounted,
    /// The file was renamed; the other file of the event is the new name.
    Moved,
}

impl EventKind {
    /// Whether this event participates in change-rate limiting.
    pub fn is_change(self) -> bool {
        self == EventKind::Changed
    }
}

/// One event as delivered downstream of the coalescer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub file: PathBuf,
    /// A second file taking part in the event, e.g. the rename target of
    /// [`EventKind::Moved`].
    pub other_file: Option<PathBuf>,
    pub kind: EventKind,
}

impl Event {
    pub fn new(file: impl Into<PathBuf>, kind: EventKind) -> Event {
        Event {
            file: file.into(),
            other_file: None,
            kind,
        }
    }
}
