use std::io::{self, Cursor};
use std::sync::atomic::{AtomicBool, Ordering};

/// Where a seek offset is measured from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekOrigin {
    /// Relative to the current position.
    Current,
    /// Relative to the start of the stream.
    Set,
    /// Relative to the end of the stream.
    End,
}

/// A cancellation flag that long-running operations poll.
///
/// Shared between the thread driving an operation and the thread that
/// wants to abort it; cancelling is a one-way, idempotent transition.
#[derive(Debug, Default)]
pub struct Cancellable {
    cancelled: AtomicBool,
}

impl Cancellable {
    pub fn new() -> Cancellable {
        Cancellable::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns an error if the operation was cancelled, for use at the
    /// top of cancellable operations.
    pub fn check(&self) -> io::Result<()> {
        if self.is_cancelled() {
            Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "operation was cancelled",
            ))
        } else {
            Ok(())
        }
    }
}

/// Random access within a stream of bytes.
///
/// Streams that cannot seek or truncate report so through `can_seek` /
/// `can_truncate`; calling the operation anyway is an error, not a panic.
pub trait Seekable {
    /// The current position in the stream.
    fn tell(&self) -> u64;

    fn can_seek(&self) -> bool;

    /// Moves the position to `offset` relative to `origin`.
    fn seek(
        &mut self,
        offset: i64,
        origin: SeekOrigin,
        cancellable: Option<&Cancellable>,
    ) -> io::Result<()>;

    fn can_truncate(&self) -> bool;

    /// Cuts the stream off at `offset` bytes.
    fn truncate(
        &mut self,
        offset: u64,
        cancellable: Option<&Cancellable>,
    ) -> io::Result<()>;
}

impl Seekable for Cursor<Vec<u8>> {
    fn tell(&self) -> u64 {
        self.position()
    }

    fn can_seek(&self) -> bool {
        true
    }

    fn seek(
        &mut self,
        offset: i64,
        origin: SeekOrigin,
        cancellable: Option<&Cancellable>,
    ) -> io::Result<()> {
        if let Some(c) = cancellable {
            c.check()?;
        }
        let base = match origin {
            SeekOrigin::Set => 0,
            SeekOrigin::Current => self.position() as i64,
            SeekOrigin::End => self.get_ref().len() as i64,
        };
        let target = base
            .checked_add(offset)
            .filter(|&t| t >= 0)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "seek before the start of the stream",
                )
            })?;
        self.set_position(target as u64);
        Ok(())
    }

    fn can_truncate(&self) -> bool {
        true
    }

    fn truncate(
        &mut self,
        offset: u64,
        cancellable: Option<&Cancellable>,
    ) -> io::Result<()> {
        if let Some(c) = cancellable {
            c.check()?;
        }
        self.get_mut().truncate(offset as usize);
        Ok(())
    }
}
