/// A portable classification of I/O failures, for hosts that need to act
/// on the kind of failure rather than its platform-specific code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IoErrorKind {
    Exists,
    IsDirectory,
    PermissionDenied,
    FilenameTooLong,
    NotFound,
    NotDirectory,
    ReadOnly,
    TooManyLinks,
    NoSpace,
    InvalidArgument,
    Cancelled,
    NotEmpty,
    NotSupported,
    TimedOut,
    Busy,
    WouldBlock,
    /// Anything that does not fit a more specific kind.
    Failed,
}

impl IoErrorKind {
    /// Classifies a raw OS error number.
    pub fn from_errno(errno: i32) -> IoErrorKind {
        // Guards rather than patterns: some of these share a value on
        // some platforms (EAGAIN and EWOULDBLOCK, for one).
        match errno {
            e if e == libc::EEXIST => IoErrorKind::Exists,
            e if e == libc::EISDIR => IoErrorKind::IsDirectory,
            e if e == libc::EACCES || e == libc::EPERM => {
                IoErrorKind::PermissionDenied
            }
            e if e == libc::ENAMETOOLONG => IoErrorKind::FilenameTooLong,
            e if e == libc::ENOENT => IoErrorKind::NotFound,
            e if e == libc::ENOTDIR => IoErrorKind::NotDirectory,
            e if e == libc::EROFS => IoErrorKind::ReadOnly,
            e if e == libc::ELOOP => IoErrorKind::TooManyLinks,
            e if e == libc::ENOSPC || e == libc::ENOMEM => IoErrorKind::NoSpace,
            e if e == libc::EINVAL => IoErrorKind::InvalidArgument,
            e if e == libc::ECANCELED => IoErrorKind::Cancelled,
            e if e == libc::ENOTEMPTY => IoErrorKind::NotEmpty,
            e if e == libc::ENOTSUP => IoErrorKind::NotSupported,
            e if e == libc::ETIMEDOUT => IoErrorKind::TimedOut,
            e if e == libc::EBUSY => IoErrorKind::Busy,
            e if e == libc::EAGAIN || e == libc::EWOULDBLOCK => {
                IoErrorKind::WouldBlock
            }
            _ => IoErrorKind::Failed,
        }
    }

    /// Classifies a std I/O error through its raw OS error number.
    /// Synthetic errors without one are [`IoErrorKind::Failed`].
    pub fn from_io_error(err: &std::io::Error) -> IoErrorKind {
        err.raw_os_error().map_or(IoErrorKind::Failed, IoErrorKind::from_errno)
    }
}
