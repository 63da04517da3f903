/*!
Thin safe layer over the raw PCRE2 8-bit API: a compiled [`Code`] and the
[`MatchData`] block that receives match offsets. Everything above this
module works with byte offsets and never touches a raw pointer.
*/

use std::os::raw::{c_int, c_void};
use std::ptr;
use std::slice;

use pcre2_sys::{
    pcre2_code_8, pcre2_code_free_8, pcre2_compile_8,
    pcre2_compile_context_create_8, pcre2_compile_context_free_8,
    pcre2_config_8, pcre2_dfa_match_8, pcre2_get_error_message_8,
    pcre2_get_ovector_count_8, pcre2_get_ovector_pointer_8,
    pcre2_jit_compile_8, pcre2_match_8, pcre2_match_data_8,
    pcre2_match_data_create_8, pcre2_match_data_create_from_pattern_8,
    pcre2_match_data_free_8, pcre2_pattern_info_8, pcre2_set_newline_8,
    PCRE2_CONFIG_UNICODE, PCRE2_ERROR_NOMATCH, PCRE2_ERROR_PARTIAL,
    PCRE2_INFO_BACKREFMAX, PCRE2_INFO_CAPTURECOUNT, PCRE2_INFO_NAMECOUNT,
    PCRE2_INFO_NAMEENTRYSIZE, PCRE2_INFO_NAMETABLE, PCRE2_JIT_COMPLETE,
};

/// A failed compilation, before the pattern text is attached to it.
#[derive(Debug)]
pub(crate) struct CompileError {
    pub offset: usize,
    pub message: String,
}

/// True if `rc` is a hard matcher error. "No match" and "partial match"
/// are reported through the cursor state instead.
pub(crate) fn is_match_error(rc: c_int) -> bool {
    rc < PCRE2_ERROR_NOMATCH && rc != PCRE2_ERROR_PARTIAL
}

/// Render a matcher error code as text.
pub(crate) fn error_message(rc: c_int) -> String {
    let mut buf = [0u8; 256];
    let len = unsafe { pcre2_get_error_message_8(rc, buf.as_mut_ptr(), buf.len()) };
    if len < 0 {
        format!("unknown error ({rc})")
    } else {
        String::from_utf8_lossy(&buf[..len as usize]).into_owned()
    }
}

/// Whether the matcher was built with Unicode support (UTF decoding and
/// Unicode property tables). Probed once per process before first use.
pub(crate) fn unicode_supported() -> bool {
    let mut out: u32 = 0;
    let rc = unsafe {
        pcre2_config_8(PCRE2_CONFIG_UNICODE, &mut out as *mut u32 as *mut c_void)
    };
    rc >= 0 && out == 1
}

/// A compiled pattern. Immutable once built (the optional JIT study runs
/// before the code is shared), so it can be used from any thread.
#[derive(Debug)]
pub(crate) struct Code {
    ptr: *mut pcre2_code_8,
}

// SAFETY: the compiled code is never mutated after construction; PCRE2
// explicitly allows concurrent matching on one compiled pattern.
unsafe impl Send for Code {}
unsafe impl Sync for Code {}

impl Drop for Code {
    fn drop(&mut self) {
        unsafe { pcre2_code_free_8(self.ptr) }
    }
}

impl Code {
    /// Compile `pattern` with the given option bits and newline convention.
    pub(crate) fn new(
        pattern: &str,
        options: u32,
        newline: u32,
    ) -> Result<Code, CompileError> {
        let mut error_code: c_int = 0;
        let mut error_offset: usize = 0;
        unsafe {
            let ctx = pcre2_compile_context_create_8(ptr::null_mut());
            if ctx.is_null() {
                return Err(CompileError {
                    offset: 0,
                    message: "failed to allocate a compile context".to_string(),
                });
            }
            // `newline` is always one of the matcher's own constants.
            let rc = pcre2_set_newline_8(ctx, newline);
            debug_assert_eq!(rc, 0);
            let code = pcre2_compile_8(
                pattern.as_ptr(),
                pattern.len(),
                options,
                &mut error_code,
                &mut error_offset,
                ctx,
            );
            pcre2_compile_context_free_8(ctx);
            if code.is_null() {
                Err(CompileError {
                    offset: error_offset,
                    message: error_message(error_code),
                })
            } else {
                Ok(Code { ptr: code })
            }
        }
    }

    /// Study the compiled pattern with the JIT.
    pub(crate) fn jit_compile(&mut self) -> Result<(), String> {
        let rc = unsafe { pcre2_jit_compile_8(self.ptr, PCRE2_JIT_COMPLETE) };
        if rc == 0 {
            Ok(())
        } else {
            Err(error_message(rc))
        }
    }

    pub(crate) fn as_ptr(&self) -> *const pcre2_code_8 {
        self.ptr as *const pcre2_code_8
    }

    fn info_u32(&self, what: u32) -> u32 {
        let mut out: u32 = 0;
        let rc = unsafe {
            pcre2_pattern_info_8(
                self.as_ptr(),
                what,
                &mut out as *mut u32 as *mut c_void,
            )
        };
        debug_assert_eq!(rc, 0);
        out
    }

    /// Number of capturing groups, not counting group 0.
    pub(crate) fn capture_count(&self) -> usize {
        self.info_u32(PCRE2_INFO_CAPTURECOUNT) as usize
    }

    /// Highest backreference number used in the pattern, 0 if none.
    pub(crate) fn max_backref(&self) -> usize {
        self.info_u32(PCRE2_INFO_BACKREFMAX) as usize
    }

    /// All named groups as `(name, group number)` pairs, in table order.
    ///
    /// Each table entry is the group number as a big-endian u16 followed by
    /// the NUL-terminated name.
    pub(crate) fn name_table(&self) -> Vec<(String, usize)> {
        let count = self.info_u32(PCRE2_INFO_NAMECOUNT) as usize;
        if count == 0 {
            return Vec::new();
        }
        let entry_size = self.info_u32(PCRE2_INFO_NAMEENTRYSIZE) as usize;
        let mut table: *const u8 = ptr::null();
        let rc = unsafe {
            pcre2_pattern_info_8(
                self.as_ptr(),
                PCRE2_INFO_NAMETABLE,
                &mut table as *mut *const u8 as *mut c_void,
            )
        };
        debug_assert_eq!(rc, 0);
        let raw = unsafe { slice::from_raw_parts(table, count * entry_size) };
        let mut names = Vec::with_capacity(count);
        for entry in raw.chunks_exact(entry_size) {
            let number = u16::from_be_bytes([entry[0], entry[1]]) as usize;
            let name = &entry[2..];
            let len = name.iter().position(|&b| b == 0).unwrap_or(name.len());
            names.push((
                String::from_utf8_lossy(&name[..len]).into_owned(),
                number,
            ));
        }
        names
    }
}

/// Mutable scratch block that receives the offset vector of a match.
#[derive(Debug)]
pub(crate) struct MatchData {
    ptr: *mut pcre2_match_data_8,
    pairs: usize,
}

impl Drop for MatchData {
    fn drop(&mut self) {
        unsafe { pcre2_match_data_free_8(self.ptr) }
    }
}

impl MatchData {
    /// Match data sized from the pattern, one pair per group plus the
    /// whole-match pair.
    pub(crate) fn from_pattern(code: &Code) -> MatchData {
        let ptr = unsafe {
            pcre2_match_data_create_from_pattern_8(code.as_ptr(), ptr::null_mut())
        };
        assert!(!ptr.is_null(), "failed to allocate match data");
        let pairs = unsafe { pcre2_get_ovector_count_8(ptr) } as usize;
        MatchData { ptr, pairs }
    }

    /// Match data with an explicit number of offset pairs, for the
    /// all-matches mode where pairs hold matches rather than groups.
    pub(crate) fn with_pairs(pairs: usize) -> MatchData {
        let ptr = unsafe { pcre2_match_data_create_8(pairs as u32, ptr::null_mut()) };
        assert!(!ptr.is_null(), "failed to allocate match data");
        MatchData { ptr, pairs }
    }

    pub(crate) fn pairs(&self) -> usize {
        self.pairs
    }

    /// The raw offset vector, `[start0, end0, start1, end1, ...]`.
    pub(crate) fn ovector(&self) -> &[usize] {
        unsafe {
            slice::from_raw_parts(
                pcre2_get_ovector_pointer_8(self.ptr),
                self.pairs * 2,
            )
        }
    }

    /// One standard match attempt.
    pub(crate) fn find(
        &mut self,
        code: &Code,
        subject: &[u8],
        start: usize,
        options: u32,
    ) -> c_int {
        // SAFETY: `options` may carry the skip-UTF-recheck bit; match
        // states validate the subject once at creation, so skipping the
        // per-attempt recheck cannot feed the matcher invalid UTF-8.
        unsafe {
            pcre2_match_8(
                code.as_ptr(),
                subject.as_ptr(),
                subject.len(),
                start,
                options,
                self.ptr,
                ptr::null_mut(),
            )
        }
    }

    /// One all-matches attempt, reporting every match at the leftmost
    /// matching position, longest first.
    pub(crate) fn find_all(
        &mut self,
        code: &Code,
        subject: &[u8],
        start: usize,
        options: u32,
        workspace: &mut [c_int],
    ) -> c_int {
        // SAFETY: as for `find`.
        unsafe {
            pcre2_dfa_match_8(
                code.as_ptr(),
                subject.as_ptr(),
                subject.len(),
                start,
                options,
                self.ptr,
                ptr::null_mut(),
                workspace.as_mut_ptr(),
                workspace.len(),
            )
        }
    }
}
