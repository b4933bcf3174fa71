//! Branch prediction hints for the input hot path.

#[inline(always)]
#[cold]
fn cold_path() {}

/// Hints that `b` is expected to be false.
#[inline(always)]
pub fn unlikely(b: bool) -> bool {
    if b {
        cold_path()
    }
    b
}

/// Hints that `b` is expected to be true.
#[inline(always)]
pub fn likely(b: bool) -> bool {
    if !b {
        cold_path()
    }
    b
}
