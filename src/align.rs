/// Alignment, in bytes, of every block header and every payload handed out.
pub const HEAP_ALIGN: usize = 16;

/// Rounds the given value up to the heap alignment (16 bytes).
///
/// The value must be small enough that the rounding cannot overflow; use
/// [`checked_align`] for sizes coming from callers.
///
/// # Examples
///
/// ```rust
/// use brkalloc::align;
///
/// assert_eq!(align!(13), 16);
/// assert_eq!(align!(32), 32);
/// assert_eq!(align!(33), 48);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::align::HEAP_ALIGN - 1) & !($crate::align::HEAP_ALIGN - 1)
  };
}

/// Same as [`align!`], but returns `None` instead of wrapping around.
pub const fn checked_align(value: usize) -> Option<usize> {
  match value.checked_add(HEAP_ALIGN - 1) {
    Some(bumped) => Some(bumped & !(HEAP_ALIGN - 1)),
    None => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_align() {
    let mut alignments = Vec::new();

    for i in 0..10 {
      let sizes = (HEAP_ALIGN * i + 1)..=(HEAP_ALIGN * (i + 1));

      let expected_alignment = HEAP_ALIGN * (i + 1);

      alignments.push((sizes, expected_alignment));
    }

    for (sizes, expected) in alignments {
      for size in sizes {
        assert_eq!(expected, align!(size));
        assert_eq!(Some(expected), checked_align(size));
      }
    }
  }

  #[test]
  fn test_checked_align_overflow() {
    assert_eq!(checked_align(0), Some(0));
    assert_eq!(checked_align(usize::MAX), None);
    assert_eq!(checked_align(usize::MAX - HEAP_ALIGN + 2), None);
  }
}
