#![cfg(feature = "sbrk")]

use brkalloc::global;
use test_env_log::test;

#[test]
fn process_heap_round_trip() {
  global::init();
  global::init();

  assert!(global::allocate(0).is_none());
  assert!(global::zero_allocate(usize::MAX, 2).is_none());

  unsafe {
    let first = global::allocate(32).unwrap();
    let zeroed = global::zero_allocate(15, 1).unwrap();

    assert_eq!(first.as_ptr() as usize % 16, 0);
    assert!(std::slice::from_raw_parts(zeroed.as_ptr(), 15).iter().all(|&byte| byte == 0));

    first.as_ptr().write_bytes(0x5A, 32);
    let grown = global::resize(Some(first), 100).unwrap();
    assert!(std::slice::from_raw_parts(grown.as_ptr(), 32).iter().all(|&byte| byte == 0x5A));

    let report = global::inspect();
    assert!(report.overlapping().is_none());
    assert!(report.find(grown).is_some_and(|block| !block.is_free));

    global::release(Some(zeroed));
    global::release(Some(grown));
    global::release(None);

    // Blocks either went back to the system or stayed behind as free.
    assert_eq!(global::inspect().live().count(), 0);
  }

  global::shutdown();
}
