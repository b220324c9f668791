use std::{mem, ptr::NonNull};

use crate::align::HEAP_ALIGN;

/// Header sitting right in front of every payload.
///
/// `repr(align(16))` pads the header to a multiple of 16 bytes, so a payload
/// that follows an aligned header is itself 16-byte aligned.
#[repr(C, align(16))]
pub struct Block {
  /// Bytes the caller asked for when the block was created.
  pub size: usize,
  pub is_free: bool,
  /// Next header in growth order.
  pub next: Option<NonNull<Block>>,
}

pub const HEADER_SIZE: usize = mem::size_of::<Block>();

const _: () = assert!(HEADER_SIZE % HEAP_ALIGN == 0);
const _: () = assert!(mem::align_of::<Block>() == HEAP_ALIGN);

impl Block {
  pub fn new(
    size: usize,
    is_free: bool,
    next: Option<NonNull<Block>>,
  ) -> Self {
    Self { size, is_free, next }
  }

  /// Address space taken by the block, header included. Payloads are padded
  /// to the heap alignment so the next header lands on an aligned address.
  pub fn extent(&self) -> usize {
    HEADER_SIZE + crate::align!(self.size)
  }

  pub unsafe fn payload(block: NonNull<Block>) -> NonNull<u8> {
    unsafe { block.cast::<u8>().add(HEADER_SIZE) }
  }

  pub unsafe fn from_payload(payload: NonNull<u8>) -> NonNull<Block> {
    unsafe { payload.sub(HEADER_SIZE).cast::<Block>() }
  }

  /// First address past the block's extent.
  pub unsafe fn end(block: NonNull<Block>) -> usize {
    block.as_ptr() as usize + unsafe { block.as_ref() }.extent()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_header_layout() {
    assert_eq!(HEADER_SIZE % 16, 0);
    assert!(HEADER_SIZE >= mem::size_of::<usize>() * 2 + 1);
  }

  #[test]
  fn test_extent_rounds_payload() {
    assert_eq!(Block::new(15, false, None).extent(), HEADER_SIZE + 16);
    assert_eq!(Block::new(32, false, None).extent(), HEADER_SIZE + 32);
    assert_eq!(Block::new(100, true, None).extent(), HEADER_SIZE + 112);
  }

  #[test]
  fn test_payload_round_trip() {
    let mut header = Block::new(8, false, None);
    let block = NonNull::from(&mut header);

    unsafe {
      let payload = Block::payload(block);
      assert_eq!(payload.as_ptr() as usize - block.as_ptr() as usize, HEADER_SIZE);
      assert_eq!(Block::from_payload(payload), block);
      assert_eq!(Block::end(block), block.as_ptr() as usize + HEADER_SIZE + 16);
    }
  }
}
