use std::{
  ptr::{self, NonNull},
  sync::atomic::{AtomicBool, Ordering},
};

use log::{debug, trace, warn};
use spin::Mutex;

use crate::{
  align,
  align::checked_align,
  block::{Block, HEADER_SIZE},
  extender::HeapExtender,
  report::{BlockInfo, HeapReport},
};

/// First-fit allocator over a list of blocks carved out of a break-pointer heap.
///
/// The block list, the extender and therefore the break are kept behind a
/// single lock: deciding whether the tail sits at the break and moving the
/// break happen in one critical section.
pub struct Allocator<E: HeapExtender> {
  heap: Mutex<Heap<E>>,
  initialized: AtomicBool,
}

struct Heap<E> {
  extender: E,
  head: Option<NonNull<Block>>,
  tail: Option<NonNull<Block>>,
}

// Headers are only reached through the lock.
unsafe impl<E: Send> Send for Heap<E> {}

impl<E: HeapExtender> Allocator<E> {
  pub const fn new(extender: E) -> Self {
    Self {
      heap: Mutex::new(Heap {
        extender,
        head: None,
        tail: None,
      }),
      initialized: AtomicBool::new(false),
    }
  }

  /// Marks the allocator ready. Calling it again does nothing.
  pub fn init(&self) {
    if !self.initialized.swap(true, Ordering::AcqRel) {
      debug!("allocator initialized");
    }
  }

  pub fn is_initialized(&self) -> bool {
    self.initialized.load(Ordering::Acquire)
  }

  /// Counterpart of [`Allocator::init`]. Blocks still in the list stay where
  /// they are; the heap is not compacted.
  pub fn shutdown(&self) {
    let blocks = self.heap.lock().block_count();
    debug!("allocator shut down with {} blocks in place", blocks);
  }

  /// Returns at least `size` usable bytes aligned to 16, or `None` for a zero
  /// size or when the heap cannot grow. The contents are unspecified.
  pub fn allocate(
    &self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    if size == 0 {
      return None;
    }

    let mut heap = self.heap.lock();
    unsafe { heap.allocate(size) }
  }

  /// Allocates room for `count` elements of `element_size` bytes and zeroes it.
  pub fn zero_allocate(
    &self,
    count: usize,
    element_size: usize,
  ) -> Option<NonNull<u8>> {
    if count == 0 || element_size == 0 {
      return None;
    }

    let Some(size) = count.checked_mul(element_size) else {
      warn!("zero_allocate: {} * {} overflows", count, element_size);
      return None;
    };

    let mut heap = self.heap.lock();

    unsafe {
      let payload = heap.allocate(size)?;
      let capacity = Block::from_payload(payload).as_ref().size;
      ptr::write_bytes(payload.as_ptr(), 0, capacity);
      Some(payload)
    }
  }

  /// Grows a block to `new_size` bytes.
  ///
  /// `None` behaves like [`Allocator::allocate`]. A zero `new_size` releases
  /// the block and returns `None`. A block that is already large enough is
  /// returned unchanged. Otherwise the contents move to a new block and the
  /// old one is released; if no new block can be obtained the old one is left
  /// untouched and `None` is returned.
  ///
  /// # Safety
  ///
  /// `payload` must be `None` or a live pointer returned by this allocator.
  pub unsafe fn resize(
    &self,
    payload: Option<NonNull<u8>>,
    new_size: usize,
  ) -> Option<NonNull<u8>> {
    let Some(payload) = payload else {
      return self.allocate(new_size);
    };

    if new_size == 0 {
      unsafe { self.release(Some(payload)) };
      return None;
    }

    let mut heap = self.heap.lock();

    unsafe {
      let block = Block::from_payload(payload);
      let capacity = block.as_ref().size;

      if capacity >= new_size {
        trace!("resize: {:?} already holds {} bytes", payload, capacity);
        return Some(payload);
      }

      let moved = heap.allocate(new_size)?;
      ptr::copy_nonoverlapping(payload.as_ptr(), moved.as_ptr(), capacity);
      heap.release(block);

      trace!("resize: moved {:?} to {:?}", payload, moved);
      Some(moved)
    }
  }

  /// Gives a block back. `None` is ignored.
  ///
  /// # Safety
  ///
  /// `payload` must be `None` or a live pointer returned by this allocator;
  /// releasing the same pointer twice is undefined behavior.
  pub unsafe fn release(
    &self,
    payload: Option<NonNull<u8>>,
  ) {
    let Some(payload) = payload else {
      return;
    };

    let mut heap = self.heap.lock();
    unsafe { heap.release(Block::from_payload(payload)) };
  }

  /// Lists every block in list order. Nothing is modified.
  pub fn inspect(&self) -> HeapReport {
    let mut heap = self.heap.lock();
    heap.report()
  }
}

impl<E: HeapExtender> Heap<E> {
  unsafe fn find_free_block(
    &self,
    size: usize,
  ) -> Option<NonNull<Block>> {
    let mut current = self.head;

    while let Some(block) = current {
      let header = unsafe { block.as_ref() };
      if header.is_free && header.size >= size {
        return Some(block);
      }
      current = header.next;
    }

    None
  }

  unsafe fn allocate(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    unsafe {
      if let Some(mut free_block) = self.find_free_block(size) {
        free_block.as_mut().is_free = false;
        trace!("allocate({}): reusing block of {} bytes at {:?}", size, free_block.as_ref().size, free_block);
        return Some(Block::payload(free_block));
      }

      let block = self.grow(size)?;
      trace!("allocate({}): new block at {:?}", size, block);
      Some(Block::payload(block))
    }
  }

  /// Extends the heap by one block and appends it to the list.
  unsafe fn grow(
    &mut self,
    size: usize,
  ) -> Option<NonNull<Block>> {
    let extent = checked_align(size)?.checked_add(HEADER_SIZE)?;

    let program_break = self.extender.query_break();
    let padding = align!(program_break) - program_break;
    let delta = isize::try_from(padding.checked_add(extent)?).ok()?;

    let previous = match unsafe { self.extender.extend(delta) } {
      Ok(previous) => previous,
      Err(err) => {
        warn!("allocate({}): {}", size, err);
        return None;
      }
    };

    let start = previous.as_ptr() as usize;
    let offset = align!(start) - start;

    // Someone else moved the break between the query and the extension.
    if offset + extent > delta as usize {
      warn!("allocate({}): program break moved concurrently, giving the extension back", size);
      if let Err(err) = unsafe { self.extender.extend(-delta) } {
        warn!("allocate({}): {}", size, err);
      }
      return None;
    }

    unsafe {
      let block = previous.add(offset).cast::<Block>();
      block.write(Block::new(size, false, None));

      match self.tail {
        Some(mut tail) => tail.as_mut().next = Some(block),
        None => self.head = Some(block),
      }
      self.tail = Some(block);

      Some(block)
    }
  }

  unsafe fn release(
    &mut self,
    mut block: NonNull<Block>,
  ) {
    unsafe {
      let at_break = self.tail == Some(block) && Block::end(block) == self.extender.query_break();

      if !at_break {
        block.as_mut().is_free = true;
        trace!("release: marked {:?} free", block);
        return;
      }

      let extent = block.as_ref().extent();
      self.unlink_tail();

      match self.extender.extend(-(extent as isize)) {
        Ok(_) => trace!("release: trimmed {} bytes at {:?}", extent, block),
        Err(err) => warn!("release: {}", err),
      }
    }
  }

  unsafe fn unlink_tail(&mut self) {
    if self.head == self.tail {
      self.head = None;
      self.tail = None;
      return;
    }

    let mut current = self.head;

    while let Some(mut block) = current {
      let header = unsafe { block.as_mut() };
      if header.next == self.tail {
        header.next = None;
        self.tail = Some(block);
        return;
      }
      current = header.next;
    }
  }

  fn block_count(&self) -> usize {
    let mut count = 0;
    let mut current = self.head;

    while let Some(block) = current {
      count += 1;
      current = unsafe { block.as_ref() }.next;
    }

    count
  }

  fn report(&mut self) -> HeapReport {
    let mut blocks = Vec::new();
    let mut current = self.head;

    while let Some(block) = current {
      let header = unsafe { block.as_ref() };
      blocks.push(BlockInfo {
        header: block.as_ptr() as usize,
        payload: block.as_ptr() as usize + HEADER_SIZE,
        size: header.size,
        is_free: header.is_free,
        next: header.next.map(|next| next.as_ptr() as usize),
      });
      current = header.next;
    }

    HeapReport {
      head: self.head.map(|head| head.as_ptr() as usize),
      tail: self.tail.map(|tail| tail.as_ptr() as usize),
      program_break: self.extender.query_break(),
      blocks,
    }
  }
}
