use std::{fmt, ops::Range, ptr::NonNull};

/// One header as seen by [`crate::Allocator::inspect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
  pub header: usize,
  pub payload: usize,
  pub size: usize,
  pub is_free: bool,
  pub next: Option<usize>,
}

impl BlockInfo {
  /// Bytes recorded for the block, starting at its payload.
  pub fn payload_range(&self) -> Range<usize> {
    self.payload..self.payload + self.size
  }
}

/// Snapshot of the block list, in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapReport {
  pub head: Option<usize>,
  pub tail: Option<usize>,
  pub program_break: usize,
  pub blocks: Vec<BlockInfo>,
}

impl HeapReport {
  pub fn len(&self) -> usize {
    self.blocks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.blocks.is_empty()
  }

  pub fn find(
    &self,
    payload: NonNull<u8>,
  ) -> Option<&BlockInfo> {
    let address = payload.as_ptr() as usize;
    self.blocks.iter().find(|block| block.payload == address)
  }

  pub fn live(&self) -> impl Iterator<Item = &BlockInfo> {
    self.blocks.iter().filter(|block| !block.is_free)
  }

  /// Returns the first pair of blocks whose headers or payloads share bytes.
  pub fn overlapping(&self) -> Option<(&BlockInfo, &BlockInfo)> {
    let mut spans: Vec<&BlockInfo> = self.blocks.iter().collect();
    spans.sort_by_key(|block| block.header);

    spans
      .windows(2)
      .find(|pair| pair[0].payload_range().end > pair[1].header)
      .map(|pair| (pair[0], pair[1]))
  }
}

struct Address(Option<usize>);

impl fmt::Display for Address {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self.0 {
      Some(address) => write!(f, "{:#x}", address),
      None => f.write_str("(nil)"),
    }
  }
}

impl fmt::Display for HeapReport {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(
      f,
      "head = {}, tail = {}, program break = {:#x}",
      Address(self.head),
      Address(self.tail),
      self.program_break
    )?;

    for block in &self.blocks {
      writeln!(
        f,
        "addr = {:#x}, size = {}, is_free = {}, next = {}",
        block.header,
        block.size,
        block.is_free as u8,
        Address(block.next)
      )?;
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn block(
    header: usize,
    size: usize,
    next: Option<usize>,
  ) -> BlockInfo {
    BlockInfo { header, payload: header + 32, size, is_free: false, next }
  }

  #[test]
  fn test_display() {
    let report = HeapReport {
      head: Some(0x1000),
      tail: Some(0x1040),
      program_break: 0x1090,
      blocks: vec![block(0x1000, 32, Some(0x1040)), block(0x1040, 15, None)],
    };

    assert_eq!(
      report.to_string(),
      "head = 0x1000, tail = 0x1040, program break = 0x1090\n\
       addr = 0x1000, size = 32, is_free = 0, next = 0x1040\n\
       addr = 0x1040, size = 15, is_free = 0, next = (nil)\n"
    );
  }

  #[test]
  fn test_overlapping() {
    let mut report = HeapReport {
      head: Some(0x1000),
      tail: Some(0x1040),
      program_break: 0x1090,
      blocks: vec![block(0x1000, 32, Some(0x1040)), block(0x1040, 15, None)],
    };
    assert!(report.overlapping().is_none());

    report.blocks[0].size = 33;
    let (first, second) = report.overlapping().unwrap();
    assert_eq!(first.header, 0x1000);
    assert_eq!(second.header, 0x1040);
  }

  #[test]
  fn test_empty() {
    let report = HeapReport { head: None, tail: None, program_break: 0x2000, blocks: Vec::new() };

    assert!(report.is_empty());
    assert_eq!(report.live().count(), 0);
    assert_eq!(report.to_string(), "head = (nil), tail = (nil), program break = 0x2000\n");
  }
}
