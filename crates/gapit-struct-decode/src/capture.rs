//! Sparse memory observed while capturing API calls.
//!
//! A capture records the bytes each call read from (and wrote to) application memory, keyed by
//! the address they lived at. [`CaptureMemory`] collects those observations so records can be
//! decoded straight from their original addresses.

use std::collections::BTreeMap;

use crate::error::ReadError;
use crate::source::ByteSource;

/// Non-overlapping set of observed address ranges.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaptureMemory {
    // start address -> bytes. Ranges never overlap; adjacent ranges are kept separate.
    ranges: BTreeMap<u64, Vec<u8>>,
}

impl CaptureMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `bytes` as observed at `base`. Bytes of older observations that overlap the new
    /// range are replaced.
    pub fn observe(&mut self, base: u64, bytes: &[u8]) -> Result<(), ReadError> {
        if bytes.is_empty() {
            return Ok(());
        }
        let end = base.checked_add(bytes.len() as u64).ok_or(ReadError::Overflow {
            offset: base,
            len: bytes.len(),
        })?;

        let overlapping: Vec<u64> = self
            .ranges
            .range(..end)
            .rev()
            .take_while(|&(&start, data)| start + data.len() as u64 > base)
            .map(|(&start, _)| start)
            .collect();

        for start in overlapping {
            let Some(data) = self.ranges.remove(&start) else {
                continue;
            };
            let old_end = start + data.len() as u64;
            if start < base {
                let keep = (base - start) as usize;
                self.ranges.insert(start, data[..keep].to_vec());
            }
            if old_end > end {
                let skip = (end - start) as usize;
                self.ranges.insert(end, data[skip..].to_vec());
            }
        }

        self.ranges.insert(base, bytes.to_vec());
        Ok(())
    }

    /// Number of distinct observed ranges.
    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    /// Total number of observed bytes.
    pub fn observed_len(&self) -> u64 {
        self.ranges.values().map(|r| r.len() as u64).sum()
    }

    /// Observed ranges in address order, as `(start, bytes)`.
    pub fn ranges(&self) -> impl Iterator<Item = (u64, &[u8])> + '_ {
        self.ranges.iter().map(|(&start, data)| (start, data.as_slice()))
    }

    pub fn contains(&self, offset: u64, len: usize) -> bool {
        let mut buf = vec![0u8; len];
        self.read_into(offset, &mut buf).is_ok()
    }
}

impl ByteSource for CaptureMemory {
    fn read_into(&self, offset: u64, dst: &mut [u8]) -> Result<(), ReadError> {
        offset.checked_add(dst.len() as u64).ok_or(ReadError::Overflow {
            offset,
            len: dst.len(),
        })?;

        let mut cur = offset;
        let mut remaining = dst;
        while !remaining.is_empty() {
            let unmapped = ReadError::Unmapped {
                offset: cur,
                len: remaining.len(),
            };
            let Some((&start, data)) = self.ranges.range(..=cur).next_back() else {
                return Err(unmapped);
            };
            let skip = (cur - start) as usize;
            if skip >= data.len() {
                return Err(unmapped);
            }
            let take = (data.len() - skip).min(remaining.len());
            remaining[..take].copy_from_slice(&data[skip..skip + take]);

            cur += take as u64;
            remaining = &mut remaining[take..];
        }
        Ok(())
    }
}
