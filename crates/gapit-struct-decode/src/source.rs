use crate::error::ReadError;
use crate::types::{le_bytes_to_u64, MAX_FIELD_WIDTH};

/// Random-access, read-only view of an address space.
///
/// Implementations must fill all of `dst` or fail; partial reads are not a thing. Reads never
/// mutate the source, so a source may be shared across concurrent decodes.
pub trait ByteSource {
    fn read_into(&self, offset: u64, dst: &mut [u8]) -> Result<(), ReadError>;

    /// Reads `width` (at most 8) bytes at `offset` as a little-endian unsigned integer.
    fn read_uint(&self, offset: u64, width: usize) -> Result<u64, ReadError> {
        if width > MAX_FIELD_WIDTH {
            return Err(ReadError::WidthTooLarge { offset, width });
        }
        let mut buf = [0u8; MAX_FIELD_WIDTH];
        self.read_into(offset, &mut buf[..width])?;
        Ok(le_bytes_to_u64(&buf[..width]))
    }
}

impl<F> ByteSource for F
where
    F: Fn(u64, &mut [u8]) -> Result<(), ReadError>,
{
    fn read_into(&self, offset: u64, dst: &mut [u8]) -> Result<(), ReadError> {
        self(offset, dst)
    }
}

/// Adapts a `(offset, width) -> bytes` reader into a [`ByteSource`].
///
/// Returning a byte count other than `width` is reported as [`ReadError::ShortRead`].
pub struct ReadFn<F>(pub F);

impl<F> ByteSource for ReadFn<F>
where
    F: Fn(u64, usize) -> Result<Vec<u8>, ReadError>,
{
    fn read_into(&self, offset: u64, dst: &mut [u8]) -> Result<(), ReadError> {
        let bytes = (self.0)(offset, dst.len())?;
        if bytes.len() != dst.len() {
            return Err(ReadError::ShortRead {
                offset,
                expected: dst.len(),
                found: bytes.len(),
            });
        }
        dst.copy_from_slice(&bytes);
        Ok(())
    }
}

/// A flat buffer addressed from 0.
impl ByteSource for [u8] {
    fn read_into(&self, offset: u64, dst: &mut [u8]) -> Result<(), ReadError> {
        let out_of_range = || ReadError::OutOfRange {
            offset,
            len: dst.len(),
            size: self.len() as u64,
        };
        let start = usize::try_from(offset).map_err(|_| out_of_range())?;
        let end = start.checked_add(dst.len()).ok_or_else(out_of_range)?;
        let src = self.get(start..end).ok_or_else(out_of_range)?;
        dst.copy_from_slice(src);
        Ok(())
    }
}

impl ByteSource for Vec<u8> {
    fn read_into(&self, offset: u64, dst: &mut [u8]) -> Result<(), ReadError> {
        self.as_slice().read_into(offset, dst)
    }
}
