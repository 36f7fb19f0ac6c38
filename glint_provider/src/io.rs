/// Chunked byte source backing one blob transfer.
///
/// The service streams a blob by calling `fetch_fragment` with increasing
/// offsets until `total_size` bytes have been sent. Implementations must be
/// pure reads; the same fragment may be fetched more than once.
pub trait SourceBlobIo: Send {
    fn total_size(&self) -> u64;

    /// Copies bytes starting at `offset` into `dest`, returning how many
    /// were written. Zero means `offset` is at or past the end.
    fn fetch_fragment(&self, offset: u64, dest: &mut [u8]) -> usize;
}

/// In-memory blob used by every in-process provider
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobIo {
    bytes: Vec<u8>,
}

impl MemoryBlobIo {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<String> for MemoryBlobIo {
    fn from(text: String) -> Self {
        Self::new(text.into_bytes())
    }
}

impl From<&str> for MemoryBlobIo {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes().to_vec())
    }
}

impl SourceBlobIo for MemoryBlobIo {
    fn total_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn fetch_fragment(&self, offset: u64, dest: &mut [u8]) -> usize {
        if offset >= self.bytes.len() as u64 {
            return 0;
        }
        let offset = offset as usize;
        let count = dest.len().min(self.bytes.len() - offset);
        dest[..count].copy_from_slice(&self.bytes[offset..offset + count]);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_size() {
        let io = MemoryBlobIo::from("Hello, World!");
        assert_eq!(io.total_size(), 13);
    }

    #[test]
    fn test_fetch_whole() {
        let io = MemoryBlobIo::from("Hello, World!");
        let mut dest = [0u8; 32];
        let written = io.fetch_fragment(0, &mut dest);
        assert_eq!(written, 13);
        assert_eq!(&dest[..written], b"Hello, World!");
    }

    #[test]
    fn test_fetch_chunked() {
        let io = MemoryBlobIo::new((0u8..=255).collect());
        let mut reassembled = Vec::new();
        let mut dest = [0u8; 100];
        let mut offset = 0u64;
        loop {
            let written = io.fetch_fragment(offset, &mut dest);
            if written == 0 {
                break;
            }
            reassembled.extend_from_slice(&dest[..written]);
            offset += written as u64;
        }
        assert_eq!(reassembled, (0u8..=255).collect::<Vec<u8>>());
    }

    #[test]
    fn test_fetch_past_end() {
        let io = MemoryBlobIo::from("abc");
        let mut dest = [0u8; 8];
        assert_eq!(io.fetch_fragment(3, &mut dest), 0);
        assert_eq!(io.fetch_fragment(100, &mut dest), 0);
    }

    #[test]
    fn test_fetch_is_pure() {
        let io = MemoryBlobIo::from("abcdef");
        let mut first = [0u8; 4];
        let mut second = [0u8; 4];
        io.fetch_fragment(2, &mut first);
        io.fetch_fragment(2, &mut second);
        assert_eq!(first, second);
    }
}
