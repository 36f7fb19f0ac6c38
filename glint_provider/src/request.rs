/// Correlates one blob fetch across the bus. Allocated monotonically by the
/// consumer-side scheduler; zero is the invalid sentinel and never issued.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub const INVALID: RequestId = RequestId(0);

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(&self) -> u64 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Transfer priority of a blob fetch, ordered lowest to highest
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoadPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sentinel() {
        assert!(!RequestId::INVALID.is_valid());
        assert_eq!(RequestId::default(), RequestId::INVALID);
        assert!(RequestId::from_raw(1).is_valid());
    }

    #[test]
    fn test_priority_ordering() {
        assert!(LoadPriority::Low < LoadPriority::Normal);
        assert!(LoadPriority::Normal < LoadPriority::High);
        assert!(LoadPriority::High < LoadPriority::Critical);
        assert_eq!(LoadPriority::default(), LoadPriority::Normal);
    }
}
