//! Permission-gated capability availability.
//!
//! Platform permission checks boil down to a single question the collection
//! paths consume uniformly: is the capability available or denied? Denied
//! always degrades to fallback behavior, never fails a tick.

/// Availability of a permission-gated capability (microphone, heart-rate
/// sensor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Available,
    Denied,
}

impl Capability {
    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Available => write!(f, "available"),
            Capability::Denied => write!(f, "denied"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_display() {
        assert_eq!(Capability::Available.to_string(), "available");
        assert_eq!(Capability::Denied.to_string(), "denied");
        assert!(Capability::Available.is_available());
        assert!(!Capability::Denied.is_available());
    }
}
