use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(libc::pid_t);

impl ProcessId {
    pub fn new(id: libc::pid_t) -> Self {
        Self(id)
    }

    pub fn get(&self) -> libc::pid_t {
        self.0
    }

    /// Returns whether this identifier can name a single live process.
    ///
    /// Zero and negative values have special meanings for `kill` and `waitpid` (process groups,
    /// "any child") and never denote a tracked child.
    pub fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::ProcessId;

    #[test]
    fn display() {
        assert_eq!(ProcessId::new(4242).to_string(), "4242");
    }

    #[test]
    fn only_positive_ids_are_valid() {
        assert!(ProcessId::new(1).is_valid());
        assert!(!ProcessId::new(0).is_valid());
        assert!(!ProcessId::new(-1).is_valid());
    }
}
