/// Routes mutations to the read-write store and queries to the read-only one.
///
/// When no replica is configured, `read_only()` hands out the read-write
/// store. That is a valid single-database deployment, not an error.
#[derive(Debug, Clone)]
pub struct ConnectionRouter<S> {
    read_write: S,
    read_only: Option<S>,
}

impl<S> ConnectionRouter<S> {
    /// Creates a router with an optional read-only replica.
    pub fn new(read_write: S, read_only: Option<S>) -> Self {
        Self {
            read_write,
            read_only,
        }
    }

    /// Creates a router that serves reads and writes from one store.
    pub fn single(read_write: S) -> Self {
        Self::new(read_write, None)
    }

    /// Store used for every mutation.
    pub fn read_write(&self) -> &S {
        &self.read_write
    }

    /// Store used for every query.
    pub fn read_only(&self) -> &S {
        self.read_only.as_ref().unwrap_or(&self.read_write)
    }

    /// Returns true if reads go to a distinct replica.
    pub fn has_replica(&self) -> bool {
        self.read_only.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_falls_back_to_read_write() {
        let router = ConnectionRouter::single("primary");
        assert_eq!(*router.read_write(), "primary");
        assert_eq!(*router.read_only(), "primary");
        assert!(!router.has_replica());
    }

    #[test]
    fn replica_serves_reads() {
        let router = ConnectionRouter::new("primary", Some("replica"));
        assert_eq!(*router.read_write(), "primary");
        assert_eq!(*router.read_only(), "replica");
        assert!(router.has_replica());
    }

    #[test]
    fn fallback_returns_the_same_handle() {
        let router = ConnectionRouter::single(String::from("primary"));
        assert!(std::ptr::eq(router.read_write(), router.read_only()));
    }
}
