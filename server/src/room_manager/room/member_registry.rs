use std::collections::HashSet;

/// [MemberRegistry] tracks which sessions are currently joined to a room.
///
/// It exists only for fan-out bookkeeping and empty-room detection; the
/// drawing history never reads it. There is no user identity layer, so the
/// sessions themselves are the members.
#[derive(Debug, Default)]
pub struct MemberRegistry {
    session_ids: HashSet<String>,
}

impl MemberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session to the room, returns true if it was not already a member
    pub fn insert(&mut self, session_id: &str) -> bool {
        self.session_ids.insert(String::from(session_id))
    }

    /// Remove a session from the room, returns true if it was a member
    pub fn remove(&mut self, session_id: &str) -> bool {
        self.session_ids.remove(session_id)
    }

    pub fn is_empty(&self) -> bool {
        self.session_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_remove() {
        let mut registry = MemberRegistry::new();

        assert!(registry.insert("session-1"));
        assert!(!registry.insert("session-1"));
        assert!(registry.insert("session-2"));

        assert!(registry.remove("session-1"));
        assert!(!registry.remove("session-1"));
        assert!(!registry.is_empty());

        assert!(registry.remove("session-2"));
        assert!(registry.is_empty());
    }
}
