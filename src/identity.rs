//! Display-name resolution for unique accounts.

use std::collections::HashMap;

use uuid::Uuid;

/// Resolves a unique id to a human-readable label.
///
/// The economy asks for a live session first, then the offline identity
/// store, and falls back to the raw id.
pub trait IdentityResolver: Send + Sync {
    /// Display name of a currently connected identity.
    fn online(&self, id: Uuid) -> Option<String>;

    /// Name of a known but disconnected identity.
    fn offline(&self, id: Uuid) -> Option<String>;

    fn display_name(&self, id: Uuid) -> String {
        self.online(id)
            .or_else(|| self.offline(id))
            .unwrap_or_else(|| id.to_string())
    }
}

/// Resolver that knows nobody.
#[derive(Debug, Default, Clone, Copy)]
pub struct Anonymous;

impl IdentityResolver for Anonymous {
    fn online(&self, _id: Uuid) -> Option<String> {
        None
    }

    fn offline(&self, _id: Uuid) -> Option<String> {
        None
    }
}

/// In-memory directory of online and offline names.
#[derive(Debug, Default, Clone)]
pub struct Directory {
    online: HashMap<Uuid, String>,
    offline: HashMap<Uuid, String>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_online(mut self, id: Uuid, name: impl Into<String>) -> Self {
        self.online.insert(id, name.into());
        self
    }

    pub fn with_offline(mut self, id: Uuid, name: impl Into<String>) -> Self {
        self.offline.insert(id, name.into());
        self
    }
}

impl IdentityResolver for Directory {
    fn online(&self, id: Uuid) -> Option<String> {
        self.online.get(&id).cloned()
    }

    fn offline(&self, id: Uuid) -> Option<String> {
        self.offline.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn online_name_wins() {
        let id = Uuid::new_v4();
        let directory = Directory::new()
            .with_online(id, "Steve")
            .with_offline(id, "steve_offline");
        assert_eq!(directory.display_name(id), "Steve");
    }

    #[test]
    fn offline_name_used_when_not_connected() {
        let id = Uuid::new_v4();
        let directory = Directory::new().with_offline(id, "Alex");
        assert_eq!(directory.display_name(id), "Alex");
    }

    #[test]
    fn falls_back_to_raw_id() {
        let id = Uuid::new_v4();
        assert_eq!(Anonymous.display_name(id), id.to_string());
        assert_eq!(Directory::new().display_name(id), id.to_string());
    }
}
