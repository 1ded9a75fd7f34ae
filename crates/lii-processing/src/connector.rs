//! Link groups of equally named plugins across runs.

use std::collections::BTreeSet;

use crate::plugin::PluginUid;

/// Plugins (by UID) whose settings are kept in sync.
///
/// The connector only records membership; the plugins are owned by their
/// chains and every command is applied by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connector {
    id: u64,
    plugin_name: &'static str,
    members: BTreeSet<PluginUid>,
}

impl Connector {
    pub fn new(id: u64, plugin_name: &'static str) -> Self {
        Self {
            id,
            plugin_name,
            members: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn plugin_name(&self) -> &'static str {
        self.plugin_name
    }

    pub fn members(&self) -> impl Iterator<Item = PluginUid> + '_ {
        self.members.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, uid: PluginUid) -> bool {
        self.members.contains(&uid)
    }

    pub(crate) fn insert(&mut self, uid: PluginUid) {
        self.members.insert(uid);
    }

    pub(crate) fn remove(&mut self, uid: PluginUid) -> bool {
        self.members.remove(&uid)
    }
}
