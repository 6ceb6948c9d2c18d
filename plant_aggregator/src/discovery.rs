//! Process-tree discovery over a subsystem link.
//!
//! The aggregation side starts address-blind: it learns the set of
//! addressable variables by walking the remote tree with repeated
//! one-level browses, filing the full slash-joined path of every variable
//! node next to its registry identifier. A re-walk builds a fresh
//! [`PathIndex`] and replaces the previous one wholesale; nothing is
//! patched in place, so a half-finished walk can never be observed.

use crate::resolver::PathResolver;
use plant_registry::{LinkError, NodeRef, SubsystemLink};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Where a [`Discovery`] currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryPhase {
    /// No walk has completed; the index is empty.
    Idle,
    /// A walk is in progress.
    Walking,
    /// The index reflects the last completed walk.
    Indexed,
}

/// Path-to-identifier lookup built by a tree walk.
///
/// Every variable is filed under its full path. Its bare identifier is
/// additionally filed as a simplified key when no earlier entry already
/// claimed that string.
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    entries: HashMap<String, String>,
}

impl PathIndex {
    /// Registry identifier filed under `path`, which may be a full
    /// slash-joined path or a bare identifier.
    pub fn identifier(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    /// Number of keys, counting bare-identifier aliases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert_variable(&mut self, path: String, identifier: String) {
        if !self.entries.contains_key(&identifier) {
            self.entries.insert(identifier.clone(), identifier.clone());
        }
        self.entries.insert(path, identifier);
    }
}

/// One subsystem's discovery state.
pub struct Discovery {
    subsystem: String,
    phase: DiscoveryPhase,
    index: PathIndex,
}

impl Discovery {
    pub fn new() -> Self {
        Self {
            subsystem: String::new(),
            phase: DiscoveryPhase::Idle,
            index: PathIndex::default(),
        }
    }

    pub fn phase(&self) -> DiscoveryPhase {
        self.phase
    }

    pub fn index(&self) -> &PathIndex {
        &self.index
    }

    /// Resolver over the current index.
    pub fn resolver(&self) -> PathResolver<'_> {
        PathResolver::new(&self.index, &self.subsystem)
    }

    /// Depth-first walk of the remote tree, replacing the index.
    ///
    /// Returns the number of variable nodes indexed. When the link fails
    /// mid-walk the previous index stays in place and the phase reverts
    /// to what it was before the attempt.
    pub fn walk(&mut self, link: &dyn SubsystemLink, max_depth: u32) -> Result<usize, LinkError> {
        let previous = self.phase;
        self.phase = DiscoveryPhase::Walking;
        match walk_tree(link, max_depth) {
            Ok((index, variables)) => {
                info!(
                    subsystem = link.subsystem_name(),
                    variables,
                    keys = index.len(),
                    "discovery walk complete"
                );
                self.subsystem = link.subsystem_name().to_string();
                self.index = index;
                self.phase = DiscoveryPhase::Indexed;
                Ok(variables)
            }
            Err(err) => {
                warn!(
                    subsystem = link.subsystem_name(),
                    error = %err,
                    "discovery walk failed"
                );
                self.phase = previous;
                Err(err)
            }
        }
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new()
    }
}

fn walk_tree(link: &dyn SubsystemLink, max_depth: u32) -> Result<(PathIndex, usize), LinkError> {
    let mut index = PathIndex::default();
    let mut variables = 0usize;
    let root = link.root()?;
    let mut stack: Vec<(NodeRef, String, u32)> =
        vec![(root, link.subsystem_name().to_string(), 0)];

    while let Some((node, path, depth)) = stack.pop() {
        if depth >= max_depth {
            warn!(
                subsystem = link.subsystem_name(),
                node = %node,
                depth,
                "browse depth bound hit, subtree skipped"
            );
            continue;
        }
        for entry in link.browse(&node)? {
            let child_path = format!("{path}/{}", entry.name);
            if entry.kind.is_container() {
                stack.push((entry.node, child_path, depth + 1));
            } else {
                index.insert_variable(child_path, entry.node.as_str().to_string());
                variables += 1;
            }
        }
    }
    debug!(subsystem = link.subsystem_name(), variables, "tree walk finished");
    Ok((index, variables))
}

#[cfg(test)]
mod tests {
    use super::*;
    use plant_common::config::LineConfig;
    use plant_registry::{BrowseEntry, LoopbackLink, OpStatus, ReadResult, WriteRequest};
    use plant_server::ConveyorLineSubsystem;

    fn line_link(conveyors: u8) -> LoopbackLink {
        let config = LineConfig {
            conveyor_count: conveyors,
            ..LineConfig::default()
        };
        let line = ConveyorLineSubsystem::build(&config, 1).expect("build");
        LoopbackLink::new(line.service())
    }

    #[test]
    fn walk_indexes_every_variable_under_both_key_shapes() {
        let link = line_link(2);
        let mut discovery = Discovery::new();
        assert_eq!(discovery.phase(), DiscoveryPhase::Idle);

        let variables = discovery.walk(&link, 4).expect("walk");
        assert_eq!(variables, 20);
        assert_eq!(discovery.phase(), DiscoveryPhase::Indexed);

        let index = discovery.index();
        assert_eq!(
            index.identifier("ConveyorLine/Conveyor1/Parameters/Status"),
            Some("Conveyor1.Status")
        );
        assert_eq!(
            index.identifier("ConveyorLine/Conveyor2/Control/Powered"),
            Some("Conveyor2.Powered")
        );
        // Bare identifiers are filed as simplified keys.
        assert_eq!(index.identifier("Conveyor2.Powered"), Some("Conveyor2.Powered"));
        assert_eq!(index.identifier("ConveyorLine/Conveyor3/Parameters/Status"), None);
    }

    #[test]
    fn rewalk_replaces_the_index() {
        let link = line_link(3);
        let mut discovery = Discovery::new();
        let first = discovery.walk(&link, 4).expect("first walk");
        let keys = discovery.index().len();

        let second = discovery.walk(&link, 4).expect("second walk");
        assert_eq!(first, second);
        assert_eq!(discovery.index().len(), keys);
    }

    #[test]
    fn depth_bound_prunes_the_walk() {
        let link = line_link(2);
        let mut discovery = Discovery::new();
        // Variables sit three browse levels down; a bound of 2 never
        // reaches them.
        let variables = discovery.walk(&link, 2).expect("walk");
        assert_eq!(variables, 0);
        assert!(discovery.index().is_empty());
        assert_eq!(discovery.phase(), DiscoveryPhase::Indexed);
    }

    struct DeadLink;

    impl SubsystemLink for DeadLink {
        fn subsystem_name(&self) -> &str {
            "ConveyorLine"
        }

        fn root(&self) -> Result<NodeRef, LinkError> {
            Err(LinkError::Unreachable {
                subsystem: "ConveyorLine".to_string(),
                reason: "injected outage".to_string(),
            })
        }

        fn browse(&self, _node: &NodeRef) -> Result<Vec<BrowseEntry>, LinkError> {
            Err(LinkError::Unreachable {
                subsystem: "ConveyorLine".to_string(),
                reason: "injected outage".to_string(),
            })
        }

        fn read_variables(&self, _ids: &[String]) -> Result<Vec<ReadResult>, LinkError> {
            Err(LinkError::Unreachable {
                subsystem: "ConveyorLine".to_string(),
                reason: "injected outage".to_string(),
            })
        }

        fn write_variables(&self, _requests: &[WriteRequest]) -> Result<Vec<OpStatus>, LinkError> {
            Err(LinkError::Unreachable {
                subsystem: "ConveyorLine".to_string(),
                reason: "injected outage".to_string(),
            })
        }
    }

    #[test]
    fn failed_walk_keeps_the_previous_index() {
        let link = line_link(2);
        let mut discovery = Discovery::new();
        discovery.walk(&link, 4).expect("walk");
        let keys = discovery.index().len();

        let result = discovery.walk(&DeadLink, 4);
        assert!(matches!(result, Err(LinkError::Unreachable { .. })));
        assert_eq!(discovery.phase(), DiscoveryPhase::Indexed);
        assert_eq!(discovery.index().len(), keys);
        assert_eq!(
            discovery.index().identifier("ConveyorLine/Conveyor1/Control/Powered"),
            Some("Conveyor1.Powered")
        );
    }

    #[test]
    fn failed_first_walk_stays_idle() {
        let mut discovery = Discovery::new();
        let result = discovery.walk(&DeadLink, 4);
        assert!(result.is_err());
        assert_eq!(discovery.phase(), DiscoveryPhase::Idle);
        assert!(discovery.index().is_empty());
    }
}
