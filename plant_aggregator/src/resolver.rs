//! Unit/role resolution against a discovery index.
//!
//! Consumers address variables by typed `(unit, role)` pairs; the
//! resolver maps those onto whatever identifier the remote actually
//! filed the variable under. Three candidate shapes are tried in order:
//! the nested per-category path, the flattened layout older servers
//! exposed, and the bare identifier. First hit wins.

use crate::discovery::PathIndex;
use crate::error::ResolveError;
use plant_common::role::{UnitId, VarKey, VarRole};
use tracing::trace;

/// Borrowing resolver over one subsystem's [`PathIndex`].
pub struct PathResolver<'a> {
    index: &'a PathIndex,
    root: &'a str,
}

impl<'a> PathResolver<'a> {
    pub fn new(index: &'a PathIndex, root: &'a str) -> Self {
        Self { index, root }
    }

    /// Identifier for `unit`/`role`, trying the nested, flat and bare
    /// candidates in that order.
    pub fn resolve(&self, unit: UnitId, role: VarRole) -> Result<String, ResolveError> {
        let prefix = self.unit_prefix(unit);
        let candidates = [
            format!("{prefix}/{}/{}", role.category().name(), role.name()),
            format!("{prefix}/{}", role.name()),
            VarKey::new(unit, role).identifier(),
        ];
        for candidate in &candidates {
            if let Some(id) = self.index.identifier(candidate) {
                trace!(candidate = candidate.as_str(), id, "path resolved");
                return Ok(id.to_string());
            }
        }
        Err(ResolveError::Unresolved { unit, role })
    }

    /// Number of conveyors addressable through this index, probing
    /// ordinals upward until the first hole.
    pub fn conveyor_count(&self) -> u8 {
        (1..=u8::MAX)
            .take_while(|&ordinal| {
                self.resolve(UnitId::Conveyor(ordinal), VarRole::Status)
                    .is_ok()
            })
            .count() as u8
    }

    // The filler subsystem's root object doubles as the unit, so its
    // prefix carries no unit segment.
    fn unit_prefix(&self, unit: UnitId) -> String {
        let name = unit.to_string();
        if name == self.root {
            name
        } else {
            format!("{}/{}", self.root, name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with(entries: &[(&str, &str)]) -> PathIndex {
        let mut index = PathIndex::default();
        for (path, id) in entries {
            index.insert_variable(path.to_string(), id.to_string());
        }
        index
    }

    #[test]
    fn nested_candidate_wins() {
        let index = index_with(&[
            ("ConveyorLine/Conveyor2/Parameters/Status", "Conveyor2.Status"),
            ("ConveyorLine/Conveyor2/Status", "legacy-flat"),
        ]);
        let resolver = PathResolver::new(&index, "ConveyorLine");
        let id = resolver
            .resolve(UnitId::Conveyor(2), VarRole::Status)
            .expect("resolve");
        assert_eq!(id, "Conveyor2.Status");
    }

    #[test]
    fn flat_candidate_beats_bare() {
        let index = index_with(&[
            ("ConveyorLine/Conveyor2/Status", "flat-id"),
            ("Conveyor2.Status", "bare-id"),
        ]);
        let resolver = PathResolver::new(&index, "ConveyorLine");
        let id = resolver
            .resolve(UnitId::Conveyor(2), VarRole::Status)
            .expect("resolve");
        assert_eq!(id, "flat-id");
    }

    #[test]
    fn bare_identifier_is_the_last_resort() {
        let mut index = PathIndex::default();
        index.insert_variable("Somewhere/Else".to_string(), "Conveyor1.Powered".to_string());
        let resolver = PathResolver::new(&index, "ConveyorLine");
        let id = resolver
            .resolve(UnitId::Conveyor(1), VarRole::Powered)
            .expect("resolve");
        assert_eq!(id, "Conveyor1.Powered");
    }

    #[test]
    fn filler_prefix_has_no_unit_segment() {
        let index = index_with(&[("Filler/Parameters/Status", "Filler.Status")]);
        let resolver = PathResolver::new(&index, "Filler");
        let id = resolver
            .resolve(UnitId::Filler, VarRole::Status)
            .expect("resolve");
        assert_eq!(id, "Filler.Status");
    }

    #[test]
    fn missing_everything_is_unresolved() {
        let index = PathIndex::default();
        let resolver = PathResolver::new(&index, "ConveyorLine");
        let result = resolver.resolve(UnitId::Conveyor(1), VarRole::Status);
        assert_eq!(
            result,
            Err(ResolveError::Unresolved {
                unit: UnitId::Conveyor(1),
                role: VarRole::Status,
            })
        );
    }

    #[test]
    fn conveyor_count_stops_at_the_first_hole() {
        let index = index_with(&[
            ("ConveyorLine/Conveyor1/Parameters/Status", "Conveyor1.Status"),
            ("ConveyorLine/Conveyor2/Parameters/Status", "Conveyor2.Status"),
            // Conveyor3 absent; Conveyor4 must not be counted.
            ("ConveyorLine/Conveyor4/Parameters/Status", "Conveyor4.Status"),
        ]);
        let resolver = PathResolver::new(&index, "ConveyorLine");
        assert_eq!(resolver.conveyor_count(), 2);

        let empty = PathIndex::default();
        assert_eq!(PathResolver::new(&empty, "ConveyorLine").conveyor_count(), 0);
    }
}
