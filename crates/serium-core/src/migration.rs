//! Migration path resolution and execution.
//!
//! Versions of a logical type form a graph: each definition carries the
//! migrations that produce it, keyed by source version. A path is found by a
//! breadth-first search backwards from the target, so the shortest chain wins
//! and cycles (two-way migrations) terminate.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::error::{Result, SeriumError};
use crate::naming::VersionedType;
use crate::record::{Record, RecordBuilder};
use crate::schema::{RecordType, TypeRegistry};
use crate::value::Value;

/// Handed to migration functions, mainly to build instances of the target shape.
#[derive(Debug, Clone, Copy)]
pub struct MigrationContext<'a> {
    registry: &'a TypeRegistry,
    from_version: u32,
    to_version: u32,
}

impl<'a> MigrationContext<'a> {
    pub fn new(registry: &'a TypeRegistry, from_version: u32, to_version: u32) -> Self {
        Self {
            registry,
            from_version,
            to_version,
        }
    }

    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    pub fn from_version(&self) -> u32 {
        self.from_version
    }

    pub fn to_version(&self) -> u32 {
        self.to_version
    }

    /// Construct `name` from positional values.
    pub fn create(&self, name: &str, positional: Vec<Value>) -> Result<Record> {
        self.registry.create(name, positional)
    }

    pub fn build(&self, name: &str) -> Result<RecordBuilder<'a>> {
        self.registry.build(name)
    }
}

/// Shortest chain of versions leading from `from` to `to`, both included.
///
/// Among paths of equal length the one following earlier-registered
/// migrations is chosen. Versions with no definition in the registry are
/// skipped.
pub fn find_migration_path(
    registry: &TypeRegistry,
    record_type: &Arc<RecordType>,
    to: u32,
    from: u32,
) -> Result<Vec<u32>> {
    if to == from {
        return Ok(vec![to]);
    }

    // next[v] is the version v migrates into on the way to `to`
    let mut next: HashMap<u32, u32> = HashMap::new();
    let mut visited = HashSet::from([to]);
    let mut queue = VecDeque::from([to]);

    while let Some(version) = queue.pop_front() {
        let definition = match registry.resolve_version(record_type, version) {
            Ok(def) => def,
            Err(SeriumError::VersionNotFound { ccvt }) => {
                trace!(%ccvt, "no definition, skipping");
                continue;
            }
            Err(e) => return Err(e),
        };

        for source in definition.migration_sources() {
            if !visited.insert(source) {
                continue;
            }
            next.insert(source, version);
            if source == from {
                let mut path = vec![from];
                let mut current = from;
                while let Some(&n) = next.get(&current) {
                    path.push(n);
                    current = n;
                }
                return Ok(path);
            }
            queue.push_back(source);
        }
    }

    Err(SeriumError::MigrationPathNotFound {
        from: VersionedType::new(record_type.normalized_name(), from),
        to: VersionedType::new(record_type.normalized_name(), to),
    })
}

/// Bring `instance`, written as `source`, up (or down) to `target`'s version.
pub fn migrate(
    registry: &TypeRegistry,
    target: &Arc<RecordType>,
    instance: Record,
    source: &VersionedType,
) -> Result<Record> {
    let path = find_migration_path(registry, target, target.version(), source.version())?;
    debug!(
        from = %source,
        to = %target.versioned_type(),
        ?path,
        "migrating"
    );

    let mut current = instance;
    for step in path.windows(2) {
        let (from_version, to_version) = (step[0], step[1]);
        let definition = registry.resolve_version(target, to_version)?;
        let migration = definition.migration(from_version).ok_or_else(|| {
            SeriumError::MigrationPathNotFound {
                from: VersionedType::new(target.normalized_name(), from_version),
                to: VersionedType::new(target.normalized_name(), to_version),
            }
        })?;

        let ctx = MigrationContext::new(registry, from_version, to_version);
        trace!(from_version, to_version, instance = %current, "applying migration");
        current = migration(&current, &ctx).map_err(|e| SeriumError::MigrationFunction {
            instance: current.to_string(),
            from_version,
            to_version,
            source: e.into(),
        })?;
    }

    Ok(current)
}
