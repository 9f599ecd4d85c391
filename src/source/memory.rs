//! Relationship store held entirely in memory.

use rustc_hash::{FxHashMap, FxHashSet};

use super::{Dir, PropValue, Relationship, RelationshipSource};
use crate::types::{GraphError, PropId, RelationshipId, Result, TypeId};

#[derive(Clone, Debug)]
struct StoredRelationship {
    start: u64,
    end: u64,
    ty: TypeId,
    props: Vec<(PropId, PropValue)>,
}

/// Accumulates nodes and relationships for a [`MemorySource`].
#[derive(Clone, Debug, Default)]
pub struct MemorySourceBuilder {
    nodes: Vec<u64>,
    known: FxHashSet<u64>,
    rels: Vec<StoredRelationship>,
}

impl MemorySourceBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node; registering twice is a no-op.
    pub fn add_node(&mut self, node: u64) -> &mut Self {
        if self.known.insert(node) {
            self.nodes.push(node);
        }
        self
    }

    /// Adds a relationship, registering both endpoints.
    pub fn add_relationship(
        &mut self,
        start: u64,
        end: u64,
        ty: TypeId,
        props: Vec<(PropId, PropValue)>,
    ) -> RelationshipId {
        self.add_node(start);
        self.add_node(end);
        let id = RelationshipId(self.rels.len() as u64);
        self.rels.push(StoredRelationship {
            start,
            end,
            ty,
            props,
        });
        id
    }

    /// Number of relationships added so far.
    pub fn relationship_count(&self) -> usize {
        self.rels.len()
    }

    /// Freezes the builder into a queryable source.
    pub fn build(self) -> MemorySource {
        let mut outgoing: FxHashMap<u64, Vec<usize>> = FxHashMap::default();
        let mut incoming: FxHashMap<u64, Vec<usize>> = FxHashMap::default();
        for (idx, rel) in self.rels.iter().enumerate() {
            outgoing.entry(rel.start).or_default().push(idx);
            incoming.entry(rel.end).or_default().push(idx);
        }
        MemorySource {
            nodes: self.nodes,
            live: self.known,
            rels: self.rels,
            outgoing,
            incoming,
        }
    }
}

/// In-memory [`RelationshipSource`].
///
/// Relationships are reported in insertion order, which need not be sorted
/// by neighbor id.
#[derive(Clone, Debug)]
pub struct MemorySource {
    nodes: Vec<u64>,
    live: FxHashSet<u64>,
    rels: Vec<StoredRelationship>,
    outgoing: FxHashMap<u64, Vec<usize>>,
    incoming: FxHashMap<u64, Vec<usize>>,
}

impl MemorySource {
    /// Starts a new builder.
    pub fn builder() -> MemorySourceBuilder {
        MemorySourceBuilder::new()
    }

    /// Original node ids in registration order, including removed nodes.
    pub fn node_ids(&self) -> &[u64] {
        &self.nodes
    }

    /// Total number of stored relationships.
    pub fn relationship_count(&self) -> usize {
        self.rels.len()
    }

    /// Removes a node so later reads of it fail, as if it were deleted concurrently.
    pub fn remove_node(&mut self, node: u64) {
        self.live.remove(&node);
    }

    fn check_node(&self, node: u64) -> Result<()> {
        if self.live.contains(&node) {
            Ok(())
        } else {
            Err(GraphError::NodeNotFound(node))
        }
    }

    fn indices(&self, node: u64, dir: Dir) -> impl Iterator<Item = usize> + '_ {
        let out = dir
            .includes_out()
            .then(|| self.outgoing.get(&node))
            .flatten()
            .into_iter()
            .flatten();
        let inc = dir
            .includes_in()
            .then(|| self.incoming.get(&node))
            .flatten()
            .into_iter()
            .flatten();
        out.chain(inc).copied()
    }

    fn matching(
        &self,
        node: u64,
        dir: Dir,
        ty: Option<TypeId>,
    ) -> impl Iterator<Item = (usize, &StoredRelationship)> + '_ {
        self.indices(node, dir)
            .map(move |idx| (idx, &self.rels[idx]))
            .filter(move |(_, rel)| ty.map_or(true, |ty| rel.ty == ty))
    }
}

impl RelationshipSource for MemorySource {
    fn degree(&self, node: u64, dir: Dir, ty: Option<TypeId>) -> Result<usize> {
        self.check_node(node)?;
        Ok(self.matching(node, dir, ty).count())
    }

    fn for_each_relationship(
        &self,
        node: u64,
        dir: Dir,
        ty: Option<TypeId>,
        visit: &mut dyn FnMut(Relationship) -> Result<()>,
    ) -> Result<()> {
        self.check_node(node)?;
        for (idx, rel) in self.matching(node, dir, ty) {
            visit(Relationship {
                id: RelationshipId(idx as u64),
                start: rel.start,
                end: rel.end,
            })?;
        }
        Ok(())
    }

    fn property(&self, rel: RelationshipId, key: PropId) -> Result<Option<PropValue>> {
        let stored = self
            .rels
            .get(rel.0 as usize)
            .ok_or_else(|| GraphError::Source(format!("unknown relationship {rel}")))?;
        Ok(stored
            .props
            .iter()
            .find(|(prop, _)| *prop == key)
            .map(|(_, value)| value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemorySource {
        let mut builder = MemorySource::builder();
        builder.add_relationship(10, 20, TypeId(1), vec![(PropId(0), PropValue::Int(5))]);
        builder.add_relationship(10, 30, TypeId(2), Vec::new());
        builder.add_relationship(30, 10, TypeId(1), Vec::new());
        builder.add_node(40);
        builder.build()
    }

    fn collect(source: &MemorySource, node: u64, dir: Dir, ty: Option<TypeId>) -> Vec<(u64, u64)> {
        let mut seen = Vec::new();
        source
            .for_each_relationship(node, dir, ty, &mut |rel| {
                seen.push((rel.start, rel.end));
                Ok(())
            })
            .unwrap();
        seen
    }

    #[test]
    fn degree_agrees_with_iteration() {
        let source = sample();
        for dir in [Dir::Out, Dir::In, Dir::Both] {
            for ty in [None, Some(TypeId(1)), Some(TypeId(2))] {
                assert_eq!(
                    source.degree(10, dir, ty).unwrap(),
                    collect(&source, 10, dir, ty).len(),
                    "{dir:?} {ty:?}"
                );
            }
        }
        assert_eq!(collect(&source, 10, Dir::Both, None), vec![(10, 20), (10, 30), (30, 10)]);
        assert_eq!(source.degree(40, Dir::Both, None).unwrap(), 0);
    }

    #[test]
    fn properties_resolve_by_key() {
        let source = sample();
        assert_eq!(
            source.property(RelationshipId(0), PropId(0)).unwrap(),
            Some(PropValue::Int(5))
        );
        assert_eq!(source.property(RelationshipId(1), PropId(0)).unwrap(), None);
        assert!(source.property(RelationshipId(99), PropId(0)).is_err());
    }

    #[test]
    fn removed_nodes_fail_reads() {
        let mut source = sample();
        source.remove_node(30);
        assert!(matches!(
            source.degree(30, Dir::Out, None),
            Err(GraphError::NodeNotFound(30))
        ));
        assert_eq!(source.node_ids(), &[10, 20, 30, 40]);
    }
}
