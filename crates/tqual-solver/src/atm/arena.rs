//! Node arena for annotated types.

use super::{AtmId, AtmNode};
use std::ops::{Index, IndexMut};

/// Arena-based storage for [`AtmNode`]s.
///
/// Nodes are stored contiguously and referenced by index. Nothing is ever
/// freed; an arena lives as long as the factory session that owns it.
#[derive(Debug, Default, Clone)]
pub struct AtmArena {
    nodes: Vec<AtmNode>,
}

impl AtmArena {
    pub fn new() -> AtmArena {
        AtmArena { nodes: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> AtmArena {
        AtmArena {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Add a node to the arena and return its handle
    pub fn alloc(&mut self, node: AtmNode) -> AtmId {
        let index = self.nodes.len() as u32;
        self.nodes.push(node);
        AtmId(index)
    }

    pub fn get(&self, id: AtmId) -> Option<&AtmNode> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: AtmId) -> Option<&mut AtmNode> {
        self.nodes.get_mut(id.index())
    }

    /// Replace the node at `id`, returning the old one.
    pub fn replace(&mut self, id: AtmId, node: AtmNode) -> Option<AtmNode> {
        self.nodes
            .get_mut(id.index())
            .map(|old| std::mem::replace(old, node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Handles are only minted by [`AtmArena::alloc`], so indexing with one from
/// the same arena never goes out of bounds.
impl Index<AtmId> for AtmArena {
    type Output = AtmNode;

    fn index(&self, id: AtmId) -> &AtmNode {
        &self.nodes[id.index()]
    }
}

impl IndexMut<AtmId> for AtmArena {
    fn index_mut(&mut self, id: AtmId) -> &mut AtmNode {
        &mut self.nodes[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atm::AtmData;
    use tqual_host::Type;

    #[test]
    fn alloc_and_replace() {
        let mut arena = AtmArena::new();
        let a = arena.alloc(AtmNode::new(Type::Null, AtmData::Null));
        let b = arena.alloc(AtmNode::new(Type::Void, AtmData::NoType));
        assert_eq!(arena.len(), 2);
        assert_ne!(a, b);

        let old = arena.replace(a, AtmNode::new(Type::Void, AtmData::NoType));
        assert!(matches!(old.map(|n| n.data), Some(AtmData::Null)));
        assert!(matches!(arena[a].data, AtmData::NoType));
        assert!(arena.get(AtmId(7)).is_none());
    }
}
