use std::collections::HashSet;

use crate::domain::Record;
use crate::index::RelationshipIndex;

/// Whether any descendant of `token_id` is still alive.
///
/// Depth-first over the parent -> children index. Each token is expanded at
/// most once, so a cyclic `parentID` chain ends the walk instead of looping.
pub fn has_living_descendant(index: &RelationshipIndex<'_>, token_id: u64) -> bool {
    let mut visited = HashSet::from([token_id]);
    let mut stack = vec![token_id];

    while let Some(current) = stack.pop() {
        for child in index.children_of(current) {
            if !child.is_deceased() {
                return true;
            }
            if visited.insert(child.token_id) {
                stack.push(child.token_id);
            }
        }
    }
    false
}

/// Alive, or dead with a living line below it.
pub fn is_effectively_alive(index: &RelationshipIndex<'_>, record: &Record) -> bool {
    !record.is_deceased() || has_living_descendant(index, record.token_id)
}
