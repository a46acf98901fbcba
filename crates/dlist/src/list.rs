//! Doubly-linked list implementation
//!
//! Nodes are stored in a slot arena and linked by slot index. Callers hold
//! [`NodeId`] handles, which stay valid until the node is removed.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::InvariantError;

/// Source of process-unique list identities
static NEXT_LIST_ID: AtomicU64 = AtomicU64::new(1);

fn next_list_id() -> u64 {
    NEXT_LIST_ID.fetch_add(1, Ordering::Relaxed)
}

/// Handle to a node of a [`List`]
///
/// A handle only resolves in the list that created it, and only while the
/// node it was issued for is still linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    list: u64,
    index: usize,
    generation: u64,
}

/// Node in the doubly-linked list
#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Arena slot; the generation is bumped every time the slot is vacated
#[derive(Debug)]
struct Slot<T> {
    generation: u64,
    node: Option<Node<T>>,
}

/// Doubly-linked list with O(1) positional mutation
#[derive(Debug)]
pub struct List<T> {
    id: u64,
    slots: Vec<Slot<T>>,
    free_list: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> List<T> {
    /// Create an empty list
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty list with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id: next_list_id(),
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Number of linked nodes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First node, or `None` if the list is empty
    pub fn front(&self) -> Option<NodeId> {
        self.head.map(|idx| self.handle(idx))
    }

    /// Last node, or `None` if the list is empty
    pub fn back(&self) -> Option<NodeId> {
        self.tail.map(|idx| self.handle(idx))
    }

    /// Node following `id`, or `None` if `id` is the back or not in this list
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        let idx = self.resolve(id)?;
        self.link(idx).1.map(|next| self.handle(next))
    }

    /// Node preceding `id`, or `None` if `id` is the front or not in this list
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        let idx = self.resolve(id)?;
        self.link(idx).0.map(|prev| self.handle(prev))
    }

    /// Check if `id` is a linked node of this list
    pub fn contains(&self, id: NodeId) -> bool {
        self.resolve(id).is_some()
    }

    /// Value stored at `id`
    pub fn get(&self, id: NodeId) -> Option<&T> {
        let idx = self.resolve(id)?;
        self.slots[idx].node.as_ref().map(|node| &node.value)
    }

    /// Mutable value stored at `id`
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        let idx = self.resolve(id)?;
        self.slots[idx].node.as_mut().map(|node| &mut node.value)
    }

    /// Insert `value` as the new front node
    ///
    /// The returned node has no previous neighbor.
    pub fn push_front(&mut self, value: T) -> NodeId {
        let idx = self.alloc_node(value);
        self.attach_front(idx);
        self.handle(idx)
    }

    /// Insert `value` as the new back node
    ///
    /// The returned node has no next neighbor.
    pub fn push_back(&mut self, value: T) -> NodeId {
        let idx = self.alloc_node(value);
        self.attach_back(idx);
        self.handle(idx)
    }

    /// Unlink `id` and return its value
    ///
    /// Returns `None` without touching the list when it is empty or when
    /// `id` is not a linked node of this list.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        // Empty list: nothing to unlink, whatever the handle
        if self.len == 0 {
            return None;
        }
        let idx = self.resolve(id)?;
        self.detach(idx);
        self.free_node(idx)
    }

    /// Relink `id` as the front node, keeping its handle and value
    ///
    /// Returns `false` if `id` is not a linked node of this list.
    pub fn move_to_front(&mut self, id: NodeId) -> bool {
        let Some(idx) = self.resolve(id) else {
            return false;
        };
        if self.head != Some(idx) {
            self.detach(idx);
            self.attach_front(idx);
        }
        true
    }

    /// Relink `id` as the back node, keeping its handle and value
    ///
    /// Returns `false` if `id` is not a linked node of this list.
    pub fn move_to_back(&mut self, id: NodeId) -> bool {
        let Some(idx) = self.resolve(id) else {
            return false;
        };
        if self.tail != Some(idx) {
            self.detach(idx);
            self.attach_back(idx);
        }
        true
    }

    /// Remove the front node and return its value
    pub fn pop_front(&mut self) -> Option<T> {
        let id = self.front()?;
        self.remove(id)
    }

    /// Remove the back node and return its value
    pub fn pop_back(&mut self) -> Option<T> {
        let id = self.back()?;
        self.remove(id)
    }

    /// Remove every node
    ///
    /// All previously issued handles stop resolving.
    pub fn clear(&mut self) {
        self.id = next_list_id();
        self.slots.clear();
        self.free_list.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Iterate values from front to back
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            current: self.head,
            remaining: self.len,
        }
    }

    /// Walk the list in both directions and verify the link structure
    ///
    /// Checks that the ends have no outward links, that every `a.next.prev`
    /// is `a`, and that both walks visit exactly `len` nodes.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        match (self.len, self.head, self.tail) {
            (0, None, None) => return Ok(()),
            (0, _, _) => return Err(InvariantError::new("empty list has an end node")),
            (_, None, _) | (_, _, None) => {
                return Err(InvariantError::new("non-empty list is missing an end node"))
            }
            (1, head, tail) if head != tail => {
                return Err(InvariantError::new("single-node list has distinct ends"))
            }
            _ => {}
        }

        let live = self.slots.iter().filter(|slot| slot.node.is_some()).count();
        if live != self.len {
            return Err(InvariantError::new(format!(
                "len is {} but {} slots are occupied",
                self.len, live
            )));
        }

        let mut visited = 0;
        let mut prev = None;
        let mut current = self.head;
        while let Some(idx) = current {
            visited += 1;
            if visited > self.len {
                return Err(InvariantError::new("forward walk exceeds len"));
            }
            let (node_prev, node_next) = self.link(idx);
            if node_prev != prev {
                return Err(InvariantError::new(format!(
                    "node at slot {} has a mismatched prev link",
                    idx
                )));
            }
            prev = Some(idx);
            current = node_next;
        }
        if visited != self.len || prev != self.tail {
            return Err(InvariantError::new("forward walk does not end at back"));
        }

        visited = 0;
        current = self.tail;
        let mut next = None;
        while let Some(idx) = current {
            visited += 1;
            if visited > self.len {
                return Err(InvariantError::new("backward walk exceeds len"));
            }
            let (node_prev, node_next) = self.link(idx);
            if node_next != next {
                return Err(InvariantError::new(format!(
                    "node at slot {} has a mismatched next link",
                    idx
                )));
            }
            next = Some(idx);
            current = node_prev;
        }
        if visited != self.len || next != self.head {
            return Err(InvariantError::new("backward walk does not end at front"));
        }

        Ok(())
    }

    fn handle(&self, idx: usize) -> NodeId {
        NodeId {
            list: self.id,
            index: idx,
            generation: self.slots[idx].generation,
        }
    }

    fn resolve(&self, id: NodeId) -> Option<usize> {
        if id.list != self.id {
            return None;
        }
        let slot = self.slots.get(id.index)?;
        (slot.generation == id.generation && slot.node.is_some()).then_some(id.index)
    }

    fn link(&self, idx: usize) -> (Option<usize>, Option<usize>) {
        self.slots[idx]
            .node
            .as_ref()
            .map_or((None, None), |node| (node.prev, node.next))
    }

    fn set_prev(&mut self, idx: usize, prev: Option<usize>) {
        if let Some(node) = &mut self.slots[idx].node {
            node.prev = prev;
        }
    }

    fn set_next(&mut self, idx: usize, next: Option<usize>) {
        if let Some(node) = &mut self.slots[idx].node {
            node.next = next;
        }
    }

    fn attach_front(&mut self, idx: usize) {
        self.set_prev(idx, None);
        self.set_next(idx, self.head);

        match self.head {
            Some(head_idx) => self.set_prev(head_idx, Some(idx)),
            None => self.tail = Some(idx),
        }

        self.head = Some(idx);
        self.len += 1;
    }

    fn attach_back(&mut self, idx: usize) {
        self.set_next(idx, None);
        self.set_prev(idx, self.tail);

        match self.tail {
            Some(tail_idx) => self.set_next(tail_idx, Some(idx)),
            None => self.head = Some(idx),
        }

        self.tail = Some(idx);
        self.len += 1;
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = self.link(idx);

        match prev {
            Some(prev_idx) => self.set_next(prev_idx, next),
            None => self.head = next,
        }

        match next {
            Some(next_idx) => self.set_prev(next_idx, prev),
            None => self.tail = prev,
        }

        self.set_prev(idx, None);
        self.set_next(idx, None);
        self.len -= 1;
    }

    fn alloc_node(&mut self, value: T) -> usize {
        let node = Node {
            value,
            prev: None,
            next: None,
        };

        if let Some(idx) = self.free_list.pop() {
            self.slots[idx].node = Some(node);
            idx
        } else {
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            self.slots.len() - 1
        }
    }

    fn free_node(&mut self, idx: usize) -> Option<T> {
        let slot = &mut self.slots[idx];
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(idx);
        Some(node.value)
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Front-to-back iterator over list values
pub struct Iter<'a, T> {
    list: &'a List<T>,
    current: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.current?;
        let node = self.list.slots[idx].node.as_ref()?;
        self.current = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(list: &List<i32>) -> Vec<i32> {
        list.iter().copied().collect()
    }

    fn verify_structure(list: &List<i32>, len: usize, front: Option<NodeId>, back: Option<NodeId>) {
        assert_eq!(list.len(), len);
        assert_eq!(list.front(), front);
        assert_eq!(list.back(), back);
        list.check_invariants().unwrap();
    }

    #[test]
    fn test_empty_list() {
        let list: List<i32> = List::new();

        verify_structure(&list, 0, None, None);
        assert!(list.is_empty());
        assert_eq!(list.iter().count(), 0);
    }

    #[test]
    fn test_empty_list_push() {
        let mut list = List::new();
        let a = list.push_front(1);
        verify_structure(&list, 1, Some(a), Some(a));
        assert_eq!(list.prev(a), None);
        assert_eq!(list.next(a), None);

        let mut list = List::new();
        let b = list.push_back(2);
        verify_structure(&list, 1, Some(b), Some(b));
    }

    #[test]
    fn test_empty_list_remove_is_noop() {
        let mut other = List::new();
        let foreign = other.push_front(10);

        let mut list: List<i32> = List::new();
        assert_eq!(list.remove(foreign), None);
        verify_structure(&list, 0, None, None);
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn test_empty_list_move_to_front_rejects_foreign() {
        let mut other = List::new();
        let foreign = other.push_front(10);

        let mut list: List<i32> = List::new();
        assert!(!list.move_to_front(foreign));
        verify_structure(&list, 0, None, None);
    }

    #[test]
    fn test_single_element_push() {
        let mut list = List::new();
        let a = list.push_front(1);

        let b = list.push_front(2);
        verify_structure(&list, 2, Some(b), Some(a));
        assert_eq!(list.next(b), Some(a));
        assert_eq!(list.prev(a), Some(b));

        let c = list.push_back(3);
        verify_structure(&list, 3, Some(b), Some(c));
        assert_eq!(values(&list), vec![2, 1, 3]);
    }

    #[test]
    fn test_single_element_remove() {
        let mut list = List::new();
        let a = list.push_back(7);

        assert_eq!(list.remove(a), Some(7));
        verify_structure(&list, 0, None, None);
        assert!(!list.contains(a));
    }

    #[test]
    fn test_single_element_move_to_front() {
        let mut list = List::new();
        let a = list.push_front(7);

        assert!(list.move_to_front(a));
        verify_structure(&list, 1, Some(a), Some(a));
        assert_eq!(list.get(a), Some(&7));
    }

    #[test]
    fn test_two_element_remove() {
        let mut list = List::new();
        let a = list.push_back(1);
        let b = list.push_back(2);

        assert_eq!(list.remove(a), Some(1));
        verify_structure(&list, 1, Some(b), Some(b));

        let mut list = List::new();
        let a = list.push_back(1);
        let b = list.push_back(2);

        assert_eq!(list.remove(b), Some(2));
        verify_structure(&list, 1, Some(a), Some(a));
    }

    #[test]
    fn test_two_element_move_to_front() {
        let mut list = List::new();
        let a = list.push_back(1);
        let b = list.push_back(2);

        assert!(list.move_to_front(b));
        verify_structure(&list, 2, Some(b), Some(a));
        assert_eq!(values(&list), vec![2, 1]);

        assert!(list.move_to_front(b));
        verify_structure(&list, 2, Some(b), Some(a));
    }

    #[test]
    fn test_remove_interior() {
        let mut list = List::new();
        let a = list.push_back(1);
        let b = list.push_back(2);
        let c = list.push_back(3);

        assert_eq!(list.remove(b), Some(2));
        verify_structure(&list, 2, Some(a), Some(c));
        assert_eq!(list.next(a), Some(c));
        assert_eq!(list.prev(c), Some(a));
    }

    #[test]
    fn test_move_interior_and_back_to_front() {
        let mut list = List::new();
        let ids: Vec<_> = (1..=5).map(|v| list.push_back(v)).collect();

        assert!(list.move_to_front(ids[2]));
        assert_eq!(values(&list), vec![3, 1, 2, 4, 5]);

        assert!(list.move_to_front(ids[4]));
        assert_eq!(values(&list), vec![5, 3, 1, 2, 4]);
        verify_structure(&list, 5, Some(ids[4]), Some(ids[3]));

        assert!(list.move_to_back(ids[4]));
        assert_eq!(values(&list), vec![3, 1, 2, 4, 5]);
        list.check_invariants().unwrap();
    }

    #[test]
    fn test_move_keeps_identity() {
        let mut list = List::new();
        let a = list.push_back(1);
        list.push_back(2);
        list.push_back(3);

        list.move_to_front(a);
        *list.get_mut(a).unwrap() = 10;

        assert_eq!(list.front(), Some(a));
        assert_eq!(list.get(a), Some(&10));
    }

    #[test]
    fn test_stale_handle_rejected() {
        let mut list = List::new();
        let a = list.push_back(1);
        list.push_back(2);

        assert_eq!(list.remove(a), Some(1));
        // Slot is reused by the next push
        let c = list.push_back(3);

        assert_eq!(list.get(a), None);
        assert_eq!(list.remove(a), None);
        assert!(!list.move_to_front(a));
        assert_eq!(list.get(c), Some(&3));
        verify_structure(&list, 2, list.front(), Some(c));
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut first = List::new();
        let mut second = List::new();
        let a = first.push_back(1);
        second.push_back(2);

        assert_eq!(second.get(a), None);
        assert_eq!(second.remove(a), None);
        assert!(!second.move_to_front(a));
        assert_eq!(second.len(), 1);
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_pop_front_back() {
        let mut list = List::new();
        list.push_back(1);
        list.push_back(2);
        list.push_back(3);

        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.pop_front(), Some(2));
        assert_eq!(list.pop_back(), None);
        verify_structure(&list, 0, None, None);
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut list = List::new();
        let a = list.push_back(1);
        list.push_back(2);

        list.clear();
        verify_structure(&list, 0, None, None);

        let b = list.push_back(3);
        assert_ne!(a, b);
        assert_eq!(list.get(a), None);
        assert_eq!(values(&list), vec![3]);
    }

    #[test]
    fn test_cyclic_move_to_front() {
        let mut list = List::new();
        let ids: Vec<_> = (0..10).map(|v| list.push_back(v)).collect();

        // Moving the back to the front len times restores the original order
        for _ in 0..ids.len() {
            let back = list.back().unwrap();
            list.move_to_front(back);
            list.check_invariants().unwrap();
        }

        assert_eq!(values(&list), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_mixed_operations_keep_invariants() {
        let mut list = List::new();
        let mut ids = Vec::new();

        for i in 0..50 {
            let id = if i % 2 == 0 {
                list.push_front(i)
            } else {
                list.push_back(i)
            };
            ids.push(id);
            if i % 3 == 0 {
                list.move_to_front(ids[i as usize / 2]);
            }
            if i % 7 == 0 {
                list.remove(ids[i as usize / 3]);
            }
            list.check_invariants().unwrap();
        }

        assert_eq!(list.iter().count(), list.len());
    }
}
