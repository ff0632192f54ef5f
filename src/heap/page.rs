use crate::heap::node::{HeapNode, NodeLayout};
use crate::heap::order::PriorityOrder;

/// One fixed-size sub-heap buffer. Slots are 1-indexed; slot 1 is the page
/// root. A buffer shorter than the full page size (a short read at the end
/// of the pages file) reads as empty slots and grows on first write.
pub struct Page {
    number: u64,
    layout: NodeLayout,
    data: Vec<u8>,
}

impl Page {
    pub fn new(number: u64, layout: NodeLayout, data: Vec<u8>) -> Page {
        Page {
            number,
            layout,
            data,
        }
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn offset(&self, slot: u64) -> usize {
        (slot as usize - 1) * self.layout.node_size()
    }

    pub fn node_at(&self, slot: u64) -> HeapNode {
        let start = self.offset(slot);
        if start >= self.data.len() {
            return HeapNode::EMPTY;
        }
        let end = (start + self.layout.node_size()).min(self.data.len());
        HeapNode::decode(&self.data[start..end], &self.layout)
    }

    pub fn priority_at(&self, slot: u64) -> u64 {
        self.node_at(slot).priority
    }

    pub fn set_node(&mut self, slot: u64, node: &HeapNode) {
        let start = self.offset(slot);
        let bytes = node.encode(&self.layout);
        if self.data.len() < start + bytes.len() {
            self.data.resize(start + bytes.len(), 0);
        }
        self.data[start..start + bytes.len()].copy_from_slice(&bytes);
    }

    pub fn set_cursor(&mut self, slot: u64, cursor: u64) {
        let mut node = self.node_at(slot);
        node.cursor = cursor;
        self.set_node(slot, &node);
    }

    pub fn zero_slot(&mut self, slot: u64) {
        self.set_node(slot, &HeapNode::EMPTY);
    }

    /// The canonical `N`-byte image of one slot.
    pub fn slot_bytes(&self, slot: u64) -> Vec<u8> {
        self.node_at(slot).encode(&self.layout)
    }

    pub fn swap_slots(&mut self, a: u64, b: u64) {
        let node_a = self.node_at(a);
        let node_b = self.node_at(b);
        self.set_node(a, &node_b);
        self.set_node(b, &node_a);
    }

    /// Sift the value at `slot` toward the page root. Returns true iff the
    /// value ended at slot 1, in which case the caller must carry the
    /// ascent on into the parent page.
    pub fn sift_up(&mut self, slot: u64, order: &impl PriorityOrder) -> bool {
        let mut child = slot;
        while child > 1 {
            let parent = child / 2;
            if order.precedes(self.priority_at(child), self.priority_at(parent)) {
                self.swap_slots(child, parent);
            } else {
                return false;
            }
            child = parent;
        }
        true
    }

    /// Sift the page root down. Slots in the last layer have no in-page
    /// children, so the walk stops there. Returns whether it reached the
    /// last layer (the sink then continues in the child page below the
    /// stop slot) and the slot the value stopped at.
    pub fn sift_down(&mut self, order: &impl PriorityOrder, last_layer_nodes: u64) -> (bool, u64) {
        let mut parent = 1u64;
        while parent < last_layer_nodes {
            let left = parent * 2;
            let right = left + 1;
            let parent_priority = self.priority_at(parent);
            let left_priority = self.priority_at(left);
            let right_priority = self.priority_at(right);

            // priority 0 means the child slot is empty
            if left_priority == 0 && right_priority == 0 {
                return (false, parent);
            }
            if right_priority == 0 {
                if order.precedes(parent_priority, left_priority) {
                    return (false, parent);
                }
                self.swap_slots(parent, left);
                return (false, left);
            }
            if order.precedes(parent_priority, left_priority)
                && order.precedes(parent_priority, right_priority)
            {
                return (false, parent);
            }
            if order.precedes(left_priority, right_priority) {
                self.swap_slots(parent, left);
                parent = left;
            } else {
                self.swap_slots(parent, right);
                parent = right;
            }
        }
        (true, parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::order::MaxFirst;

    fn empty_page() -> Page {
        // height-3 page: 7 slots
        Page::new(1, NodeLayout::default(), vec![0u8; 7 * 16])
    }

    #[test]
    fn set_and_read_back() {
        let mut page = empty_page();
        page.set_node(3, &HeapNode::new(9, 4));
        assert_eq!(page.node_at(3), HeapNode::new(9, 4));
        assert!(page.node_at(2).is_empty());
        page.zero_slot(3);
        assert!(page.node_at(3).is_empty());
    }

    #[test]
    fn short_buffer_reads_empty_and_grows_on_write() {
        let mut page = Page::new(1, NodeLayout::default(), Vec::new());
        assert!(page.node_at(5).is_empty());
        page.set_node(2, &HeapNode::new(3, 0));
        assert_eq!(page.node_at(2), HeapNode::new(3, 0));
        assert_eq!(page.data().len(), 2 * 16);
    }

    #[test]
    fn sift_up_stops_below_a_bigger_parent() {
        let mut page = empty_page();
        page.set_node(1, &HeapNode::new(10, 0));
        page.set_node(2, &HeapNode::new(5, 0));
        page.set_node(4, &HeapNode::new(7, 0));
        assert!(!page.sift_up(4, &MaxFirst));
        assert_eq!(page.priority_at(2), 7);
        assert_eq!(page.priority_at(4), 5);
        assert_eq!(page.priority_at(1), 10);
    }

    #[test]
    fn sift_up_reaching_the_root_reports_it() {
        let mut page = empty_page();
        page.set_node(1, &HeapNode::new(4, 0));
        page.set_node(2, &HeapNode::new(3, 0));
        page.set_node(4, &HeapNode::new(9, 1));
        assert!(page.sift_up(4, &MaxFirst));
        assert_eq!(page.node_at(1), HeapNode::new(9, 1));
    }

    #[test]
    fn sift_up_keeps_the_parent_on_a_tie() {
        let mut page = empty_page();
        page.set_node(1, &HeapNode::new(6, 0));
        page.set_node(2, &HeapNode::new(6, 1));
        assert!(!page.sift_up(2, &MaxFirst));
        assert_eq!(page.node_at(1), HeapNode::new(6, 0));
    }

    #[test]
    fn sift_down_stops_on_empty_children() {
        let mut page = empty_page();
        page.set_node(1, &HeapNode::new(2, 0));
        assert_eq!(page.sift_down(&MaxFirst, 4), (false, 1));
    }

    #[test]
    fn sift_down_single_left_child() {
        let mut page = empty_page();
        page.set_node(1, &HeapNode::new(2, 0));
        page.set_node(2, &HeapNode::new(8, 0));
        assert_eq!(page.sift_down(&MaxFirst, 4), (false, 2));
        assert_eq!(page.priority_at(1), 8);
        assert_eq!(page.priority_at(2), 2);
    }

    #[test]
    fn sift_down_prefers_the_right_child_on_a_tie() {
        let mut page = empty_page();
        page.set_node(1, &HeapNode::new(1, 0));
        page.set_node(2, &HeapNode::new(7, 10));
        page.set_node(3, &HeapNode::new(7, 20));
        let (continues, stop) = page.sift_down(&MaxFirst, 4);
        assert!(!continues);
        assert_eq!(stop, 3);
        assert_eq!(page.node_at(1), HeapNode::new(7, 20));
        assert_eq!(page.node_at(3), HeapNode::new(1, 0));
    }

    #[test]
    fn sift_down_reaching_the_last_layer_continues() {
        let mut page = empty_page();
        page.set_node(1, &HeapNode::new(1, 0));
        page.set_node(2, &HeapNode::new(9, 0));
        page.set_node(3, &HeapNode::new(2, 0));
        page.set_node(4, &HeapNode::new(8, 0));
        page.set_node(5, &HeapNode::new(3, 0));
        let (continues, stop) = page.sift_down(&MaxFirst, 4);
        assert!(continues);
        assert_eq!(stop, 4);
        assert_eq!(page.priority_at(1), 9);
        assert_eq!(page.priority_at(2), 8);
        assert_eq!(page.priority_at(4), 1);
    }
}
