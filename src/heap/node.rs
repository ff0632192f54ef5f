/// Byte widths of the two fields of an on-disk heap node. Values are
/// little-endian; widths up to 8 bytes each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLayout {
    pub priority_size: usize,
    pub cursor_size: usize,
}

impl NodeLayout {
    pub fn node_size(&self) -> usize {
        self.priority_size + self.cursor_size
    }
}

impl Default for NodeLayout {
    fn default() -> Self {
        NodeLayout {
            priority_size: 8,
            cursor_size: 8,
        }
    }
}

/// A (priority, cursor) pair. Priority 0 marks an empty slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapNode {
    pub priority: u64,
    pub cursor: u64,
}

impl HeapNode {
    pub const EMPTY: HeapNode = HeapNode {
        priority: 0,
        cursor: 0,
    };

    pub fn new(priority: u64, cursor: u64) -> HeapNode {
        HeapNode { priority, cursor }
    }

    pub fn is_empty(&self) -> bool {
        self.priority == 0
    }

    /// Serialize little-endian, priority first, into `N = P + I` bytes.
    pub fn encode(&self, layout: &NodeLayout) -> Vec<u8> {
        let mut buf = vec![0u8; layout.node_size()];
        buf[..layout.priority_size]
            .copy_from_slice(&self.priority.to_le_bytes()[..layout.priority_size]);
        buf[layout.priority_size..]
            .copy_from_slice(&self.cursor.to_le_bytes()[..layout.cursor_size]);
        buf
    }

    /// Decode from up to `N` bytes. Missing bytes read as zero, so a short
    /// or empty slice yields the empty node.
    pub fn decode(data: &[u8], layout: &NodeLayout) -> HeapNode {
        HeapNode {
            priority: read_le(data, 0, layout.priority_size),
            cursor: read_le(data, layout.priority_size, layout.cursor_size),
        }
    }
}

fn read_le(data: &[u8], offset: usize, size: usize) -> u64 {
    let mut buf = [0u8; 8];
    let end = (offset + size).min(data.len());
    if offset < end {
        buf[..end - offset].copy_from_slice(&data[offset..end]);
    }
    u64::from_le_bytes(buf)
}
