use std::path::{Path, PathBuf};

use log::debug;

use crate::{
    error::{ErrorKind, QueueError},
    heap::mapper::locate,
    heap::node::{HeapNode, NodeLayout},
    heap::order::{MaxFirst, PriorityOrder},
    heap::page_cache::PageCache,
    io,
    types::QueueResult,
};

/// Tunables for a paged heap. `height` is the height of each page's
/// sub-heap, so a page holds `2^height - 1` nodes. `capacity` bounds the
/// node count when set; the paged layout itself can grow without limit.
#[derive(Debug, Clone)]
pub struct HeapOptions {
    pub height: u32,
    pub priority_size: usize,
    pub cursor_size: usize,
    pub capacity: Option<u64>,
}

impl Default for HeapOptions {
    fn default() -> Self {
        HeapOptions {
            height: 5,
            priority_size: 8,
            cursor_size: 8,
            capacity: None,
        }
    }
}

struct HeapConfig {
    pages_path: PathBuf,
    height: u32,
    layout: NodeLayout,
    node_size: usize,
    page_nodes: u64,
    last_layer_nodes: u64,
    page_size: usize,
    capacity: Option<u64>,
}

impl HeapConfig {
    fn build(pages_path: PathBuf, options: &HeapOptions) -> Result<HeapConfig, QueueError> {
        if options.height < 2 {
            return Err(QueueError::invalid("page height must be at least 2"));
        }
        if options.priority_size < 1
            || options.priority_size > 8
            || options.cursor_size < 1
            || options.cursor_size > 8
        {
            return Err(QueueError::invalid("field sizes must be between 1 and 8 bytes"));
        }
        let layout = NodeLayout {
            priority_size: options.priority_size,
            cursor_size: options.cursor_size,
        };
        let node_size = layout.node_size();
        let page_nodes = (1u64 << options.height) - 1;
        Ok(HeapConfig {
            pages_path,
            height: options.height,
            layout,
            node_size,
            page_nodes,
            last_layer_nodes: 1u64 << (options.height - 1),
            page_size: node_size * page_nodes as usize,
            capacity: options.capacity,
        })
    }
}

/// A max-heap of (priority, cursor) pairs laid out over fixed-size disk
/// pages, each page being a complete sub-heap. Slot 1 of every non-first
/// page duplicates the leaf of its parent page, so each page heapifies in
/// isolation and an ascent or descent touches at most one page per level.
///
/// Single-owner: the one-slot page cache makes interleaved access unsafe,
/// so callers sharing a heap across threads must serialize externally.
pub struct PagedHeap<C: PriorityOrder = MaxFirst> {
    total_nodes: u64,
    total_pages: u64,
    config: HeapConfig,
    cache: PageCache,
    order: C,
}

impl PagedHeap<MaxFirst> {
    /// Open (or create) the heap stored at `dir/pages` with the default
    /// highest-first order.
    pub fn open(dir: &Path, options: HeapOptions) -> Result<Self, QueueError> {
        PagedHeap::open_with(dir, options, MaxFirst)
    }
}

impl<C: PriorityOrder> PagedHeap<C> {
    /// Open (or create) the heap stored at `dir/pages` ranking priorities
    /// with `order`. An existing pages file is scanned linearly to recover
    /// the node and page counts; the scan is advisory and does not repair
    /// a torn write.
    pub fn open_with(dir: &Path, options: HeapOptions, order: C) -> Result<Self, QueueError> {
        io::ensure_dir_created(dir)?;
        let config = HeapConfig::build(dir.join("pages"), &options)?;

        let (total_nodes, total_pages) = if io::file_exists(&config.pages_path) {
            recount(&config)?
        } else {
            io::ensure_file_created(&config.pages_path)?;
            (0, 0)
        };
        debug!(
            "heap at {}: {} nodes over {} pages",
            config.pages_path.display(),
            total_nodes,
            total_pages
        );

        let cache = PageCache::new(config.pages_path.clone(), config.page_size, config.layout);
        Ok(PagedHeap {
            total_nodes,
            total_pages,
            config,
            cache,
            order,
        })
    }

    pub fn len(&self) -> u64 {
        self.total_nodes
    }

    pub fn is_empty(&self) -> bool {
        self.total_nodes == 0
    }

    pub fn page_count(&self) -> u64 {
        self.total_pages
    }

    /// Insert a node at global index `total_nodes + 1` and lift it until
    /// the order holds again.
    pub fn push(&mut self, node: HeapNode) -> QueueResult {
        if node.priority == 0 {
            return Err(QueueError::new(
                ErrorKind::PriorityZero,
                "priority 0 is the empty-slot sentinel",
            ));
        }
        if let Some(capacity) = self.config.capacity {
            if self.total_nodes >= capacity {
                return Err(QueueError::new(
                    ErrorKind::Full,
                    "heap reached its configured capacity",
                ));
            }
        }

        if self.total_nodes == 0 {
            self.cache.flush()?;
            let mut data = vec![0u8; self.config.page_size];
            let bytes = node.encode(&self.config.layout);
            data[..bytes.len()].copy_from_slice(&bytes);
            self.cache.save_new(1, data);
            self.total_pages += 1;
        } else {
            self.heapify_up(self.total_nodes + 1, node)?;
        }
        self.total_nodes += 1;
        self.cache.commit()
    }

    /// Remove and return the top node. The last node takes the root's
    /// place and sinks back down, page by page.
    pub fn pop(&mut self) -> Result<HeapNode, QueueError> {
        if self.total_nodes == 0 {
            return Err(QueueError::empty("heap is empty"));
        }
        if self.total_nodes == 1 {
            let root = {
                let page = self.cache.load(1)?;
                let root = page.node_at(1);
                page.zero_slot(1);
                root
            };
            self.total_nodes -= 1;
            self.total_pages -= 1;
            self.cache.commit()?;
            return Ok(root);
        }

        let root = self.peek()?;
        let last_loc = locate(self.total_nodes, self.config.height);
        let last = {
            let page = self.cache.load(last_loc.page)?;
            let last = page.node_at(last_loc.slot);
            page.zero_slot(last_loc.slot);
            if last_loc.slot == 2 && last_loc.page != 1 {
                // that was the page's only real node; the duplicated root
                // goes with it and the page stops counting
                page.zero_slot(1);
            }
            last
        };
        self.total_nodes -= 1;
        if last_loc.slot == 2 && last_loc.page != 1 {
            self.total_pages -= 1;
        }
        self.heapify_down(last)?;
        self.cache.commit()?;
        Ok(root)
    }

    /// Read the top node without removing it.
    pub fn peek(&mut self) -> Result<HeapNode, QueueError> {
        if self.total_nodes == 0 {
            return Err(QueueError::empty("heap is empty"));
        }
        let node_size = self.config.node_size;
        let page = self.cache.load(1)?;
        if page.data().len() < node_size {
            return Err(QueueError::empty("heap is empty"));
        }
        Ok(page.node_at(1))
    }

    /// Overwrite the cursor of the root node in place.
    pub fn set_root_cursor(&mut self, cursor: u64) -> QueueResult {
        if self.total_nodes == 0 {
            return Err(QueueError::empty("heap is empty"));
        }
        let page = self.cache.load(1)?;
        page.set_cursor(1, cursor);
        self.cache.commit()
    }

    fn heapify_up(&mut self, global_index: u64, node: HeapNode) -> QueueResult {
        let loc = locate(global_index, self.config.height);
        if loc.slot == 2 && loc.page != 1 {
            // First node of a page that does not exist yet. Its slot-1
            // duplicate is the parent page's leaf holding the global
            // parent.
            let parent_loc = locate(global_index / 2, self.config.height);
            let parent_bytes = {
                let page = self.cache.load(parent_loc.page)?;
                page.slot_bytes(parent_loc.slot)
            };
            self.cache.flush()?;
            let mut data = vec![0u8; self.config.page_size];
            data[..parent_bytes.len()].copy_from_slice(&parent_bytes);
            self.cache.save_new(loc.page, data);
            self.total_pages += 1;
        }

        let mut index = global_index;
        let mut previous_page = 0u64;
        loop {
            let loc = locate(index, self.config.height);
            let (rose, slot_bytes) = {
                let page = self.cache.load(loc.page)?;
                page.set_node(loc.slot, &node);
                let rose = page.sift_up(loc.slot, &self.order);
                (rose, page.slot_bytes(loc.slot))
            };
            if previous_page != 0 {
                // whatever sank into this slot mirrors the root of the
                // page we just left
                self.flush_slot_to_disk(previous_page, 1, &slot_bytes)?;
            }
            if loc.page == 1 || !rose {
                break;
            }
            previous_page = loc.page;
            // ascending the slot's local levels lands on the parent-page
            // leaf that duplicates this page's root
            index >>= loc.level;
        }
        Ok(())
    }

    fn heapify_down(&mut self, node: HeapNode) -> QueueResult {
        let mut page_number = 1u64;
        let mut previous: Option<(u64, u64)> = None;
        loop {
            let (continues, last_slot, root_bytes) = {
                let page = self.cache.load(page_number)?;
                page.set_node(1, &node);
                let (continues, last_slot) =
                    page.sift_down(&self.order, self.config.last_layer_nodes);
                (continues, last_slot, page.slot_bytes(1))
            };
            if let Some((previous_page, previous_slot)) = previous {
                // the parent page's leaf duplicates this page's new root
                self.flush_slot_to_disk(previous_page, previous_slot, &root_bytes)?;
            }
            if !continues {
                break;
            }
            previous = Some((page_number, last_slot));
            page_number = self.config.last_layer_nodes * (page_number - 1)
                + (last_slot - self.config.last_layer_nodes + 1)
                + 1;
            if page_number > self.total_pages {
                break;
            }
        }
        Ok(())
    }

    /// Write one node's bytes straight into `page_number`'s `slot` on
    /// disk, bypassing the cache. Sound only when the cache does not hold
    /// `page_number` and the bytes were computed for the page's current
    /// on-disk image. Cross-page heapify satisfies both: the target page
    /// was committed when the cache moved past it, and only the one slot
    /// mirroring the current page's root is rewritten. Audit every new
    /// call site against that precondition.
    fn flush_slot_to_disk(&self, page_number: u64, slot: u64, bytes: &[u8]) -> QueueResult {
        debug_assert_ne!(self.cache.held_page(), page_number);
        let offset = (page_number - 1) * self.config.page_size as u64
            + (slot - 1) * self.config.node_size as u64;
        io::write_bytes(&self.config.pages_path, offset, bytes)
    }
}

/// Linear advisory scan of an existing pages file: counts live nodes and
/// non-empty pages. Duplicated roots of non-first pages do not count.
fn recount(config: &HeapConfig) -> Result<(u64, u64), QueueError> {
    let mut nodes = 0u64;
    let mut pages = 0u64;
    let mut number = 1u64;
    loop {
        let offset = (number - 1) * config.page_size as u64;
        let data = io::read_bytes(&config.pages_path, offset, config.page_size)?;
        if data.is_empty() {
            break;
        }
        let mut nodes_in_page = 0u64;
        for slot in 1..=config.page_nodes {
            let start = (slot - 1) as usize * config.node_size;
            if start >= data.len() {
                break;
            }
            let end = (start + config.node_size).min(data.len());
            let node = HeapNode::decode(&data[start..end], &config.layout);
            if node.priority == 0 || (slot == 1 && number != 1) {
                continue;
            }
            nodes_in_page += 1;
        }
        nodes += nodes_in_page;
        if nodes_in_page > 0 {
            pages += 1;
        }
        number += 1;
    }
    Ok((nodes, pages))
}
