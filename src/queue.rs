use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::info;
use uuid::Uuid;

use crate::{
    error::{ErrorKind, QueueError},
    heap::{HeapNode, HeapOptions, PagedHeap},
    io,
    namespace::NamespaceConfig,
    types::QueueResult,
};

/// Width of one record in a priority log.
pub const MESSAGE_ID_SIZE: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct QueueConfiguration {
    pub queue_id: u32,
    pub queue_name: String,
    pub enable_dlq: bool,
    pub enable_invisible: bool,
}

/// A message identifier waiting at some priority. The nil UUID is the
/// empty-record sentinel and never a valid id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueItem {
    pub message_id: Uuid,
    pub priority: u64,
}

/// A durable priority queue: a paged heap holding one (priority, cursor)
/// node per active priority, plus one append-only log of message ids per
/// priority. Highest priority first; FIFO within a priority, because the
/// log grows at the tail while the cursor consumes from the head.
pub struct Queue {
    pub id: u32,
    pub name: String,
    pub root_dir: PathBuf,
    main: PagedHeap,
    indexes_dir: PathBuf,
    invisible: Option<PagedHeap>,
    dlq: Option<PagedHeap>,
}

impl Queue {
    /// Create or reopen the queue rooted at
    /// `<root>/<namespace-name>-<namespace-id>/<queue-id>`. The `dlq` and
    /// `invisible` sibling trees are laid out eagerly when enabled.
    pub fn new(
        root: &Path,
        namespace: &NamespaceConfig,
        config: QueueConfiguration,
    ) -> Result<Queue, QueueError> {
        let namespace_dir = root.join(format!(
            "{}-{}",
            namespace.namespace_name, namespace.namespace_id
        ));
        let root_dir = namespace_dir.join(config.queue_id.to_string());
        io::ensure_dir_created(&root_dir)?;

        let main = Queue::open_tree(&root_dir, "main")?;
        let invisible = if config.enable_invisible {
            Some(Queue::open_tree(&root_dir, "invisible")?)
        } else {
            None
        };
        let dlq = if config.enable_dlq {
            Some(Queue::open_tree(&root_dir, "dlq")?)
        } else {
            None
        };
        info!(
            "queue {} ({}) opened at {}",
            config.queue_id,
            config.queue_name,
            root_dir.display()
        );

        Ok(Queue {
            id: config.queue_id,
            name: config.queue_name,
            indexes_dir: root_dir.join("main").join("indexes"),
            root_dir,
            main,
            invisible,
            dlq,
        })
    }

    fn open_tree(root_dir: &Path, tree: &str) -> Result<PagedHeap, QueueError> {
        let dir = root_dir.join(tree);
        let mut options = HeapOptions::default();
        // one node per active priority, capped at the first page's last
        // layer; distinct-priority counts beyond this are rejected as Full
        options.capacity = Some(1u64 << (options.height - 1));
        let heap = PagedHeap::open(&dir, options)?;
        io::ensure_dir_created(&dir.join("indexes"))?;
        Ok(heap)
    }

    fn index_path(&self, priority: u64) -> PathBuf {
        self.indexes_dir.join(priority.to_string())
    }

    /// Append a message id under its priority. A first-seen priority is
    /// pushed into the heap with cursor 0; the heap tracks priorities, not
    /// messages, so later arrivals only grow the log.
    pub fn enqueue(&mut self, item: &QueueItem) -> QueueResult {
        if item.priority == 0 {
            return Err(QueueError::new(
                ErrorKind::PriorityZero,
                "priority 0 is reserved",
            ));
        }
        let index_path = self.index_path(item.priority);
        if !io::file_exists(&index_path) {
            self.main.push(HeapNode::new(item.priority, 0))?;
        }
        io::append_bytes(&index_path, item.message_id.as_bytes())
    }

    /// Remove and return the highest-priority id. Reads the record at the
    /// cursor together with its successor; a missing or all-zero successor
    /// means the priority is exhausted, so its log is deleted and the heap
    /// pops. Otherwise only the root cursor advances.
    pub fn dequeue(&mut self) -> Result<QueueItem, QueueError> {
        let root = self.main.peek()?;
        let index_path = self.index_path(root.priority);
        let data = io::read_bytes(
            &index_path,
            root.cursor * MESSAGE_ID_SIZE as u64,
            2 * MESSAGE_ID_SIZE,
        )?;
        let message_id = decode_record(&data)?;

        let exhausted = data.len() < 2 * MESSAGE_ID_SIZE
            || data[MESSAGE_ID_SIZE..2 * MESSAGE_ID_SIZE].iter().all(|b| *b == 0);
        if exhausted {
            io::ensure_file_deleted(&index_path)?;
            self.main.pop()?;
        } else {
            self.main.set_root_cursor(root.cursor + 1)?;
        }
        Ok(QueueItem {
            message_id,
            priority: root.priority,
        })
    }

    /// Read the highest-priority id without consuming it.
    pub fn peek(&mut self) -> Result<QueueItem, QueueError> {
        let root = self.main.peek()?;
        let data = io::read_bytes(
            &self.index_path(root.priority),
            root.cursor * MESSAGE_ID_SIZE as u64,
            MESSAGE_ID_SIZE,
        )?;
        let message_id = decode_record(&data)?;
        Ok(QueueItem {
            message_id,
            priority: root.priority,
        })
    }

    /// True when nothing is deliverable: an empty heap, a missing log, or
    /// a sentinel record at the cursor all count as empty.
    pub fn is_empty(&mut self) -> Result<bool, QueueError> {
        let root = match self.main.peek() {
            Ok(root) => root,
            Err(e) => {
                return if e.kind() == ErrorKind::Empty {
                    Ok(true)
                } else {
                    Err(e)
                };
            }
        };
        let index_path = self.index_path(root.priority);
        if !io::file_exists(&index_path) {
            return Ok(true);
        }
        let data = io::read_bytes(
            &index_path,
            root.cursor * MESSAGE_ID_SIZE as u64,
            MESSAGE_ID_SIZE,
        )?;
        if data.len() < MESSAGE_ID_SIZE || data.iter().all(|b| *b == 0) {
            return Ok(true);
        }
        Ok(false)
    }

    /// Node and page counts per tree.
    pub fn stats(&self) -> HashMap<String, u64> {
        let mut stats = HashMap::new();
        stats.insert("main_priorities".to_string(), self.main.len());
        stats.insert("main_pages".to_string(), self.main.page_count());
        if let Some(heap) = &self.invisible {
            stats.insert("invisible_priorities".to_string(), heap.len());
        }
        if let Some(heap) = &self.dlq {
            stats.insert("dlq_priorities".to_string(), heap.len());
        }
        stats
    }

    /// Remove the queue directory and everything under it.
    pub fn delete(self) -> QueueResult {
        info!("deleting queue {} at {}", self.id, self.root_dir.display());
        io::ensure_dir_deleted(&self.root_dir)
    }
}

fn decode_record(data: &[u8]) -> Result<Uuid, QueueError> {
    if data.len() < MESSAGE_ID_SIZE {
        return Err(QueueError::empty("no record at the log cursor"));
    }
    let id = Uuid::from_slice(&data[..MESSAGE_ID_SIZE])
        .map_err(|e| QueueError::new(ErrorKind::Corrupt, &format!("bad message id: {}", e)))?;
    if id.is_nil() {
        return Err(QueueError::new(
            ErrorKind::Corrupt,
            "nil message id at a live cursor",
        ));
    }
    Ok(id)
}
