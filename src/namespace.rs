use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::info;

use crate::{
    error::QueueError,
    io,
    queue::{Queue, QueueConfiguration},
    types::QueueResult,
};

/// Identity of a namespace; its directory is named `<name>-<id>`.
#[derive(Debug, Clone, Default)]
pub struct NamespaceConfig {
    pub namespace_name: String,
    pub namespace_id: u32,
}

/// A set of queues sharing one root directory.
pub struct Namespace {
    pub name: String,
    pub id: u32,
    pub root_dir: PathBuf,
    parent_dir: PathBuf,
    queues: HashMap<u32, Queue>,
}

impl Namespace {
    pub fn new(parent: &Path, config: NamespaceConfig) -> Result<Namespace, QueueError> {
        let root_dir = parent.join(format!(
            "{}-{}",
            config.namespace_name, config.namespace_id
        ));
        io::ensure_dir_created(&root_dir)?;
        info!(
            "namespace {} ({}) at {}",
            config.namespace_name,
            config.namespace_id,
            root_dir.display()
        );
        Ok(Namespace {
            name: config.namespace_name,
            id: config.namespace_id,
            root_dir,
            parent_dir: parent.to_path_buf(),
            queues: HashMap::new(),
        })
    }

    fn config(&self) -> NamespaceConfig {
        NamespaceConfig {
            namespace_name: self.name.clone(),
            namespace_id: self.id,
        }
    }

    pub fn add_queue(&mut self, config: QueueConfiguration) -> Result<&mut Queue, QueueError> {
        let queue_id = config.queue_id;
        let queue = Queue::new(&self.parent_dir, &self.config(), config)?;
        self.queues.insert(queue_id, queue);
        Ok(self.queues.get_mut(&queue_id).unwrap())
    }

    pub fn get_queue(&mut self, queue_id: u32) -> Option<&mut Queue> {
        self.queues.get_mut(&queue_id)
    }

    /// Fetch a queue, creating it on first use.
    pub fn load_queue(&mut self, config: QueueConfiguration) -> Result<&mut Queue, QueueError> {
        if self.queues.contains_key(&config.queue_id) {
            return Ok(self.queues.get_mut(&config.queue_id).unwrap());
        }
        self.add_queue(config)
    }

    /// Drop the in-memory handle and remove the queue's directory.
    pub fn delete_queue(&mut self, queue_id: u32) -> QueueResult {
        if let Some(queue) = self.queues.remove(&queue_id) {
            queue.delete()?;
        }
        io::ensure_dir_deleted(&self.root_dir.join(queue_id.to_string()))
    }
}
