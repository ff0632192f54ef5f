pub mod error;
pub mod heap;
pub mod io;
pub mod logger;
pub mod namespace;
pub mod queue;
pub mod types;
pub mod utils;

pub use error::{ErrorKind, QueueError};
pub use heap::{HeapNode, HeapOptions, MaxFirst, MinFirst, OrderFn, PagedHeap, PriorityOrder};
pub use logger::init_log;
pub use namespace::{Namespace, NamespaceConfig};
pub use queue::{Queue, QueueConfiguration, QueueItem, MESSAGE_ID_SIZE};
