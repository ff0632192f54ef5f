pub mod mapper;
pub mod node;
pub mod order;
pub mod page;
pub mod page_cache;
pub mod paged_heap;

pub use node::{HeapNode, NodeLayout};
pub use order::{MaxFirst, MinFirst, OrderFn, PriorityOrder};
pub use paged_heap::{HeapOptions, PagedHeap};
