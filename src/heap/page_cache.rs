use std::path::PathBuf;

use log::debug;

use crate::{
    error::QueueError,
    heap::node::NodeLayout,
    heap::page::Page,
    io,
    types::QueueResult,
};

/// One-slot cache over the pages file. At most one page lives in memory at
/// a time; loading another commits the held page first. That commit-before-
/// evict discipline is what keeps cross-page heapify sound: once the cache
/// has moved past a page, the page's on-disk image is current.
pub struct PageCache {
    pages_path: PathBuf,
    page_size: usize,
    layout: NodeLayout,
    current: Option<Page>,
}

impl PageCache {
    pub fn new(pages_path: PathBuf, page_size: usize, layout: NodeLayout) -> PageCache {
        PageCache {
            pages_path,
            page_size,
            layout,
            current: None,
        }
    }

    /// Bring page `number` into the cache, committing whatever it held. A
    /// read past the end of the pages file yields a short page, which reads
    /// as empty slots.
    pub fn load(&mut self, number: u64) -> Result<&mut Page, QueueError> {
        debug_assert!(number >= 1);
        if self.held_page() != number {
            self.commit()?;
            let offset = (number - 1) * self.page_size as u64;
            let data = io::read_bytes(&self.pages_path, offset, self.page_size)?;
            debug!("page {} loaded ({} bytes)", number, data.len());
            self.current = Some(Page::new(number, self.layout, data));
        }
        Ok(self.current.as_mut().unwrap())
    }

    /// Commit and drop the held page. Must run before `save_new` grows the
    /// file with a brand-new tail page.
    pub fn flush(&mut self) -> QueueResult {
        self.commit()?;
        self.current = None;
        Ok(())
    }

    /// Install `data` as page `number` without touching disk. The caller
    /// has just called `flush`, so nothing is lost by the replacement.
    pub fn save_new(&mut self, number: u64, data: Vec<u8>) {
        debug_assert!(self.current.is_none());
        self.current = Some(Page::new(number, self.layout, data));
    }

    /// Write the held page back to its slot in the pages file.
    pub fn commit(&mut self) -> QueueResult {
        if let Some(page) = &self.current {
            let offset = (page.number() - 1) * self.page_size as u64;
            io::write_bytes(&self.pages_path, offset, page.data())?;
        }
        Ok(())
    }

    /// Number of the held page, 0 when the cache is empty.
    pub fn held_page(&self) -> u64 {
        self.current.as_ref().map(|p| p.number()).unwrap_or(0)
    }
}
