pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const PAGE_SIZE_CHOICES: [u32; 5] = [10, 20, 30, 40, 50];

/// Page position over a server-side list. A `page_size` of 0 means the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 0,
            total_items: 0,
        }
    }
}

impl Pager {
    pub fn effective_page_size(&self) -> u32 {
        if self.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size
        }
    }

    pub fn total_pages(&self) -> u32 {
        let size = u64::from(self.effective_page_size());
        let pages = self.total_items.div_ceil(size);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Moves forward, returning whether the page changed.
    pub fn next(&mut self) -> bool {
        if self.has_next() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn previous(&mut self) -> bool {
        if self.has_previous() {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// A new search term starts over from the first page.
    pub fn restart(&mut self) {
        self.page = 1;
    }

    pub fn set_page_size(&mut self, size: u32) {
        self.page_size = size;
        self.page = 1;
    }

    pub fn record_total(&mut self, total_items: u64) {
        self.total_items = total_items;
    }

    pub fn summary(&self) -> String {
        format!("Page {} of {}", self.page, self.total_pages())
    }
}
