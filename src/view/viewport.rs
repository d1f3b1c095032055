use std::ops::Range;

/// Paged window over the table rows. Once the offset reaches `top_threshold`
/// rows the shell offers a jump back to the first row.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    offset: usize,
    page_size: usize,
    top_threshold: usize,
}

impl Viewport {
    pub fn new(page_size: usize, top_threshold: usize) -> Self {
        Self {
            offset: 0,
            page_size: page_size.max(1),
            top_threshold,
        }
    }

    #[cfg(test)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn visible(&self, total: usize) -> Range<usize> {
        let start = self.offset.min(total);
        start..(start + self.page_size).min(total)
    }

    /// Advances one page; returns false when already on the last page.
    pub fn scroll_down(&mut self, total: usize) -> bool {
        let next = self.offset + self.page_size;
        if next >= total {
            return false;
        }
        self.offset = next;
        true
    }

    pub fn scroll_top(&mut self) {
        self.offset = 0;
    }

    pub fn shows_top_hint(&self) -> bool {
        self.offset > 0 && self.offset >= self.top_threshold
    }
}
