use serde::Serialize;

pub const POSTS_PER_PAGE: u32 = 10;

/// Which slice of a list a requested page maps to.
///
/// A missing or malformed page number falls back to the first page and a
/// number past the end is clamped to the last one, so a valid request
/// never ends in an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u32,
    pub num_pages: u32,
    pub per_page: u32,
    pub count: u32,
}

impl PageWindow {
    pub fn new(count: u32, per_page: u32, requested: Option<&str>) -> Self {
        let num_pages = if count == 0 {
            1
        } else {
            (count + per_page - 1) / per_page
        };
        let number = requested
            .and_then(|page| page.trim().parse::<u32>().ok())
            .filter(|page| *page >= 1)
            .map(|page| page.min(num_pages))
            .unwrap_or(1);
        PageWindow {
            number,
            num_pages,
            per_page,
            count,
        }
    }

    pub fn offset(&self) -> u32 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> u32 {
        self.per_page
    }

    pub fn into_page<T>(self, object_list: Vec<T>) -> Page<T> {
        Page {
            has_previous: self.number > 1,
            has_next: self.number < self.num_pages,
            previous_page_number: self.number.saturating_sub(1).max(1),
            next_page_number: (self.number + 1).min(self.num_pages),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            object_list,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    pub count: u32,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: u32,
    pub next_page_number: u32,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            object_list: self.object_list.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            has_previous: self.has_previous,
            has_next: self.has_next,
            previous_page_number: self.previous_page_number,
            next_page_number: self.next_page_number,
        }
    }
}
