use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Page selection as it arrives from a query string. `page` is kept raw so
/// that malformed values can fall back to the first page instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default)]
    pub page: Option<String>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page: None,
        }
    }
}

impl PageRequest {
    pub fn number(page: u64) -> Self {
        Self {
            page: Some(page.to_string()),
            ..Self::default()
        }
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    page_size: u64,
}

impl Paginator {
    pub fn new(count: u64, page_size: u64) -> Self {
        Self {
            count,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// An empty result set still has one (empty) page.
    pub fn num_pages(&self) -> u64 {
        self.count.div_ceil(self.page_size).max(1)
    }

    /// Resolves a raw page number: missing or non-numeric input selects the
    /// first page, anything outside `1..=num_pages` selects the last one.
    pub fn resolve(&self, raw: Option<&str>) -> u64 {
        let Some(raw) = raw.map(str::trim) else {
            return 1;
        };
        match raw.parse::<i64>() {
            Ok(n) if n >= 1 && (n as u64) <= self.num_pages() => n as u64,
            Ok(_) => self.num_pages(),
            Err(_) if is_integer_literal(raw) => self.num_pages(),
            Err(_) => 1,
        }
    }

    pub fn offset(&self, number: u64) -> u64 {
        (number.max(1) - 1) * self.page_size
    }

    pub fn page<T>(&self, number: u64, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number,
            num_pages: self.num_pages(),
            count: self.count,
            page_size: self.page_size,
        }
    }
}

// overflowing i64 is still a page number, just an out-of-range one
fn is_integer_literal(raw: &str) -> bool {
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_page_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }

    /// 1-based index of the first item on this page, 0 for an empty page.
    pub fn start_index(&self) -> u64 {
        if self.count == 0 {
            return 0;
        }
        (self.number - 1) * self.page_size + 1
    }

    pub fn end_index(&self) -> u64 {
        if self.number == self.num_pages {
            return self.count;
        }
        self.number * self.page_size
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
