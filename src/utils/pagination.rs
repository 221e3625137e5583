//! Fixed-size pagination over an ordered listing.
//!
//! The requested page number comes straight from the query string, so it is
//! resolved leniently: anything missing or non-numeric serves the first page,
//! anything below 1 serves the first page and anything past the end serves the
//! last page. An empty listing still has exactly one (empty) page.

/// Number of files shown per listing page.
pub const FILES_PER_PAGE: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based number of the page actually served.
    pub number: usize,
    pub num_pages: usize,
    /// Total number of items across all pages.
    pub count: usize,
    per_page: usize,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_other_pages(&self) -> bool {
        self.has_previous() || self.has_next()
    }

    pub fn previous_page_number(&self) -> Option<usize> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn next_page_number(&self) -> Option<usize> {
        self.has_next().then(|| self.number + 1)
    }

    /// 1-based position of the first item on this page within the whole listing.
    pub fn start_index(&self) -> usize {
        if self.count == 0 {
            0
        } else {
            (self.number - 1) * self.per_page + 1
        }
    }

    /// 1-based position of the last item on this page within the whole listing.
    pub fn end_index(&self) -> usize {
        if self.number == self.num_pages {
            self.count
        } else {
            self.number * self.per_page
        }
    }
}

/// Total number of pages for `count` items, never less than one.
pub fn num_pages(count: usize, per_page: usize) -> usize {
    if count == 0 {
        1
    } else {
        count.div_ceil(per_page.max(1))
    }
}

/// Resolves a raw page parameter to a valid 1-based page number.
pub fn resolve_page_number(requested: Option<&str>, num_pages: usize) -> usize {
    let Some(raw) = requested.map(str::trim).filter(|s| !s.is_empty()) else {
        return 1;
    };

    match raw.parse::<i64>() {
        Ok(n) if n < 1 => 1,
        Ok(n) => usize::try_from(n).map_or(num_pages, |n| n.min(num_pages)),
        // Integer literals that overflow are still out of range, not garbage.
        Err(_) if is_integer_literal(raw) => {
            if raw.starts_with('-') {
                1
            } else {
                num_pages
            }
        }
        Err(_) => 1,
    }
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(&['+', '-'][..]).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// The slice of a listing a request resolves to, computed from the total
/// count alone so the store only has to load the rows on that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub per_page: usize,
}

impl PageWindow {
    pub fn resolve(count: usize, per_page: usize, requested: Option<&str>) -> Self {
        let per_page = per_page.max(1);
        let num_pages = num_pages(count, per_page);
        Self {
            number: resolve_page_number(requested, num_pages),
            num_pages,
            count,
            per_page,
        }
    }

    /// Number of items before the first one on this page.
    pub fn offset(&self) -> usize {
        (self.number - 1) * self.per_page
    }

    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            per_page: self.per_page,
        }
    }
}

/// Slices `items` into pages of `per_page` and returns the requested one.
pub fn paginate<T>(items: Vec<T>, per_page: usize, requested: Option<&str>) -> Page<T> {
    let window = PageWindow::resolve(items.len(), per_page, requested);

    let items = items
        .into_iter()
        .skip(window.offset())
        .take(window.per_page)
        .collect();

    window.into_page(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: usize) -> Vec<usize> {
        (1..=n).collect()
    }

    #[test]
    fn test_pages_cover_listing_in_order() {
        for n in 0..=10 {
            let first = paginate(numbers(n), FILES_PER_PAGE, None);
            let expected_pages = if n == 0 { 1 } else { n.div_ceil(3) };
            assert_eq!(first.num_pages, expected_pages, "n = {n}");

            let mut seen = Vec::new();
            for page_number in 1..=first.num_pages {
                let requested = page_number.to_string();
                let page = paginate(numbers(n), FILES_PER_PAGE, Some(&requested));
                assert_eq!(page.number, page_number);
                assert!(page.len() <= FILES_PER_PAGE);
                seen.extend(page.items);
            }
            assert_eq!(seen, numbers(n));
        }
    }

    #[test]
    fn test_missing_or_garbage_page_serves_first() {
        for requested in [None, Some(""), Some("  "), Some("abc"), Some("2.0"), Some("1e3")] {
            let page = paginate(numbers(7), FILES_PER_PAGE, requested);
            assert_eq!(page.number, 1, "requested = {requested:?}");
            assert_eq!(page.items, vec![1, 2, 3]);
        }
    }

    #[test]
    fn test_out_of_range_pages_are_clamped() {
        assert_eq!(paginate(numbers(7), 3, Some("0")).number, 1);
        assert_eq!(paginate(numbers(7), 3, Some("-4")).number, 1);
        assert_eq!(paginate(numbers(7), 3, Some("-99999999999999999999")).number, 1);

        let last = paginate(numbers(7), 3, Some("9"));
        assert_eq!(last.number, 3);
        assert_eq!(last.items, vec![7]);

        let huge = paginate(numbers(7), 3, Some("99999999999999999999"));
        assert_eq!(huge.number, 3);
    }

    #[test]
    fn test_empty_listing_has_single_empty_page() {
        let page = paginate(Vec::<usize>::new(), FILES_PER_PAGE, Some("5"));
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(page.is_empty());
        assert!(!page.has_other_pages());
        assert_eq!(page.start_index(), 0);
        assert_eq!(page.end_index(), 0);
    }

    #[test]
    fn test_navigation_metadata() {
        let middle = paginate(numbers(8), 3, Some("2"));
        assert!(middle.has_previous());
        assert!(middle.has_next());
        assert_eq!(middle.previous_page_number(), Some(1));
        assert_eq!(middle.next_page_number(), Some(3));
        assert_eq!(middle.start_index(), 4);
        assert_eq!(middle.end_index(), 6);

        let last = paginate(numbers(8), 3, Some("3"));
        assert!(!last.has_next());
        assert_eq!(last.next_page_number(), None);
        assert_eq!(last.start_index(), 7);
        assert_eq!(last.end_index(), 8);
        assert_eq!(last.count, 8);
    }

    #[test]
    fn test_window_matches_in_memory_pagination() {
        for requested in [None, Some("2"), Some("3"), Some("0"), Some("99"), Some("abc")] {
            let window = PageWindow::resolve(7, FILES_PER_PAGE, requested);
            let items: Vec<usize> = numbers(7)
                .into_iter()
                .skip(window.offset())
                .take(window.per_page)
                .collect();

            assert_eq!(
                window.into_page(items),
                paginate(numbers(7), FILES_PER_PAGE, requested),
                "requested = {requested:?}"
            );
        }

        let empty = PageWindow::resolve(0, FILES_PER_PAGE, Some("4"));
        assert_eq!(empty.number, 1);
        assert_eq!(empty.offset(), 0);
    }
}
