//! Search and pagination over the loaded companies.
//!
//! The view-model keeps the full dataset, the current search term and page,
//! and recomputes the filtered list whenever either input changes. Pages are
//! 1-based; an empty result has zero pages and the page stays at 1.

use crate::company::Company;

pub const PAGE_SIZE: usize = 12;
pub const MAX_SUGGESTIONS: usize = 10;

#[derive(Debug)]
pub struct Directory {
    companies: Vec<Company>,
    search_term: String,
    current_page: usize,
    // indices into `companies`
    filtered: Vec<usize>,
}

impl Directory {
    pub fn new(companies: Vec<Company>) -> Self {
        let mut d = Self {
            companies,
            search_term: String::new(),
            current_page: 1,
            filtered: Vec::new(),
        };
        d.refilter();
        d
    }

    /// Replace the dataset. A page past the new end falls back to page 1.
    pub fn set_companies(&mut self, companies: Vec<Company>) {
        self.companies = companies;
        self.filtered = self.matching();
        if self.current_page > self.total_pages() {
            self.current_page = 1;
        }
    }

    pub fn set_search_term(&mut self, term: &str) {
        if term != self.search_term {
            self.search_term = term.to_string();
            self.current_page = 1;
        }
        self.refilter();
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_companies(&self) -> usize {
        self.companies.len()
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn filtered(&self) -> impl Iterator<Item = &Company> {
        self.filtered.iter().map(|&i| &self.companies[i])
    }

    pub fn total_pages(&self) -> usize {
        self.filtered.len().div_ceil(PAGE_SIZE)
    }

    /// The page window for `current_page`.
    pub fn page(&self) -> Vec<&Company> {
        let start = (self.current_page - 1) * PAGE_SIZE;
        self.filtered
            .iter()
            .skip(start)
            .take(PAGE_SIZE)
            .map(|&i| &self.companies[i])
            .collect()
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.current_page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.go_to_page(self.current_page.saturating_sub(1));
    }

    pub fn first_page(&mut self) {
        self.go_to_page(1);
    }

    pub fn last_page(&mut self) {
        self.go_to_page(self.total_pages());
    }

    pub fn go_to_page(&mut self, n: usize) {
        self.current_page = n.clamp(1, self.total_pages().max(1));
    }

    /// Up to ten names from the filtered list, in dataset order.
    pub fn suggestions(&self) -> Vec<&str> {
        if self.search_term.is_empty() {
            return Vec::new();
        }
        self.filtered()
            .take(MAX_SUGGESTIONS)
            .map(|c| c.name.as_str())
            .collect()
    }

    fn matching(&self) -> Vec<usize> {
        let needle = self.search_term.to_lowercase();
        self.companies
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect()
    }

    fn refilter(&mut self) {
        self.filtered = self.matching();
        self.go_to_page(self.current_page);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Escape,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CursorEvent {
    None,
    Picked(String),
    Closed,
}

/// Keyboard selection over a suggestion list.
#[derive(Debug, Default)]
pub struct SuggestionCursor {
    suggestions: Vec<String>,
    selected: Option<usize>,
}

impl SuggestionCursor {
    pub fn new(suggestions: Vec<String>) -> Self {
        Self {
            suggestions,
            selected: None,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn press(&mut self, key: Key) -> CursorEvent {
        match key {
            Key::Down => {
                if !self.suggestions.is_empty() {
                    let last = self.suggestions.len() - 1;
                    self.selected = Some(self.selected.map_or(0, |i| (i + 1).min(last)));
                }
                CursorEvent::None
            }
            Key::Up => {
                self.selected = self.selected.map(|i| i.saturating_sub(1));
                CursorEvent::None
            }
            Key::Enter => match self.selected.and_then(|i| self.suggestions.get(i)) {
                Some(s) => CursorEvent::Picked(s.clone()),
                None => CursorEvent::None,
            },
            Key::Escape => CursorEvent::Closed,
        }
    }

    /// Apply a picked suggestion to the directory as the new search term.
    pub fn pick_into(&mut self, key: Key, directory: &mut Directory) -> CursorEvent {
        let event = self.press(key);
        if let CursorEvent::Picked(name) = &event {
            directory.set_search_term(name);
        }
        event
    }
}
