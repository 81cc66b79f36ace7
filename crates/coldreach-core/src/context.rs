//! Research Context: labelled facts accumulated while a run executes
use serde::{Deserialize, Serialize};

pub const SEARCH_NEWS: &str = "search:news";
pub const SEARCH_ABOUT: &str = "search:about";
pub const SCRAPE_HOMEPAGE: &str = "scrape:homepage";

/// Marker stored when a query ran and came back empty.
pub const NO_RESULTS: &str = "(no results)";

const ELLIPSIS: &str = " ...";

/// Character budget applied by [`ResearchContext::render_for_prompt`].
///
/// Search entries are capped first; scrape entries share whatever the
/// search entries leave of `total_chars`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextBudget {
    pub total_chars: usize,
    pub search_entry_chars: usize,
    pub scrape_entry_chars: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            total_chars: 8000,
            search_entry_chars: 2000,
            scrape_entry_chars: 6000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Search,
    Scrape,
}

impl SourceKind {
    /// Anything not labelled `search:*` is budgeted like scraped text.
    pub fn of(label: &str) -> Self {
        if label.starts_with("search:") {
            SourceKind::Search
        } else {
            SourceKind::Scrape
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResearchContext {
    entries: Vec<ContextEntry>,
}

impl ResearchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `text` under `label`. A repeated label replaces the text but
    /// keeps its original position.
    pub fn append(&mut self, label: impl Into<String>, text: impl Into<String>) {
        let label = label.into();
        let text = text.into();
        match self.entries.iter_mut().find(|e| e.label == label) {
            Some(entry) => entry.text = text,
            None => self.entries.push(ContextEntry { label, text }),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.text.as_str())
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Concatenate entries in insertion order under `### label` headers.
    pub fn render_for_prompt(&self, budget: &ContextBudget) -> String {
        let search_used: usize = self
            .entries
            .iter()
            .filter(|e| SourceKind::of(&e.label) == SourceKind::Search)
            .map(|e| e.text.chars().count().min(budget.search_entry_chars))
            .sum();
        let mut scrape_left = budget.total_chars.saturating_sub(search_used);

        let mut blocks = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let text = match SourceKind::of(&entry.label) {
                SourceKind::Search => shorten(&entry.text, budget.search_entry_chars),
                SourceKind::Scrape => {
                    let cap = budget.scrape_entry_chars.min(scrape_left);
                    let text = shorten(&entry.text, cap);
                    scrape_left = scrape_left.saturating_sub(text.chars().count());
                    text
                }
            };
            if text.is_empty() {
                continue;
            }
            blocks.push(format!("### {}\n{}", entry.label, text));
        }
        blocks.join("\n\n")
    }
}

/// Truncate to at most `max_chars` characters, marking the cut with ` ...`.
pub fn shorten(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= ELLIPSIS.len() {
        return text.chars().take(max_chars).collect();
    }
    let kept: String = text.chars().take(max_chars - ELLIPSIS.len()).collect();
    format!("{}{}", kept.trim_end(), ELLIPSIS)
}

/// Stable fingerprint of rendered prompt text.
pub fn fingerprint(text: &str) -> String {
    format!("blake3:{}", blake3::hash(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_insertion_order() {
        let mut ctx = ResearchContext::new();
        ctx.append(SEARCH_NEWS, "news");
        ctx.append(SEARCH_ABOUT, "about");
        ctx.append(SCRAPE_HOMEPAGE, "home");
        assert_eq!(ctx.labels(), vec![SEARCH_NEWS, SEARCH_ABOUT, SCRAPE_HOMEPAGE]);
    }

    #[test]
    fn test_append_same_label_overwrites_in_place() {
        let mut ctx = ResearchContext::new();
        ctx.append(SEARCH_NEWS, "first");
        ctx.append(SCRAPE_HOMEPAGE, "home");
        ctx.append(SEARCH_NEWS, "second");
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.get(SEARCH_NEWS), Some("second"));
        assert_eq!(ctx.labels()[0], SEARCH_NEWS);
    }

    #[test]
    fn test_render_has_headers_in_order() {
        let mut ctx = ResearchContext::new();
        ctx.append(SEARCH_NEWS, "Acme raised a round");
        ctx.append(SEARCH_ABOUT, "Acme makes widgets");
        let rendered = ctx.render_for_prompt(&ContextBudget::default());
        assert_eq!(
            rendered,
            "### search:news\nAcme raised a round\n\n### search:about\nAcme makes widgets"
        );
    }

    #[test]
    fn test_render_empty_context() {
        assert_eq!(ResearchContext::new().render_for_prompt(&ContextBudget::default()), "");
    }

    #[test]
    fn test_scrape_truncated_before_search() {
        let budget = ContextBudget {
            total_chars: 100,
            search_entry_chars: 60,
            scrape_entry_chars: 100,
        };
        let mut ctx = ResearchContext::new();
        ctx.append(SEARCH_NEWS, "n".repeat(50));
        ctx.append(SCRAPE_HOMEPAGE, "s".repeat(200));
        ctx.append(SEARCH_ABOUT, "a".repeat(30));

        let rendered = ctx.render_for_prompt(&budget);
        assert!(rendered.contains(&"n".repeat(50)));
        assert!(rendered.contains(&"a".repeat(30)));
        // 100 - (50 + 30) leaves 20 characters for the scrape entry.
        let scrape_block = rendered
            .split("\n\n")
            .find(|b| b.starts_with("### scrape:homepage"))
            .unwrap();
        let body = scrape_block.lines().nth(1).unwrap();
        assert_eq!(body.chars().count(), 20);
        assert!(body.ends_with(" ..."));
    }

    #[test]
    fn test_scrape_dropped_when_search_fills_budget() {
        let budget = ContextBudget {
            total_chars: 40,
            search_entry_chars: 40,
            scrape_entry_chars: 100,
        };
        let mut ctx = ResearchContext::new();
        ctx.append(SEARCH_NEWS, "n".repeat(80));
        ctx.append(SCRAPE_HOMEPAGE, "scraped text");
        let rendered = ctx.render_for_prompt(&budget);
        assert!(!rendered.contains("scrape:homepage"));
    }

    #[test]
    fn test_shorten_char_boundaries() {
        assert_eq!(shorten("héllo wörld", 20), "héllo wörld");
        assert_eq!(shorten("héllo wörld", 9), "héllo ...");
        assert_eq!(shorten("abcdef", 3), "abc");
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(fingerprint("abc"), fingerprint("abc"));
        assert_ne!(fingerprint("abc"), fingerprint("abd"));
        assert!(fingerprint("abc").starts_with("blake3:"));
    }
}
