//! Page selections and output file naming.
//!
//! A selection is written the way people type it on a command line:
//! `"1-3,5 7"`. Tokens are separated by commas and/or whitespace, each token
//! is a page number or an inclusive `a-b` range, and a reversed range
//! (`"5-3"`) means the same as the forward one. The parsed form is a sorted,
//! de-duplicated set, so `"3,1-2"` and `"1-2,3"` are the same selection.
//!
//! The empty selection means *all pages*. Only an engine that knows the
//! document's page count can expand it, see [`PageSelection::resolve`].

use crate::error::DocToolsError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Highest page number pdfium can address (page indices are `u16`).
pub const MAX_PAGE: u32 = u16::MAX as u32;

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\s]+").unwrap());

/// A set of 1-indexed page numbers; empty means every page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    /// The selection covering every page of the document.
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse a textual selection such as `"1-3,5,7"`.
    pub fn parse(spec: &str) -> Result<Self, DocToolsError> {
        let mut pages = BTreeSet::new();

        for token in SEPARATORS.split(spec.trim()).filter(|t| !t.is_empty()) {
            match token.split_once('-') {
                Some((a, b)) => {
                    let a = parse_page(a, token)?;
                    let b = parse_page(b, token)?;
                    let (lo, hi) = if b < a { (b, a) } else { (a, b) };
                    pages.extend(lo..=hi);
                }
                None => {
                    pages.insert(parse_page(token, token)?);
                }
            }
        }

        Ok(Self { pages })
    }

    /// Build a selection from explicit page numbers.
    pub fn from_pages(pages: impl IntoIterator<Item = u32>) -> Result<Self, DocToolsError> {
        let mut set = BTreeSet::new();
        for p in pages {
            if p == 0 || p > MAX_PAGE {
                return Err(DocToolsError::InvalidPageSpec {
                    token: p.to_string(),
                    reason: format!("page numbers must be in 1..={MAX_PAGE}"),
                });
            }
            set.insert(p);
        }
        Ok(Self { pages: set })
    }

    /// `true` when no explicit pages were given.
    pub fn is_all(&self) -> bool {
        self.pages.is_empty()
    }

    /// Number of explicitly selected pages (0 for "all").
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Same as [`Self::is_all`]; provided for collection-like call sites.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    /// Selected pages in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.iter().copied()
    }

    /// Largest selected page, if any.
    pub fn max(&self) -> Option<u32> {
        self.pages.last().copied()
    }

    /// Minimum-to-maximum range covering the selection.
    pub fn span(&self) -> Option<RangeInclusive<u32>> {
        Some(*self.pages.first()?..=*self.pages.last()?)
    }

    /// Maximal gap-free runs, ascending. `"1-3,5,7-8"` → `[1..=3, 5..=5, 7..=8]`.
    pub fn runs(&self) -> Vec<RangeInclusive<u32>> {
        let mut runs: Vec<RangeInclusive<u32>> = Vec::new();
        for p in self.iter() {
            match runs.last_mut() {
                Some(run) if *run.end() + 1 == p => *run = *run.start()..=p,
                _ => runs.push(p..=p),
            }
        }
        runs
    }

    /// Expand against a document with `total` pages, silently dropping
    /// pages past the end.
    pub fn resolve(&self, total: u32) -> Vec<u32> {
        if self.is_all() {
            (1..=total).collect()
        } else {
            self.iter().filter(|&p| p <= total).collect()
        }
    }
}

impl FromStr for PageSelection {
    type Err = DocToolsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return f.write_str("all");
        }
        let parts: Vec<String> = self
            .runs()
            .into_iter()
            .map(|r| {
                if r.start() == r.end() {
                    r.start().to_string()
                } else {
                    format!("{}-{}", r.start(), r.end())
                }
            })
            .collect();
        f.write_str(&parts.join(","))
    }
}

fn parse_page(raw: &str, token: &str) -> Result<u32, DocToolsError> {
    let invalid = |reason: String| DocToolsError::InvalidPageSpec {
        token: token.to_string(),
        reason,
    };

    let n: i64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid(format!("'{raw}' is not a page number")))?;

    if n <= 0 {
        return Err(invalid("page numbers must be >= 1".into()));
    }
    if n > MAX_PAGE as i64 {
        return Err(invalid(format!("page numbers must be <= {MAX_PAGE}")));
    }
    Ok(n as u32)
}

/// Zero-padding width for page numbers: at least 2, or the digit count of
/// the largest relevant page number (or page total), whichever is larger.
pub fn pad_width(largest: u32) -> usize {
    largest.to_string().len().max(2)
}

/// `<prefix><page zero-padded to width>.<ext>`
pub fn page_file_name(prefix: &str, page: u32, width: usize, ext: &str) -> String {
    format!("{prefix}{page:0width$}.{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(spec: &str) -> Vec<u32> {
        PageSelection::parse(spec).unwrap().iter().collect()
    }

    #[test]
    fn parse_is_order_independent() {
        assert_eq!(pages("3,1-2"), vec![1, 2, 3]);
        assert_eq!(pages("1-2,3"), vec![1, 2, 3]);
        assert_eq!(
            PageSelection::parse("3,1-2").unwrap(),
            PageSelection::parse("1-2,3").unwrap()
        );
    }

    #[test]
    fn reversed_range_normalises() {
        assert_eq!(pages("5-3"), pages("3-5"));
        assert_eq!(pages("5-3"), vec![3, 4, 5]);
    }

    #[test]
    fn whitespace_and_duplicates() {
        assert_eq!(pages(" 7 1-3,,2\t5 "), vec![1, 2, 3, 5, 7]);
    }

    #[test]
    fn empty_means_all() {
        let sel = PageSelection::parse("   ").unwrap();
        assert!(sel.is_all());
        assert_eq!(sel.resolve(3), vec![1, 2, 3]);
        assert_eq!(sel.to_string(), "all");
    }

    #[test]
    fn non_positive_tokens_fail() {
        for bad in ["0", "-1", "0-3", "2-0", "1,0", "-", "3-", "abc", "1.5", "2--4"] {
            assert!(
                PageSelection::parse(bad).is_err(),
                "expected '{bad}' to be rejected"
            );
        }
    }

    #[test]
    fn too_large_page_fails() {
        assert!(PageSelection::parse("70000").is_err());
        assert!(PageSelection::from_pages([0]).is_err());
    }

    #[test]
    fn parse_is_idempotent_through_display() {
        let sel = PageSelection::parse("9,1-3,5,4").unwrap();
        assert_eq!(sel.to_string(), "1-5,9");
        assert_eq!(PageSelection::parse(&sel.to_string()).unwrap(), sel);
    }

    #[test]
    fn resolve_filters_out_of_range() {
        let sel = PageSelection::parse("2,4,9").unwrap();
        assert_eq!(sel.resolve(5), vec![2, 4]);
        assert!(PageSelection::parse("8-9").unwrap().resolve(5).is_empty());
    }

    #[test]
    fn span_and_runs() {
        let sel = PageSelection::parse("1,3,5-6").unwrap();
        assert_eq!(sel.span(), Some(1..=6));
        assert_eq!(sel.runs(), vec![1..=1, 3..=3, 5..=6]);
        assert_eq!(PageSelection::all().span(), None);
        assert!(PageSelection::all().runs().is_empty());
    }

    #[test]
    fn pad_width_has_floor_of_two() {
        assert_eq!(pad_width(1), 2);
        assert_eq!(pad_width(9), 2);
        assert_eq!(pad_width(99), 2);
        assert_eq!(pad_width(100), 3);
        assert_eq!(pad_width(12345), 5);
    }

    #[test]
    fn file_name_is_zero_padded() {
        assert_eq!(page_file_name("page_", 4, 2, "png"), "page_04.png");
        assert_eq!(page_file_name("p", 12, 3, "jpg"), "p012.jpg");
        assert_eq!(page_file_name("", 123, 2, "png"), "123.png");
    }
}
