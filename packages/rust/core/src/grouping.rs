//! Parsing the model's grouping reply.
//!
//! The reply is free text following the grammar requested by
//! [`crate::prompt`]. Parsing runs in three stages, each usable on its own:
//!
//! 1. [`classify_line`]: one line to a [`LineEvent`].
//! 2. [`assignments`]: line events to ordered [`GroupAssignment`]s.
//! 3. [`reconcile`]: assignments against the batch, yielding a [`GroupedResult`].
//!
//! None of the stages can fail. Unrecognised lines, unknown URLs and repeated
//! URLs are dropped.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use newslens_shared::{ArticleGroup, ArticleRecord, GroupedResult};

use crate::prompt::{GROUP_COUNT, MEMBER_PREFIX, is_reserved_label};

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^[1-{GROUP_COUNT}]\.\s")).expect("heading regex")
});

static MEMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    let keyword = MEMBER_PREFIX.trim_start_matches('-').trim();
    Regex::new(&format!(r"^-\s{}\s", regex::escape(keyword))).expect("member regex")
});

// ---------------------------------------------------------------------------
// Line grammar
// ---------------------------------------------------------------------------

/// What a single reply line means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent<'a> {
    /// `N. <label>` with the label trimmed of whitespace and emphasis.
    Heading(&'a str),
    /// `- Article: <url>` with the URL trimmed.
    Member(&'a str),
    Ignorable,
}

/// Classify one line of the reply.
///
/// Emphasis markers are removed from the ends of a line or URL only when they
/// come in pairs; a URL ending in `_` or `*` keeps that character.
pub fn classify_line(line: &str) -> LineEvent<'_> {
    let line = strip_paired_emphasis(line.trim());

    let heading = line.trim_start_matches(['*', '_']);
    if let Some(m) = HEADING_RE.find(heading) {
        return LineEvent::Heading(trim_decoration(&heading[m.end()..]));
    }

    if let Some(m) = MEMBER_RE.find(line) {
        let url = strip_paired_emphasis(line[m.end()..].trim());
        let url = url
            .strip_prefix('<')
            .and_then(|u| u.strip_suffix('>'))
            .unwrap_or(url)
            .trim();
        return LineEvent::Member(url);
    }

    LineEvent::Ignorable
}

fn trim_decoration(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '*' || c == '_')
}

/// Remove `**…**`, `__…__`, `*…*` and `_…_` wrappers, repeatedly.
fn strip_paired_emphasis(mut text: &str) -> &str {
    loop {
        let inner = ["**", "__", "*", "_"]
            .into_iter()
            .find_map(|marker| text.strip_prefix(marker)?.strip_suffix(marker))
            .map(str::trim);
        match inner {
            Some(inner) if inner.len() < text.len() => text = inner,
            _ => return text,
        }
    }
}

// ---------------------------------------------------------------------------
// Assignment assembly
// ---------------------------------------------------------------------------

/// A heading and the member URLs listed under it, before reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupAssignment {
    pub label: String,
    pub member_urls: Vec<String>,
}

/// Fold the reply's lines into assignments, in heading order.
///
/// A repeated label replaces the earlier group's members but keeps its
/// position. Headings with an empty or reserved label open no group, and
/// member lines under them (or before any heading) are discarded.
pub fn assignments(response: &str) -> Vec<GroupAssignment> {
    let mut groups: Vec<GroupAssignment> = Vec::new();
    let mut current: Option<usize> = None;

    for line in response.lines() {
        match classify_line(line) {
            LineEvent::Heading(label) => {
                if label.is_empty() || is_reserved_label(label) {
                    debug!(label, "ignoring empty or reserved heading");
                    current = None;
                    continue;
                }

                match groups.iter().position(|g| g.label == label) {
                    Some(idx) => {
                        debug!(label, "repeated heading replaces earlier group");
                        groups[idx].member_urls.clear();
                        current = Some(idx);
                    }
                    None => {
                        groups.push(GroupAssignment {
                            label: label.to_string(),
                            member_urls: Vec::new(),
                        });
                        current = Some(groups.len() - 1);
                    }
                }
            }
            LineEvent::Member(url) => match current {
                Some(idx) => groups[idx].member_urls.push(url.to_string()),
                None => debug!(url, "member line outside any group"),
            },
            LineEvent::Ignorable => {}
        }
    }

    groups
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Resolve member URLs against the batch.
///
/// URLs are matched by exact equality. Unknown URLs are dropped, and a URL
/// already placed (in any group) is dropped on later occurrences. Groups left
/// with no members are kept.
pub fn reconcile(assignments: Vec<GroupAssignment>, records: &[ArticleRecord]) -> GroupedResult {
    let by_url: HashMap<&str, &ArticleRecord> =
        records.iter().map(|r| (r.url.as_str(), r)).collect();
    let mut placed: HashSet<&str> = HashSet::new();
    let mut groups = Vec::with_capacity(assignments.len());

    for assignment in assignments {
        let mut articles = Vec::new();
        for url in &assignment.member_urls {
            let Some((&key, &record)) = by_url.get_key_value(url.as_str()) else {
                debug!(%url, group = %assignment.label, "dropping unknown url");
                continue;
            };
            if !placed.insert(key) {
                debug!(%url, group = %assignment.label, "dropping already placed url");
                continue;
            }
            articles.push(record.clone());
        }
        groups.push(ArticleGroup {
            label: assignment.label,
            articles,
        });
    }

    GroupedResult::from_groups(groups)
}

/// Parse a reply into a partition of `records`.
pub fn parse(response: &str, records: &[ArticleRecord]) -> GroupedResult {
    reconcile(assignments(response), records)
}
