//! Stage 3: clean text fields and type the publish date.

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use videoindex_common::{CleanRecord, TranscriptRecord};

use crate::store::ArtifactStore;

/// A literal, case-sensitive substring substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub pattern: String,
    pub replacement: String,
}

impl Replacement {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// A later rule whose output contains an earlier rule's pattern. Text produced by
/// `later` can be rewritten by `earlier` on the next run, breaking idempotence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConflict {
    pub earlier: usize,
    pub later: usize,
}

/// Ordered replacement table applied to titles and transcripts.
/// Rules run in order; each replaces every occurrence of its pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialStrings {
    rules: Vec<Replacement>,
}

impl Default for SpecialStrings {
    fn default() -> Self {
        Self::new(vec![
            Replacement::new("&#39;", "'"),
            Replacement::new("&amp;", "&"),
            Replacement::new("sha ", "Shaw "),
        ])
    }
}

impl SpecialStrings {
    pub fn new(rules: Vec<Replacement>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Replacement] {
        &self.rules
    }

    pub fn apply(&self, text: &str) -> String {
        self.rules
            .iter()
            .filter(|r| !r.pattern.is_empty())
            .fold(text.to_string(), |acc, r| acc.replace(&r.pattern, &r.replacement))
    }

    /// Only detects direct containment. A replacement can still combine with
    /// neighbouring text to form an earlier pattern (`&amp;#39;` → `&#39;`).
    pub fn order_conflicts(&self) -> Vec<OrderConflict> {
        let mut conflicts = Vec::new();
        for (later, rule) in self.rules.iter().enumerate() {
            for (earlier, prior) in self.rules[..later].iter().enumerate() {
                if !prior.pattern.is_empty() && rule.replacement.contains(&prior.pattern) {
                    conflicts.push(OrderConflict { earlier, later });
                }
            }
        }
        conflicts
    }
}

/// Parse the API's RFC 3339 publish date. Anything unparseable is null.
pub fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransformStats {
    pub rows: u32,
    pub unparsed_timestamps: u32,
}

pub fn transform(
    rows: Vec<TranscriptRecord>,
    rules: &SpecialStrings,
) -> (Vec<CleanRecord>, TransformStats) {
    let mut stats = TransformStats::default();
    let clean = rows
        .into_iter()
        .map(|row| {
            stats.rows += 1;
            let published_at = parse_published_at(&row.published_at);
            if published_at.is_none() {
                warn!(
                    video_id = %row.video_id,
                    raw = %row.published_at,
                    "Unparseable publish date"
                );
                stats.unparsed_timestamps += 1;
            }
            CleanRecord {
                published_at,
                title: rules.apply(&row.title),
                transcript: rules.apply(&row.transcript),
                video_id: row.video_id,
            }
        })
        .collect();
    (clean, stats)
}

/// Read `video-transcripts`, clean it, and write it back in place.
pub fn run(store: &dyn ArtifactStore, rules: &SpecialStrings) -> Result<TransformStats> {
    for conflict in rules.order_conflicts() {
        let earlier = &rules.rules()[conflict.earlier];
        let later = &rules.rules()[conflict.later];
        warn!(
            earlier = %earlier.pattern,
            later = %later.pattern,
            replacement = %later.replacement,
            "Replacement output contains an earlier pattern; transform is not idempotent"
        );
    }

    let rows = store.load_transcripts()?;
    let (clean, stats) = transform(rows, rules);
    store.save_clean_transcripts(&clean)?;
    info!(
        rows = stats.rows,
        unparsed_timestamps = stats.unparsed_timestamps,
        "Transcripts transformed"
    );
    Ok(stats)
}
