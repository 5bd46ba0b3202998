use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use super::rules::{LineRecord, MatchRule, Provenance, RuleSet};
use super::FilterError;
use crate::conf::FilterConfig;

#[derive(Debug, Default)]
pub struct FilterStats {
    pub lines_scanned: AtomicU64,
    pub lines_matched: AtomicU64,
    pub bytes_processed: AtomicU64,
}

/// A retained line, trimmed, with its 1-based position in the decoded text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelevantLine {
    pub line_no: usize,
    pub text: String,
    pub rule: MatchRule,
}

#[derive(Debug, Clone)]
pub struct Excerpt {
    pub lines: Vec<RelevantLine>,
    /// Retained lines joined by `\n`.
    pub content: String,
    /// Earlier matches discarded by the cap.
    pub dropped: usize,
}

#[derive(Debug, Clone)]
pub enum FilterOutcome {
    Relevant(Excerpt),
    NoSignal { matched: usize },
}

impl FilterOutcome {
    pub fn is_relevant(&self) -> bool {
        matches!(self, FilterOutcome::Relevant(_))
    }
}

/// Result of one filter pass over a decoded excerpt.
#[derive(Debug, Clone)]
pub struct FilterPass {
    pub scanned: usize,
    pub matched: usize,
    pub outcome: FilterOutcome,
}

impl FilterPass {
    pub fn dropped(&self) -> usize {
        match &self.outcome {
            FilterOutcome::Relevant(excerpt) => excerpt.dropped,
            FilterOutcome::NoSignal { .. } => 0,
        }
    }
}

pub struct RelevanceFilter {
    rules: RuleSet,
    max_lines: usize,
    min_signal_chars: usize,
    connectivity_sources: Vec<String>,
    stats: FilterStats,
}

impl RelevanceFilter {
    pub fn new(config: &FilterConfig) -> Result<Self, FilterError> {
        Ok(Self {
            rules: RuleSet::from_config(config)?,
            max_lines: config.max_lines.max(1),
            min_signal_chars: config.min_signal_chars,
            connectivity_sources: config.connectivity_sources.clone(),
            stats: FilterStats::default(),
        })
    }

    /// Provenance for a source name, using the configured connectivity hints.
    pub fn provenance(&self, source_name: &str) -> Provenance {
        Provenance::new(source_name, &self.connectivity_sources)
    }

    #[inline]
    pub fn classify(&self, line: &str, provenance: &Provenance) -> Option<MatchRule> {
        self.stats.lines_scanned.fetch_add(1, Ordering::Relaxed);
        self.stats.bytes_processed.fetch_add(line.len() as u64, Ordering::Relaxed);

        let rule = self.rules.classify(&LineRecord::new(line, provenance));

        if rule.is_some() {
            self.stats.lines_matched.fetch_add(1, Ordering::Relaxed);
        }

        rule
    }

    /// Single pass over `text`. Keeps the last `max_lines` matches in order.
    pub fn filter(&self, text: &str, provenance: &Provenance) -> FilterPass {
        let mut kept: VecDeque<RelevantLine> = VecDeque::with_capacity(self.max_lines.min(1024));
        let mut scanned = 0usize;
        let mut matched = 0usize;

        for (idx, raw) in text.split('\n').enumerate() {
            scanned += 1;
            let Some(rule) = self.classify(raw, provenance) else {
                continue;
            };
            matched += 1;
            if kept.len() == self.max_lines {
                kept.pop_front();
            }
            kept.push_back(RelevantLine {
                line_no: idx + 1,
                text: raw.trim().to_string(),
                rule,
            });
        }

        let lines: Vec<RelevantLine> = kept.into_iter().collect();
        let content = lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let outcome = if content.chars().count() < self.min_signal_chars {
            FilterOutcome::NoSignal { matched }
        } else {
            FilterOutcome::Relevant(Excerpt {
                dropped: matched - lines.len(),
                lines,
                content,
            })
        };

        FilterPass {
            scanned,
            matched,
            outcome,
        }
    }

    /// Lifetime totals: (lines_scanned, lines_matched, bytes_processed).
    pub fn stats(&self) -> (u64, u64, u64) {
        (
            self.stats.lines_scanned.load(Ordering::Relaxed),
            self.stats.lines_matched.load(Ordering::Relaxed),
            self.stats.bytes_processed.load(Ordering::Relaxed),
        )
    }
}
