//! Maps the order observed on the index slides back to content groups.
//!
//! Tiers are tried strongest first and the first one that clears its bar is
//! used. Every accepted tier except the sequential one hands leftover entries
//! the unused groups in storage order.

use std::collections::HashSet;

use serde::Serialize;

use crate::core::{
    errors::{AppError, AppResult},
    run_log::RunLog,
    types::{Confidence, ContentGroup, CorrelationMethod, VisualOrderEntry},
};

const CONTENT_ID_COVERAGE: f64 = 0.8;
const VISUAL_SCORE_FLOOR: f64 = 0.3;
const VISUAL_ACCEPT: f64 = 0.6;
const VISUAL_HIGH: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Index into the visual order.
    pub entry: usize,
    pub group: usize,
    /// Whether the tier matched this entry itself rather than gap-filling it.
    pub direct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Correlation {
    pub method: CorrelationMethod,
    pub confidence: Confidence,
    pub direct_matches: usize,
    /// Sorted by entry, i.e. by visual position.
    pub assignments: Vec<Assignment>,
}

impl Correlation {
    /// Group indices in the order they should appear in the deck.
    pub fn desired_order(&self) -> Vec<usize> {
        self.assignments.iter().map(|assignment| assignment.group).collect()
    }

    pub fn unmapped_entries(&self, entry_count: usize) -> Vec<usize> {
        let mapped = self
            .assignments
            .iter()
            .map(|assignment| assignment.entry)
            .collect::<HashSet<_>>();
        (0..entry_count).filter(|entry| !mapped.contains(entry)).collect()
    }
}

/// Partial assignment built by one tier: `slots[i]` is the group chosen for
/// entry `i`, if any.
struct Draft {
    slots: Vec<Option<(usize, Option<f64>)>>,
    used: HashSet<usize>,
}

impl Draft {
    fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
            used: HashSet::new(),
        }
    }

    fn assign(&mut self, entry: usize, group: usize, score: Option<f64>) {
        self.slots[entry] = Some((group, score));
        self.used.insert(group);
    }

    fn direct_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    fn into_assignments(self, group_count: usize, fill_gaps: bool) -> Vec<Assignment> {
        let mut assignments = vec![];
        let mut used = self.used;
        let mut next_unused = 0usize;
        for (entry, slot) in self.slots.into_iter().enumerate() {
            match slot {
                Some((group, score)) => assignments.push(Assignment {
                    entry,
                    group,
                    direct: true,
                    score,
                }),
                None if fill_gaps => {
                    while next_unused < group_count && used.contains(&next_unused) {
                        next_unused += 1;
                    }
                    if next_unused < group_count {
                        used.insert(next_unused);
                        assignments.push(Assignment {
                            entry,
                            group: next_unused,
                            direct: false,
                            score: None,
                        });
                    }
                }
                None => {}
            }
        }
        assignments
    }
}

fn by_title(entries: &[VisualOrderEntry], groups: &[ContentGroup], log: &mut RunLog) -> Draft {
    let mut draft = Draft::new(entries.len());
    for (entry_index, entry) in entries.iter().enumerate() {
        let Some(group) = entry.group_index() else {
            continue;
        };
        if group >= groups.len() {
            log.warn(format!(
                "Thumbnail {} points at group {} but only {} groups exist",
                entry_index + 1,
                group + 1,
                groups.len()
            ));
        } else if draft.used.contains(&group) {
            log.warn(format!(
                "Thumbnail {} repeats group {}, treating it as unresolved",
                entry_index + 1,
                group + 1
            ));
        } else {
            draft.assign(entry_index, group, None);
        }
    }
    draft
}

fn by_content_id(entries: &[VisualOrderEntry], groups: &[ContentGroup]) -> Draft {
    let mut draft = Draft::new(entries.len());
    for (entry_index, entry) in entries.iter().enumerate() {
        let Some(content_id) = entry.content_id() else {
            continue;
        };
        let matched = groups.iter().enumerate().find(|(group_index, group)| {
            !draft.used.contains(group_index) && group.anchor_content_id() == Some(content_id)
        });
        if let Some((group_index, _)) = matched {
            draft.assign(entry_index, group_index, None);
        }
    }
    draft
}

/// Aspect-ratio closeness in `[0, 1]`; an identical content id scores 1.
pub fn visual_similarity(entry: &VisualOrderEntry, group: &ContentGroup) -> f64 {
    if let (Some(entry_id), Some(group_id)) = (entry.content_id(), group.anchor_content_id()) {
        if entry_id == group_id {
            return 1.0;
        }
    }
    match (entry.rect.aspect_ratio(), group.anchor_aspect_ratio()) {
        (Some(entry_ratio), Some(group_ratio)) => {
            (1.0 - (entry_ratio - group_ratio).abs() / 2.0).max(0.0)
        }
        _ => 0.0,
    }
}

fn by_visual_similarity(entries: &[VisualOrderEntry], groups: &[ContentGroup]) -> Draft {
    let mut draft = Draft::new(entries.len());
    for entry_index in 0..entries.len().min(groups.len()) {
        let mut best: Option<(usize, f64)> = None;
        for (group_index, group) in groups.iter().enumerate() {
            if draft.used.contains(&group_index) {
                continue;
            }
            let score = visual_similarity(&entries[entry_index], group);
            if score > VISUAL_SCORE_FLOOR && best.map_or(true, |(_, top)| score > top) {
                best = Some((group_index, score));
            }
        }
        if let Some((group_index, score)) = best {
            draft.assign(entry_index, group_index, Some(score));
        }
    }
    draft
}

fn coverage(matched: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64
    }
}

pub fn correlate(
    entries: &[VisualOrderEntry],
    groups: &[ContentGroup],
    log: &mut RunLog,
) -> AppResult<Correlation> {
    if entries.is_empty() {
        return Err(AppError::CorrelationFailed(
            "the index slides show no thumbnails".to_string(),
        ));
    }
    if groups.is_empty() {
        return Err(AppError::CorrelationFailed("no content groups to map onto".to_string()));
    }
    let total = entries.len();

    let titles = by_title(entries, groups, log);
    let direct = titles.direct_count();
    log.info(format!("Title tags resolved {direct}/{total} thumbnails"));
    if direct > 0 {
        let confidence = if direct == total {
            Confidence::Perfect
        } else {
            Confidence::High
        };
        return Ok(Correlation {
            method: CorrelationMethod::Title,
            confidence,
            direct_matches: direct,
            assignments: titles.into_assignments(groups.len(), true),
        });
    }

    let content_ids = by_content_id(entries, groups);
    let direct = content_ids.direct_count();
    log.info(format!("Content ids matched {direct}/{total} thumbnails"));
    if direct > 0 && coverage(direct, total) >= CONTENT_ID_COVERAGE {
        return Ok(Correlation {
            method: CorrelationMethod::ContentId,
            confidence: Confidence::High,
            direct_matches: direct,
            assignments: content_ids.into_assignments(groups.len(), true),
        });
    }

    if total == groups.len() {
        log.info(format!("Thumbnail and group counts agree ({total}), mapping in order"));
        return Ok(Correlation {
            method: CorrelationMethod::Sequential,
            confidence: Confidence::High,
            direct_matches: total,
            assignments: (0..total)
                .map(|index| Assignment {
                    entry: index,
                    group: index,
                    direct: true,
                    score: None,
                })
                .collect(),
        });
    }

    let visual = by_visual_similarity(entries, groups);
    let direct = visual.direct_count();
    let ratio = coverage(direct, total);
    log.info(format!(
        "Visual similarity matched {direct}/{total} thumbnails ({:.1}%)",
        ratio * 100.0
    ));
    if ratio >= VISUAL_ACCEPT {
        let confidence = if ratio >= VISUAL_HIGH {
            Confidence::High
        } else {
            Confidence::Medium
        };
        return Ok(Correlation {
            method: CorrelationMethod::Visual,
            confidence,
            direct_matches: direct,
            assignments: visual.into_assignments(groups.len(), true),
        });
    }

    Err(AppError::CorrelationFailed(format!(
        "no strategy could map {total} thumbnails onto {} groups",
        groups.len()
    )))
}
