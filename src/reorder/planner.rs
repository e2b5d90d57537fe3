use std::collections::HashSet;

use serde::Serialize;

use crate::{
    core::{
        errors::{AppError, AppResult},
        types::ContentGroup,
    },
    reorder::groups::GROUP_SIZE,
};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlideRole {
    Anchor,
    Second,
    Third,
}

impl SlideRole {
    pub fn for_offset(offset: usize) -> Self {
        match offset {
            0 => Self::Anchor,
            1 => Self::Second,
            _ => Self::Third,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anchor => "anchor",
            Self::Second => "second",
            Self::Third => "third",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Backward,
    Forward,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub slide_id: String,
    pub current_position: usize,
    pub target_position: usize,
    /// 1-based position in the desired order.
    pub visual_position: usize,
    pub group_index: usize,
    pub role: SlideRole,
}

/// The three moves that relocate one group.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoveBatch {
    pub group_index: usize,
    pub visual_position: usize,
    pub direction: MoveDirection,
    pub current: [usize; 3],
    pub target: [usize; 3],
    /// Ordered so that no move shifts a slide still waiting in this batch.
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReorderPlan {
    pub index_slide_count: usize,
    pub batches: Vec<MoveBatch>,
}

impl ReorderPlan {
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.batches.iter().flat_map(|batch| batch.operations.iter())
    }

    pub fn operation_count(&self) -> usize {
        self.batches.iter().map(|batch| batch.operations.len()).sum()
    }
}

pub fn target_base(index_slide_count: usize, visual_slot: usize) -> usize {
    index_slide_count + GROUP_SIZE * visual_slot
}

fn validate_order(groups: &[ContentGroup], desired_order: &[usize]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for &group_index in desired_order {
        if group_index >= groups.len() {
            return Err(AppError::InvalidInput(format!(
                "desired order names group {} but only {} groups exist",
                group_index + 1,
                groups.len()
            )));
        }
        if !seen.insert(group_index) {
            return Err(AppError::InvalidInput(format!(
                "desired order names group {} twice",
                group_index + 1
            )));
        }
    }
    Ok(())
}

fn build_batches(
    groups: &[ContentGroup],
    desired_order: &[usize],
    index_slide_count: usize,
) -> Vec<MoveBatch> {
    desired_order
        .iter()
        .enumerate()
        .filter_map(|(slot, &group_index)| {
            let group = &groups[group_index];
            let base = target_base(index_slide_count, slot);
            let target = [base, base + 1, base + 2];
            if group.slides == target {
                return None;
            }
            let direction = if base < group.slides[0] {
                MoveDirection::Backward
            } else {
                MoveDirection::Forward
            };

            let mut operations = (0..GROUP_SIZE)
                .map(|offset| Operation {
                    slide_id: group.slide_ids[offset].clone(),
                    current_position: group.slides[offset],
                    target_position: target[offset],
                    visual_position: slot + 1,
                    group_index,
                    role: SlideRole::for_offset(offset),
                })
                .collect::<Vec<_>>();
            match direction {
                MoveDirection::Backward => operations.sort_by_key(|op| op.current_position),
                MoveDirection::Forward => {
                    operations.sort_by_key(|op| std::cmp::Reverse(op.current_position))
                }
            }

            Some(MoveBatch {
                group_index,
                visual_position: slot + 1,
                direction,
                current: group.slides,
                target,
                operations,
            })
        })
        .collect()
}

/// Plans the moves that put `desired_order[v]` at slides
/// `index_slide_count + 3v ..= index_slide_count + 3v + 2`.
///
/// Groups already in place produce no batch. Backward batches run first,
/// ascending by current position; forward batches follow, descending.
pub fn plan_reorder(
    groups: &[ContentGroup],
    desired_order: &[usize],
    index_slide_count: usize,
) -> AppResult<ReorderPlan> {
    validate_order(groups, desired_order)?;
    let mut batches = build_batches(groups, desired_order, index_slide_count);
    batches.sort_by(|a, b| match (a.direction, b.direction) {
        (MoveDirection::Backward, MoveDirection::Forward) => std::cmp::Ordering::Less,
        (MoveDirection::Forward, MoveDirection::Backward) => std::cmp::Ordering::Greater,
        (MoveDirection::Backward, MoveDirection::Backward) => a.current[0].cmp(&b.current[0]),
        (MoveDirection::Forward, MoveDirection::Forward) => b.current[0].cmp(&a.current[0]),
    });

    Ok(ReorderPlan {
        index_slide_count,
        batches,
    })
}

/// Same targets as [`plan_reorder`], filled front to back.
///
/// Once every earlier slot holds its group, the group for the next slot can
/// only sit at or after its target, so each batch is a backward move that
/// leaves the settled prefix alone. A single pass always reaches the target
/// order when the index slides lead the deck.
pub fn plan_settle(
    groups: &[ContentGroup],
    desired_order: &[usize],
    index_slide_count: usize,
) -> AppResult<ReorderPlan> {
    validate_order(groups, desired_order)?;
    let mut batches = build_batches(groups, desired_order, index_slide_count);
    batches.sort_by_key(|batch| batch.target[0]);
    Ok(ReorderPlan {
        index_slide_count,
        batches,
    })
}
