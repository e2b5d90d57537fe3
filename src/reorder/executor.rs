use serde::Serialize;

use crate::{
    core::{
        config::EngineConfig,
        run_log::RunLog,
        types::{position_of, ContentGroup, Slide},
    },
    host::SlideHost,
    reorder::planner::{plan_settle, MoveBatch, MoveDirection, Operation, ReorderPlan, SlideRole},
};

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    /// Operations that ended with the slide at its target.
    pub executed: usize,
    /// Operations that actually called the host's move.
    pub moved: usize,
    /// Operations whose slide was already at its target.
    pub skipped: usize,
    pub errors: Vec<String>,
    pub passes: usize,
    pub verified: bool,
}

impl ExecutionReport {
    fn absorb(&mut self, other: ExecutionReport) {
        self.executed += other.executed;
        self.moved += other.moved;
        self.skipped += other.skipped;
        self.errors.extend(other.errors);
    }
}

fn record_error(report: &mut ExecutionReport, log: &mut RunLog, message: String) {
    log.warn(message.clone());
    report.errors.push(message);
}

/// Current positions of a group's slides, resolved by id against `slides`.
pub fn relocate_group(group: &ContentGroup, slides: &[Slide]) -> Option<ContentGroup> {
    let mut positions = [0usize; 3];
    for (offset, slide_id) in group.slide_ids.iter().enumerate() {
        positions[offset] = position_of(slides, slide_id)?;
    }
    Some(ContentGroup {
        anchor_slide_index: positions[0],
        slides: positions,
        ..group.clone()
    })
}

async fn run_batch<H: SlideHost>(
    host: &mut H,
    batch: &MoveBatch,
    config: &EngineConfig,
    report: &mut ExecutionReport,
    log: &mut RunLog,
) {
    let snapshot = match host.slides().await {
        Ok(slides) => slides,
        Err(err) => {
            record_error(report, log, format!("Could not read slides before batch: {err}"));
            return;
        }
    };

    let anchor_live = batch
        .operations
        .iter()
        .find(|op| op.role == SlideRole::Anchor)
        .and_then(|op| position_of(&snapshot, &op.slide_id));
    let forward = match anchor_live {
        Some(live) => batch.target[0] > live,
        None => batch.direction == MoveDirection::Forward,
    };
    // For an intact group, target order matches live order; unlike live
    // order it stays correct when a previous pass left the group split.
    let mut ordered = batch.operations.iter().collect::<Vec<&Operation>>();
    if forward {
        ordered.sort_by_key(|op| std::cmp::Reverse(op.target_position));
    } else {
        ordered.sort_by_key(|op| op.target_position);
    }

    for op in ordered {
        let slides = match host.slides().await {
            Ok(slides) => slides,
            Err(err) => {
                record_error(report, log, format!("Could not read slides: {err}"));
                continue;
            }
        };
        let Some(live) = position_of(&slides, &op.slide_id) else {
            record_error(report, log, format!("Slide not found: {}", op.slide_id));
            continue;
        };
        if live == op.target_position {
            report.executed += 1;
            report.skipped += 1;
            log.debug(format!(
                "    {} slide already at {}",
                op.role.as_str(),
                live + 1
            ));
            continue;
        }

        log.debug(format!(
            "    {}: slide {} -> {}",
            op.role.as_str(),
            live + 1,
            op.target_position + 1
        ));
        match host.move_slide(&op.slide_id, op.target_position).await {
            Ok(()) => {
                report.executed += 1;
                report.moved += 1;
                tokio::time::sleep(config.move_delay).await;
            }
            Err(err) => {
                record_error(
                    report,
                    log,
                    format!("Error moving slide {}: {err}", op.slide_id),
                );
            }
        }
    }
}

/// Applies every batch of `plan`, resolving each slide by id right before its
/// move. Failures are recorded and execution carries on.
pub async fn execute_plan<H: SlideHost>(
    host: &mut H,
    plan: &ReorderPlan,
    config: &EngineConfig,
    log: &mut RunLog,
) -> ExecutionReport {
    let mut report = ExecutionReport {
        passes: 1,
        ..ExecutionReport::default()
    };
    if plan.is_empty() {
        log.info("No moves needed");
        return report;
    }

    let total = plan.batches.len();
    for (number, batch) in plan.batches.iter().enumerate() {
        log.info(format!(
            "  Batch {}/{}: group {} to visual position {} ({})",
            number + 1,
            total,
            batch.group_index + 1,
            batch.visual_position,
            match batch.direction {
                MoveDirection::Backward => "backward",
                MoveDirection::Forward => "forward",
            }
        ));
        run_batch(host, batch, config, &mut report, log).await;
        if number + 1 < total {
            tokio::time::sleep(config.batch_delay).await;
        }
    }

    log.info(format!(
        "  Completed {}/{} operations ({} moved)",
        report.executed,
        plan.operation_count(),
        report.moved
    ));
    if !report.errors.is_empty() {
        log.warn(format!("  {} errors during execution", report.errors.len()));
    }
    report
}

/// Executes `plan`, then re-reads the deck and settles any group left out of
/// place from live positions, until every group sits at its target or
/// `config.max_passes` is spent.
pub async fn execute_and_verify<H: SlideHost>(
    host: &mut H,
    groups: &[ContentGroup],
    desired_order: &[usize],
    plan: &ReorderPlan,
    config: &EngineConfig,
    log: &mut RunLog,
) -> ExecutionReport {
    let mut report = execute_plan(host, plan, config, log).await;

    loop {
        let slides = match host.slides().await {
            Ok(slides) => slides,
            Err(err) => {
                record_error(&mut report, log, format!("Could not verify the deck: {err}"));
                break;
            }
        };
        let live = groups
            .iter()
            .map(|group| relocate_group(group, &slides))
            .collect::<Option<Vec<_>>>();
        let Some(live) = live else {
            record_error(
                &mut report,
                log,
                "Could not verify the deck: a group slide disappeared".to_string(),
            );
            break;
        };

        let replan = match plan_settle(&live, desired_order, plan.index_slide_count) {
            Ok(replan) => replan,
            Err(err) => {
                record_error(&mut report, log, format!("Could not re-plan: {err}"));
                break;
            }
        };
        if replan.is_empty() {
            report.verified = true;
            log.info(format!("Verified final order after {} pass(es)", report.passes));
            break;
        }
        if report.passes >= config.max_passes.max(1) {
            log.warn(format!(
                "{} groups still out of place after {} pass(es)",
                replan.batches.len(),
                report.passes
            ));
            break;
        }

        log.info(format!(
            "Verification found {} misplaced groups, running pass {}",
            replan.batches.len(),
            report.passes + 1
        ));
        let extra = execute_plan(host, &replan, config, log).await;
        report.absorb(extra);
        report.passes += 1;
    }
    report
}
