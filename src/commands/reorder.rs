use chrono::Utc;
use tracing::info;

use crate::{
    core::{
        config::EngineConfig,
        errors::{AppError, AppResult},
        run_log::RunLog,
        types::{Confidence, CorrelationMethod, ReorderResponse, VisualOrderEntry},
    },
    host::{PropertyStore, SlideHost},
    reorder::{
        correlation::correlate,
        executor::{execute_and_verify, ExecutionReport},
        groups::detect_groups,
        identity::group_title,
        index_slides::{detect_index_slides, discover_from_mapping, extract_visual_order},
        mapping::{load_mapping, save_mapping, PlacedThumbnail, ThumbnailMapping},
        planner::{plan_reorder, ReorderPlan},
    },
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReorderOptions {
    /// Plan only; nothing in the deck or the store changes.
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct ReorderOutcome {
    pub method: CorrelationMethod,
    pub confidence: Confidence,
    pub plan: ReorderPlan,
    pub report: Option<ExecutionReport>,
}

/// Detects, correlates, plans and executes a reorder that makes the deck
/// follow the order shown on its index slides.
///
/// Never returns an error: failures become `success: false` with the log of
/// everything that happened up to that point.
pub async fn reorder_from_index<H, S>(
    host: &mut H,
    store: &S,
    config: &EngineConfig,
    options: ReorderOptions,
) -> ReorderResponse
where
    H: SlideHost,
    S: PropertyStore,
{
    let mut log = RunLog::new();
    log.info(format!("Reordering document {}", host.document_id()));

    match run_reorder(host, store, config, options, &mut log).await {
        Ok(outcome) => {
            let report = outcome.report.unwrap_or_default();
            ReorderResponse {
                success: true,
                log: log.render(),
                moves_made: Some(report.moved),
                method: Some(outcome.method),
                confidence: Some(outcome.confidence),
                planned_operations: Some(outcome.plan.operation_count()),
                verified: (!options.dry_run).then_some(report.verified || outcome.plan.is_empty()),
                errors: report.errors,
                error_code: None,
            }
        }
        Err(err) => {
            log.error(format!("Reorder aborted: {err}"));
            ReorderResponse {
                success: false,
                log: log.render(),
                moves_made: None,
                method: None,
                confidence: None,
                planned_operations: None,
                verified: None,
                errors: vec![err.to_string()],
                error_code: Some(err.code().to_string()),
            }
        }
    }
}

pub async fn run_reorder<H, S>(
    host: &mut H,
    store: &S,
    config: &EngineConfig,
    options: ReorderOptions,
    log: &mut RunLog,
) -> AppResult<ReorderOutcome>
where
    H: SlideHost,
    S: PropertyStore,
{
    let slides = host.slides().await?;
    log.info(format!("Deck has {} slides", slides.len()));

    let stored = load_mapping(store, log).await;
    let mut index_slides = vec![];
    let mut mapping = None;
    if let Some(stored) = stored.as_ref() {
        index_slides = discover_from_mapping(&slides, stored, config, log);
        if index_slides.is_empty() {
            log.warn("None of the recorded index slides remain, detecting them from layout");
        } else {
            log.info(format!("Using stored mapping ({} index slides)", index_slides.len()));
            mapping = Some(stored);
        }
    }
    if index_slides.is_empty() {
        index_slides = detect_index_slides(&slides, config, log);
    }
    if index_slides.is_empty() {
        return Err(AppError::DetectionFailed("no index slides found".to_string()));
    }
    let index_count = index_slides.len();
    log.info(format!("Index slides: {index_count}"));

    let mut entries = extract_visual_order(&slides, &index_slides, mapping, config, log);
    if mapping.is_some() {
        let before = entries.len();
        entries.retain(|entry| entry.identity.is_resolved());
        if entries.len() < before {
            log.warn(format!(
                "{} thumbnails could not be matched to a group and are left out",
                before - entries.len()
            ));
        }
    }
    log.info(format!("Visual order: {} thumbnails", entries.len()));

    let groups = detect_groups(&slides, index_count, config.anchor_threshold(), log);
    if groups.is_empty() {
        return Err(AppError::DetectionFailed(
            "no content groups found after the index slides".to_string(),
        ));
    }
    log.info(format!("Content groups: {}", groups.len()));

    let correlation = correlate(&entries, &groups, log)?;
    log.info(format!(
        "Correlated by {} ({:?} confidence), {} of {} thumbnails placed",
        correlation.method.as_str(),
        correlation.confidence,
        correlation.assignments.len(),
        entries.len()
    ));
    for entry in correlation.unmapped_entries(entries.len()) {
        log.warn(format!("Thumbnail {} left unmapped", entry + 1));
    }

    let desired_order = correlation.desired_order();
    let plan = plan_reorder(&groups, &desired_order, index_count)?;
    for batch in &plan.batches {
        log.debug(format!(
            "Plan: group {} from slides {}-{} to {}-{}",
            batch.group_index + 1,
            batch.current[0] + 1,
            batch.current[2] + 1,
            batch.target[0] + 1,
            batch.target[2] + 1
        ));
    }
    log.info(format!(
        "Plan: {} groups to move, {} operations",
        plan.batches.len(),
        plan.operation_count()
    ));

    if options.dry_run {
        log.info("Dry run, leaving the deck untouched");
        return Ok(ReorderOutcome {
            method: correlation.method,
            confidence: correlation.confidence,
            plan,
            report: None,
        });
    }
    if plan.is_empty() {
        log.info("Groups are already in the requested order");
        return Ok(ReorderOutcome {
            method: correlation.method,
            confidence: correlation.confidence,
            plan,
            report: None,
        });
    }

    let report = execute_and_verify(host, &groups, &desired_order, &plan, config, log).await;
    info!(
        moved = report.moved,
        errors = report.errors.len(),
        verified = report.verified,
        "reorder executed"
    );

    if report.errors.is_empty() || report.verified {
        let placed = correlation
            .assignments
            .iter()
            .enumerate()
            .map(|(rank, assignment)| PlacedThumbnail {
                entry: &entries[assignment.entry],
                visual_position: rank + 1,
            })
            .collect::<Vec<_>>();
        let mut updated = stored
            .clone()
            .unwrap_or_else(|| ThumbnailMapping::new(groups.len(), vec![]));
        updated.rewrite_after_reorder(&index_slides, &placed, groups.len(), Utc::now());
        match save_mapping(store, &updated).await {
            Ok(()) => log.info("Stored mapping updated"),
            Err(err) => log.warn(format!("Could not store the updated mapping: {err}")),
        }
        retitle_thumbnails(host, &placed, log).await;
    } else {
        log.warn("Execution had errors, stored mapping and titles left as they were");
    }

    Ok(ReorderOutcome {
        method: correlation.method,
        confidence: correlation.confidence,
        plan,
        report: Some(report),
    })
}

async fn retitle_thumbnails<H: SlideHost>(
    host: &mut H,
    placed: &[PlacedThumbnail<'_>],
    log: &mut RunLog,
) {
    let mut updated = 0usize;
    for thumbnail in placed {
        let entry: &VisualOrderEntry = thumbnail.entry;
        let title = group_title(thumbnail.visual_position);
        if entry.title.as_deref() == Some(title.as_str()) {
            updated += 1;
            continue;
        }
        match host.set_image_title(&entry.image_object_id, &title).await {
            Ok(()) => {
                updated += 1;
                log.debug(format!(
                    "  {} -> {title}",
                    entry.title.as_deref().unwrap_or("untitled")
                ));
            }
            Err(err) => log.warn(format!(
                "Could not retitle thumbnail {}: {err}",
                entry.image_object_id
            )),
        }
    }
    log.info(format!("Thumbnail titles current: {updated}/{}", placed.len()));
}
