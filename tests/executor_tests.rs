mod common;

use deckorder_lib::{
    core::{config::EngineConfig, run_log::RunLog, types::Slide},
    host::{memory::InMemoryDeck, SlideHost},
    reorder::{
        executor::{execute_and_verify, execute_plan, relocate_group},
        groups::{detect_groups, AnchorThreshold},
        planner::plan_reorder,
    },
};

fn indexed_deck(labels: &[&str]) -> InMemoryDeck {
    let mut slides = vec![
        common::index_slide("idx1", 1, &[], 9),
        common::index_slide("idx2", 2, &[], 9),
    ];
    slides.extend(common::groups(labels));
    InMemoryDeck::new("doc", slides)
}

fn with_index_ids(labels: &[&str]) -> Vec<String> {
    let mut ids = vec!["idx1".to_string(), "idx2".to_string()];
    ids.extend(common::expected_ids(labels));
    ids
}

#[tokio::test]
async fn plan_executes_to_the_desired_order_in_one_pass() {
    let mut deck = indexed_deck(&["A", "B", "C", "D"]);
    let config = EngineConfig::without_pacing();
    let mut log = RunLog::new();
    let slides = deck.slides().await.expect("slides");
    let groups = detect_groups(&slides, 2, AnchorThreshold::default(), &mut log);
    let desired = vec![2, 0, 3, 1];
    let plan = plan_reorder(&groups, &desired, 2).expect("plan");

    let report = execute_and_verify(&mut deck, &groups, &desired, &plan, &config, &mut log).await;

    assert_eq!(deck.slide_ids(), with_index_ids(&["C", "A", "D", "B"]));
    assert!(report.errors.is_empty(), "errors: {:?}", report.errors);
    assert!(report.verified);
    assert_eq!(report.passes, 1);
    assert_eq!(report.moved, 6);
    assert_eq!(report.skipped, 6);
    assert_eq!(report.executed, 12);
    assert_eq!(deck.moves().len(), 6);
}

#[tokio::test]
async fn reversal_is_settled_by_the_verification_pass() {
    let mut deck = InMemoryDeck::new("doc", common::groups(&["A", "B", "C", "D"]));
    let config = EngineConfig::without_pacing();
    let mut log = RunLog::new();
    let slides = deck.slides().await.expect("slides");
    let groups = detect_groups(&slides, 0, AnchorThreshold::default(), &mut log);
    let desired = vec![3, 2, 1, 0];
    let plan = plan_reorder(&groups, &desired, 0).expect("plan");

    let report = execute_and_verify(&mut deck, &groups, &desired, &plan, &config, &mut log).await;

    assert_eq!(deck.slide_ids(), common::expected_ids(&["D", "C", "B", "A"]));
    assert!(report.verified);
    assert_eq!(report.passes, 2);
    assert!(log.contains("running pass 2"));
}

#[tokio::test]
async fn failed_move_is_recorded_and_execution_continues() {
    let mut deck = indexed_deck(&["A", "B", "C", "D"]);
    deck.fail_moves_of("C2");
    let config = EngineConfig::without_pacing();
    let mut log = RunLog::new();
    let slides = deck.slides().await.expect("slides");
    let groups = detect_groups(&slides, 2, AnchorThreshold::default(), &mut log);
    let desired = vec![2, 0, 3, 1];
    let plan = plan_reorder(&groups, &desired, 2).expect("plan");

    let report = execute_and_verify(&mut deck, &groups, &desired, &plan, &config, &mut log).await;

    assert!(!report.verified);
    assert_eq!(report.passes, 2);
    assert!(report.errors[0].starts_with("Error moving slide C2"));
    assert!(deck.moves().iter().any(|(slide_id, _)| slide_id == "D1"));
    assert!(deck.moves().iter().all(|(slide_id, _)| slide_id != "C2"));
}

#[tokio::test]
async fn vanished_slide_is_reported_by_id() {
    let mut deck = indexed_deck(&["A", "B", "C", "D"]);
    let config = EngineConfig::without_pacing();
    let mut log = RunLog::new();
    let slides = deck.slides().await.expect("slides");
    let groups = detect_groups(&slides, 2, AnchorThreshold::default(), &mut log);
    let plan = plan_reorder(&groups, &[2, 0, 3, 1], 2).expect("plan");

    deck.remove_slide("D2").expect("slide exists");
    let report = execute_plan(&mut deck, &plan, &config, &mut log).await;

    assert!(report
        .errors
        .iter()
        .any(|message| message == "Slide not found: D2"));
    assert!(deck.moves().iter().any(|(slide_id, _)| slide_id == "D3"));
}

#[test]
fn relocation_follows_slide_ids() {
    let mut log = RunLog::new();
    let slides = common::groups(&["A", "B"]);
    let groups = detect_groups(&slides, 0, AnchorThreshold::default(), &mut log);

    let mut moved = slides.clone();
    let a = moved.drain(0..3).collect::<Vec<Slide>>();
    moved.extend(a);

    let relocated = relocate_group(&groups[0], &moved).expect("all slides present");
    assert_eq!(relocated.slides, [3, 4, 5]);
    assert_eq!(relocated.anchor_slide_index, 3);

    moved.truncate(4);
    assert!(relocate_group(&groups[0], &moved).is_none());
}
