mod common;

use chrono::{TimeZone, Utc};
use deckorder_lib::{
    core::{
        run_log::RunLog,
        types::{Identity, IdentityMethod, IndexSlide, Rect, VisualOrderEntry},
    },
    db::{repositories::properties, Database, DocumentProperties},
    host::PropertyStore,
    reorder::mapping::{
        load_mapping, save_mapping, IndexSlideMapping, PlacedThumbnail, ThumbnailMapping,
        ThumbnailRecord, MAPPING_KEY, MAPPING_VERSION,
    },
};

fn sample_mapping() -> ThumbnailMapping {
    ThumbnailMapping::new(
        2,
        vec![IndexSlideMapping {
            slide_id: "idx".to_string(),
            slide_number: 1,
            thumbnails: (0..2)
                .map(|group_index| ThumbnailRecord {
                    image_object_id: format!("thumb{group_index}"),
                    position: group_index,
                    group_index,
                    group_slides: vec![1 + 3 * group_index, 2 + 3 * group_index, 3 + 3 * group_index],
                    original_order: group_index + 1,
                    slide_position: Some(1 + 3 * group_index),
                    drive_id: Some(common::content_id(&format!("G{group_index}"))),
                    visual_position: None,
                })
                .collect(),
        }],
    )
}

fn placed_entry(index_slide: usize, cell: usize, image: &str) -> VisualOrderEntry {
    VisualOrderEntry {
        index_slide,
        cell,
        image_object_id: image.to_string(),
        rect: Rect::new(0.0, 0.0, 202.0, 106.0),
        title: None,
        identity: Identity {
            method: IdentityMethod::TitleTag,
            group_index: Some(0),
            content_id: Some(common::content_id(image)),
        },
    }
}

#[tokio::test]
async fn mapping_round_trips_through_the_property_store() {
    let db = Database::in_memory().await.expect("db should initialize");
    let store = DocumentProperties::new(db, "deck-1");
    let mapping = sample_mapping();

    save_mapping(&store, &mapping).await.expect("save mapping");
    let mut log = RunLog::new();
    let loaded = load_mapping(&store, &mut log).await.expect("mapping present");

    assert_eq!(loaded, mapping);
    assert_eq!(loaded.total_thumbnails, 2);
    assert_eq!(
        loaded.find_by_content_id(&common::content_id("G1")).map(|r| r.group_index),
        Some(1)
    );
}

#[tokio::test]
async fn properties_are_scoped_per_document() {
    let db = Database::in_memory().await.expect("db should initialize");
    let first = DocumentProperties::new(db.clone(), "deck-1");
    let second = DocumentProperties::new(db.clone(), "deck-2");

    first.set_property(MAPPING_KEY, "one").await.expect("set first");
    second.set_property(MAPPING_KEY, "two").await.expect("set second");
    first.set_property(MAPPING_KEY, "uno").await.expect("overwrite first");

    assert_eq!(
        first.get_property(MAPPING_KEY).await.expect("get"),
        Some("uno".to_string())
    );
    assert_eq!(
        second.get_property(MAPPING_KEY).await.expect("get"),
        Some("two".to_string())
    );
    assert_eq!(
        properties::list_keys(db.pool(), "deck-1").await.expect("keys"),
        vec![MAPPING_KEY.to_string()]
    );

    assert!(first.delete_property(MAPPING_KEY).await.expect("delete"));
    assert!(!first.delete_property(MAPPING_KEY).await.expect("delete again"));
    assert_eq!(first.get_property(MAPPING_KEY).await.expect("get"), None);

    let err = properties::set_property(db.pool(), "deck-1", "  ", "x")
        .await
        .expect_err("empty key");
    assert_eq!(err.code(), "INVALID_INPUT");
}

#[tokio::test]
async fn unreadable_blobs_load_as_no_mapping() {
    let db = Database::in_memory().await.expect("db should initialize");
    let store = DocumentProperties::new(db, "deck-1");
    let mut log = RunLog::new();

    assert!(load_mapping(&store, &mut log).await.is_none());

    store.set_property(MAPPING_KEY, "{broken").await.expect("set");
    assert!(load_mapping(&store, &mut log).await.is_none());

    store
        .set_property(MAPPING_KEY, r#"{"version": 3, "slides": [{"slideId": "idx"}]}"#)
        .await
        .expect("set");
    assert!(load_mapping(&store, &mut log).await.is_none());
    assert!(log.contains("newer than supported"));
}

#[tokio::test]
async fn mapping_survives_reopening_the_database() {
    let dir = tempfile::tempdir().expect("temp dir");
    {
        let db = Database::new(dir.path()).await.expect("db should initialize");
        let store = DocumentProperties::new(db, "deck-1");
        save_mapping(&store, &sample_mapping()).await.expect("save mapping");
    }

    let db = Database::new(dir.path()).await.expect("db should reopen");
    let store = DocumentProperties::new(db, "deck-1");
    let mut log = RunLog::new();
    let loaded = load_mapping(&store, &mut log).await.expect("mapping persisted");
    assert_eq!(loaded.slides[0].slide_id, "idx");
    assert_eq!(loaded.version, MAPPING_VERSION);
}

#[test]
fn rewrite_records_the_realized_order() {
    let mut mapping = sample_mapping();
    let index_slides = vec![
        IndexSlide {
            slide_id: "idx".to_string(),
            position: 0,
            index_num: 1,
            grid: None,
        },
        IndexSlide {
            slide_id: "idx2".to_string(),
            position: 1,
            index_num: 2,
            grid: None,
        },
    ];
    let entries = vec![
        placed_entry(0, 0, "late"),
        placed_entry(0, 1, "early"),
        placed_entry(1, 0, "last"),
    ];
    let placed = entries
        .iter()
        .enumerate()
        .map(|(rank, entry)| PlacedThumbnail {
            entry,
            visual_position: rank + 1,
        })
        .collect::<Vec<_>>();
    let at = Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap();

    mapping.rewrite_after_reorder(&index_slides, &placed, 3, at);

    assert_eq!(mapping.last_reorder, Some(at));
    assert_eq!(mapping.total_thumbnails, 3);
    assert_eq!(mapping.total_groups, 3);
    assert_eq!(mapping.slides.len(), 2);

    let second = &mapping.slides[0].thumbnails[1];
    assert_eq!(second.image_object_id, "early");
    assert_eq!(second.group_index, 1);
    assert_eq!(second.original_order, 2);
    assert_eq!(second.visual_position, Some(2));
    assert_eq!(second.group_slides, vec![5, 6, 7]);
    assert_eq!(second.slide_position, Some(5));
    assert_eq!(second.drive_id, Some(common::content_id("early")));

    let last = &mapping.slides[1].thumbnails[0];
    assert_eq!(last.group_index, 2);
    assert_eq!(last.group_slides, vec![8, 9, 10]);
}
