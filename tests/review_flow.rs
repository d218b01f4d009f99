use std::sync::Arc;
use std::time::Duration;

use image::{Rgb, RgbImage};
use tokio_util::sync::CancellationToken;

use player_attribution::batch::{BatchConfig, BatchSample, FrameSource, MaskMode};
use player_attribution::calibration::{ColorProfile, MemoryCalibrationStore};
use player_attribution::review::{FlushOutcome, ReviewChoice, ReviewReason};
use player_attribution::{ActionRecord, Attribution, Database, OfflineBatchClassifier, Player, ReviewQueue};

fn open() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path().join("attribution.sqlite3")).unwrap();
    (dir, db)
}

#[tokio::test]
async fn reviewed_labels_reach_the_store_in_one_batch() {
    let (_dir, db) = open();
    let confident = ActionRecord::new("s1", "build", None, Attribution::PlayerA, 0.97);
    let unsure = ActionRecord::new("s1", "build", None, Attribution::PlayerB, 0.41);
    let unknown = ActionRecord::new("s1", "build", None, Attribution::Unknown, 0.0);
    for record in [&confident, &unsure, &unknown] {
        db.insert_move(record).await.unwrap();
    }

    let moves = db.list_moves_for_session("s1").await.unwrap();
    let mut queue = ReviewQueue::from_records(moves, 0.6);
    assert_eq!(queue.remaining(), 2);

    while let Some(item) = queue.current() {
        let choice = match item.reason {
            ReviewReason::LowConfidence => ReviewChoice::Player(Player::A),
            ReviewReason::Unattributed => ReviewChoice::Player(Player::B),
        };
        queue.decide(choice);
    }

    let outcome = queue.flush(&db, Duration::from_secs(5)).await.unwrap();
    assert_eq!(outcome, FlushOutcome::Written(2));
    assert!(queue.is_drained());

    let unsure = db.get_move(&unsure.move_id).await.unwrap().unwrap();
    assert_eq!(unsure.assigned_player, Attribution::PlayerA);
    assert_eq!(unsure.confidence, 1.0);
    let unknown = db.get_move(&unknown.move_id).await.unwrap().unwrap();
    assert_eq!(unknown.assigned_player, Attribution::PlayerB);
    let confident = db.get_move(&confident.move_id).await.unwrap().unwrap();
    assert_eq!(confident.confidence, 0.97);

    // reviewed moves are stored at full confidence and leave the queue
    let again = ReviewQueue::from_records(db.list_moves_for_session("s1").await.unwrap(), 0.6);
    assert!(again.is_drained());
}

#[tokio::test]
async fn flush_against_a_missing_move_keeps_every_decision() {
    let (_dir, db) = open();
    let real = ActionRecord::new("s1", "build", None, Attribution::None, 0.0);
    db.insert_move(&real).await.unwrap();
    let phantom = ActionRecord::new("s1", "build", None, Attribution::None, 0.0);

    let mut queue = ReviewQueue::from_records(vec![real.clone(), phantom], 0.6);
    queue.decide(ReviewChoice::Player(Player::A));
    queue.decide(ReviewChoice::Player(Player::B));

    assert!(queue.flush(&db, Duration::from_secs(5)).await.is_err());
    assert_eq!(queue.pending().len(), 2);

    let untouched = db.get_move(&real.move_id).await.unwrap().unwrap();
    assert_eq!(untouched.assigned_player, Attribution::None);
}

#[tokio::test]
async fn offline_results_written_back_then_reviewed() {
    let (dir, db) = open();
    let red = RgbImage::from_pixel(40, 40, Rgb([220, 20, 20]));
    let blue = RgbImage::from_pixel(40, 40, Rgb([20, 20, 220]));

    let mut records = Vec::new();
    for (i, frame) in [&red, &blue, &red, &blue, &red].into_iter().enumerate() {
        let path = dir.path().join(format!("frame-{i}.png"));
        frame.save(&path).unwrap();
        let record = ActionRecord::new(
            "s1",
            "build",
            Some(path.to_string_lossy().into_owned()),
            Attribution::Unknown,
            0.0,
        );
        db.insert_move(&record).await.unwrap();
        records.push(record);
    }
    db.archive_session("s1").await.unwrap();

    let samples = db
        .list_moves_for_session("s1")
        .await
        .unwrap()
        .into_iter()
        .map(|r| BatchSample {
            source: FrameSource::Path(r.captured_frame.clone().unwrap().into()),
            move_id: r.move_id,
            existing_label: None,
        })
        .collect();

    let calibration = Arc::new(MemoryCalibrationStore::with_profiles(
        Some(ColorProfile::new(0.0, 230.0, 220.0)),
        Some(ColorProfile::new(120.0, 230.0, 220.0)),
    ));
    let config = BatchConfig {
        mask_mode: MaskMode::General,
        ..BatchConfig::default()
    };
    let outcome = OfflineBatchClassifier::new(config, calibration, None)
        .run(samples, &CancellationToken::new())
        .await
        .unwrap();

    // archived sessions still take label updates
    assert_eq!(db.apply_attributions(&outcome.updates()).await.unwrap(), 5);

    let stored = db.get_move(&records[0].move_id).await.unwrap().unwrap();
    assert_eq!(stored.assigned_player, Attribution::PlayerA);
    let stored = db.get_move(&records[1].move_id).await.unwrap().unwrap();
    assert_eq!(stored.assigned_player, Attribution::PlayerB);

    // identical frames sit on their centroids, so nothing needs review
    let queue = ReviewQueue::from_records(db.list_moves_for_session("s1").await.unwrap(), 0.6);
    assert_eq!(queue.remaining(), 0);
}
