//! Submissions driven directly through the pipeline with a SQLite store.

use order_intake_lib::error::IngestError;
use order_intake_lib::models::{OrderFields, SkipReason};
use order_intake_lib::services::Upload;
use sea_orm::ConnectionTrait;

use super::test_helpers::{TestEnv, complete_fields};

#[tokio::test]
async fn test_accepted_and_rejected_files() {
    let env = TestEnv::new().await;
    let uploads = vec![
        Upload::new("x.ab1", b"trace-data".to_vec()),
        Upload::new("y.txt", b"notes".to_vec()),
    ];

    let summary = env
        .pipeline()
        .run(complete_fields(), uploads)
        .await
        .unwrap();

    assert_eq!(summary.stored_file_count, 1);
    assert_eq!(summary.skipped_files.len(), 1);
    assert_eq!(summary.skipped_files[0].filename, "y.txt");
    assert_eq!(
        summary.skipped_files[0].reason,
        SkipReason::InvalidExtension {
            extension: ".txt".to_string()
        }
    );

    let dirs = env.order_dirs();
    assert_eq!(dirs.len(), 1);
    let dir_name = dirs[0].file_name().unwrap().to_str().unwrap().to_string();
    assert!(dir_name.ends_with("_ab1"));
    assert!(dir_name.contains(&summary.order_number));
    assert_eq!(std::fs::read(dirs[0].join("x.ab1")).unwrap(), b"trace-data");
    assert!(!dirs[0].join("y.txt").exists());

    let order = env
        .pool
        .get_order_by_number(&summary.order_number)
        .await
        .unwrap()
        .expect("order row");
    assert_eq!(Some(order.id), summary.order_id);
    assert_eq!(order.name, "A");
    assert_eq!(order.institution, "B");
    assert_eq!(order.email, "c@d.com");

    let files = env.pool.get_order_files(order.id).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file, format!("{}/x.ab1", dir_name));
}

#[tokio::test]
async fn test_missing_fields_leaves_empty_directory() {
    let env = TestEnv::new().await;
    let fields = OrderFields::new("", "B", "c@d.com");

    let err = env
        .pipeline()
        .run(fields, vec![Upload::new("x.ab1", b"data".to_vec())])
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::MissingFields { .. }));
    assert_eq!(env.pool.count_orders().await.unwrap(), 0);

    let dirs = env.order_dirs();
    assert_eq!(dirs.len(), 1);
    assert_eq!(std::fs::read_dir(&dirs[0]).unwrap().count(), 0);
}

#[tokio::test]
async fn test_zero_files_writes_nothing() {
    let env = TestEnv::new().await;

    let summary = env
        .pipeline()
        .run(complete_fields(), Vec::new())
        .await
        .unwrap();

    assert!(summary.is_empty());
    assert_eq!(summary.order_id, None);
    assert!(env.order_dirs().is_empty());
    assert_eq!(env.pool.count_orders().await.unwrap(), 0);
    assert_eq!(env.pool.count_order_files().await.unwrap(), 0);
}

#[tokio::test]
async fn test_all_files_rejected_writes_nothing() {
    let env = TestEnv::new().await;
    let uploads = vec![
        Upload::new("a.txt", b"a".to_vec()),
        Upload::new("b.AB1", b"b".to_vec()),
        Upload::new("c", b"c".to_vec()),
    ];

    let summary = env
        .pipeline()
        .run(complete_fields(), uploads)
        .await
        .unwrap();

    assert_eq!(summary.stored_file_count, 0);
    assert_eq!(summary.skipped_files.len(), 3);
    assert!(env.order_dirs().is_empty());
    assert_eq!(env.pool.count_orders().await.unwrap(), 0);
}

#[tokio::test]
async fn test_persistence_failure_keeps_files_without_rows() {
    let env = TestEnv::new().await;
    env.pool
        .connection()
        .execute_unprepared(
            "CREATE TRIGGER reject_all_files BEFORE INSERT ON order_files \
             BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
        )
        .await
        .unwrap();

    let err = env
        .pipeline()
        .run(
            complete_fields(),
            vec![Upload::new("x.ab1", b"data".to_vec())],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::PersistenceFailed { .. }));
    assert_eq!(env.pool.count_orders().await.unwrap(), 0);
    assert_eq!(env.pool.count_order_files().await.unwrap(), 0);

    let dirs = env.order_dirs();
    assert_eq!(dirs.len(), 1);
    assert!(dirs[0].join("x.ab1").exists());
}

#[tokio::test]
async fn test_sequential_submissions_get_distinct_orders() {
    let env = TestEnv::new().await;
    let pipeline = env.pipeline();

    let first = pipeline
        .run(complete_fields(), vec![Upload::new("x.ab1", b"1".to_vec())])
        .await
        .unwrap();
    let second = pipeline
        .run(complete_fields(), vec![Upload::new("x.ab1", b"2".to_vec())])
        .await
        .unwrap();

    assert_ne!(first.order_number, second.order_number);
    assert_eq!(env.order_dirs().len(), 2);
    assert_eq!(env.pool.count_orders().await.unwrap(), 2);
    assert_eq!(env.pool.count_order_files().await.unwrap(), 2);
}
