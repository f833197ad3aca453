mod common;

use schoolhub_core::settings::{STUDENT_INQUIRIES_ENABLED, TEACHER_INQUIRIES_ENABLED};
use schoolhub_core::SettingsStore;
use schoolhub_db::entities::system_setting;
use schoolhub_db::sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};

#[tokio::test]
async fn unset_key_returns_default() {
    let store = SettingsStore::new(common::migrated_db().await);

    for default in ["0", "1", "", "anything"] {
        let got = store.get("never_written", default).await;
        assert_eq!(got.value, default);
        assert!(!got.is_degraded());
    }
}

#[tokio::test]
async fn set_then_get_returns_stored_value_regardless_of_default() {
    let store = SettingsStore::new(common::migrated_db().await);

    store.set("flag_x", "1", None).await.unwrap();

    assert_eq!(store.get("flag_x", "0").await.value, "1");
    assert_eq!(store.get("flag_x", "1").await.value, "1");
    assert_eq!(store.get("flag_x", "zzz").await.value, "1");
}

#[tokio::test]
async fn set_is_idempotent_and_keeps_one_row() {
    let db = common::migrated_db().await;
    let store = SettingsStore::new(db.clone());

    store.set("motd", "hello", None).await.unwrap();
    store.set("motd", "hello", None).await.unwrap();

    let rows = system_setting::Entity::find()
        .filter(system_setting::Column::Key.eq("motd"))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn update_overwrites_value_and_keeps_description_when_omitted() {
    let db = common::migrated_db().await;
    let store = SettingsStore::new(db.clone());

    store
        .set(STUDENT_INQUIRIES_ENABLED, "1", Some("enable student inquiries"))
        .await
        .unwrap();
    let first = system_setting::Entity::find()
        .filter(system_setting::Column::Key.eq(STUDENT_INQUIRIES_ENABLED))
        .one(&db)
        .await
        .unwrap()
        .unwrap();

    store.set(STUDENT_INQUIRIES_ENABLED, "0", None).await.unwrap();
    let second = system_setting::Entity::find()
        .filter(system_setting::Column::Key.eq(STUDENT_INQUIRIES_ENABLED))
        .one(&db)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.value, "0");
    assert_eq!(second.description.as_deref(), Some("enable student inquiries"));
    assert!(second.updated_at >= first.updated_at);

    store
        .set(STUDENT_INQUIRIES_ENABLED, "0", Some("disable student inquiries"))
        .await
        .unwrap();
    let third = system_setting::Entity::find_by_id(first.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(third.description.as_deref(), Some("disable student inquiries"));
}

#[tokio::test]
async fn flags_read_as_booleans() {
    let store = SettingsStore::new(common::migrated_db().await);

    assert!(!store.get_flag(TEACHER_INQUIRIES_ENABLED, false).await.value);
    assert!(store.get_flag(TEACHER_INQUIRIES_ENABLED, true).await.value);

    store.set(TEACHER_INQUIRIES_ENABLED, "1", None).await.unwrap();
    assert!(store.get_flag(TEACHER_INQUIRIES_ENABLED, false).await.value);

    store.set(TEACHER_INQUIRIES_ENABLED, "0", None).await.unwrap();
    assert!(!store.get_flag(TEACHER_INQUIRIES_ENABLED, true).await.value);
}

#[tokio::test]
async fn list_is_ordered_by_key() {
    let store = SettingsStore::new(common::migrated_db().await);
    store.set("b_key", "2", None).await.unwrap();
    store.set("a_key", "1", None).await.unwrap();
    store.set("c_key", "3", None).await.unwrap();

    let keys: Vec<String> = store.list().await.unwrap().into_iter().map(|s| s.key).collect();
    assert_eq!(keys, vec!["a_key", "b_key", "c_key"]);
}

#[tokio::test]
async fn storage_failure_degrades_reads_and_reports_failed_writes() {
    let store = SettingsStore::new(common::bare_db().await);

    let got = store.get("flag_x", "fallback").await;
    assert_eq!(got.value, "fallback");
    assert!(got.is_degraded());

    let flag = store.get_flag("flag_x", true).await;
    assert!(flag.value);
    assert!(flag.is_degraded());

    assert!(store.set("flag_x", "1", None).await.is_err());
    assert!(store.list().await.is_err());
    assert!(store.lookup("flag_x").await.is_err());
}

#[tokio::test]
async fn lookup_returns_full_row() {
    let store = SettingsStore::new(common::migrated_db().await);
    assert!(store.lookup("school_motto").await.unwrap().is_none());

    store
        .set("school_motto", "Learn and lead", Some("Shown on the home page"))
        .await
        .unwrap();
    let row = store.lookup("school_motto").await.unwrap().unwrap();
    assert_eq!(row.value, "Learn and lead");
    assert_eq!(row.description.as_deref(), Some("Shown on the home page"));
}

#[tokio::test]
async fn failed_update_rolls_back_and_keeps_prior_value() {
    let db = common::migrated_db().await;
    let store = SettingsStore::new(db.clone());

    store.set("exam_mode", "v1", Some("first")).await.unwrap();

    db.execute_unprepared(
        "CREATE TRIGGER reject_setting_update BEFORE UPDATE ON system_settings \
         BEGIN SELECT RAISE(ABORT, 'updates rejected'); END",
    )
    .await
    .unwrap();

    assert!(store.set("exam_mode", "v2", Some("second")).await.is_err());

    let got = store.get("exam_mode", "default").await;
    assert!(!got.is_degraded());
    assert_eq!(got.value, "v1");

    let row = store.lookup("exam_mode").await.unwrap().unwrap();
    assert_eq!(row.description.as_deref(), Some("first"));
}

#[tokio::test]
async fn blank_description_keeps_stored_one() {
    let store = SettingsStore::new(common::migrated_db().await);

    store
        .set(TEACHER_INQUIRIES_ENABLED, "1", Some("enable teacher inquiries"))
        .await
        .unwrap();
    store.set(TEACHER_INQUIRIES_ENABLED, "0", Some("")).await.unwrap();
    store.set(TEACHER_INQUIRIES_ENABLED, "0", Some("   ")).await.unwrap();

    let row = store.lookup(TEACHER_INQUIRIES_ENABLED).await.unwrap().unwrap();
    assert_eq!(row.value, "0");
    assert_eq!(row.description.as_deref(), Some("enable teacher inquiries"));

    store.set("fresh_key", "1", Some("")).await.unwrap();
    let fresh = store.lookup("fresh_key").await.unwrap().unwrap();
    assert_eq!(fresh.description, None);
}
