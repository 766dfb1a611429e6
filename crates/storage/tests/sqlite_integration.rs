use chrono::Duration;
use onboard_core::model::{
    LearnerId, ModuleCategory, ModuleDraft, ModuleId, ProgressPatch, Question, Score, StaffRole,
    ValidatedModule,
};
use onboard_core::time::fixed_now;
use storage::repository::{ModuleRepository, ProgressRepository, StorageError};
use storage::sqlite::SqliteRepository;

async fn repo(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn module(title: &str, role: StaffRole) -> ValidatedModule {
    ModuleDraft {
        title: title.into(),
        description: "Campus orientation".into(),
        role,
        category: ModuleCategory::Refresher,
        folder: Some("Safety".into()),
        video_url: "https://youtu.be/abc123".into(),
        transcript: "Exits are marked in green.".into(),
        questions: vec![
            Question::new("Where are exits?", vec!["Green".into(), "Red".into()], 0).unwrap(),
            Question::new("Drill frequency?", vec!["Monthly".into(), "Never".into()], 0).unwrap(),
        ],
    }
    .validate()
    .unwrap()
}

fn learner() -> LearnerId {
    LearnerId::new("Teacher@Darshan.org").unwrap()
}

#[tokio::test]
async fn sqlite_roundtrip_preserves_module_fields() {
    let repo = repo("memdb_module_roundtrip").await;

    let inserted = repo
        .insert_new_module(module("Fire Safety", StaffRole::Teacher))
        .await
        .unwrap();
    let fetched = repo.get_module(inserted.id()).await.unwrap().expect("module");

    assert_eq!(fetched, inserted);
    assert_eq!(fetched.folder_name(), "Safety");
    assert_eq!(fetched.category(), ModuleCategory::Refresher);
    assert_eq!(fetched.questions().len(), 2);
    assert!(fetched.questions()[0].is_correct(0));
    assert_eq!(repo.get_module(ModuleId::new(999)).await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_assigns_ordinals_per_role_in_creation_order() {
    let repo = repo("memdb_ordinals").await;

    let first = repo
        .insert_new_module(module("One", StaffRole::Teacher))
        .await
        .unwrap();
    let guard = repo
        .insert_new_module(module("Gate", StaffRole::Security))
        .await
        .unwrap();
    let second = repo
        .insert_new_module(module("Two", StaffRole::Teacher))
        .await
        .unwrap();

    assert_eq!(first.ordinal(), 0);
    assert_eq!(guard.ordinal(), 0);
    assert_eq!(second.ordinal(), 1);

    let teacher: Vec<_> = repo
        .list_modules(StaffRole::Teacher)
        .await
        .unwrap()
        .iter()
        .map(|m| m.id())
        .collect();
    assert_eq!(teacher, vec![first.id(), second.id()]);
    assert_eq!(repo.list_all_modules().await.unwrap().len(), 3);
}

#[tokio::test]
async fn sqlite_write_progress_merges_and_stamps() {
    let repo = repo("memdb_progress_merge").await;
    let m = repo
        .insert_new_module(module("Fire Safety", StaffRole::Teacher))
        .await
        .unwrap();
    let who = learner();
    let at = fixed_now();

    assert_eq!(repo.read_progress(&who, m.id()).await.unwrap(), None);

    let watched = repo
        .write_progress(&who, m.id(), &ProgressPatch::new().with_video_watched(true), at)
        .await
        .unwrap();
    assert!(watched.video_watched());
    assert_eq!(watched.updated_at(), Some(at));

    let later = at + Duration::minutes(5);
    let failed = ProgressPatch::new()
        .with_score(Some(Score::new(50).unwrap()))
        .with_passed(false)
        .with_attempts(1);
    repo.write_progress(&who, m.id(), &failed, later).await.unwrap();

    let stored = repo.read_progress(&who, m.id()).await.unwrap().expect("row");
    assert!(stored.video_watched());
    assert_eq!(stored.score().map(Score::value), Some(50));
    assert!(!stored.passed());
    assert_eq!(stored.attempts(), 1);
    assert_eq!(stored.updated_at(), Some(later));
    assert_eq!(stored.learner_id().as_str(), "teacher@darshan.org");

    let cleared = repo
        .write_progress(&who, m.id(), &ProgressPatch::new().with_score(None), later)
        .await
        .unwrap();
    assert_eq!(cleared.score(), None);
    assert_eq!(cleared.attempts(), 1);
}

#[tokio::test]
async fn sqlite_write_for_unknown_module_is_not_found() {
    let repo = repo("memdb_progress_unknown").await;
    let err = repo
        .write_progress(
            &learner(),
            ModuleId::new(42),
            &ProgressPatch::new().with_video_watched(true),
            fixed_now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
    assert!(repo.list_all_progress().await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_delete_module_cascades_progress() {
    let repo = repo("memdb_delete_cascade").await;
    let keep = repo
        .insert_new_module(module("Keep", StaffRole::Teacher))
        .await
        .unwrap();
    let gone = repo
        .insert_new_module(module("Gone", StaffRole::Teacher))
        .await
        .unwrap();
    let who = learner();
    let patch = ProgressPatch::new().with_video_watched(true);
    repo.write_progress(&who, keep.id(), &patch, fixed_now()).await.unwrap();
    repo.write_progress(&who, gone.id(), &patch, fixed_now()).await.unwrap();

    repo.delete_module(gone.id()).await.unwrap();

    let remaining = repo.list_progress(&who).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].module_id(), keep.id());
    assert!(matches!(
        repo.delete_module(gone.id()).await.unwrap_err(),
        StorageError::NotFound
    ));
}

#[tokio::test]
async fn sqlite_delete_learner_progress_removes_only_that_learner() {
    let repo = repo("memdb_delete_learner").await;
    let m = repo
        .insert_new_module(module("Fire Safety", StaffRole::Teacher))
        .await
        .unwrap();
    let other = LearnerId::new("guard@darshan.org").unwrap();
    let patch = ProgressPatch::new().with_video_watched(true);
    repo.write_progress(&learner(), m.id(), &patch, fixed_now()).await.unwrap();
    repo.write_progress(&other, m.id(), &patch, fixed_now()).await.unwrap();

    assert_eq!(repo.delete_learner_progress(&learner()).await.unwrap(), 1);
    let all = repo.list_all_progress().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].learner_id(), &other);
}

#[tokio::test]
async fn sqlite_migrate_is_idempotent() {
    let repo = repo("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    repo.insert_new_module(module("After", StaffRole::Principal))
        .await
        .unwrap();
}
