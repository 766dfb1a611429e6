use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use onboard_core::model::{
    LearnerId, ModuleCategory, ModuleDraft, ModuleId, ProgressPatch, ProgressRecord, Question,
    StaffMember, StaffRole,
};
use onboard_core::time::fixed_now;
use services::{Clock, LearnerError, LearnerService};
use storage::repository::{
    InMemoryRepository, ModuleRepository, ProgressRepository, StorageError,
};

/// Progress gateway that can be switched into failing reads or writes.
#[derive(Clone, Default)]
struct FlakyGateway {
    inner: InMemoryRepository,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyGateway {
    fn check(flag: &AtomicBool) -> Result<(), StorageError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("gateway unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProgressRepository for FlakyGateway {
    async fn read_progress(
        &self,
        learner: &LearnerId,
        module_id: ModuleId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        Self::check(&self.fail_reads)?;
        self.inner.read_progress(learner, module_id).await
    }

    async fn list_progress(
        &self,
        learner: &LearnerId,
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        Self::check(&self.fail_reads)?;
        self.inner.list_progress(learner).await
    }

    async fn list_all_progress(&self) -> Result<Vec<ProgressRecord>, StorageError> {
        Self::check(&self.fail_reads)?;
        self.inner.list_all_progress().await
    }

    async fn write_progress(
        &self,
        learner: &LearnerId,
        module_id: ModuleId,
        patch: &ProgressPatch,
        at: DateTime<Utc>,
    ) -> Result<ProgressRecord, StorageError> {
        Self::check(&self.fail_writes)?;
        self.inner.write_progress(learner, module_id, patch, at).await
    }

    async fn delete_learner_progress(&self, learner: &LearnerId) -> Result<u64, StorageError> {
        Self::check(&self.fail_writes)?;
        self.inner.delete_learner_progress(learner).await
    }
}

fn learner() -> StaffMember {
    StaffMember::new(
        LearnerId::new("guard@darshan.org").unwrap(),
        "Gopal",
        StaffRole::Security,
    )
}

async fn setup() -> (FlakyGateway, ModuleId) {
    let gateway = FlakyGateway::default();
    let module = gateway
        .inner
        .insert_new_module(
            ModuleDraft {
                title: "Gate Duty".into(),
                description: String::new(),
                role: StaffRole::Security,
                category: ModuleCategory::New,
                folder: None,
                video_url: "https://youtu.be/gate".into(),
                transcript: String::new(),
                questions: vec![Question::new("Q", vec!["A".into(), "B".into()], 0).unwrap()],
            }
            .validate()
            .unwrap(),
        )
        .await
        .unwrap();
    (gateway, module.id())
}

async fn open(gateway: &FlakyGateway) -> Result<LearnerService, LearnerError> {
    LearnerService::open(
        Clock::fixed(fixed_now()),
        learner(),
        Arc::new(gateway.inner.clone()),
        Arc::new(gateway.clone()),
    )
    .await
}

#[tokio::test]
async fn failed_write_keeps_optimistic_state_until_refresh() {
    let (gateway, module) = setup().await;
    let mut service = open(&gateway).await.unwrap();

    gateway.fail_writes.store(true, Ordering::SeqCst);
    let err = service.mark_video_watched(module).await.unwrap_err();
    assert!(matches!(err, LearnerError::GatewayWrite { module: m, .. } if m == module));

    let optimistic = service.progress(module).expect("optimistic record");
    assert!(optimistic.video_watched());
    assert_eq!(optimistic.updated_at(), None);

    service.refresh().await.unwrap();
    assert!(service.progress(module).is_none());

    gateway.fail_writes.store(false, Ordering::SeqCst);
    let durable = service.mark_video_watched(module).await.unwrap();
    assert_eq!(durable.updated_at(), Some(fixed_now()));
}

#[tokio::test]
async fn failed_read_is_not_treated_as_empty_progress() {
    let (gateway, module) = setup().await;
    let mut service = open(&gateway).await.unwrap();
    service.mark_video_watched(module).await.unwrap();

    gateway.fail_reads.store(true, Ordering::SeqCst);
    assert!(matches!(
        open(&gateway).await.err(),
        Some(LearnerError::GatewayRead(_))
    ));

    let err = service.refresh().await.unwrap_err();
    assert!(matches!(err, LearnerError::GatewayRead(_)));
    assert!(service.progress(module).unwrap().video_watched());
}
