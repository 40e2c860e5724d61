use patient_store::prelude::*;
use tempfile::TempDir;
use tokio::task::JoinSet;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_channel() -> Result<(), StoreError> {
    let store = PatientStore::new(StoreOptions::in_memory());

    let mut set = JoinSet::new();
    for _ in 0..16 {
        let client = store.clone();
        set.spawn(async move { client.ensure_initialized().await });
    }

    let mut handles = Vec::new();
    while let Some(joined) = set.join_next().await {
        handles.push(joined.expect("task panicked")?);
    }

    let first = &handles[0];
    assert!(handles.iter().all(|h| h.ptr_eq(first)));
    assert!(handles.iter().all(|h| h.channel_id() == first.channel_id()));
    assert_eq!(store.lifecycle().channels_created(), 1);
    assert_eq!(store.lifecycle().attempts(), 1);
    Ok(())
}

#[tokio::test]
async fn later_calls_return_cached_handle() -> Result<(), StoreError> {
    let store = PatientStore::new(StoreOptions::in_memory());
    assert!(!store.lifecycle().is_initialized());

    let first = store.ensure_initialized().await?;
    let second = store.clone().ensure_initialized().await?;

    assert!(first.ptr_eq(&second));
    assert!(store.lifecycle().is_initialized());
    assert_eq!(store.lifecycle().attempts(), 1);
    Ok(())
}

#[tokio::test]
async fn empty_path_fails_initialization() {
    let store = PatientStore::new(StoreOptions::new(""));
    let err = store.ensure_initialized().await.unwrap_err();
    assert!(err.is_initialization_error());
    assert!(err.to_string().contains("db_path must not be empty"));
    assert_eq!(store.lifecycle().channels_created(), 0);
}

#[tokio::test]
async fn retry_policy_recovers_after_failure() -> Result<(), StoreError> {
    let dir = TempDir::new().expect("tempdir");
    let parent = dir.path().join("not-yet");
    let db_path = parent.join("clinic.db");
    let store = PatientStore::builder(db_path.to_string_lossy())
        .failure_policy(InitFailurePolicy::Retry)
        .build();

    let err = store.ensure_initialized().await.unwrap_err();
    assert!(err.is_initialization_error());
    assert!(!store.lifecycle().is_initialized());

    std::fs::create_dir_all(&parent).expect("create parent");
    store.ensure_initialized().await?;
    assert!(store.lifecycle().is_initialized());
    assert_eq!(store.lifecycle().attempts(), 2);
    Ok(())
}

#[tokio::test]
async fn fatal_policy_caches_first_failure() {
    let dir = TempDir::new().expect("tempdir");
    let parent = dir.path().join("not-yet");
    let db_path = parent.join("clinic.db");
    let store = PatientStore::builder(db_path.to_string_lossy())
        .failure_policy(InitFailurePolicy::Fatal)
        .build();

    let first = store.ensure_initialized().await.unwrap_err();
    std::fs::create_dir_all(&parent).expect("create parent");
    let second = store.ensure_initialized().await.unwrap_err();

    assert!(second.is_initialization_error());
    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(store.lifecycle().attempts(), 1);
}

#[tokio::test]
async fn schema_provisioning_is_idempotent() -> Result<(), StoreError> {
    let dir = TempDir::new().expect("tempdir");
    let db_path = dir.path().join("clinic.db").to_string_lossy().into_owned();

    let first = PatientStore::new(StoreOptions::new(db_path.clone()));
    first
        .register_patient(&NewPatient::new("Ada", "Lovelace", 28, "female", "555-0100"))
        .await?;

    // a second process-level store on the same file provisions again
    let second = PatientStore::new(StoreOptions::new(db_path));
    let handle = second.ensure_initialized().await?;
    patient_store::schema::provision_schema(&handle).await?;

    let rows = second.list_all_patients().await?;
    assert_eq!(rows.len(), 1);
    Ok(())
}
