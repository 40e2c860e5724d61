use patient_store::prelude::*;

async fn seeded_store() -> Result<PatientStore, StoreError> {
    let store = PatientStore::new(StoreOptions::in_memory());
    store
        .register_patient(&NewPatient::new("Ada", "Lovelace", 28, "female", "555-0100"))
        .await?;
    Ok(store)
}

#[tokio::test]
async fn missing_table_resolves_to_failure_envelope() -> Result<(), StoreError> {
    let store = seeded_store().await?;
    let result = store
        .execute_query("select * from nonexistent_table", &[])
        .await;

    assert!(!result.success);
    assert!(result.data.is_empty());
    let message = result.error.expect("failure carries a message");
    assert!(message.contains("nonexistent_table"), "{message}");
    Ok(())
}

#[tokio::test]
async fn select_returns_rows_in_column_order() -> Result<(), StoreError> {
    let store = seeded_store().await?;
    let result = store
        .execute_query(
            "SELECT first_name, age FROM patients WHERE last_name = $1",
            &[DbValue::from("Lovelace")],
        )
        .await;

    assert!(result.success);
    assert_eq!(result.error, None);
    assert_eq!(result.data.len(), 1);
    let row = &result.data[0];
    assert_eq!(row.get("first_name").and_then(DbValue::as_text), Some("Ada"));
    assert_eq!(row.get_by_index(1), Some(&DbValue::Int(28)));
    Ok(())
}

#[tokio::test]
async fn numbered_placeholders_bind_by_number() -> Result<(), StoreError> {
    let store = PatientStore::new(StoreOptions::in_memory());
    let params = [DbValue::Int(1), DbValue::Int(2)];

    let translated = store.execute_query("SELECT $2 AS a, $1 AS b", &params).await;
    assert!(translated.success);
    assert_eq!(translated.data[0].get("a"), Some(&DbValue::Int(2)));
    assert_eq!(translated.data[0].get("b"), Some(&DbValue::Int(1)));

    // untranslated, SQLite numbers `$name` parameters by first appearance
    let raw = store
        .execute_query_with("SELECT $2 AS a, $1 AS b", &params, TranslationMode::ForceOff)
        .await;
    assert!(raw.success);
    assert_eq!(raw.data[0].get("a"), Some(&DbValue::Int(1)));
    Ok(())
}

#[tokio::test]
async fn statements_without_rows_report_empty_data() -> Result<(), StoreError> {
    let store = seeded_store().await?;
    let update = store
        .execute_query(
            "UPDATE patients SET age = $1 WHERE last_name = $2",
            &[DbValue::Int(29), DbValue::from("Lovelace")],
        )
        .await;
    assert!(update.success);
    assert!(update.data.is_empty());

    let records = store.list_all_patients().await?;
    assert_eq!(records[0].age, 29);
    Ok(())
}

#[tokio::test]
async fn identity_columns_cannot_change() -> Result<(), StoreError> {
    let store = seeded_store().await?;
    let result = store
        .execute_query("UPDATE patients SET id = 99", &[])
        .await;
    assert!(!result.success);
    assert!(
        result
            .error
            .as_deref()
            .is_some_and(|m| m.contains("immutable"))
    );

    let records = store.list_all_patients().await?;
    assert_ne!(records[0].id, 99);
    Ok(())
}

#[tokio::test]
async fn mistyped_age_is_rejected_and_reads_keep_working() -> Result<(), StoreError> {
    let store = seeded_store().await?;

    let insert = store
        .execute_query(
            "INSERT INTO patients (first_name, last_name, age, gender, phone) \
             VALUES ('Alan', 'Turing', 'unknown', 'male', '555-0101')",
            &[],
        )
        .await;
    assert!(!insert.success);
    assert!(insert.error.is_some());

    let update = store
        .execute_query("UPDATE patients SET age = 28.5", &[])
        .await;
    assert!(!update.success);

    let records = store.list_all_patients().await?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].age, 28);
    assert_eq!(store.search_patients_by_name("ada").await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn integral_text_age_is_stored_as_integer() -> Result<(), StoreError> {
    let store = seeded_store().await?;
    let update = store
        .execute_query("UPDATE patients SET age = '30'", &[])
        .await;
    assert!(update.success);
    assert_eq!(store.list_all_patients().await?[0].age, 30);
    Ok(())
}

#[tokio::test]
async fn duplicate_columns_serialize_first_value() -> Result<(), StoreError> {
    let store = PatientStore::new(StoreOptions::in_memory());
    let result = store.execute_query("SELECT 1 AS id, 2 AS id", &[]).await;
    assert_eq!(result.data[0].get("id"), Some(&DbValue::Int(1)));
    let json = serde_json::to_string(&result).expect("serializable");
    assert_eq!(json, r#"{"success":true,"data":[{"id":1}],"error":null}"#);
    Ok(())
}

#[tokio::test]
async fn envelope_serializes_for_the_ui() {
    let store = PatientStore::new(StoreOptions::in_memory());
    let result = store.execute_query("SELECT 1 AS one, 'x' AS two", &[]).await;
    let json = serde_json::to_string(&result).unwrap();
    assert_eq!(
        json,
        r#"{"success":true,"data":[{"one":1,"two":"x"}],"error":null}"#
    );
}

#[tokio::test]
async fn initialization_failure_stays_inside_envelope() {
    let store = PatientStore::new(StoreOptions::new(""));
    let result = store.execute_query("SELECT 1", &[]).await;
    assert!(!result.success);
    assert!(result.data.is_empty());
    assert!(
        result
            .error
            .as_deref()
            .is_some_and(|m| m.starts_with("Store initialization failed"))
    );
}
