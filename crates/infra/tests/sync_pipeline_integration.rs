//! End-to-end sync runs against SQLite repositories and the simulated ERP.

mod support;

use matsync_core::{HealthRepository, MaterialClient, ProductStore, SyncLogRepository, SyncRequest};
use matsync_domain::{
    codes, CanonicalField, ExternalRecord, HealthStatus, MatSyncError, NewProduct, ProductFields,
    SyncDirection, SyncRunStatus,
};
use support::{Stack, CONNECTOR_ID};

fn inbound() -> SyncRequest {
    SyncRequest { direction: Some(SyncDirection::Inbound), ..SyncRequest::default() }
}

fn outbound() -> SyncRequest {
    SyncRequest { direction: Some(SyncDirection::Outbound), ..SyncRequest::default() }
}

#[tokio::test(flavor = "multi_thread")]
async fn inbound_run_persists_products_identities_and_log() {
    let stack = Stack::new(SyncDirection::Bidirectional).await;

    let result = stack.orchestrator.execute_sync(CONNECTOR_ID, inbound()).await.unwrap();
    assert_eq!(result.status, SyncRunStatus::Completed);
    assert_eq!(result.records_processed, 3);
    assert_eq!(result.records_created, 3);

    let chair = stack.products.find_by_sku("DPP-CHAIR-001").await.unwrap().unwrap();
    assert_eq!(chair.fields.name.as_deref(), Some("Oak dining chair"));
    assert_eq!(chair.fields.certifications, vec!["FSC", "EU Ecolabel"]);
    assert_eq!(chair.fields.recyclability, Some(85.0));

    let identity = stack.provisioner.identity(chair.id).await.unwrap();
    assert!(identity.is_some());
    assert_eq!(stack.provisioner.trace_events(chair.id).await.unwrap().len(), 1);

    let logs = stack.sync_logs.recent(CONNECTOR_ID, 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].log_id, result.run_id);
    assert_eq!(logs[0].result.status, SyncRunStatus::Completed);

    let again = stack.orchestrator.execute_sync(CONNECTOR_ID, inbound()).await.unwrap();
    assert_eq!(again.records_skipped, 3);
    assert_eq!(stack.products.count().await.unwrap(), 3);

    let stats = stack.sync_logs.statistics(CONNECTOR_ID).await.unwrap();
    assert_eq!(stats.total_runs, 2);
    assert_eq!(stats.total_created, 3);
    assert!((stats.success_rate - 100.0).abs() < f64::EPSILON);
}

#[tokio::test(flavor = "multi_thread")]
async fn padded_business_key_does_not_overwrite_existing_product() {
    let stack = Stack::new(SyncDirection::Inbound).await;
    stack.orchestrator.execute_sync(CONNECTOR_ID, inbound()).await.unwrap();

    stack.erp.insert(ExternalRecord {
        material_number: format!("{:018}", 900),
        business_key: " DPP-LAMP-002".into(),
        last_changed: "20990101".into(),
        fields: [(codes::DESCRIPTION.to_string(), "Impostor lamp".to_string())]
            .into_iter()
            .collect(),
    });

    let result = stack.orchestrator.execute_sync(CONNECTOR_ID, inbound()).await.unwrap();
    assert_eq!(result.status, SyncRunStatus::Completed, "errors: {:?}", result.errors);
    assert_eq!(result.records_created, 1);
    assert_eq!(result.records_updated, 0);

    let lamp = stack.products.find_by_sku("DPP-LAMP-002").await.unwrap().unwrap();
    assert_eq!(lamp.fields.name.as_deref(), Some("Aluminium desk lamp"));
    let padded = stack.products.find_by_sku(" DPP-LAMP-002").await.unwrap().unwrap();
    assert_eq!(padded.fields.name.as_deref(), Some("Impostor lamp"));
    assert_ne!(padded.id, lamp.id);
    assert_eq!(stack.products.count().await.unwrap(), 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn dry_run_writes_nothing() {
    let stack = Stack::new(SyncDirection::Bidirectional).await;

    let request = SyncRequest { dry_run: true, ..inbound() };
    let result = stack.orchestrator.execute_sync(CONNECTOR_ID, request).await.unwrap();

    assert!(result.dry_run);
    assert_eq!(result.records_created, 3);
    assert_eq!(stack.products.count().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn outbound_pushes_newer_canonical_changes_and_new_products() {
    let stack = Stack::new(SyncDirection::Bidirectional).await;
    stack.orchestrator.execute_sync(CONNECTOR_ID, inbound()).await.unwrap();

    let lamp = stack.products.find_by_sku("DPP-LAMP-002").await.unwrap().unwrap();
    let mut fields = lamp.fields.clone();
    fields.write(CanonicalField::Warranty, "3 years").unwrap();
    stack.products.update(lamp.id, &fields).await.unwrap();

    let mut stool = ProductFields::default();
    stool.write(CanonicalField::Name, "Birch stool").unwrap();
    stack.products.create(&NewProduct { sku: "DPP-STOOL-004".into(), fields: stool }).await.unwrap();

    let result = stack.orchestrator.execute_sync(CONNECTOR_ID, outbound()).await.unwrap();
    assert_eq!(result.status, SyncRunStatus::Completed, "errors: {:?}", result.errors);
    assert_eq!(result.records_processed, 4);
    assert_eq!(result.records_created, 1);
    assert_eq!(result.records_updated, 1);
    assert_eq!(result.records_skipped, 2);
    assert_eq!(result.conflicts.len(), 1);

    let erp_lamp = stack.erp.get_record("DPP-LAMP-002").await.unwrap().unwrap();
    assert_eq!(erp_lamp.field(codes::WARRANTY), Some("3 years"));
    let erp_stool = stack.erp.get_record("DPP-STOOL-004").await.unwrap().unwrap();
    assert_eq!(erp_stool.field(codes::DESCRIPTION), Some("Birch stool"));
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_erp_fails_the_phase_and_marks_connector_unhealthy() {
    let stack = Stack::new(SyncDirection::Inbound).await;
    stack.erp.set_offline(true);

    let result = stack.orchestrator.execute_sync(CONNECTOR_ID, SyncRequest::default()).await.unwrap();
    assert_eq!(result.status, SyncRunStatus::Failed);
    assert_eq!(result.errors[0].record, "__inbound_fetch__");
    assert_eq!(result.errors[0].kind, MatSyncError::Network(String::new()).kind());

    let health = stack.monitor.check_connection(CONNECTOR_ID).await;
    assert_eq!(health.status, HealthStatus::Unhealthy);
    assert_eq!(health.consecutive_failures, 1);
    assert!(health.recommendation.is_some());
    let stored = stack.health.get(CONNECTOR_ID).await.unwrap().expect("health persisted");
    assert_eq!(stored.status, HealthStatus::Unhealthy);
    assert_eq!(stored.error, health.error);

    stack.erp.set_offline(false);
    let recovered = stack.monitor.check_connection(CONNECTOR_ID).await;
    assert_eq!(recovered.status, HealthStatus::Healthy);
    assert_eq!(recovered.consecutive_failures, 0);
}
