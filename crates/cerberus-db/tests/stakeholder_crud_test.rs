//! Integration tests for stakeholder CRUD, listing filters and soft delete.

use cerberus_db::test_fixtures::{connect_test_db, TestProgram};
use cerberus_db::{
    CreateStakeholderRequest, EngagementLevel, Error, StakeholderFilter, StakeholderRepository,
    StakeholderType, UpdateStakeholderRequest,
};

fn request(name: &str, stakeholder_type: &str) -> CreateStakeholderRequest {
    CreateStakeholderRequest {
        person_name: name.to_string(),
        stakeholder_type: stakeholder_type.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "requires migrated PostgreSQL database"]
async fn test_create_and_get_stakeholder() {
    let db = connect_test_db().await;
    let program = TestProgram::create(&db.pool, None).await;

    let created = db
        .stakeholders
        .create(
            program.program_id,
            &CreateStakeholderRequest {
                engagement_level: Some("Key".to_string()),
                is_internal: true,
                role: Some("CFO".to_string()),
                ..request("  Jane Doe ", "Internal")
            },
        )
        .await
        .expect("create stakeholder");

    assert_eq!(created.person_name, "Jane Doe");
    assert_eq!(created.stakeholder_type, StakeholderType::Internal);
    assert_eq!(created.engagement_level, Some(EngagementLevel::Key));
    assert!(created.is_internal);

    let fetched = db
        .stakeholders
        .get(program.program_id, created.stakeholder_id)
        .await
        .expect("get stakeholder");
    assert_eq!(fetched.stakeholder_id, created.stakeholder_id);
    assert_eq!(fetched.role.as_deref(), Some("CFO"));

    program.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated PostgreSQL database"]
async fn test_create_rejects_unknown_type() {
    let db = connect_test_db().await;
    let program = TestProgram::create(&db.pool, None).await;

    let err = db
        .stakeholders
        .create(program.program_id, &request("Jane Doe", "contractor"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    program.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated PostgreSQL database"]
async fn test_list_filters_and_orders_by_name() {
    let db = connect_test_db().await;
    let program = TestProgram::create(&db.pool, None).await;

    for (name, kind) in [("Zed", "vendor"), ("Amy", "vendor"), ("Bob", "customer")] {
        db.stakeholders
            .create(program.program_id, &request(name, kind))
            .await
            .expect("create stakeholder");
    }

    let vendors = db
        .stakeholders
        .list(&StakeholderFilter {
            program_id: program.program_id,
            stakeholder_type: Some(StakeholderType::Vendor),
            ..Default::default()
        })
        .await
        .expect("list stakeholders");
    let names: Vec<&str> = vendors.iter().map(|s| s.person_name.as_str()).collect();
    assert_eq!(names, vec!["Amy", "Zed"]);

    let page = db
        .stakeholders
        .list(&StakeholderFilter {
            program_id: program.program_id,
            limit: Some(1),
            offset: Some(1),
            ..Default::default()
        })
        .await
        .expect("list page");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].person_name, "Bob");

    program.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated PostgreSQL database"]
async fn test_partial_update_keeps_other_fields() {
    let db = connect_test_db().await;
    let program = TestProgram::create(&db.pool, None).await;

    let created = db
        .stakeholders
        .create(
            program.program_id,
            &CreateStakeholderRequest {
                email: Some("jane@example.com".to_string()),
                ..request("Jane Doe", "partner")
            },
        )
        .await
        .expect("create stakeholder");

    let updated = db
        .stakeholders
        .update(
            program.program_id,
            created.stakeholder_id,
            &UpdateStakeholderRequest {
                role: Some("VP Sales".to_string()),
                engagement_level: Some("secondary".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("update stakeholder");

    assert_eq!(updated.role.as_deref(), Some("VP Sales"));
    assert_eq!(updated.engagement_level, Some(EngagementLevel::Secondary));
    assert_eq!(updated.email.as_deref(), Some("jane@example.com"));
    assert_eq!(updated.stakeholder_type, StakeholderType::Partner);
    assert!(updated.updated_at >= created.updated_at);

    program.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated PostgreSQL database"]
async fn test_soft_deleted_stakeholder_is_invisible() {
    let db = connect_test_db().await;
    let program = TestProgram::create(&db.pool, None).await;

    let created = db
        .stakeholders
        .create(program.program_id, &request("Jane Doe", "external"))
        .await
        .expect("create stakeholder");

    db.stakeholders
        .delete(program.program_id, created.stakeholder_id)
        .await
        .expect("delete stakeholder");

    let err = db
        .stakeholders
        .get(program.program_id, created.stakeholder_id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StakeholderNotFound(id) if id == created.stakeholder_id));

    let names = db
        .stakeholders
        .names(program.program_id)
        .await
        .expect("names");
    assert!(names.is_empty());

    let again = db
        .stakeholders
        .delete(program.program_id, created.stakeholder_id)
        .await
        .unwrap_err();
    assert!(again.is_not_found());

    program.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated PostgreSQL database"]
async fn test_find_by_exact_name_ignores_case() {
    let db = connect_test_db().await;
    let program = TestProgram::create(&db.pool, None).await;

    let created = db
        .stakeholders
        .create(program.program_id, &request("Jane Doe", "internal"))
        .await
        .expect("create stakeholder");

    let found = db
        .stakeholders
        .find_by_exact_name(program.program_id, "jane DOE")
        .await
        .expect("find");
    assert_eq!(found.map(|s| s.stakeholder_id), Some(created.stakeholder_id));

    let missing = db
        .stakeholders
        .find_by_exact_name(program.program_id, "Jane")
        .await
        .expect("find");
    assert!(missing.is_none());

    program.cleanup().await;
}
