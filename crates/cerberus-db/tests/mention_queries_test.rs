//! Integration tests for suggestion candidates, mention linking and linked
//! artifact listing.

use chrono::{Duration, Utc};
use serde_json::json;

use cerberus_db::test_fixtures::{connect_test_db, MentionSeed, TestProgram};
use cerberus_db::{
    CreateStakeholderRequest, Error, MentionRepository, StakeholderRepository,
};
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires migrated PostgreSQL database"]
async fn test_suggestion_candidates_exclude_resolved_and_cap_artifacts() {
    let db = connect_test_db().await;
    let program = TestProgram::create(&db.pool, None).await;
    let now = Utc::now();

    let mut artifacts = Vec::new();
    for i in 0..7 {
        artifacts.push(
            program
                .artifact_at(&format!("doc-{}.md", i), now - Duration::hours(i))
                .await,
        );
    }

    let busy = program
        .mention_with(artifacts[0], MentionSeed::named("Jon Smith").mentions(4))
        .await;
    let quiet = program.mention(artifacts[1], "Ada Lovelace").await;

    let stakeholder = db
        .stakeholders
        .create(
            program.program_id,
            &CreateStakeholderRequest {
                person_name: "Ada Lovelace".to_string(),
                stakeholder_type: "internal".to_string(),
                ..Default::default()
            },
        )
        .await
        .expect("create stakeholder");
    db.mentions
        .link_to_stakeholder(program.program_id, quiet, stakeholder.stakeholder_id)
        .await
        .expect("link");

    let candidates = db
        .mentions
        .suggestion_candidates(program.program_id, 5)
        .await
        .expect("candidates");

    assert_eq!(candidates.len(), 1);
    let candidate = &candidates[0];
    assert_eq!(candidate.person_id, busy);
    assert_eq!(candidate.total_mentions, 4);
    assert_eq!(candidate.artifact_count, 1);
    assert_eq!(candidate.artifacts.len(), 1);
    assert_eq!(candidate.artifacts[0].filename, "doc-0.md");

    program.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated PostgreSQL database"]
async fn test_suggestion_candidates_order_by_mentions() {
    let db = connect_test_db().await;
    let program = TestProgram::create(&db.pool, None).await;
    let artifact = program.artifact("minutes.md").await;

    let low = program
        .mention_with(artifact, MentionSeed::named("Low").mentions(1))
        .await;
    let high = program
        .mention_with(
            artifact,
            MentionSeed::named("High")
                .mentions(9)
                .snippets(json!(["High said hello"])),
        )
        .await;

    let candidates = db
        .mentions
        .suggestion_candidates(program.program_id, 5)
        .await
        .expect("candidates");
    let ids: Vec<Uuid> = candidates.iter().map(|c| c.person_id).collect();
    assert_eq!(ids, vec![high, low]);

    program.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated PostgreSQL database"]
async fn test_link_to_unknown_stakeholder_fails() {
    let db = connect_test_db().await;
    let program = TestProgram::create(&db.pool, None).await;
    let artifact = program.artifact("notes.md").await;
    let person = program.mention(artifact, "Jon Smith").await;

    let missing = Uuid::new_v4();
    let err = db
        .mentions
        .link_to_stakeholder(program.program_id, person, missing)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StakeholderNotFound(id) if id == missing));
    assert_eq!(program.stakeholder_of(person).await, None);

    program.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated PostgreSQL database"]
async fn test_get_mention_from_other_program_is_not_found() {
    let db = connect_test_db().await;
    let program = TestProgram::create(&db.pool, None).await;
    let other = TestProgram::create(&db.pool, None).await;
    let artifact = other.artifact("notes.md").await;
    let person = other.mention(artifact, "Jon Smith").await;

    let err = db
        .mentions
        .get(program.program_id, person)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MentionNotFound(id) if id == person));

    program.cleanup().await;
    other.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated PostgreSQL database"]
async fn test_linked_artifacts_sum_mentions() {
    let db = connect_test_db().await;
    let program = TestProgram::create(&db.pool, None).await;
    let now = Utc::now();
    let older = program.artifact_at("older.md", now - Duration::days(1)).await;
    let newer = program.artifact_at("newer.md", now).await;

    let a = program
        .mention_with(older, MentionSeed::named("Jon Smith").mentions(2))
        .await;
    let b = program
        .mention_with(newer, MentionSeed::named("Jonathan Smith").mentions(3))
        .await;

    let stakeholder = db
        .stakeholders
        .create(
            program.program_id,
            &CreateStakeholderRequest {
                person_name: "Jonathan Smith".to_string(),
                stakeholder_type: "external".to_string(),
                ..Default::default()
            },
        )
        .await
        .expect("create stakeholder");

    for person in [a, b] {
        db.mentions
            .link_to_stakeholder(program.program_id, person, stakeholder.stakeholder_id)
            .await
            .expect("link");
    }

    let artifacts = db
        .stakeholders
        .linked_artifacts(program.program_id, stakeholder.stakeholder_id)
        .await
        .expect("linked artifacts");
    let summary: Vec<(&str, i64)> = artifacts
        .iter()
        .map(|a| (a.filename.as_str(), a.mention_count))
        .collect();
    assert_eq!(summary, vec![("newer.md", 3), ("older.md", 2)]);

    program.cleanup().await;
}
