use leadflow_core::db::open_db_in_memory;
use leadflow_core::{
    available_operators, select_operator, AvailableOperator, ContactRepository, ContactRequest,
    ContactStatus, DistributionConfig, DistributionError, DistributionService, LeadRepository,
    Operator, OperatorRepository, PageQuery, RandomWeightSampler, SourceDraft, SourceService,
    SqliteContactRepository, SqliteLeadRepository, SqliteOperatorRepository,
    SqliteSourceRepository, WeightEntry,
};
use rusqlite::Connection;
use std::collections::HashMap;
use uuid::Uuid;

#[test]
fn single_operator_is_assigned_until_exactly_max_load() {
    let conn = open_db_in_memory().unwrap();
    let operator = seed_operator(&conn, "alice", 3);
    let source = seed_source(&conn, "web", &[(operator.uuid, 1)]);
    let mut service =
        DistributionService::try_new(&conn, RandomWeightSampler::seeded(1)).unwrap();

    for _ in 0..3 {
        let contact = service.distribute(&request(source)).unwrap();
        assert_eq!(contact.operator_uuid, Some(operator.uuid));
    }

    let overflow = service.distribute(&request(source)).unwrap();
    assert_eq!(overflow.operator_uuid, None);

    let repo = SqliteOperatorRepository::try_new(&conn).unwrap();
    let loaded = repo.get_operator(operator.uuid).unwrap().unwrap();
    assert_eq!(loaded.current_load, 3);
}

#[test]
fn concrete_capacity_one_scenario() {
    let conn = open_db_in_memory().unwrap();
    let operator = seed_operator(&conn, "a", 1);
    let source = seed_source(&conn, "s", &[(operator.uuid, 1)]);
    let mut service =
        DistributionService::try_new(&conn, RandomWeightSampler::seeded(2)).unwrap();

    let first = service.distribute(&request(source)).unwrap();
    assert_eq!(first.operator_uuid, Some(operator.uuid));
    assert_eq!(first.status, ContactStatus::New);

    let repo = SqliteOperatorRepository::try_new(&conn).unwrap();
    assert_eq!(
        repo.get_operator(operator.uuid).unwrap().unwrap().current_load,
        1
    );

    let second = service.distribute(&request(source)).unwrap();
    assert_eq!(second.operator_uuid, None);
}

#[test]
fn weighted_draws_approximate_configured_ratio() {
    let light = Operator::new("light", 1);
    let heavy = Operator::new("heavy", 1);
    let pool = vec![
        AvailableOperator {
            operator: light.clone(),
            weight: 1,
        },
        AvailableOperator {
            operator: heavy.clone(),
            weight: 3,
        },
    ];

    let mut sampler = RandomWeightSampler::seeded(42);
    let mut wins: HashMap<Uuid, u32> = HashMap::new();
    for _ in 0..10_000 {
        let winner = select_operator(&pool, &mut sampler).unwrap();
        *wins.entry(winner.uuid).or_default() += 1;
    }

    let heavy_wins = wins[&heavy.uuid];
    // Expected share 7500 of 10000, tolerance +-5%.
    assert!(
        (7125..=7875).contains(&heavy_wins),
        "heavy operator won {heavy_wins} of 10000 draws"
    );
}

#[test]
fn lead_resolution_is_idempotent_by_external_id() {
    let conn = open_db_in_memory().unwrap();
    let operator = seed_operator(&conn, "alice", 100);
    let source = seed_source(&conn, "web", &[(operator.uuid, 1)]);
    let mut service =
        DistributionService::try_new(&conn, RandomWeightSampler::seeded(3)).unwrap();

    let first = service
        .distribute(&ContactRequest {
            lead_external_id: Some("crm-77".to_string()),
            lead_email: Some("one@example.com".to_string()),
            lead_phone: None,
            source_uuid: source,
            message: None,
        })
        .unwrap();

    let second = service
        .distribute(&ContactRequest {
            lead_external_id: Some("crm-77".to_string()),
            lead_email: Some("two@example.com".to_string()),
            lead_phone: Some("+100".to_string()),
            source_uuid: source,
            message: None,
        })
        .unwrap();

    assert_eq!(first.lead_uuid, second.lead_uuid);

    let leads = SqliteLeadRepository::try_new(&conn).unwrap();
    assert_eq!(leads.list_leads(&PageQuery::default()).unwrap().len(), 1);
}

#[test]
fn external_id_lookup_outranks_email() {
    let conn = open_db_in_memory().unwrap();
    let operator = seed_operator(&conn, "alice", 100);
    let source = seed_source(&conn, "web", &[(operator.uuid, 1)]);
    let mut service =
        DistributionService::try_new(&conn, RandomWeightSampler::seeded(4)).unwrap();

    let by_external = service
        .distribute(&ContactRequest {
            lead_external_id: Some("X".to_string()),
            lead_email: None,
            lead_phone: None,
            source_uuid: source,
            message: None,
        })
        .unwrap();

    let by_email = service
        .distribute(&ContactRequest {
            lead_external_id: None,
            lead_email: Some("a@b.com".to_string()),
            lead_phone: None,
            source_uuid: source,
            message: None,
        })
        .unwrap();
    assert_ne!(by_external.lead_uuid, by_email.lead_uuid);

    let both = service
        .distribute(&ContactRequest {
            lead_external_id: Some("X".to_string()),
            lead_email: Some("a@b.com".to_string()),
            lead_phone: None,
            source_uuid: source,
            message: None,
        })
        .unwrap();
    assert_eq!(both.lead_uuid, by_external.lead_uuid);
}

#[test]
fn anonymous_requests_create_fresh_leads() {
    let conn = open_db_in_memory().unwrap();
    let operator = seed_operator(&conn, "alice", 100);
    let source = seed_source(&conn, "web", &[(operator.uuid, 1)]);
    let mut service =
        DistributionService::try_new(&conn, RandomWeightSampler::seeded(5)).unwrap();

    let first = service.distribute(&request(source)).unwrap();
    let second = service.distribute(&request(source)).unwrap();
    assert_ne!(first.lead_uuid, second.lead_uuid);

    // Blank keys are treated as absent, same as the missing case.
    let blank = service
        .distribute(&ContactRequest {
            lead_external_id: Some("  ".to_string()),
            lead_email: Some(String::new()),
            lead_phone: None,
            source_uuid: source,
            message: None,
        })
        .unwrap();
    assert_ne!(blank.lead_uuid, first.lead_uuid);
    assert_ne!(blank.lead_uuid, second.lead_uuid);
}

#[test]
fn cleared_config_yields_no_candidates_and_unassigned_contacts() {
    let conn = open_db_in_memory().unwrap();
    let operator = seed_operator(&conn, "alice", 100);
    let source = seed_source(&conn, "web", &[(operator.uuid, 2)]);

    let source_service = SourceService::new(SqliteSourceRepository::try_new(&conn).unwrap());
    source_service
        .replace_distribution_config(&DistributionConfig {
            source_uuid: source,
            operators: vec![],
        })
        .unwrap();

    let operator_repo = SqliteOperatorRepository::try_new(&conn).unwrap();
    let source_repo = SqliteSourceRepository::try_new(&conn).unwrap();
    let candidates = available_operators(&operator_repo, &source_repo, source).unwrap();
    assert!(candidates.is_empty());

    let mut service =
        DistributionService::try_new(&conn, RandomWeightSampler::seeded(6)).unwrap();
    let contact = service.distribute(&request(source)).unwrap();
    assert_eq!(contact.operator_uuid, None);
}

#[test]
fn inactive_and_full_operators_are_silently_excluded() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteOperatorRepository::try_new(&conn).unwrap();

    let mut inactive = Operator::new("inactive", 10);
    inactive.is_active = false;
    repo.create_operator(&inactive).unwrap();

    let full = seed_operator(&conn, "full", 1);
    assert_eq!(repo.increment_load(full.uuid).unwrap(), 1);

    let available = seed_operator(&conn, "available", 10);

    let source = seed_source(
        &conn,
        "web",
        &[(inactive.uuid, 5), (full.uuid, 5), (available.uuid, 1)],
    );

    let source_repo = SqliteSourceRepository::try_new(&conn).unwrap();
    let candidates = available_operators(&repo, &source_repo, source).unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].operator.uuid, available.uuid);

    let mut service =
        DistributionService::try_new(&conn, RandomWeightSampler::seeded(7)).unwrap();
    let contact = service.distribute(&request(source)).unwrap();
    assert_eq!(contact.operator_uuid, Some(available.uuid));
}

#[test]
fn missing_source_aborts_distribution() {
    let conn = open_db_in_memory().unwrap();
    let mut service =
        DistributionService::try_new(&conn, RandomWeightSampler::seeded(8)).unwrap();

    let missing = Uuid::new_v4();
    let err = service.distribute(&request(missing)).unwrap_err();
    assert!(matches!(err, DistributionError::SourceNotFound(id) if id == missing));

    // Nothing was persisted: the transaction rolled back.
    let contacts = SqliteContactRepository::try_new(&conn).unwrap();
    assert!(contacts.list_contacts(&PageQuery::default()).unwrap().is_empty());
    let leads = SqliteLeadRepository::try_new(&conn).unwrap();
    assert!(leads.list_leads(&PageQuery::default()).unwrap().is_empty());
}

#[test]
fn distributed_contact_persists_message_status_and_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let operator = seed_operator(&conn, "alice", 100);
    let source = seed_source(&conn, "web", &[(operator.uuid, 1)]);
    let mut service =
        DistributionService::try_new(&conn, RandomWeightSampler::seeded(9)).unwrap();

    let contact = service
        .distribute(&ContactRequest {
            lead_external_id: Some("crm-1".to_string()),
            lead_email: None,
            lead_phone: None,
            source_uuid: source,
            message: Some("please call back".to_string()),
        })
        .unwrap();

    assert_eq!(contact.status, ContactStatus::New);
    assert_eq!(contact.message.as_deref(), Some("please call back"));
    assert!(contact.created_at > 0);
    assert_eq!(contact.source_uuid, source);

    let contacts = SqliteContactRepository::try_new(&conn).unwrap();
    let listed = contacts.list_contacts(&PageQuery::default()).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], contact);
}

fn request(source_uuid: Uuid) -> ContactRequest {
    ContactRequest {
        lead_external_id: None,
        lead_email: None,
        lead_phone: None,
        source_uuid,
        message: None,
    }
}

fn seed_operator(conn: &Connection, name: &str, max_load: u32) -> Operator {
    let repo = SqliteOperatorRepository::try_new(conn).unwrap();
    let operator = Operator::new(name, max_load);
    repo.create_operator(&operator).unwrap();
    operator
}

fn seed_source(conn: &Connection, name: &str, weights: &[(Uuid, u32)]) -> Uuid {
    let service = SourceService::new(SqliteSourceRepository::try_new(conn).unwrap());
    let source = service
        .create(&SourceDraft {
            name: name.to_string(),
            description: None,
        })
        .unwrap();

    service
        .replace_distribution_config(&DistributionConfig {
            source_uuid: source.uuid,
            operators: weights
                .iter()
                .map(|(operator_uuid, weight)| WeightEntry {
                    operator_uuid: *operator_uuid,
                    source_uuid: source.uuid,
                    weight: *weight,
                })
                .collect(),
        })
        .unwrap();

    source.uuid
}
