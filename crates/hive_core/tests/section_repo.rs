use hive_core::db::open_db_in_memory;
use hive_core::{
    NewHiveSection, RepoError, SectionFilter, SectionRepository, SqliteSectionRepository,
};
use rusqlite::Connection;

fn new_section(hive_id: i64, code: &str) -> NewHiveSection {
    NewHiveSection {
        hive_id,
        name: format!("Section {code}"),
        code: code.to_string(),
        is_deleted: false,
        created_by: 1,
        last_updated_by: 1,
        last_updated: 1_000,
    }
}

fn seed(conn: &Connection, sections: &[(i64, &str)]) {
    let repo = SqliteSectionRepository::new(conn);
    for (hive_id, code) in sections {
        repo.add(&new_section(*hive_id, code)).unwrap();
    }
    repo.commit().unwrap();
}

#[test]
fn add_assigns_increasing_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSectionRepository::new(&conn);

    let first = repo.add(&new_section(1, "A1")).unwrap();
    let second = repo.add(&new_section(1, "A2")).unwrap();
    repo.commit().unwrap();

    assert_eq!((first, second), (1, 2));
}

#[test]
fn query_combines_filters_and_orders_by_id() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn, &[(2, "B1"), (1, "A1"), (2, "B2"), (2, "B3")]);
    let repo = SqliteSectionRepository::new(&conn);

    let all: Vec<i64> = repo
        .query(&SectionFilter::all())
        .unwrap()
        .iter()
        .map(|section| section.id)
        .collect();
    assert_eq!(all, vec![1, 2, 3, 4]);

    let hive_two_without_third = SectionFilter {
        hive_id: Some(2),
        exclude_id: Some(3),
        ..SectionFilter::default()
    };
    let codes: Vec<String> = repo
        .query(&hive_two_without_third)
        .unwrap()
        .into_iter()
        .map(|section| section.code)
        .collect();
    assert_eq!(codes, vec!["B1", "B3"]);

    assert_eq!(repo.query(&SectionFilter::by_code("A1")).unwrap()[0].id, 2);
    assert!(repo
        .query(&SectionFilter::by_code("A1").excluding(2))
        .unwrap()
        .is_empty());
}

#[test]
fn code_match_is_exact() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn, &[(1, "AB1")]);
    let repo = SqliteSectionRepository::new(&conn);

    assert!(repo.query(&SectionFilter::by_code("ab1")).unwrap().is_empty());
    assert!(repo.query(&SectionFilter::by_code("AB")).unwrap().is_empty());
}

#[test]
fn rollback_discards_pending_writes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSectionRepository::new(&conn);

    repo.add(&new_section(1, "A1")).unwrap();
    assert!(!conn.is_autocommit());
    repo.rollback().unwrap();

    assert!(conn.is_autocommit());
    assert!(repo.query(&SectionFilter::all()).unwrap().is_empty());
}

#[test]
fn commit_and_rollback_without_pending_writes_are_noops() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSectionRepository::new(&conn);

    repo.commit().unwrap();
    repo.rollback().unwrap();
    assert!(conn.is_autocommit());
}

#[test]
fn duplicate_code_is_reported_semantically() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn, &[(1, "A1")]);
    let repo = SqliteSectionRepository::new(&conn);

    let err = repo.add(&new_section(2, "A1")).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateCode(ref code) if code == "A1"));
    repo.rollback().unwrap();
}

#[test]
fn update_never_rewrites_parent_or_creator() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn, &[(1, "A1")]);
    let repo = SqliteSectionRepository::new(&conn);

    let mut section = repo.query(&SectionFilter::by_id(1)).unwrap().remove(0);
    section.hive_id = 77;
    section.created_by = 77;
    section.name = "Renamed".to_string();
    section.last_updated_by = 5;
    repo.update(&section).unwrap();
    repo.commit().unwrap();

    let loaded = repo.query(&SectionFilter::by_id(1)).unwrap().remove(0);
    assert_eq!(loaded.name, "Renamed");
    assert_eq!(loaded.last_updated_by, 5);
    assert_eq!(loaded.hive_id, 1);
    assert_eq!(loaded.created_by, 1);
}

#[test]
fn update_and_remove_missing_rows_are_not_found() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn, &[(1, "A1")]);
    let repo = SqliteSectionRepository::new(&conn);

    let mut ghost = repo.query(&SectionFilter::by_id(1)).unwrap().remove(0);
    ghost.id = 50;
    assert!(matches!(repo.update(&ghost), Err(RepoError::NotFound(50))));
    assert!(matches!(repo.remove(51), Err(RepoError::NotFound(51))));
    repo.rollback().unwrap();
}

#[test]
fn remove_deletes_row_permanently() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn, &[(1, "A1"), (1, "A2")]);
    let repo = SqliteSectionRepository::new(&conn);

    repo.remove(1).unwrap();
    repo.commit().unwrap();

    let remaining = repo.query(&SectionFilter::all()).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].code, "A2");
}

#[test]
fn writes_inside_foreign_transaction_are_refused() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn, &[(1, "A1")]);
    let repo = SqliteSectionRepository::new(&conn);

    conn.execute_batch("BEGIN;").unwrap();
    assert!(matches!(
        repo.add(&new_section(1, "A2")),
        Err(RepoError::TransactionInProgress)
    ));
    assert!(matches!(repo.remove(1), Err(RepoError::TransactionInProgress)));

    repo.commit().unwrap();
    repo.rollback().unwrap();
    assert!(!conn.is_autocommit());

    conn.execute_batch("ROLLBACK;").unwrap();
    assert_eq!(repo.query(&SectionFilter::all()).unwrap().len(), 1);
}

#[test]
fn separate_repositories_do_not_end_each_others_unit() {
    let conn = open_db_in_memory().unwrap();
    let writer = SqliteSectionRepository::new(&conn);
    let bystander = SqliteSectionRepository::new(&conn);

    writer.add(&new_section(1, "A1")).unwrap();
    bystander.commit().unwrap();
    assert!(!conn.is_autocommit());

    writer.rollback().unwrap();
    assert!(conn.is_autocommit());
    assert!(writer.query(&SectionFilter::all()).unwrap().is_empty());
}
