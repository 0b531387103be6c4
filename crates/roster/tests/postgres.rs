//! Repository behavior against a live PostgreSQL.
//!
//! Every test gets a throwaway schema, so runs never see each other's rows.
//! Skipped when `DATABASE_URL` is not set.

use roster::{
    GenericClient, InstrumentedClient, MemberRepository, NewMember, NewTeam, Order, Pageable,
    RosterError, RosterResult, SearchCondition, Sort, SortKey, TeamRepository,
};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_postgres::{Client, NoTls};

const SCHEMA_SQL: &str = include_str!("../migrations/V1__create_team_member.sql");

struct TestDb {
    client: Client,
    schema: String,
}

impl TestDb {
    async fn connect(test: &str) -> RosterResult<Option<Self>> {
        let _ = dotenvy::dotenv();
        let database_url = match std::env::var("DATABASE_URL") {
            Ok(v) => v,
            Err(_) => {
                eprintln!("DATABASE_URL is not set; skipping {test}");
                return Ok(None);
            }
        };

        let (client, connection) = tokio_postgres::connect(&database_url, NoTls)
            .await
            .map_err(RosterError::from_db_error)?;
        tokio::spawn(async move {
            let _ = connection.await;
        });

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before UNIX_EPOCH")
            .as_nanos();
        let schema = format!("roster_test_{}_{nanos}", std::process::id());
        client
            .batch_execute(&format!(
                "CREATE SCHEMA {schema}; SET search_path TO {schema}; {SCHEMA_SQL}"
            ))
            .await
            .map_err(RosterError::from_db_error)?;

        Ok(Some(Self { client, schema }))
    }

    async fn drop_schema(&self) -> RosterResult<()> {
        self.client
            .batch_execute(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .await
            .map_err(RosterError::from_db_error)
    }
}

/// teamA: member1 (10), member2 (20); teamB: member3 (30), member4 (40).
async fn seed(conn: &impl GenericClient) -> RosterResult<()> {
    let team_a = TeamRepository.save(conn, NewTeam::new("teamA")).await?;
    let team_b = TeamRepository.save(conn, NewTeam::new("teamB")).await?;
    for (name, age, team) in [
        ("member1", 10, team_a.id),
        ("member2", 20, team_a.id),
        ("member3", 30, team_b.id),
        ("member4", 40, team_b.id),
    ] {
        MemberRepository
            .save(conn, NewMember::new(name, age).in_team(team))
            .await?;
    }
    Ok(())
}

fn usernames<'a>(names: impl IntoIterator<Item = &'a Option<String>>) -> Vec<&'a str> {
    names.into_iter().filter_map(|n| n.as_deref()).collect()
}

#[tokio::test]
async fn search_by_age_window() -> RosterResult<()> {
    let Some(db) = TestDb::connect("search_by_age_window").await? else {
        return Ok(());
    };
    seed(&db.client).await?;

    let cond = SearchCondition::new().age_goe(20).age_loe(35);
    let rows = MemberRepository.search(&db.client, &cond).await?;
    let mut ages: Vec<i32> = rows.iter().map(|r| r.age).collect();
    ages.sort();
    assert_eq!(ages, vec![20, 30]);

    let by_builder = MemberRepository.search_by_builder(&db.client, &cond).await?;
    assert_eq!(by_builder.len(), 2);

    let members = MemberRepository.search_member(&db.client, &cond).await?;
    assert_eq!(members.len(), 2);

    let all = MemberRepository
        .search(&db.client, &SearchCondition::new())
        .await?;
    assert_eq!(all.len(), 4);

    let team_b = MemberRepository
        .search(&db.client, &SearchCondition::new().team_name("teamB"))
        .await?;
    assert!(team_b.iter().all(|r| r.team_name.as_deref() == Some("teamB")));
    assert_eq!(team_b.len(), 2);

    db.drop_schema().await
}

#[tokio::test]
async fn sorted_window_reports_full_total() -> RosterResult<()> {
    let Some(db) = TestDb::connect("sorted_window_reports_full_total").await? else {
        return Ok(());
    };
    seed(&db.client).await?;

    let pageable = Pageable::at_offset(1, 2)?.with_sort(Sort::by(vec![Order::desc(SortKey::Username)]));
    let cond = SearchCondition::new();

    let simple = MemberRepository
        .search_page_simple(&db.client, &cond, &pageable)
        .await?;
    assert_eq!(simple.total_elements(), 4);
    assert_eq!(simple.number_of_elements(), 2);
    assert_eq!(
        usernames(simple.content().iter().map(|r| &r.username)),
        vec!["member3", "member2"]
    );

    let complex = MemberRepository
        .search_page_complex(&db.client, &cond, &pageable)
        .await?;
    assert_eq!(complex.total_elements(), 4);
    assert_eq!(complex.content(), simple.content());

    db.drop_schema().await
}

#[tokio::test]
async fn count_query_is_elided_when_derivable() -> RosterResult<()> {
    let Some(db) = TestDb::connect("count_query_is_elided_when_derivable").await? else {
        return Ok(());
    };
    seed(&db.client).await?;
    let schema = db.schema.clone();
    let client = InstrumentedClient::new(db.client);
    let cond = SearchCondition::new();

    // First page larger than the result: one statement.
    let page = MemberRepository
        .search_page_complex(&client, &cond, &Pageable::of(0, 10)?)
        .await?;
    assert_eq!(page.total_elements(), 4);
    assert_eq!(client.stats().stats().select_count, 1);

    // Partial last page: still one statement.
    client.stats().reset();
    let page = MemberRepository
        .search_page_complex(&client, &cond, &Pageable::of(1, 3)?)
        .await?;
    assert_eq!(page.total_elements(), 4);
    assert_eq!(page.number_of_elements(), 1);
    assert_eq!(client.stats().stats().select_count, 1);

    // Full page: the count has to run.
    client.stats().reset();
    let page = MemberRepository
        .search_page_complex(&client, &cond, &Pageable::of(0, 2)?)
        .await?;
    assert_eq!(page.total_elements(), 4);
    assert_eq!(client.stats().stats().select_count, 2);

    // Simple mode always counts.
    client.stats().reset();
    MemberRepository
        .search_page_simple(&client, &cond, &Pageable::of(0, 10)?)
        .await?;
    assert_eq!(client.stats().stats().select_count, 2);

    let db = TestDb {
        client: client.into_inner(),
        schema,
    };
    db.drop_schema().await
}

#[tokio::test]
async fn lookups_and_joins() -> RosterResult<()> {
    let Some(db) = TestDb::connect("lookups_and_joins").await? else {
        return Ok(());
    };
    seed(&db.client).await?;

    let members = MemberRepository.find_by_username(&db.client, "member1").await?;
    assert_eq!(members.len(), 1);
    let found = MemberRepository.find_by_id(&db.client, members[0].id).await?;
    assert_eq!(found.as_ref().map(|m| m.age), Some(10));
    assert!(MemberRepository.find_by_id(&db.client, -1).await?.is_none());

    let (member, team) = MemberRepository
        .find_with_team(&db.client, "member3")
        .await?
        .expect("member3 exists");
    assert_eq!(member.age, 30);
    assert_eq!(team.map(|t| t.name).as_deref(), Some("teamB"));

    let team_a = MemberRepository.find_by_team_name(&db.client, "teamA").await?;
    assert_eq!(team_a.len(), 2);

    let team = TeamRepository.find_by_name(&db.client, "teamA").await?;
    assert!(team.is_some());
    assert_eq!(TeamRepository.find_all(&db.client).await?.len(), 2);

    let dtos = MemberRepository.find_dtos(&db.client).await?;
    assert_eq!(dtos.len(), 4);

    let stats = MemberRepository.team_age_stats(&db.client).await?;
    let a = stats.iter().find(|s| s.team_name == "teamA").expect("teamA stats");
    assert_eq!(a.member_count, 2);
    assert!((a.avg_age - 15.0).abs() < f64::EPSILON);

    db.drop_schema().await
}

#[tokio::test]
async fn subqueries() -> RosterResult<()> {
    let Some(db) = TestDb::connect("subqueries").await? else {
        return Ok(());
    };
    seed(&db.client).await?;

    let oldest = MemberRepository.find_oldest(&db.client).await?;
    assert_eq!(oldest.iter().map(|m| m.age).collect::<Vec<_>>(), vec![40]);

    let mut at_least_avg: Vec<i32> = MemberRepository
        .find_age_at_least_average(&db.client)
        .await?
        .iter()
        .map(|m| m.age)
        .collect();
    at_least_avg.sort();
    assert_eq!(at_least_avg, vec![30, 40]);

    let mut older: Vec<i32> = MemberRepository
        .find_age_in_older_than(&db.client, 10)
        .await?
        .iter()
        .map(|m| m.age)
        .collect();
    older.sort();
    assert_eq!(older, vec![20, 30, 40]);

    db.drop_schema().await
}

#[tokio::test]
async fn bulk_operations_touch_rows_in_place() -> RosterResult<()> {
    let Some(db) = TestDb::connect("bulk_operations_touch_rows_in_place").await? else {
        return Ok(());
    };
    seed(&db.client).await?;

    let renamed = MemberRepository
        .bulk_rename_younger_than(&db.client, 28, "nonMember")
        .await?;
    assert_eq!(renamed, 2);
    assert_eq!(
        MemberRepository
            .find_by_username(&db.client, "nonMember")
            .await?
            .len(),
        2
    );

    assert_eq!(MemberRepository.bulk_add_age(&db.client, 1).await?, 4);
    let mut ages: Vec<i32> = MemberRepository
        .find_all(&db.client)
        .await?
        .iter()
        .map(|m| m.age)
        .collect();
    ages.sort();
    assert_eq!(ages, vec![11, 21, 31, 41]);

    assert_eq!(MemberRepository.bulk_delete_older_than(&db.client, 30).await?, 2);
    assert_eq!(MemberRepository.find_all(&db.client).await?.len(), 2);

    db.drop_schema().await
}

#[tokio::test]
async fn failed_transaction_rolls_back() -> RosterResult<()> {
    let Some(mut db) = TestDb::connect("failed_transaction_rolls_back").await? else {
        return Ok(());
    };

    let result: RosterResult<()> = roster::transaction!(&mut db.client, tx, {
        TeamRepository.save(&tx, NewTeam::new("ghost")).await?;
        Err(RosterError::validation("abort"))
    });
    assert!(matches!(result, Err(RosterError::Validation(_))));
    assert!(TeamRepository.find_all(&db.client).await?.is_empty());

    let team = roster::transaction!(&mut db.client, tx, {
        TeamRepository.save(&tx, NewTeam::new("kept")).await
    })?;
    assert_eq!(TeamRepository.find_all(&db.client).await?, vec![team]);

    db.drop_schema().await
}

#[tokio::test]
async fn missing_team_is_a_foreign_key_violation() -> RosterResult<()> {
    let Some(db) = TestDb::connect("missing_team_is_a_foreign_key_violation").await? else {
        return Ok(());
    };

    let err = MemberRepository
        .save(&db.client, NewMember::new("orphan", 5).in_team(i64::MAX))
        .await
        .unwrap_err();
    assert!(err.is_foreign_key_violation(), "{err}");

    db.drop_schema().await
}

#[tokio::test]
async fn empty_results_are_none_or_not_found() -> RosterResult<()> {
    let Some(db) = TestDb::connect("empty_results_are_none_or_not_found").await? else {
        return Ok(());
    };

    let sql = "SELECT id FROM member WHERE id = $1";
    assert!(GenericClient::query_opt(&db.client, sql, &[&-1_i64]).await?.is_none());
    let err = GenericClient::query_one(&db.client, sql, &[&-1_i64])
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    db.drop_schema().await
}
