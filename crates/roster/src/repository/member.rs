use super::MEMBER_COLUMNS;
use crate::client::GenericClient;
use crate::error::{RosterError, RosterResult};
use crate::model::{Member, MemberDto, MemberTeamRow, MemberWithTeamRow, NewMember, Team, TeamAgeStats};
use crate::page::{self, Page, Pageable};
use crate::qb::{self, Expr, SelectQb};
use crate::search::{Filter, SearchCondition};

const MEMBER_TEAM_COLUMNS: &[&str] = &[
    "member.id AS member_id",
    "member.username",
    "member.age",
    "team.id AS team_id",
    "team.name AS team_name",
];

const JOIN_TEAM: &str = "member.team_id = team.id";

/// `member LEFT JOIN team` filtered by `filter`, projected to [`MemberTeamRow`].
fn member_team_query(filter: &Filter) -> SelectQb {
    qb::select("member")
        .select_cols(MEMBER_TEAM_COLUMNS)
        .left_join("team", JOIN_TEAM)
        .and_expr(filter.to_expr())
}

/// Same join and filter, projected to [`Member`].
fn member_query(filter: &Filter) -> SelectQb {
    qb::select("member")
        .select_cols(MEMBER_COLUMNS)
        .left_join("team", JOIN_TEAM)
        .and_expr(filter.to_expr())
}

/// Apply a page request. `member.id` is always the last sort term so rows
/// tied on the requested keys land in the same window on every run.
fn paged(qb: SelectQb, pageable: &Pageable) -> SelectQb {
    qb.paged(pageable).order_by("member.id ASC")
}

fn to_total(count: i64) -> RosterResult<u64> {
    u64::try_from(count).map_err(|_| RosterError::decode("count", format!("negative row count {count}")))
}

/// Persistence and queries for [`Member`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MemberRepository;

impl MemberRepository {
    pub async fn save(&self, conn: &impl GenericClient, member: NewMember) -> RosterResult<Member> {
        qb::insert("member")
            .set("username", member.username)
            .set("age", member.age)
            .set("team_id", member.team_id)
            .returning_cols(&["id", "username", "age", "team_id"])
            .tag("member.save")
            .fetch_one(conn)
            .await
    }

    /// `None` when no member has this id.
    pub async fn find_by_id(&self, conn: &impl GenericClient, id: i64) -> RosterResult<Option<Member>> {
        qb::select("member")
            .select_cols(MEMBER_COLUMNS)
            .eq("member.id", id)
            .tag("member.find_by_id")
            .fetch_opt(conn)
            .await
    }

    pub async fn find_all(&self, conn: &impl GenericClient) -> RosterResult<Vec<Member>> {
        qb::select("member")
            .select_cols(MEMBER_COLUMNS)
            .order_by("member.id ASC")
            .tag("member.find_all")
            .fetch_all(conn)
            .await
    }

    pub async fn find_by_username(&self, conn: &impl GenericClient, username: &str) -> RosterResult<Vec<Member>> {
        qb::select("member")
            .select_cols(MEMBER_COLUMNS)
            .eq("member.username", username.to_string())
            .order_by("member.id ASC")
            .tag("member.find_by_username")
            .fetch_all(conn)
            .await
    }

    /// Joined rows matching every present field of `cond`.
    pub async fn search(&self, conn: &impl GenericClient, cond: &SearchCondition) -> RosterResult<Vec<MemberTeamRow>> {
        member_team_query(&cond.to_filter())
            .order_by("member.id ASC")
            .tag("member.search")
            .fetch_all(conn)
            .await
    }

    /// [`search`](Self::search) with the filter assembled clause by clause.
    pub async fn search_by_builder(
        &self,
        conn: &impl GenericClient,
        cond: &SearchCondition,
    ) -> RosterResult<Vec<MemberTeamRow>> {
        member_team_query(&cond.to_filter_with_builder())
            .order_by("member.id ASC")
            .tag("member.search_by_builder")
            .fetch_all(conn)
            .await
    }

    /// Members (not projections) matching `cond`; team filters still go through the join.
    pub async fn search_member(&self, conn: &impl GenericClient, cond: &SearchCondition) -> RosterResult<Vec<Member>> {
        member_query(&cond.to_filter())
            .order_by("member.id ASC")
            .tag("member.search_member")
            .fetch_all(conn)
            .await
    }

    /// One page of [`search_member`](Self::search_member), counting only when needed.
    pub async fn search_member_page(
        &self,
        conn: &impl GenericClient,
        cond: &SearchCondition,
        pageable: &Pageable,
    ) -> RosterResult<Page<Member>> {
        let qb = paged(member_query(&cond.to_filter()), pageable).tag("member.search_member_page");
        let content = qb.fetch_all(conn).await?;
        page::get_page(content, pageable.clone(), || qb.count(conn)).await
    }

    /// Content and COUNT, always both.
    pub async fn search_page_simple(
        &self,
        conn: &impl GenericClient,
        cond: &SearchCondition,
        pageable: &Pageable,
    ) -> RosterResult<Page<MemberTeamRow>> {
        let qb = paged(member_team_query(&cond.to_filter()), pageable).tag("member.search_page_simple");
        let content = qb.fetch_all(conn).await?;
        let total = to_total(qb.count(conn).await?)?;
        Ok(Page::new(content, pageable.clone(), total))
    }

    /// Content first; COUNT only when the total cannot be derived from it.
    pub async fn search_page_complex(
        &self,
        conn: &impl GenericClient,
        cond: &SearchCondition,
        pageable: &Pageable,
    ) -> RosterResult<Page<MemberTeamRow>> {
        let qb = paged(member_team_query(&cond.to_filter()), pageable).tag("member.search_page_complex");
        let content = qb.fetch_all(conn).await?;
        page::get_page(content, pageable.clone(), || qb.count(conn)).await
    }

    /// Member and its team in a single query.
    pub async fn find_with_team(
        &self,
        conn: &impl GenericClient,
        username: &str,
    ) -> RosterResult<Option<(Member, Option<Team>)>> {
        let row: Option<MemberWithTeamRow> = qb::select("member")
            .select_cols(&[
                "member.id AS member_id",
                "member.username",
                "member.age",
                "member.team_id",
                "team.name AS team_name",
            ])
            .left_join("team", JOIN_TEAM)
            .eq("member.username", username.to_string())
            .order_by("member.id ASC")
            .limit(1)
            .tag("member.find_with_team")
            .fetch_opt(conn)
            .await?;
        Ok(row.map(MemberWithTeamRow::split))
    }

    /// Members of the named team (inner join; teamless members never match).
    pub async fn find_by_team_name(&self, conn: &impl GenericClient, team_name: &str) -> RosterResult<Vec<Member>> {
        qb::select("member")
            .select_cols(MEMBER_COLUMNS)
            .inner_join("team", JOIN_TEAM)
            .eq("team.name", team_name.to_string())
            .order_by("member.id ASC")
            .tag("member.find_by_team_name")
            .fetch_all(conn)
            .await
    }

    /// Every member sharing the maximum age.
    pub async fn find_oldest(&self, conn: &impl GenericClient) -> RosterResult<Vec<Member>> {
        qb::select("member")
            .select_cols(MEMBER_COLUMNS)
            .and_expr(Expr::raw("member.age = (SELECT MAX(m.age) FROM member m)"))
            .order_by("member.id ASC")
            .tag("member.find_oldest")
            .fetch_all(conn)
            .await
    }

    pub async fn find_age_at_least_average(&self, conn: &impl GenericClient) -> RosterResult<Vec<Member>> {
        qb::select("member")
            .select_cols(MEMBER_COLUMNS)
            .and_expr(Expr::raw("member.age >= (SELECT AVG(m.age) FROM member m)"))
            .order_by("member.id ASC")
            .tag("member.find_age_at_least_average")
            .fetch_all(conn)
            .await
    }

    /// Members whose age appears among ages strictly greater than `age`.
    pub async fn find_age_in_older_than(&self, conn: &impl GenericClient, age: i32) -> RosterResult<Vec<Member>> {
        qb::select("member")
            .select_cols(MEMBER_COLUMNS)
            .and_expr(Expr::template(
                "member.age IN (SELECT m.age FROM member m WHERE m.age > ?)",
                vec![age],
            ))
            .order_by("member.id ASC")
            .tag("member.find_age_in_older_than")
            .fetch_all(conn)
            .await
    }

    pub async fn find_dtos(&self, conn: &impl GenericClient) -> RosterResult<Vec<MemberDto>> {
        qb::select("member")
            .select_cols(&["member.username", "member.age"])
            .order_by("member.id ASC")
            .tag("member.find_dtos")
            .fetch_all(conn)
            .await
    }

    /// Member count and average age per team. Teams without members are omitted.
    pub async fn team_age_stats(&self, conn: &impl GenericClient) -> RosterResult<Vec<TeamAgeStats>> {
        qb::select("member")
            .select_cols(&[
                "team.name AS team_name",
                "COUNT(member.id) AS member_count",
                "AVG(member.age)::float8 AS avg_age",
            ])
            .inner_join("team", JOIN_TEAM)
            .group_by("team.name")
            .order_by("team.name ASC")
            .tag("member.team_age_stats")
            .fetch_all(conn)
            .await
    }

    /// Set `username` on every member younger than `age`, without loading them.
    pub async fn bulk_rename_younger_than(
        &self,
        conn: &impl GenericClient,
        age: i32,
        new_name: &str,
    ) -> RosterResult<u64> {
        qb::update("member")
            .set("username", new_name.to_string())
            .and_expr(Expr::lt("age", age))
            .tag("member.bulk_rename_younger_than")
            .execute(conn)
            .await
    }

    /// Add `delta` to every member's age.
    pub async fn bulk_add_age(&self, conn: &impl GenericClient, delta: i32) -> RosterResult<u64> {
        qb::update("member")
            .set_template("age", "age + ?", vec![delta])
            .tag("member.bulk_add_age")
            .execute(conn)
            .await
    }

    pub async fn bulk_delete_older_than(&self, conn: &impl GenericClient, age: i32) -> RosterResult<u64> {
        qb::delete("member")
            .and_expr(Expr::gt("age", age))
            .tag("member.bulk_delete_older_than")
            .execute(conn)
            .await
    }
}
