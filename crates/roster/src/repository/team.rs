use crate::client::GenericClient;
use crate::error::RosterResult;
use crate::model::{NewTeam, Team};
use crate::qb;

const TEAM_COLUMNS: &[&str] = &["team.id", "team.name"];

/// Persistence for [`Team`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamRepository;

impl TeamRepository {
    pub async fn save(&self, conn: &impl GenericClient, team: NewTeam) -> RosterResult<Team> {
        qb::insert("team")
            .set("name", team.name)
            .returning_cols(&["id", "name"])
            .tag("team.save")
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(&self, conn: &impl GenericClient, id: i64) -> RosterResult<Option<Team>> {
        qb::select("team")
            .select_cols(TEAM_COLUMNS)
            .eq("team.id", id)
            .tag("team.find_by_id")
            .fetch_opt(conn)
            .await
    }

    pub async fn find_by_name(&self, conn: &impl GenericClient, name: &str) -> RosterResult<Option<Team>> {
        qb::select("team")
            .select_cols(TEAM_COLUMNS)
            .eq("team.name", name.to_string())
            .order_by("team.id ASC")
            .tag("team.find_by_name")
            .fetch_opt(conn)
            .await
    }

    pub async fn find_all(&self, conn: &impl GenericClient) -> RosterResult<Vec<Team>> {
        qb::select("team")
            .select_cols(TEAM_COLUMNS)
            .order_by("team.id ASC")
            .tag("team.find_all")
            .fetch_all(conn)
            .await
    }
}
