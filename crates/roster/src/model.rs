//! Row types for the `member` and `team` tables and their projections.

use crate::FromRow;
use serde::Serialize;

/// A team. Owns the inverse side of `member.team_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Team {
    pub id: i64,
    pub name: String,
}

/// A member, belonging to at most one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Member {
    pub id: i64,
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<i64>,
}

/// Insert payload for [`Team`].
#[derive(Debug, Clone)]
pub struct NewTeam {
    pub name: String,
}

impl NewTeam {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Insert payload for [`Member`].
#[derive(Debug, Clone, Default)]
pub struct NewMember {
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<i64>,
}

impl NewMember {
    pub fn new(username: impl Into<String>, age: i32) -> Self {
        Self {
            username: Some(username.into()),
            age,
            team_id: None,
        }
    }

    pub fn in_team(mut self, team_id: i64) -> Self {
        self.team_id = Some(team_id);
        self
    }
}

/// One row of `member LEFT JOIN team`.
///
/// Members without a team still appear, with both team fields `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct MemberTeamRow {
    pub member_id: i64,
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
}

/// `username, age` projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct MemberDto {
    pub username: Option<String>,
    pub age: i32,
}

/// Per-team aggregate from a GROUP BY over the join.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TeamAgeStats {
    pub team_name: String,
    pub member_count: i64,
    pub avg_age: f64,
}

/// Flat row for the fetch join: member columns plus nullable team columns.
#[derive(Debug, FromRow)]
pub(crate) struct MemberWithTeamRow {
    #[roster(column = "member_id")]
    pub id: i64,
    pub username: Option<String>,
    pub age: i32,
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
}

impl MemberWithTeamRow {
    pub(crate) fn split(self) -> (Member, Option<Team>) {
        let team = match (self.team_id, self.team_name) {
            (Some(id), Some(name)) => Some(Team { id, name }),
            _ => None,
        };
        let member = Member {
            id: self.id,
            username: self.username,
            age: self.age,
            team_id: self.team_id,
        };
        (member, team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_join_row_without_team_splits_to_none() {
        let row = MemberWithTeamRow {
            id: 7,
            username: Some("loner".into()),
            age: 33,
            team_id: None,
            team_name: None,
        };
        let (member, team) = row.split();
        assert_eq!(member.id, 7);
        assert_eq!(member.team_id, None);
        assert!(team.is_none());
    }

    #[test]
    fn fetch_join_row_with_team_keeps_both_sides() {
        let row = MemberWithTeamRow {
            id: 1,
            username: Some("member1".into()),
            age: 10,
            team_id: Some(3),
            team_name: Some("teamA".into()),
        };
        let (member, team) = row.split();
        assert_eq!(member.team_id, Some(3));
        assert_eq!(team, Some(Team { id: 3, name: "teamA".into() }));
    }

    #[test]
    fn member_serializes_with_null_team() {
        let member = Member {
            id: 1,
            username: None,
            age: 0,
            team_id: None,
        };
        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["team_id"], serde_json::Value::Null);
    }
}
