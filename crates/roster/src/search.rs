//! Optional search predicates over `member LEFT JOIN team`.
//!
//! Every sub-filter returns `Option<Predicate>`; `None` means "no filter on
//! this attribute". A [`Filter`] is a conjunction of the present ones, and the
//! empty filter matches every row, so an absent predicate is the identity of
//! AND:
//!
//! ```
//! use roster::search::{self, Filter};
//!
//! let only_age = Filter::all()
//!     .and_opt(search::username_eq(None))
//!     .and_opt(search::age_goe(Some(20)));
//! assert_eq!(only_age.len(), 1);
//!
//! let everything = Filter::all().and_opt(search::team_name_eq(Some("  ")));
//! assert!(everything.is_all());
//! ```

use crate::model::MemberTeamRow;
use crate::qb::Expr;

pub(crate) const USERNAME: &str = "member.username";
pub(crate) const AGE: &str = "member.age";
pub(crate) const TEAM_NAME: &str = "team.name";

/// Search input: four independently optional fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCondition {
    pub username: Option<String>,
    pub team_name: Option<String>,
    pub age_goe: Option<i32>,
    pub age_loe: Option<i32>,
}

impl SearchCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn team_name(mut self, team_name: impl Into<String>) -> Self {
        self.team_name = Some(team_name.into());
        self
    }

    pub fn age_goe(mut self, bound: i32) -> Self {
        self.age_goe = Some(bound);
        self
    }

    pub fn age_loe(mut self, bound: i32) -> Self {
        self.age_loe = Some(bound);
        self
    }

    /// List the four optional predicates and drop the absent ones.
    pub fn to_filter(&self) -> Filter {
        [
            username_eq(self.username.as_deref()),
            team_name_eq(self.team_name.as_deref()),
            age_goe(self.age_goe),
            age_loe(self.age_loe),
        ]
        .into_iter()
        .collect()
    }

    /// Build the same conjunction one clause at a time.
    pub fn to_filter_with_builder(&self) -> Filter {
        let mut builder = FilterBuilder::new();
        if let Some(username) = self.username.as_deref().filter(|s| has_text(s)) {
            builder = builder.and(Predicate::UsernameEq(username.to_string()));
        }
        if let Some(team_name) = self.team_name.as_deref().filter(|s| has_text(s)) {
            builder = builder.and(Predicate::TeamNameEq(team_name.to_string()));
        }
        if let Some(bound) = self.age_goe {
            builder = builder.and(Predicate::AgeGoe(bound));
        }
        if let Some(bound) = self.age_loe {
            builder = builder.and(Predicate::AgeLoe(bound));
        }
        builder.build()
    }
}

/// A single active condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `member.username = value`
    UsernameEq(String),
    /// `team.name = value`
    TeamNameEq(String),
    /// `member.age >= bound`
    AgeGoe(i32),
    /// `member.age <= bound`
    AgeLoe(i32),
}

impl Predicate {
    /// Lower to a parameterized SQL expression.
    pub fn to_expr(&self) -> Expr {
        match self {
            Predicate::UsernameEq(v) => Expr::eq(USERNAME, v.clone()),
            Predicate::TeamNameEq(v) => Expr::eq(TEAM_NAME, v.clone()),
            Predicate::AgeGoe(bound) => Expr::gte(AGE, *bound),
            Predicate::AgeLoe(bound) => Expr::lte(AGE, *bound),
        }
    }

    /// Evaluate against a joined row the way PostgreSQL would.
    ///
    /// A NULL username or team name never equals anything.
    pub fn matches(&self, row: &MemberTeamRow) -> bool {
        match self {
            Predicate::UsernameEq(v) => row.username.as_deref() == Some(v.as_str()),
            Predicate::TeamNameEq(v) => row.team_name.as_deref() == Some(v.as_str()),
            Predicate::AgeGoe(bound) => row.age >= *bound,
            Predicate::AgeLoe(bound) => row.age <= *bound,
        }
    }
}

fn has_text(s: &str) -> bool {
    !s.trim().is_empty()
}

/// Username equality; absent when `None`, empty or whitespace.
pub fn username_eq(username: Option<&str>) -> Option<Predicate> {
    username
        .filter(|s| has_text(s))
        .map(|s| Predicate::UsernameEq(s.to_string()))
}

/// Team name equality; absent when `None`, empty or whitespace.
pub fn team_name_eq(team_name: Option<&str>) -> Option<Predicate> {
    team_name
        .filter(|s| has_text(s))
        .map(|s| Predicate::TeamNameEq(s.to_string()))
}

/// Age lower bound (inclusive).
pub fn age_goe(bound: Option<i32>) -> Option<Predicate> {
    bound.map(Predicate::AgeGoe)
}

/// Age upper bound (inclusive).
pub fn age_loe(bound: Option<i32>) -> Option<Predicate> {
    bound.map(Predicate::AgeLoe)
}

/// `goe <= age <= loe`, either side optional. Both absent matches everything.
pub fn age_between(goe: Option<i32>, loe: Option<i32>) -> Filter {
    Filter::all().and_opt(age_goe(goe)).and_opt(age_loe(loe))
}

/// Conjunction of predicates. No terms means match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    terms: Vec<Predicate>,
}

impl Filter {
    /// The filter that matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_all(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn terms(&self) -> &[Predicate] {
        &self.terms
    }

    /// AND another filter.
    pub fn and(mut self, other: impl Into<Filter>) -> Self {
        self.terms.extend(other.into().terms);
        self
    }

    /// AND a predicate if present.
    pub fn and_opt(mut self, predicate: Option<Predicate>) -> Self {
        self.terms.extend(predicate);
        self
    }

    /// Evaluate every term against a joined row.
    pub fn matches(&self, row: &MemberTeamRow) -> bool {
        self.terms.iter().all(|p| p.matches(row))
    }

    /// Lower to SQL. The empty filter lowers to an empty AND, which renders
    /// no WHERE clause at all.
    pub fn to_expr(&self) -> Expr {
        Expr::and(self.terms.iter().map(Predicate::to_expr).collect())
    }
}

impl From<Predicate> for Filter {
    fn from(predicate: Predicate) -> Self {
        Filter {
            terms: vec![predicate],
        }
    }
}

impl From<Option<Predicate>> for Filter {
    fn from(predicate: Option<Predicate>) -> Self {
        Filter::all().and_opt(predicate)
    }
}

impl FromIterator<Option<Predicate>> for Filter {
    fn from_iter<I: IntoIterator<Item = Option<Predicate>>>(iter: I) -> Self {
        Filter {
            terms: iter.into_iter().flatten().collect(),
        }
    }
}

/// Incremental conjunction builder.
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    filter: Filter,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.filter.terms.push(predicate);
        self
    }

    pub fn and_opt(mut self, predicate: Option<Predicate>) -> Self {
        self.filter = self.filter.and_opt(predicate);
        self
    }

    pub fn and_filter(mut self, filter: Filter) -> Self {
        self.filter = self.filter.and(filter);
        self
    }

    pub fn build(self) -> Filter {
        self.filter
    }
}
