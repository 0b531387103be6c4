//! Repositories over the `member` and `team` tables.
//!
//! Repositories are stateless unit structs; every method takes the client to
//! run on, so the same call works on a plain connection, a pooled connection,
//! an [`InstrumentedClient`](crate::monitor::InstrumentedClient) or inside a
//! transaction. Each statement carries a `<table>.<method>` tag.

mod member;
mod team;

pub use member::MemberRepository;
pub use team::TeamRepository;

pub(crate) const MEMBER_COLUMNS: &[&str] = &["member.id", "member.username", "member.age", "member.team_id"];
