//! # roster
//!
//! Member/Team data access for PostgreSQL.
//!
//! ## Features
//!
//! - **Optional predicates**: a [`SearchCondition`] lowers to a conjunction of
//!   only the fields that are present; the empty conjunction matches everything
//! - **Count-eliding pagination**: [`page::get_page`] skips the COUNT query
//!   whenever the total follows from the page content
//! - **Transaction-friendly**: repositories take any [`GenericClient`]
//! - **Statement logging**: [`InstrumentedClient`] emits one `tracing` event per
//!   statement on the `roster.sql` target
//!
//! ## Example
//!
//! ```ignore
//! use roster::{MemberRepository, Pageable, SearchCondition};
//!
//! let pool = roster::create_pool(&database_url)?;
//! let client = pool.get().await?;
//!
//! let cond = SearchCondition::new().age_goe(20).age_loe(35);
//! let page = MemberRepository
//!     .search_page_complex(&client, &cond, &Pageable::of(0, 10)?)
//!     .await?;
//! println!("{} of {}", page.number_of_elements(), page.total_elements());
//! ```

extern crate self as roster;

pub mod client;
pub mod error;
pub mod model;
pub mod monitor;
pub mod page;
pub mod qb;
pub mod repository;
pub mod row;
pub mod search;
pub mod transaction;

#[cfg(feature = "migrate")]
pub mod migrate;

#[cfg(feature = "pool")]
pub mod pool;

pub use client::GenericClient;
pub use error::{RosterError, RosterResult};
pub use model::{Member, MemberDto, MemberTeamRow, NewMember, NewTeam, Team, TeamAgeStats};
pub use monitor::{InstrumentedClient, MonitorConfig, QueryStats, StatsMonitor};
pub use page::{Order, Page, Pageable, Sort, SortKey};
pub use repository::{MemberRepository, TeamRepository};
pub use row::{FromRow, RowExt};
pub use search::{Filter, FilterBuilder, Predicate, SearchCondition};

pub use roster_derive::FromRow;

#[cfg(feature = "pool")]
pub use client::PoolClient;

#[cfg(feature = "pool")]
pub use pool::{Pool, PoolSettings, create_pool, create_pool_with_settings};

pub use tokio_postgres;
