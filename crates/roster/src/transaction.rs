//! Transaction helper macro.
//!
//! Repository methods accept any [`GenericClient`](crate::GenericClient), so a
//! transaction is just another client to pass in. [`transaction!`] handles the
//! commit/rollback bookkeeping.
//!
//! # Example
//!
//! ```ignore
//! let mut client = pool.get().await?;
//! let team = roster::transaction!(&mut client, tx, {
//!     let team = TeamRepository.save(&tx, NewTeam::new("teamA")).await?;
//!     MemberRepository.save(&tx, NewMember::new("member1", 10).in_team(team.id)).await?;
//!     Ok(team)
//! })?;
//! ```

/// Runs the given block inside a database transaction.
///
/// - Begins a transaction via `$client.transaction().await`.
/// - Commits on `Ok(_)`.
/// - Rolls back on `Err(_)`.
///
/// The block must evaluate to `roster::RosterResult<T>`.
#[macro_export]
macro_rules! transaction {
    ($client:expr, $tx:ident, $body:block) => {{
        let $tx = ($client)
            .transaction()
            .await
            .map_err($crate::RosterError::from_db_error)?;

        let __roster_tx_body_result: $crate::RosterResult<_> = async { $body }.await;
        match __roster_tx_body_result {
            Ok(value) => {
                $tx.commit()
                    .await
                    .map_err($crate::RosterError::from_db_error)?;
                $crate::RosterResult::Ok(value)
            }
            Err(error) => match $tx.rollback().await {
                Ok(()) => Err(error),
                Err(rollback_err) => Err($crate::RosterError::Other(format!(
                    "{error} (rollback failed: {rollback_err})"
                ))),
            },
        }
    }};
}
