use crate::cli::ConnArgs;
use crate::output::{print_info, print_success};
use crate::session::Session;
use anyhow::Context;

pub async fn run(args: ConnArgs) -> anyhow::Result<()> {
    let session = Session::open(&args)?;
    let report = roster::migrate::run_pool(session.pool())
        .await
        .context("failed to apply migrations")?;

    let applied = report.applied_migrations();
    if applied.is_empty() {
        print_info("schema is up to date");
        return Ok(());
    }
    for m in applied {
        print_success(&format!("applied V{}__{}", m.version(), m.name()));
    }
    Ok(())
}
