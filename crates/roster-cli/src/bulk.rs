use crate::cli::{BulkArgs, BulkOp};
use crate::output::{print_query_stats, print_success};
use crate::session::Session;
use roster::MemberRepository;

pub async fn run(args: BulkArgs) -> anyhow::Result<()> {
    let session = Session::open(&args.conn)?;
    let client = session.instrumented().await?;

    let (affected, what) = match &args.op {
        BulkOp::AddAge(delta) => (
            MemberRepository.bulk_add_age(&client, *delta).await?,
            format!("added {delta} to every age"),
        ),
        BulkOp::RenameYoungerThan { age, name } => (
            MemberRepository
                .bulk_rename_younger_than(&client, *age, name)
                .await?,
            format!("renamed members younger than {age} to {name}"),
        ),
        BulkOp::DeleteOlderThan(age) => (
            MemberRepository.bulk_delete_older_than(&client, *age).await?,
            format!("deleted members older than {age}"),
        ),
    };

    print_success(&format!("{what}: {affected} row(s)"));
    print_query_stats(&client.stats().stats());
    Ok(())
}
