use crate::cli::ConnArgs;
use crate::output::print_success;
use crate::session::Session;
use roster::{MemberRepository, NewMember, NewTeam, TeamRepository};

/// teamA holds member1/member2, teamB holds member3/member4.
const DEMO: [(&str, i32, usize); 4] = [
    ("member1", 10, 0),
    ("member2", 20, 0),
    ("member3", 30, 1),
    ("member4", 40, 1),
];

pub async fn run(args: ConnArgs) -> anyhow::Result<()> {
    let session = Session::open(&args)?;
    let mut client = session.connection().await?;

    let inserted = roster::transaction!(&mut client, tx, {
        let team_a = TeamRepository.save(&tx, NewTeam::new("teamA")).await?;
        let team_b = TeamRepository.save(&tx, NewTeam::new("teamB")).await?;
        let teams = [team_a.id, team_b.id];

        let mut inserted = 0usize;
        for (username, age, team) in DEMO {
            MemberRepository
                .save(&tx, NewMember::new(username, age).in_team(teams[team]))
                .await?;
            inserted += 1;
        }
        Ok(inserted)
    })?;

    print_success(&format!("seeded 2 teams and {inserted} members"));
    Ok(())
}
