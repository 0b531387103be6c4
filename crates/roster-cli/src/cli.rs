use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Migrate,
    Seed,
    Search,
    Page,
    Bulk,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Migrate(ConnArgs),
    Seed(ConnArgs),
    Search(SearchArgs),
    Page(PageArgs),
    Bulk(BulkArgs),
}

/// Options every database-touching command accepts.
#[derive(Debug, Clone)]
pub struct ConnArgs {
    pub config: PathBuf,
    pub database: Option<String>,
}

impl Default for ConnArgs {
    fn default() -> Self {
        Self {
            config: PathBuf::from("roster.toml"),
            database: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterArgs {
    pub username: Option<String>,
    pub team: Option<String>,
    pub age_goe: Option<i32>,
    pub age_loe: Option<i32>,
}

impl FilterArgs {
    pub fn to_condition(&self) -> roster::SearchCondition {
        let mut cond = roster::SearchCondition::new();
        if let Some(v) = &self.username {
            cond = cond.username(v.clone());
        }
        if let Some(v) = &self.team {
            cond = cond.team_name(v.clone());
        }
        if let Some(v) = self.age_goe {
            cond = cond.age_goe(v);
        }
        if let Some(v) = self.age_loe {
            cond = cond.age_loe(v);
        }
        cond
    }
}

#[derive(Debug, Clone)]
pub struct SearchArgs {
    pub conn: ConnArgs,
    pub filters: FilterArgs,
}

#[derive(Debug, Clone)]
pub struct PageArgs {
    pub conn: ConnArgs,
    pub filters: FilterArgs,
    pub page: u64,
    /// Falls back to `paging.default_size` from the config file.
    pub size: Option<u64>,
    pub sort: Vec<String>,
    pub simple: bool,
}

#[derive(Debug, Clone)]
pub struct BulkArgs {
    pub conn: ConnArgs,
    pub op: BulkOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOp {
    AddAge(i32),
    RenameYoungerThan { age: i32, name: String },
    DeleteOlderThan(i32),
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1).map(|s| s.as_str());

    let Some(cmd) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match cmd {
        "-h" | "--help" | "help" => Ok(Command::Help(HelpTopic::Root)),
        "migrate" => parse_conn_only(it, HelpTopic::Migrate).map(|c| match c {
            Ok(conn) => Command::Migrate(conn),
            Err(topic) => Command::Help(topic),
        }),
        "seed" => parse_conn_only(it, HelpTopic::Seed).map(|c| match c {
            Ok(conn) => Command::Seed(conn),
            Err(topic) => Command::Help(topic),
        }),
        "search" => parse_search(it),
        "page" => parse_page(it),
        "bulk" => parse_bulk(it),
        other => anyhow::bail!("unknown command: {other}"),
    }
}

/// Pulls the value of `--flag <v>` or `--flag=<v>`; `Ok(None)` when `token` is
/// not that flag.
fn flag_value<'a>(
    flag: &str,
    token: &'a str,
    it: &mut impl Iterator<Item = &'a str>,
) -> anyhow::Result<Option<&'a str>> {
    if token == flag {
        let Some(v) = it.next() else {
            anyhow::bail!("{flag} requires a value");
        };
        return Ok(Some(v));
    }
    match token.strip_prefix(flag).and_then(|rest| rest.strip_prefix('=')) {
        Some(v) => Ok(Some(v)),
        None => Ok(None),
    }
}

fn parse_number<T: std::str::FromStr>(flag: &str, v: &str) -> anyhow::Result<T> {
    v.parse()
        .map_err(|_| anyhow::anyhow!("{flag} expects a number, got: {v}"))
}

fn take_conn<'a>(
    conn: &mut ConnArgs,
    token: &'a str,
    it: &mut impl Iterator<Item = &'a str>,
) -> anyhow::Result<bool> {
    if let Some(v) = flag_value("--config", token, it)? {
        conn.config = PathBuf::from(v);
        return Ok(true);
    }
    if let Some(v) = flag_value("--database", token, it)? {
        conn.database = Some(v.to_string());
        return Ok(true);
    }
    Ok(false)
}

fn take_filter<'a>(
    filters: &mut FilterArgs,
    token: &'a str,
    it: &mut impl Iterator<Item = &'a str>,
) -> anyhow::Result<bool> {
    if let Some(v) = flag_value("--username", token, it)? {
        filters.username = Some(v.to_string());
        return Ok(true);
    }
    if let Some(v) = flag_value("--team", token, it)? {
        filters.team = Some(v.to_string());
        return Ok(true);
    }
    if let Some(v) = flag_value("--age-goe", token, it)? {
        filters.age_goe = Some(parse_number("--age-goe", v)?);
        return Ok(true);
    }
    if let Some(v) = flag_value("--age-loe", token, it)? {
        filters.age_loe = Some(parse_number("--age-loe", v)?);
        return Ok(true);
    }
    Ok(false)
}

fn parse_conn_only<'a>(
    mut it: impl Iterator<Item = &'a str>,
    topic: HelpTopic,
) -> anyhow::Result<Result<ConnArgs, HelpTopic>> {
    let mut conn = ConnArgs::default();
    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Err(topic)),
            _ if take_conn(&mut conn, token, &mut it)? => {}
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(Ok(conn))
}

fn parse_search<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut conn = ConnArgs::default();
    let mut filters = FilterArgs::default();

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Search)),
            _ if take_conn(&mut conn, token, &mut it)? => {}
            _ if take_filter(&mut filters, token, &mut it)? => {}
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(Command::Search(SearchArgs { conn, filters }))
}

fn parse_page<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut conn = ConnArgs::default();
    let mut filters = FilterArgs::default();
    let mut page = 0;
    let mut size = None;
    let mut sort = Vec::new();
    let mut simple = false;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Page)),
            "--simple" => simple = true,
            _ if take_conn(&mut conn, token, &mut it)? => {}
            _ if take_filter(&mut filters, token, &mut it)? => {}
            _ => {
                if let Some(v) = flag_value("--page", token, &mut it)? {
                    page = parse_number("--page", v)?;
                } else if let Some(v) = flag_value("--size", token, &mut it)? {
                    let n: u64 = parse_number("--size", v)?;
                    if n == 0 {
                        anyhow::bail!("--size must be at least 1");
                    }
                    size = Some(n);
                } else if let Some(v) = flag_value("--sort", token, &mut it)? {
                    sort.push(v.to_string());
                } else {
                    anyhow::bail!("unknown argument: {token}");
                }
            }
        }
    }

    Ok(Command::Page(PageArgs {
        conn,
        filters,
        page,
        size,
        sort,
        simple,
    }))
}

fn parse_bulk<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut conn = ConnArgs::default();
    let mut positional: Vec<&str> = Vec::new();

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Bulk)),
            _ if take_conn(&mut conn, token, &mut it)? => {}
            _ if token.starts_with("--") => anyhow::bail!("unknown argument: {token}"),
            _ => positional.push(token),
        }
    }

    let op = match positional.as_slice() {
        ["add-age", delta] => BulkOp::AddAge(parse_number("add-age", delta)?),
        ["rename-younger-than", age, name] => BulkOp::RenameYoungerThan {
            age: parse_number("rename-younger-than", age)?,
            name: name.to_string(),
        },
        ["delete-older-than", age] => BulkOp::DeleteOlderThan(parse_number("delete-older-than", age)?),
        [] => return Ok(Command::Help(HelpTopic::Bulk)),
        [op, ..] => anyhow::bail!("invalid bulk operation or arguments: {op}"),
    };

    Ok(Command::Bulk(BulkArgs { conn, op }))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
roster - member/team store CLI

USAGE:
  roster <COMMAND> [OPTIONS]

COMMANDS:
  migrate       Apply embedded schema migrations
  seed          Insert the demo teams and members
  search        List members matching optional filters
  page          Print one page of matching members
  bulk          Run a bulk update or delete

GLOBAL OPTIONS:
  --config <FILE>       Config file path (default: roster.toml)
  --database <URL>      Override database.url from config
  -h, --help            Print help

Run `roster <command> --help` for more."
            );
        }
        HelpTopic::Migrate => {
            println!(
                "\
USAGE:
  roster migrate [--config <FILE>] [--database <URL>]"
            );
        }
        HelpTopic::Seed => {
            println!(
                "\
USAGE:
  roster seed [--config <FILE>] [--database <URL>]

Creates teamA and teamB with member1..member4 aged 10, 20, 30 and 40 in a
single transaction."
            );
        }
        HelpTopic::Search => {
            println!(
                "\
USAGE:
  roster search [FILTERS]

FILTERS:
  --username <NAME>     Exact username
  --team <NAME>         Exact team name
  --age-goe <N>         Age greater than or equal to N
  --age-loe <N>         Age less than or equal to N

Blank names count as absent. With no filters every member is listed."
            );
        }
        HelpTopic::Page => {
            println!(
                "\
USAGE:
  roster page [FILTERS] [OPTIONS]

OPTIONS:
  --page <N>            Zero-based page number (default: 0)
  --size <N>            Page size (default: paging.default_size)
  --sort <KEY[,desc]>   Sort key: id, username, age, team (repeatable)
  --simple              Always run the COUNT query

FILTERS are the same as for `roster search`."
            );
        }
        HelpTopic::Bulk => {
            println!(
                "\
USAGE:
  roster bulk add-age <DELTA>
  roster bulk rename-younger-than <AGE> <NAME>
  roster bulk delete-older-than <AGE>"
            );
        }
    }
}
