use colored::Colorize;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use roster::{MemberTeamRow, QueryStats};

pub fn print_header(title: &str) {
    println!("{}", title.bold().cyan());
    println!("{}", "─".repeat(60).bright_black());
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

pub fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

fn header_cell(title: &str) -> Cell {
    Cell::new(title).add_attribute(Attribute::Bold).fg(Color::Cyan)
}

pub fn member_table(rows: &[MemberTeamRow]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            header_cell("ID"),
            header_cell("Username"),
            header_cell("Age"),
            header_cell("Team"),
        ]);

    for row in rows {
        table.add_row(vec![
            Cell::new(row.member_id.to_string()).fg(Color::Yellow),
            match &row.username {
                Some(name) => Cell::new(name),
                None => Cell::new("(null)").fg(Color::DarkGrey),
            },
            Cell::new(row.age.to_string()),
            match &row.team_name {
                Some(name) => Cell::new(name).fg(Color::Green),
                None => Cell::new("(none)").fg(Color::DarkGrey),
            },
        ]);
    }
    table
}

pub fn print_query_stats(stats: &QueryStats) {
    print_info(&format!(
        "{} statement(s), {} select, {:.2} ms",
        stats.total_queries,
        stats.select_count,
        stats.total_duration.as_secs_f64() * 1000.0
    ));
}
