use crate::cli::{PageArgs, SearchArgs};
use crate::output::{member_table, print_header, print_info, print_query_stats};
use crate::session::Session;
use anyhow::Context;
use roster::{MemberRepository, Order, Pageable, Sort};

pub async fn run_search(args: SearchArgs) -> anyhow::Result<()> {
    let session = Session::open(&args.conn)?;
    let client = session.instrumented().await?;
    let cond = args.filters.to_condition();

    let rows = MemberRepository.search(&client, &cond).await?;

    print_header("Members");
    println!("{}", member_table(&rows));
    print_info(&format!("{} row(s)", rows.len()));
    print_query_stats(&client.stats().stats());
    Ok(())
}

pub(crate) fn build_pageable(args: &PageArgs, default_size: u64) -> anyhow::Result<Pageable> {
    let orders = args
        .sort
        .iter()
        .map(|s| s.parse::<Order>().with_context(|| format!("invalid --sort value: {s}")))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let size = args.size.unwrap_or(default_size);
    let pageable = Pageable::of(args.page, size)?;
    Ok(if orders.is_empty() {
        pageable
    } else {
        pageable.with_sort(Sort::by(orders))
    })
}

pub async fn run_page(args: PageArgs) -> anyhow::Result<()> {
    let session = Session::open(&args.conn)?;
    let pageable = build_pageable(&args, session.config.file.paging.default_size)?;
    let client = session.instrumented().await?;
    let cond = args.filters.to_condition();

    let page = if args.simple {
        MemberRepository.search_page_simple(&client, &cond, &pageable).await?
    } else {
        MemberRepository.search_page_complex(&client, &cond, &pageable).await?
    };

    print_header(&page.to_string());
    println!("{}", member_table(page.content()));
    print_info(&format!(
        "total {} | has next: {} | has previous: {}",
        page.total_elements(),
        page.has_next(),
        page.has_previous()
    ));
    print_query_stats(&client.stats().stats());
    Ok(())
}
