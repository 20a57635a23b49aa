//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `memberdata_core` linkage with a deterministic probe.
//! - Run the "hello" lookup: save one member, read it back by id.

use memberdata_core::{Member, MemberService, PageRequest, SortSpec};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("memberdata_core ping={}", memberdata_core::ping());
    println!("memberdata_core version={}", memberdata_core::core_version());

    match hello() {
        Ok(greeting) => {
            println!("{greeting}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("hello probe failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn hello() -> Result<String, Box<dyn std::error::Error>> {
    let mut service = MemberService::new();
    let mut member = Member::with_age("member1", 10);
    let id = service.save_member(&mut member)?;
    let found = service.find_member(id)?;

    let page = service.find_by_age(10, &PageRequest::sorted(0, 3, SortSpec::desc("username"))?)?;
    println!(
        "lookup username={} page_total={} page_count={}",
        found.username,
        page.total_elements(),
        page.total_pages()
    );
    Ok("hello".to_string())
}
