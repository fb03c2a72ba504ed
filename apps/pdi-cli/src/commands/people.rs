// people.rs — Directory subcommands: list, chart.

use clap::Subcommand;
use pdi_directory::{Directory, OrgNode};

use crate::config::PdiConfig;

#[derive(Subcommand)]
pub enum PeopleCommands {
    /// List everyone in the directory.
    List,
    /// Print the org chart from reporting lines.
    Chart,
}

pub fn execute(cmd: &PeopleCommands, config: &PdiConfig) -> anyhow::Result<()> {
    let directory = Directory::load_or_empty(&config.directory.path)?;
    if directory.is_empty() {
        println!(
            "No people found. Add a JSON array of people to {}.",
            config.directory.path.display()
        );
        return Ok(());
    }

    match cmd {
        PeopleCommands::List => list_people(&directory),
        PeopleCommands::Chart => print_chart(&directory),
    }
    Ok(())
}

fn list_people(directory: &Directory) {
    println!("{:<38} {:<24} {:<13} {:<16}", "ID", "NAME", "ROLE", "MANAGER");
    println!("{}", "-".repeat(94));
    for person in directory.people() {
        let manager = directory
            .manager_of(person.id)
            .map(|m| m.name.as_str())
            .unwrap_or("-");
        println!(
            "{:<38} {:<24} {:<13} {:<16}",
            person.id,
            person.name,
            person.role.to_string(),
            manager
        );
    }
    println!("\n{} person(s) total.", directory.len());
}

fn print_chart(directory: &Directory) {
    let chart = directory.org_chart();
    for root in &chart.roots {
        print_node(root, 0);
    }
    if !chart.cyclic.is_empty() {
        println!("\nReporting loop (not shown above):");
        for id in &chart.cyclic {
            let name = directory.get(*id).map(|p| p.name.as_str()).unwrap_or("?");
            println!("  {} ({})", name, id);
        }
    }
}

fn print_node(node: &OrgNode, depth: usize) {
    let area = node
        .person
        .area
        .as_deref()
        .map(|a| format!(", {}", a))
        .unwrap_or_default();
    println!(
        "{}{} ({}{})",
        "  ".repeat(depth),
        node.person.name,
        node.person.role,
        area
    );
    for report in &node.reports {
        print_node(report, depth + 1);
    }
}
