// Output formatting and display for CLI

use crate::process::types::ServiceSpec;
use colored::*;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

/// Print the discovered services as a formatted table
pub fn print_service_table(specs: &[ServiceSpec]) {
    if specs.is_empty() {
        println!("{}", "No services discovered".yellow());
        return;
    }

    #[derive(Tabled)]
    struct ServiceRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Directory")]
        directory: String,
        #[tabled(rename = "Entry")]
        entry: String,
        #[tabled(rename = "Host")]
        host: String,
        #[tabled(rename = "Port")]
        port: String,
    }

    let rows: Vec<ServiceRow> = specs
        .iter()
        .map(|s| ServiceRow {
            name: truncate(&s.name, 24).cyan().to_string(),
            directory: s.dir.display().to_string(),
            entry: s.entry.clone(),
            host: s.host.clone(),
            port: s.port.to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    println!("\n{}\n", table);
    println!(
        "{}",
        format!("Total: {} service(s)", specs.len()).dimmed()
    );
}

/// Truncate a string, appending an ellipsis when it was cut
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}…", &s[..max_len.saturating_sub(1)])
    }
}
