//! Output formatting for CLI
//!
//! Report data goes to stdout in the selected format. Notices (written files,
//! warnings, errors) go to stderr so `--format json` output stays parseable
//! when piped from a CI step.

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use runledger_report::FlushOutcome;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Tab-separated rows with a header line
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// One plain line per row; tabs and newlines inside a cell become spaces
fn plain_line(cells: &[String]) -> String {
    cells
        .iter()
        .map(|c| c.replace(['\t', '\n', '\r'], " "))
        .collect::<Vec<_>>()
        .join("\t")
}

fn render<T: Serialize + TableDisplay>(items: &[T], value: &impl Serialize, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = table();
            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }
            format!("{table}\n")
        }
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(value).unwrap_or_default()),
        OutputFormat::Yaml => serde_yaml::to_string(value).unwrap_or_default(),
        OutputFormat::Plain => {
            let header: Vec<String> = T::headers().into_iter().map(str::to_string).collect();
            let mut out = plain_line(&header);
            out.push('\n');
            for item in items {
                out.push_str(&plain_line(&item.row()));
                out.push('\n');
            }
            out
        }
    }
}

/// Print a single item
pub fn print_item<T: Serialize + TableDisplay>(item: &T, format: OutputFormat) {
    print!("{}", render(std::slice::from_ref(item), item, format));
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    if items.is_empty() && matches!(format, OutputFormat::Table) {
        println!("No tests to list.");
        return;
    }
    print!("{}", render(items, &items, format));
}

/// List the report files a flush produced
pub fn print_written_reports(outcome: &FlushOutcome) {
    print_success("Reports written:");
    let mut paths = vec![
        &outcome.environment_path,
        &outcome.detailed_path,
        &outcome.summary_path,
    ];
    paths.extend(outcome.allure_environment_path.as_ref());
    for path in paths {
        eprintln!("   {}", path.display());
    }
}

/// Print success message
pub fn print_success(message: &str) {
    eprintln!("✅ {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    eprintln!("⚠️  {}", message);
}
