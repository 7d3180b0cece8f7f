//! Catalog command implementations

use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::debug;
use vractl_core::CatalogItem;

use crate::cli::{CatalogCommands, OutputFormat};
use crate::connection::ConnectionManager;
use crate::error::Result as CliResult;
use crate::output;

/// Handle catalog commands
pub async fn handle_catalog_command(
    catalog_cmd: &CatalogCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    match catalog_cmd {
        CatalogCommands::List { entitled_only } => {
            handle_list(conn_mgr, profile_name, *entitled_only, output_format, query).await
        }
    }
}

async fn handle_list(
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    entitled_only: bool,
    output_format: OutputFormat,
    query: Option<&str>,
) -> CliResult<()> {
    let client = conn_mgr.create_client(profile_name)?;
    let mut items = client.list_catalog_items(entitled_only).await?;
    debug!("Fetched {} catalog items", items.len());
    items.sort_by(|a, b| a.name.cmp(&b.name));

    if output_format.is_structured() || query.is_some() {
        output::print_output(&items, output_format.into(), query)?;
        return Ok(());
    }

    if items.is_empty() {
        println!("No catalog items found.");
        return Ok(());
    }

    let rows: Vec<CatalogRow> = items.iter().map(CatalogRow::from).collect();
    println!("{}", Table::new(rows).with(Style::modern()));
    Ok(())
}

/// One line of the catalog listing
#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "Catalog ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Subtenant")]
    subtenant: String,
}

impl From<&CatalogItem> for CatalogRow {
    fn from(item: &CatalogItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            description: item.description.clone().unwrap_or_default(),
            status: status_display(item.status.as_deref()).render(),
            subtenant: item.subtenant_name().unwrap_or_default().to_string(),
        }
    }
}

/// Color for a catalog item status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Plain,
    Green,
    Red,
}

/// How a catalog item status is shown in the listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDisplay {
    pub text: String,
    pub color: StatusColor,
}

impl StatusDisplay {
    fn render(&self) -> String {
        match self.color {
            StatusColor::Plain => self.text.clone(),
            StatusColor::Green => self.text.green().to_string(),
            StatusColor::Red => self.text.red().to_string(),
        }
    }
}

/// Map a raw status to its display form
///
/// No status shows as a plain `-`; otherwise the lowercased status is green
/// when published and red for anything else.
pub fn status_display(status: Option<&str>) -> StatusDisplay {
    let Some(status) = status else {
        return StatusDisplay {
            text: "-".to_string(),
            color: StatusColor::Plain,
        };
    };

    let text = status.to_lowercase();
    let color = if text == "published" {
        StatusColor::Green
    } else {
        StatusColor::Red
    };
    StatusDisplay { text, color }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_absent() {
        assert_eq!(
            status_display(None),
            StatusDisplay {
                text: "-".to_string(),
                color: StatusColor::Plain
            }
        );
    }

    #[test]
    fn test_status_display_published_is_green() {
        let display = status_display(Some("PUBLISHED"));
        assert_eq!(display.text, "published");
        assert_eq!(display.color, StatusColor::Green);
    }

    #[test]
    fn test_status_display_other_is_red() {
        for status in ["RETIRED", "draft", ""] {
            assert_eq!(status_display(Some(status)).color, StatusColor::Red);
        }
    }

    #[test]
    fn test_catalog_row_fills_blanks() {
        let item: CatalogItem = serde_json::from_value(serde_json::json!({
            "id": "cat-1",
            "name": "CentOS 7",
        }))
        .unwrap();
        let row = CatalogRow::from(&item);
        assert_eq!(row.description, "");
        assert_eq!(row.status, "-");
        assert_eq!(row.subtenant, "");
    }
}
