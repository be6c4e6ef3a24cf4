//! Sync command implementations.

use tabled::{Table, Tabled};

use crate::cli::error::CliResult;
use crate::cli::utils::apply_table_style;
use crate::store::Database;
use crate::sync::{SyncManager, SyncStatus, Transport};

#[derive(Tabled)]
struct JournalRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Diffs")]
    diffs: usize,
}

/// Run one sync round
pub async fn sync<T: Transport>(manager: &SyncManager<T>, db: &mut Database) -> CliResult<String> {
    let report = manager.sync(db).await?;

    let mut output = String::from("✓ Sync complete\n\n");
    output.push_str(&format!("Pulled:  {}\n", format_files(&report.pulled)));
    output.push_str(&format!("Pushed:  {}\n", format_files(&report.pushed)));
    output.push_str(&format!("Changed: {} objects", report.changed));
    Ok(output)
}

fn format_files(files: &[String]) -> String {
    if files.is_empty() {
        "-".to_string()
    } else {
        files.join(", ")
    }
}

/// Show device and store status
pub fn status(status: &SyncStatus) -> String {
    let mut output = String::new();
    output.push_str(&format!("Device:  {}\n", status.device_id));
    output.push_str(&format!("Objects: {}\n", status.objects));
    output.push_str(&format!(
        "Remote files pulled: {}\n",
        status.known_remote_files
    ));
    if status.unsaved_changes {
        output.push_str("⚠ Unsaved changes\n");
    }

    if status.journals.is_empty() {
        output.push_str("\nNo journals yet.");
        return output;
    }

    let rows: Vec<JournalRow> = status
        .journals
        .iter()
        .map(|(device, diffs)| JournalRow {
            device: device.clone(),
            diffs: *diffs,
        })
        .collect();
    let mut table = Table::new(rows);
    apply_table_style(&mut table);
    output.push('\n');
    output.push_str(&table.to_string());
    output
}
