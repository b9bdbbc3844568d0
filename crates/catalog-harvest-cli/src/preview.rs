//! Plain-text rendering of result files for the terminal.

use catalog_harvest::{OutputFile, ProductRecord, COLUMNS};

const MAX_CELL: usize = 40;

/// One line per result file: row count and path.
pub fn render_outputs(outputs: &[OutputFile]) -> String {
    if outputs.is_empty() {
        return "No result files found.\n".to_string();
    }
    let mut out = String::new();
    for file in outputs {
        out.push_str(&format!("{:>5}  {}\n", file.rows, file.path.display()));
    }
    out.push_str(&format!("{} file(s)\n", outputs.len()));
    out
}

/// Tab-separated preview of the first `limit` records, with a header row.
pub fn render_preview(records: &[ProductRecord], limit: usize) -> String {
    let mut out = COLUMNS.join("\t");
    out.push('\n');

    for record in records.iter().take(limit) {
        let cells: Vec<String> = row(record).into_iter().map(|c| clip(&c)).collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }

    out.push_str(&format!("Total rows: {}\n", records.len()));
    out
}

fn row(record: &ProductRecord) -> Vec<String> {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();
    vec![
        opt(&record.product_id),
        opt(&record.brand),
        opt(&record.product_name),
        opt(&record.image_url),
        opt(&record.selling_price),
        opt(&record.mrp_price),
        opt(&record.discount_percent),
        opt(&record.rating),
        opt(&record.comment_count),
        record.listing_type.as_str().to_string(),
        record.source_page.as_str().to_string(),
    ]
}

fn clip(cell: &str) -> String {
    if cell.chars().count() <= MAX_CELL {
        return cell.to_string();
    }
    let head: String = cell.chars().take(MAX_CELL - 1).collect();
    format!("{head}…")
}
