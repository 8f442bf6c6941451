use ingest_core::{AppViewModel, FileRowView, Notice};

const BAR_WIDTH: usize = 20;

pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::with_capacity(view.files.len() + 2);

    let mut status = format!(
        "Files: {} | queued {} | in flight {} | completed {} | failed {}",
        view.total, view.queued, view.in_flight, view.completed, view.failed
    );
    if let Some(stats) = &view.last_submission {
        status.push_str(&format!(
            " | last submission: accepted {}, rejected {}",
            stats.accepted, stats.rejected
        ));
    }
    lines.push(status);

    for row in &view.files {
        lines.push(render_row(row));
    }
    if view.show_summary() {
        lines.push(format!("{} file(s) ready for cleaning", view.completed));
    }
    lines
}

fn render_row(row: &FileRowView) -> String {
    let mut line = format!("  {:<24} {:>9}  {}", row.name, row.size_label, row.status_label);
    if let Some(progress) = row.progress {
        line.push_str(&format!("  {} {:>3}%", progress_bar(progress), progress));
    }
    if let (Some(rows), Some(columns)) = (row.rows, row.columns) {
        line.push_str(&format!("  {} rows, {} columns", format_with_commas(rows), columns));
    }
    line
}

fn progress_bar(progress: u8) -> String {
    let filled = usize::from(progress.min(100)) * BAR_WIDTH / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub fn render_notice(notice: &Notice) -> String {
    match notice {
        Notice::Processed { name } => format!("{name} processed successfully!"),
        Notice::Failed { name } => format!("{name} could not be processed"),
        Notice::Rejected { name, reason } => format!("{name} rejected: {reason}"),
    }
}

fn format_with_commas(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
