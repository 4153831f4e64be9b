use super::ui;
use crate::app::RunReport;
use crate::core::error::RunError;
use comfy_table::Cell;

impl RunReport {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        let rows = [
            ("Country codes", self.codes.to_string()),
            ("Rows uploaded", self.rows.to_string()),
            ("Destination", self.destination.to_string()),
            ("Topic", self.topic.to_string()),
            ("Subscription", self.subscription.to_string()),
        ];
        for (label, value) in rows {
            table.add_row(vec![ui::label_cell(label), Cell::new(value)]);
        }

        format!(
            "{}\n\n{}",
            ui::style_text("Big Mac Index snapshot uploaded", ui::StyleType::Success),
            table
        )
    }
}

/// One-line diagnostic for stderr, stating whether the dataset reached storage.
pub fn failure_line(err: &RunError) -> String {
    let stage = if err.uploaded() {
        ui::style_text("uploaded, not notified", ui::StyleType::Subtle)
    } else {
        ui::style_text("nothing uploaded", ui::StyleType::Subtle)
    };
    format!(
        "{} {} ({})",
        ui::style_text("error:", ui::StyleType::Error),
        err,
        stage
    )
}
