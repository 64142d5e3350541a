//! Human-readable merge report on stderr.

use std::io::Write;

use mergeguard_merge::{MergeStats, Provenance, ReportSink, Table};

const RULE: usize = 40;
const WIDE_RULE: usize = 100;

/// Writes the classic "Merge Statistics" block. Write failures are ignored;
/// the report is advisory.
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for ConsoleSink<W> {
    fn message(&mut self, text: &str) {
        let _ = writeln!(self.out, "{}", "-".repeat(RULE));
        let _ = writeln!(self.out, "{text}");
    }

    fn stats(&mut self, stats: &MergeStats) {
        let _ = write!(self.out, "{}", render_stats(stats));
    }

    fn violations(&mut self, examples: &Table) {
        let _ = writeln!(self.out, "{}", "-".repeat(WIDE_RULE));
        let _ = writeln!(self.out, "Examples of cases violating -sets- condition");
        let _ = write!(self.out, "{}", render_table(examples));
    }
}

pub fn render_stats(stats: &MergeStats) -> String {
    let mut s = String::new();
    s.push_str(&format!("Merge Statistics ({}  {})\n", stats.how, stats.mergetype));
    s.push_str(&format!("On: {:?}/{:?}\n", stats.left_keys, stats.right_keys));
    s.push_str(&format!("{:<12}{:>8}\n", "", "Count"));
    for p in [Provenance::Both, Provenance::LeftOnly, Provenance::RightOnly] {
        s.push_str(&format!("{:<12}{:>8}\n", p.label(), stats.counts.get(p)));
    }
    s.push_str(&format!(
        "rows: left={} right={} result={}\n",
        stats.left_rows, stats.right_rows, stats.result_rows
    ));
    s.push_str("merge time: (seconds)\n");
    s.push_str(&format!("{:5.3}\n", stats.elapsed.as_secs_f64()));
    s.push_str(&"-".repeat(RULE));
    s.push('\n');
    s
}

/// Column-aligned text rendering, row index first.
pub fn render_table(table: &Table) -> String {
    let headers: Vec<String> = std::iter::once(String::new())
        .chain(table.column_names().map(String::from))
        .collect();
    let body: Vec<Vec<String>> = table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            std::iter::once(i.to_string())
                .chain(row.iter().map(|v| v.to_string()))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:>w$}", w = *w))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(&headers);
    for row in &body {
        out.push_str(&line(row));
    }
    out
}
