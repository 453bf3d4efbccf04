//! Console reporter with colored output

use super::{BatchSummary, EssayReport, KindSummary};
use crate::Band;
use colored::Colorize;

/// Reporter for terminal output
pub struct ConsoleReporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show verbose output
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
        }
    }

    /// Disable colors
    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Report a single scored essay
    pub fn report(&self, report: &EssayReport) {
        print!("{}", self.render(report));
    }

    /// Report multiple essays with summary
    pub fn report_many(&self, reports: &[EssayReport], summary: &BatchSummary) {
        for report in reports {
            self.report(report);
            println!("{}", "─".repeat(60));
        }
        print!("{}", self.render_summary(summary));
    }

    /// Report in quiet mode (just bands)
    pub fn report_quiet(&self, report: &EssayReport) {
        println!("{}", self.render_quiet(report));
    }

    pub fn render_quiet(&self, report: &EssayReport) -> String {
        format!(
            "{}: GRA {} LR {}{}",
            report.file_path.display(),
            self.colorize_band(report.result.gra),
            self.colorize_band(report.result.lr),
            if report.result.low_confidence {
                " (low confidence)"
            } else {
                ""
            }
        )
    }

    /// Full report as text
    pub fn render(&self, report: &EssayReport) -> String {
        let mut out = String::new();
        self.push_header(&mut out, report);
        self.push_bands(&mut out, report);
        self.push_errors(&mut out, &report.explanation.errors);
        if self.verbose {
            self.push_metrics(&mut out, report);
        }
        self.push_breakdown(&mut out, report);
        self.push_recommendations(&mut out, report);
        out.push('\n');
        out
    }

    fn push_header(&self, out: &mut String, report: &EssayReport) {
        let r = &report.result;
        out.push('\n');
        out.push_str(&format!(
            "{}\n",
            format!("📝 Band Estimate: {}", report.file_path.display()).bold()
        ));
        out.push_str(&format!(
            "   {} | Words: {} ({} unique) | Sentences: {}\n\n",
            r.task, r.word_count, r.unique_words, r.sentence_count
        ));
    }

    fn push_bands(&self, out: &mut String, report: &EssayReport) {
        let e = &report.explanation;
        for (name, band, description) in [
            ("GRA", e.gra, e.gra_description),
            ("LR ", e.lr, e.lr_description),
        ] {
            out.push_str(&format!(
                "   {} {} {}\n",
                name.bold(),
                self.create_band_bar(band),
                self.colorize_band(band).bold()
            ));
            out.push_str(&format!("       {}\n", description.dimmed()));
        }
        if report.result.low_confidence {
            out.push_str(&format!(
                "   {} Low confidence: too few content words for a reliable vocabulary estimate\n",
                "⚠".yellow()
            ));
        }
        out.push('\n');
    }

    fn push_errors(&self, out: &mut String, kinds: &[KindSummary]) {
        if kinds.is_empty() {
            out.push_str(&format!("   {} No grammar errors flagged\n\n", "✓".green()));
            return;
        }
        out.push_str(&format!("   {}\n", "Grammar Errors:".bold()));
        for summary in kinds {
            out.push_str(&format!(
                "   {} {} x{}  e.g. \"{}\" {}\n",
                "✗".red(),
                summary.kind.label(),
                summary.count,
                summary.example,
                summary.example_span.to_string().dimmed()
            ));
            if let Some(ref message) = summary.message {
                out.push_str(&format!("       {} {}\n", "→".dimmed(), message.italic()));
            }
        }
        out.push('\n');
    }

    fn push_metrics(&self, out: &mut String, report: &EssayReport) {
        out.push_str(&format!("   {}\n", "Metrics:".bold()));
        for line in &report.explanation.metrics {
            out.push_str(&format!(
                "   {} {:<24} {:>8.3}  (normalized {:.2})\n",
                self.create_mini_bar(line.normalized),
                line.label,
                line.raw,
                line.normalized
            ));
        }
        if !report.result.most_common.is_empty() {
            let words: Vec<String> = report
                .result
                .most_common
                .iter()
                .map(|w| format!("{} ({})", w.word, w.count))
                .collect();
            out.push_str(&format!("   Most common: {}\n", words.join(", ").dimmed()));
        }
        out.push('\n');
    }

    fn push_breakdown(&self, out: &mut String, report: &EssayReport) {
        out.push_str(&format!("   {}\n", "Score Breakdown:".bold()));
        for (name, lines) in [
            ("GRA", &report.explanation.gra_lines),
            ("LR", &report.explanation.lr_lines),
        ] {
            out.push_str(&format!("   {}\n", name));
            for line in lines {
                out.push_str(&format!("     {}\n", line.dimmed()));
            }
        }
        out.push('\n');
    }

    fn push_recommendations(&self, out: &mut String, report: &EssayReport) {
        let recs = &report.explanation.recommendations;
        let shown = if self.verbose { recs.len() } else { 3 };
        out.push_str(&format!("   {}\n", "Recommendations:".bold()));
        for rec in recs.iter().take(shown) {
            out.push_str(&format!("   {} {}\n", "→".cyan(), rec));
        }
        if recs.len() > shown {
            out.push_str(&format!(
                "   {} {} more (use --verbose to show)\n",
                "ℹ".blue(),
                recs.len() - shown
            ));
        }
    }

    pub fn render_summary(&self, summary: &BatchSummary) -> String {
        let mut out = String::new();
        out.push('\n');
        out.push_str(&format!("{}\n", "═".repeat(60)));
        out.push_str(&format!("{}\n", "Summary".bold()));
        out.push_str(&format!("{}\n", "═".repeat(60)));
        out.push_str(&format!(
            "   Essays scored:  {}\n",
            summary.files_scored.to_string().bold()
        ));
        if summary.files_failed > 0 {
            out.push_str(&format!(
                "   Essays failed:  {}\n",
                summary.files_failed.to_string().red()
            ));
        }
        out.push_str(&format!("   Average GRA:    {:.2}\n", summary.average_gra));
        out.push_str(&format!("   Average LR:     {:.2}\n", summary.average_lr));
        out.push_str(&format!("   Total errors:   {}\n", summary.total_errors));
        if let Some(threshold) = summary.threshold {
            out.push_str(&format!(
                "   Below {:.1}:      {}\n",
                threshold, summary.below_threshold
            ));
        }
        out.push('\n');
        out
    }

    fn colorize_band(&self, band: Band) -> colored::ColoredString {
        let s = band.to_string();
        if !self.use_colors {
            return s.normal();
        }
        match band.halves() {
            15..=18 => s.green().bold(),
            13..=14 => s.green(),
            11..=12 => s.yellow(),
            9..=10 => s.red(),
            _ => s.red().bold(),
        }
    }

    fn create_band_bar(&self, band: Band) -> String {
        let filled = band.halves() as usize;
        let empty = 18 - filled;
        let bar = format!("[{}{}]", "█".repeat(filled), "░".repeat(empty));

        if self.use_colors {
            if band.value() >= 7.0 {
                bar.green().to_string()
            } else if band.value() >= 5.5 {
                bar.yellow().to_string()
            } else {
                bar.red().to_string()
            }
        } else {
            bar
        }
    }

    fn create_mini_bar(&self, normalized: f64) -> String {
        let filled = (normalized.clamp(0.0, 1.0) * 10.0).round() as usize;
        format!("[{}{}]", "▓".repeat(filled), "░".repeat(10 - filled))
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}
