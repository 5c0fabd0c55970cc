//! Terminal rendering for a completed run.

use std::io::Write;

use owo_colors::{OwoColorize, Style};

use crate::analysis::{FileOutcome, FileReport, Report, SourceText};
use crate::aggregate::IssueMap;
use crate::blame::Blame;
use crate::error::Result;
use crate::issue::Severity;

pub const CLEAN_MARKER: &str = "All clean!";

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Clear the screen and write every file block plus a timing footer.
    pub fn render(
        &self,
        out: &mut impl Write,
        report: &Report,
        operator: Option<&str>,
    ) -> Result<()> {
        if self.color {
            write!(out, "{CLEAR_SCREEN}")?;
        }
        for file in &report.files {
            self.render_file(out, file, operator)?;
            writeln!(out)?;
        }
        writeln!(
            out,
            "Finished linting {} file(s) in {:.3} seconds",
            report.files.len(),
            report.elapsed.as_secs_f64()
        )?;
        out.flush()?;
        Ok(())
    }

    pub fn render_file(
        &self,
        out: &mut impl Write,
        file: &FileReport,
        operator: Option<&str>,
    ) -> Result<()> {
        let header = file.path.display().to_string();
        writeln!(out, "{}", self.paint(&header, Style::new().magenta()))?;

        match &file.outcome {
            FileOutcome::Failed(e) => {
                let line = format!("! {e}");
                writeln!(out, "{}", self.paint(&line, Style::new().red()))?;
            }
            FileOutcome::Analyzed {
                issues,
                blame,
                source,
            } => {
                self.render_issues(out, issues, blame, source, operator)?;
            }
        }
        Ok(())
    }

    fn render_issues(
        &self,
        out: &mut impl Write,
        issues: &IssueMap,
        blame: &Blame,
        source: &SourceText,
        operator: Option<&str>,
    ) -> Result<()> {
        if issues.is_empty() {
            writeln!(out, "{}", self.paint(CLEAN_MARKER, Style::new().bold()))?;
            return Ok(());
        }

        for (line, line_issues) in issues.iter() {
            let author = blame.author(line)?;
            let tag = self.author_tag(author, operator);
            if let Some(text) = source.line(line).filter(|t| !t.is_empty()) {
                let context = format!("{line}| {text}");
                writeln!(out, "{}", self.paint(&context, Style::new().dimmed()))?;
            }
            for issue in line_issues {
                let location = format!("{line}:{}", issue.column);
                let code = format!("[{}]", issue.code);
                writeln!(
                    out,
                    "{} {} {} {}",
                    self.paint(&location, Style::new().bold()),
                    self.paint(&code, severity_style(issue.severity())),
                    issue.message,
                    tag
                )?;
            }
        }
        Ok(())
    }

    fn author_tag(&self, author: Option<&str>, operator: Option<&str>) -> String {
        let Some(name) = author else {
            return "[unknown]".to_string();
        };
        let tag = format!("[{name}]");
        if operator == Some(name) {
            format!("{}*", self.paint(&tag, Style::new().yellow().bold()))
        } else {
            self.paint(&tag, Style::new().blue())
        }
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }
}

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Error => Style::new().red().bold(),
        Severity::Warning => Style::new().yellow(),
        Severity::Convention => Style::new().bold(),
        Severity::Info => Style::new(),
    }
}
