//! Console output: result tree and summary table.

use crate::classify::{classify, Classify};
use crate::issue::Severity;
use crate::raw::RawResults;
use crate::summary::ValidationSummary;
use migcheck_checks::{Category, CheckResult, CheckStatus};
use migcheck_redaction::Redactor;
use std::io::{self, Write};

/// Where progress and detail output goes.
pub struct Console {
    sink: Box<dyn Write + Send>,
}

impl Console {
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self { sink }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.sink, "{}", text)
    }

    pub fn block(&mut self, text: &str) -> io::Result<()> {
        self.sink.write_all(text.as_bytes())?;
        self.sink.flush()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::stdout()
    }
}

fn status_icon<S: Classify>(result: &CheckResult<S>) -> &'static str {
    match classify(result) {
        Some(Severity::Critical) => "❌",
        Some(_) => "⚠️",
        None if result.status.as_str() == "skipped" => "⏭️",
        None => "✅",
    }
}

fn branch<S: Classify>(out: &mut String, redactor: &Redactor, results: &[CheckResult<S>], last_category: bool) {
    let stem = if last_category { "    " } else { "│   " };
    for (index, result) in results.iter().enumerate() {
        let joint = if index + 1 == results.len() { "└── " } else { "├── " };
        out.push_str(&format!(
            "{}{}{} {}: {}\n",
            stem,
            joint,
            status_icon(result),
            redactor.redact_str(&result.name),
            redactor.redact_str(&result.message)
        ));
    }
}

/// Every stored result grouped by category.
pub fn render_tree(raw: &RawResults, redactor: &Redactor) -> String {
    let mut out = String::from("Validation Results\n");
    for (index, category) in Category::ALL.iter().enumerate() {
        let last = index + 1 == Category::ALL.len();
        let joint = if last { "└── " } else { "├── " };
        out.push_str(&format!("{}{} ({})\n", joint, category.title(), raw.count(*category)));

        match category {
            Category::Connectivity => branch(&mut out, redactor, &raw.connectivity, last),
            Category::Compatibility => branch(&mut out, redactor, &raw.compatibility, last),
            Category::Dependency => branch(&mut out, redactor, &raw.dependency, last),
            Category::Permission => branch(&mut out, redactor, &raw.permission, last),
        }
    }
    out
}

/// Per-category issue counts and the verdict.
pub fn render_summary_table(summary: &ValidationSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:-<44}\n", ""));
    out.push_str(&format!("{:<20} {:>10} {:>12}\n", "Category", "Issues", "Stale"));
    out.push_str(&format!("{:-<44}\n", ""));
    for (category, count) in &summary.issues_by_category {
        let stale = if summary.stale_categories.contains(category) {
            "yes"
        } else {
            ""
        };
        out.push_str(&format!("{:<20} {:>10} {:>12}\n", category.title(), count, stale));
    }
    out.push_str(&format!("{:-<44}\n", ""));
    out.push_str(&format!(
        "Checks: {} total, {} passed ({:.1}%)\n",
        summary.total_checks, summary.passed_checks, summary.success_rate
    ));
    out.push_str(&format!(
        "Issues: {} critical, {} warning. Estimated fix time: {}\n",
        summary.critical_issues, summary.warning_issues, summary.estimated_fix_time
    ));
    let verdict = if summary.can_proceed {
        "✅ Migration can proceed"
    } else {
        "❌ Migration blocked by critical issues"
    };
    out.push_str(verdict);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tree() {
        let (raw, _, _) = fixtures::blocked();
        let tree = render_tree(&raw, &Redactor::new());
        let expected = "\
Validation Results
├── Connectivity (2)
│   ├── ✅ Source network: ok
│   └── ❌ Destination network: cannot connect to new.example.com:80
├── Compatibility (0)
├── Dependency (1)
│   └── ❌ mysql-connector-python: Python package mysql-connector-python is not installed
└── Permission (0)
";
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_summary_table() {
        let (_, _, summary) = fixtures::blocked();
        let table = render_summary_table(&summary);
        assert!(table.contains("Connectivity                  1"));
        assert!(table.contains("Checks: 3 total, 1 passed (33.3%)"));
        assert!(table.ends_with("❌ Migration blocked by critical issues\n"));
    }

    #[test]
    fn test_console_sink() {
        let shared = Shared::default();
        let mut console = Console::new(Box::new(shared.clone()));
        console.line("hello").unwrap();
        console.block("world\n").unwrap();
        assert_eq!(String::from_utf8(shared.0.lock().unwrap().clone()).unwrap(), "hello\nworld\n");
    }
}
