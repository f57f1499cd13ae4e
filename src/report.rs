//! Pass/fail lines and the collected result of a smoke run.

use std::io::Write;

/// Expected vs. actual values shown under a failed check.
#[derive(Debug, Clone, PartialEq)]
pub struct Expectation {
    pub label: &'static str,
    pub expected: String,
    pub actual: String,
}

impl Expectation {
    pub fn new(expected: impl ToString, actual: impl ToString) -> Self {
        Self {
            label: "Expected",
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn labelled(label: &'static str, expected: impl ToString, actual: impl ToString) -> Self {
        Self {
            label,
            ..Self::new(expected, actual)
        }
    }
}

/// Result of a single check. Rendered as soon as it is recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub name: &'static str,
    pub passed: bool,
    /// Appended to the `PASSED`/`FAILED` line.
    pub summary: Option<String>,
    pub expectation: Option<Expectation>,
    pub request_payload: Option<String>,
    pub response_body: Option<String>,
}

impl TestOutcome {
    pub fn pass(name: &'static str) -> Self {
        Self {
            name,
            passed: true,
            summary: None,
            expectation: None,
            request_payload: None,
            response_body: None,
        }
    }

    pub fn fail(name: &'static str) -> Self {
        Self {
            passed: false,
            ..Self::pass(name)
        }
    }

    /// Pass when `passed` holds, keeping the failure details either way.
    pub fn check(name: &'static str, passed: bool) -> Self {
        Self {
            passed,
            ..Self::pass(name)
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_expectation(mut self, expectation: Expectation) -> Self {
        self.expectation = Some(expectation);
        self
    }

    pub fn with_request(mut self, payload: &serde_json::Value) -> Self {
        self.request_payload = Some(payload.to_string());
        self
    }

    pub fn with_response_body(mut self, body: impl Into<String>) -> Self {
        self.response_body = Some(body.into());
        self
    }

    pub fn render(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let verdict = if self.passed { "PASSED" } else { "FAILED" };
        writeln!(
            w,
            "{}: {}{}",
            self.name,
            verdict,
            self.summary.as_deref().unwrap_or_default()
        )?;
        if self.passed {
            return Ok(());
        }
        if let Some(request) = self.request_payload.as_deref().filter(|r| !r.is_empty()) {
            writeln!(w, "  Request: {}", request)?;
        }
        if let Some(e) = &self.expectation {
            writeln!(w, "  {}: {}, Got: {}", e.label, e.expected, e.actual)?;
        }
        if let Some(body) = self.response_body.as_deref().filter(|b| !b.is_empty()) {
            writeln!(w, "  Response Body: {}", body)?;
        }
        Ok(())
    }
}

/// Every outcome of a run, in execution order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<TestOutcome>,
    /// Set when a gating check stopped the run early.
    pub aborted: Option<String>,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && self.failed() == 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }
}

/// Writes outcomes as they arrive and keeps them for the final report.
pub struct Reporter<W: Write> {
    writer: W,
    report: RunReport,
}

impl<W: Write> Reporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            report: RunReport::default(),
        }
    }

    pub fn record(&mut self, outcome: TestOutcome) -> std::io::Result<()> {
        if outcome.passed {
            tracing::info!(test = outcome.name, "Check passed");
        } else {
            tracing::warn!(test = outcome.name, "Check failed");
        }
        outcome.render(&mut self.writer)?;
        self.report.outcomes.push(outcome);
        Ok(())
    }

    pub fn abort(&mut self, reason: &str) -> std::io::Result<()> {
        tracing::error!(reason, "Aborting smoke run");
        writeln!(self.writer, "{}", reason)?;
        self.report.aborted = Some(reason.to_string());
        Ok(())
    }

    /// Print the totals line and hand back the collected report.
    pub fn finish(mut self) -> std::io::Result<RunReport> {
        writeln!(
            self.writer,
            "{} passed, {} failed",
            self.report.passed(),
            self.report.failed()
        )?;
        self.writer.flush()?;
        Ok(self.report)
    }
}
