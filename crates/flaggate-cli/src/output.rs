//! Human-readable report for the hook.
//!
//! Everything here is string assembly over an `io::Write`; the binary passes
//! stdout and tests pass a `Vec<u8>`. Diagnostics go through `tracing` on
//! stderr and never appear in this output.

use flaggate_core::{Classification, ErrorCode, SessionError, Suggestions, TicketRecord};
use std::io::{self, Write};

const INDENT: &str = "   ";

/// Write an indented bullet line.
fn bullet(w: &mut dyn Write, text: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{INDENT}• {}", text.as_ref())
}

/// Write a blank line followed by a section heading.
fn section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "{heading}")
}

/// Opening lines naming the hook and the tool that triggered it.
pub fn render_header(w: &mut dyn Write, tool_name: &str) -> io::Result<()> {
    section(w, "🎯 Feature Flag Detection Hook")?;
    writeln!(w, "Tool: {tool_name}")
}

/// Shown when the tool result carried no ticket.
pub fn render_no_ticket(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "❌ No ticket data found in tool result")
}

/// A non-fatal problem the run recovered from.
pub fn render_warning(w: &mut dyn Write, message: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "⚠️  Warning: {}", message.as_ref())
}

/// The single line printed when the run fails.
pub fn render_error(w: &mut dyn Write, code: ErrorCode, err: &anyhow::Error) -> io::Result<()> {
    writeln!(w, "❌ Feature flag check error [{code}]: {err:#}")?;
    if let Some(hint) = code.hint() {
        writeln!(w, "{INDENT}hint: {hint}")?;
    }
    Ok(())
}

/// Everything known about one ticket after classification.
#[derive(Debug)]
pub struct Report<'a> {
    pub ticket: &'a TicketRecord,
    pub classification: &'a Classification,
    pub suggestions: Option<&'a Suggestions>,
    pub session_error: Option<&'a SessionError>,
}

impl Report<'_> {
    /// Render the ticket, the decision, the suggestions, and the summary.
    pub fn render(&self, w: &mut dyn Write) -> io::Result<()> {
        self.render_ticket(w)?;
        self.render_decision(w)?;
        self.render_summary(w)
    }

    fn identifier(&self) -> &str {
        if self.ticket.identifier.is_empty() {
            "Unknown"
        } else {
            &self.ticket.identifier
        }
    }

    fn render_ticket(&self, w: &mut dyn Write) -> io::Result<()> {
        section(w, &format!("📋 Analyzing Ticket: {}", self.identifier()))?;
        let title = if self.ticket.title.is_empty() {
            "No title"
        } else {
            &self.ticket.title
        };
        writeln!(w, "Title: {title}")?;

        let labels = self.ticket.display_labels();
        if labels.is_empty() {
            writeln!(w, "Labels: None")
        } else {
            writeln!(w, "Labels: {}", labels.join(", "))
        }
    }

    fn render_decision(&self, w: &mut dyn Write) -> io::Result<()> {
        if self.classification.requires_flag() {
            section(w, "✅ YES - FEATURE FLAG REQUIRED")?;
            writeln!(w, "🚩 Reasons:")?;
            for reason in self.classification.reasons() {
                bullet(w, reason.to_string())?;
            }
            render_interactive_steps(w)?;
            if let Some(suggestions) = self.suggestions {
                render_suggestions(w, suggestions)?;
            }
            if let Some(err) = self.session_error {
                write!(w, "{INDENT}")?;
                render_warning(w, format!("Could not store session data: {err}"))?;
            }
            Ok(())
        } else {
            section(w, "❌ NO - No feature flag required")?;
            writeln!(w, "📝 Analysis:")?;
            for reason in self.classification.reasons() {
                bullet(w, reason.to_string())?;
            }
            section(w, "✨ You can implement this change with a standard deployment")
        }
    }

    fn render_summary(&self, w: &mut dyn Write) -> io::Result<()> {
        let requires_flag = self.classification.requires_flag();

        section(w, "📋 Summary:")?;
        bullet(w, format!("Ticket: {}", self.identifier()))?;
        if let Some(url) = self.ticket.url.as_deref().filter(|url| !url.is_empty()) {
            bullet(w, format!("URL: {url}"))?;
        }
        bullet(
            w,
            format!(
                "Feature Flag Required: {}",
                if requires_flag { "YES" } else { "NO" }
            ),
        )?;
        if requires_flag {
            bullet(w, "Next Step: Create the feature flag before writing code")
        } else {
            bullet(w, "Next Step: Proceed with standard implementation")
        }
    }
}

fn render_interactive_steps(w: &mut dyn Write) -> io::Result<()> {
    section(w, "🚀 INTERACTIVE FLAG CREATION AVAILABLE")?;
    writeln!(
        w,
        "{INDENT}Your assistant can walk you through creating this flag step by step."
    )?;
    writeln!(w)?;
    writeln!(w, "{INDENT}Next steps:")?;
    writeln!(w, "{INDENT}1. Say: 'Create the feature flag interactively'")?;
    writeln!(w, "{INDENT}2. Answer the prompts for the flag details")?;
    writeln!(w, "{INDENT}3. The flag is created in GrowthBook")?;
    writeln!(w, "{INDENT}4. The flag check is added to the code")
}

fn render_suggestions(w: &mut dyn Write, suggestions: &Suggestions) -> io::Result<()> {
    section(w, "📋 Quick Details (if you prefer manual creation):")?;
    bullet(w, format!("Suggested flag name: '{}'", suggestions.flag_name))?;
    bullet(w, format!("Suggested type: {}", suggestions.flag_type))?;
    bullet(w, format!("Rollout strategy: {}", suggestions.rollout_strategy))
}
