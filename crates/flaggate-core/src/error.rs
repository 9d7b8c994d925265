use std::fmt;

/// Machine-readable error codes for hook failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidHookInput,
    RulesFileUnreadable,
    RulesParseError,
    InvalidPattern,
    MalformedTicket,
    SessionWriteFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidHookInput => "E1001",
            Self::RulesFileUnreadable => "E1002",
            Self::RulesParseError => "E1003",
            Self::InvalidPattern => "E1004",
            Self::MalformedTicket => "E2001",
            Self::SessionWriteFailed => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidHookInput => "Hook input is not valid JSON",
            Self::RulesFileUnreadable => "Rules file could not be read",
            Self::RulesParseError => "Rules file parse error",
            Self::InvalidPattern => "Invalid experimental pattern",
            Self::MalformedTicket => "Malformed ticket record",
            Self::SessionWriteFailed => "Session snapshot write failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint surfaced next to the error line.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidHookInput => {
                Some("Pipe a JSON document with `tool` and `result` keys on stdin.")
            }
            Self::RulesFileUnreadable => Some("Check the path and permissions of the rules file."),
            Self::RulesParseError => Some("Fix syntax in .flaggate/rules.toml and retry."),
            Self::InvalidPattern => Some("Use regular expression syntax supported by `regex`."),
            Self::MalformedTicket => Some("The `result` value must be a JSON object."),
            Self::SessionWriteFailed => Some("Check free space and write permissions on the temp directory."),
            Self::InternalUnexpected => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::InvalidHookInput,
            ErrorCode::RulesFileUnreadable,
            ErrorCode::RulesParseError,
            ErrorCode::InvalidPattern,
            ErrorCode::MalformedTicket,
            ErrorCode::SessionWriteFailed,
            ErrorCode::InternalUnexpected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::MalformedTicket.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }
}
