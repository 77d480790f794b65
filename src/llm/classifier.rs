//! Error classification: failure category, retry verdict, and the
//! contract-violation heuristic for error text disguised as a response.
//!
//! Classification is pure and stateless; the executor consults it after every
//! adapter call. The single most safety-critical rule lives here: a terminal
//! (content/policy) rejection is never retryable, so a caller can never shop
//! a blocked request across backends.

use crate::llm::attempt::ErrorCategory;
use crate::llm::types::GenerateError;
use regex::Regex;
use std::sync::LazyLock;

/// Verdict produced for one failed (or suspicious) attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: ErrorCategory,
    /// Finer-grained code recorded on the attempt, e.g. `"429"` or
    /// `"contract_violation"`.
    pub error_code: Option<String>,
    pub should_retry: bool,
    /// True when the failure code indicates rate limiting; the executor
    /// applies the bounded inter-attempt delay before the next backend.
    pub rate_limited: bool,
}

/// Classify a typed adapter failure.
pub fn classify_failure(error: &GenerateError) -> Classification {
    match error {
        GenerateError::Terminal(_) => Classification {
            category: ErrorCategory::TerminalError,
            error_code: None,
            should_retry: false,
            rate_limited: false,
        },
        GenerateError::Timeout(_) => Classification {
            category: ErrorCategory::Timeout,
            error_code: None,
            should_retry: true,
            rate_limited: false,
        },
        GenerateError::Provider { code, .. } => Classification {
            category: ErrorCategory::ProviderError,
            error_code: Some(code.clone()),
            should_retry: true,
            rate_limited: is_rate_limit_code(code),
        },
    }
}

/// Classify an adapter panic. Treated as an infrastructure fault, not a
/// content fault.
pub fn classify_panic() -> Classification {
    Classification {
        category: ErrorCategory::Exception,
        error_code: Some("panic".to_string()),
        should_retry: true,
        rate_limited: false,
    }
}

fn is_rate_limit_code(code: &str) -> bool {
    let code = code.to_ascii_lowercase();
    code == "429" || code.contains("rate_limit") || code.contains("quota")
}

/// Literal prefixes that mark a returned string as error boilerplate rather
/// than a model response. Matched case-sensitively at the very start of the
/// trimmed text; kept deliberately short so ordinary responses that *mention*
/// errors are untouched.
const ERROR_PREFIXES: &[&str] = &[
    "Error:",
    "ERROR:",
    "error:",
    "[ERROR]",
    "Exception:",
    "Traceback (most recent call last)",
    "{\"error\"",
];

// Word-boundary matching matters here: "sorry" must not fire on words that
// merely contain it, and "exception" must be a standalone technical term.
static APOLOGY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(sorry|apologies|apologi[sz]e)\b").unwrap());
static TECHNICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(exception|traceback|stack trace|internal error|error code)\b").unwrap()
});

/// Inspect successful-looking response text for disguised errors.
///
/// Returns `Some(classification)` with `error_code = "contract_violation"`
/// when the text is error boilerplate: either it starts with one of a small
/// set of literal prefixes, or an apology phrase co-occurs with a
/// technical-error keyword. Ordinary conversational refusals ("Sorry, I
/// can't help with that") are not violations and return `None`.
pub fn inspect_response_text(text: &str) -> Option<Classification> {
    let trimmed = text.trim_start();
    let boilerplate = ERROR_PREFIXES.iter().any(|p| trimmed.starts_with(p))
        || (APOLOGY.is_match(text) && TECHNICAL.is_match(text));

    if boilerplate {
        Some(Classification {
            category: ErrorCategory::ProviderError,
            error_code: Some("contract_violation".to_string()),
            should_retry: true,
            rate_limited: false,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn terminal_failure_is_never_retryable() {
        let class = classify_failure(&GenerateError::Terminal("policy block".into()));
        assert_eq!(class.category, ErrorCategory::TerminalError);
        assert!(!class.should_retry);
        assert!(!class.rate_limited);
    }

    #[test]
    fn timeout_is_retryable() {
        let class = classify_failure(&GenerateError::Timeout(Duration::from_secs(30)));
        assert_eq!(class.category, ErrorCategory::Timeout);
        assert!(class.should_retry);
    }

    #[test]
    fn provider_failure_carries_code_and_rate_limit_flag() {
        let class = classify_failure(&GenerateError::provider("429", "too many requests"));
        assert_eq!(class.category, ErrorCategory::ProviderError);
        assert_eq!(class.error_code.as_deref(), Some("429"));
        assert!(class.should_retry);
        assert!(class.rate_limited);

        let class = classify_failure(&GenerateError::provider("503", "upstream down"));
        assert!(!class.rate_limited);

        let class = classify_failure(&GenerateError::provider("quota_exceeded", "monthly cap"));
        assert!(class.rate_limited);
    }

    #[test]
    fn panic_classifies_as_exception() {
        let class = classify_panic();
        assert_eq!(class.category, ErrorCategory::Exception);
        assert!(class.should_retry);
        assert_eq!(class.error_code.as_deref(), Some("panic"));
    }

    #[test]
    fn error_prefix_is_a_contract_violation() {
        for text in [
            "Error: quota exceeded",
            "ERROR: upstream returned 502",
            "[ERROR] connection reset",
            "Exception: null pointer",
            "Traceback (most recent call last):\n  File \"api.py\"",
            "{\"error\": {\"type\": \"server_error\"}}",
        ] {
            let class = inspect_response_text(text).expect(text);
            assert_eq!(class.category, ErrorCategory::ProviderError);
            assert_eq!(class.error_code.as_deref(), Some("contract_violation"));
            assert!(class.should_retry);
        }
    }

    #[test]
    fn apology_with_technical_keyword_is_a_violation() {
        assert!(
            inspect_response_text("I'm sorry, an exception occurred while processing.").is_some()
        );
        assert!(
            inspect_response_text("We apologize, the server hit an internal error.").is_some()
        );
    }

    #[test]
    fn conversational_refusal_is_not_a_violation() {
        assert!(inspect_response_text("Sorry, I can't help with that.").is_none());
        assert!(inspect_response_text("I'm sorry, but that request is outside my scope.").is_none());
    }

    #[test]
    fn ordinary_text_mentioning_errors_is_not_a_violation() {
        assert!(inspect_response_text("Here is how to handle an error in Rust: use Result.").is_none());
        // "exception" without an apology is a legitimate technical answer.
        assert!(inspect_response_text("An exception in Python is raised with `raise`.").is_none());
    }

    #[test]
    fn apology_substring_inside_a_word_does_not_fire() {
        // No word-boundary apology match, despite technical keyword.
        assert!(inspect_response_text("The sorrytech exception handler works like this.").is_none());
    }
}
