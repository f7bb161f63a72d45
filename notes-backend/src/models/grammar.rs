use serde::{Deserialize, Serialize};

/// Replacement suggestions kept per issue
pub const MAX_REPLACEMENTS: usize = 5;

/// A single flagged span of checked text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarIssue {
    pub message: String,
    /// Zero-based position into the checked text
    pub offset: usize,
    pub length: usize,
    #[serde(default)]
    pub replacements: Vec<String>,
    pub rule_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrammarCheckRequest {
    pub text: String,
}
