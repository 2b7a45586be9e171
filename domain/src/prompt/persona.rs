//! Assistant persona used by the answer policy

use serde::{Deserialize, Serialize};

/// Who the assistant speaks as, and which institution owns the documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Persona {
    /// Name the assistant introduces itself with
    pub assistant_name: String,
    /// Short role description, e.g. "a bank SME loan specialist"
    pub domain_description: String,
    /// Institution that sensitive facts are attributed to
    pub institution: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            assistant_name: "BEA".to_string(),
            domain_description: "a bank SME loan specialist".to_string(),
            institution: "BPI".to_string(),
        }
    }
}
