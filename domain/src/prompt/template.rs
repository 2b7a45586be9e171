//! Prompt templates for the query pipeline

use super::persona::Persona;
use crate::retrieval::passage::RetrievedPassage;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for rewriting a follow-up into a standalone question
    pub fn contextualize_system() -> &'static str {
        r#"Reformulate the latest question to be standalone, considering the chat history context.
Do NOT answer the question.
Return the question as is if it is already standalone."#
    }

    /// System prompt for the grounded answer, with the retrieved context appended
    pub fn answer_system(persona: &Persona, context: &str) -> String {
        format!(
            r#"You are {name}, {role}.
Answer using the provided context only. Do not use any other knowledge.
If the context does not contain the answer, say "I don't know".
Answer in a professional and detailed manner.
Prefix sensitive or institution-specific information with "According to {institution}".
Capitalize abbreviations.

Context:
{context}"#,
            name = persona.assistant_name,
            role = persona.domain_description,
            institution = persona.institution,
            context = context,
        )
    }

    /// Join passage texts into the single context block, in retrieval order
    pub fn format_context(passages: &[RetrievedPassage]) -> String {
        passages
            .iter()
            .map(|p| p.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_system_embeds_policy_and_context() {
        let persona = Persona::default();
        let prompt = PromptTemplate::answer_system(&persona, "Tenor is up to 5 years.");

        assert!(prompt.starts_with("You are BEA, a bank SME loan specialist."));
        assert!(prompt.contains("I don't know"));
        assert!(prompt.contains("According to BPI"));
        assert!(prompt.contains("Capitalize abbreviations"));
        assert!(prompt.ends_with("Tenor is up to 5 years."));
    }

    #[test]
    fn test_answer_system_custom_institution() {
        let persona = Persona {
            assistant_name: "Ada".to_string(),
            domain_description: "a mortgage advisor".to_string(),
            institution: "Acme Bank".to_string(),
        };
        let prompt = PromptTemplate::answer_system(&persona, "");
        assert!(prompt.contains("According to Acme Bank"));
    }

    #[test]
    fn test_format_context_preserves_order_and_skips_blank() {
        let passages = vec![
            RetrievedPassage::new("first ", 0.9),
            RetrievedPassage::new("   ", 0.8),
            RetrievedPassage::new("second", 0.7),
        ];
        assert_eq!(PromptTemplate::format_context(&passages), "first\n\nsecond");
    }

    #[test]
    fn test_format_context_empty() {
        assert_eq!(PromptTemplate::format_context(&[]), "");
    }

    #[test]
    fn test_contextualize_system_forbids_answering() {
        assert!(PromptTemplate::contextualize_system().contains("standalone"));
        assert!(PromptTemplate::contextualize_system().contains("Do NOT answer"));
    }
}
