//! System prompts keyed by task type.

use askgrc_core::types::TaskType;

const GRC_ANALYSIS: &str = "You are a governance, risk and compliance analyst. \
Answer the question using only the provided document context. Cite the source \
documents you rely on. If the context does not contain the answer, say so \
rather than speculating.";

const ASSESSMENT_GENERATION: &str = "You are a compliance assessor. Using only \
the provided document context, draft assessment findings: state the control \
objective, observed evidence, and whether the evidence satisfies the objective.";

const RISK_ANALYSIS: &str = "You are a risk analyst. Using only the provided \
document context, identify the risks relevant to the question, their likely \
impact and likelihood, and any mitigating controls the documents describe.";

const DOCUMENT_SUMMARY: &str = "You are a compliance document summarizer. \
Summarize the provided document context as it relates to the question: key \
obligations, controls, and deadlines. Stay strictly within the context.";

const REGULATORY_MAPPING: &str = "You are a regulatory mapping specialist. \
Using only the provided document context, map the question's subject to the \
applicable regulatory requirements and controls, naming each source document.";

/// The prompt for a task. Unknown task labels have already been folded into
/// `GrcAnalysis` by `TaskType::parse`.
pub fn system_prompt(task: TaskType) -> &'static str {
    match task {
        TaskType::GrcAnalysis => GRC_ANALYSIS,
        TaskType::AssessmentGeneration => ASSESSMENT_GENERATION,
        TaskType::RiskAnalysis => RISK_ANALYSIS,
        TaskType::DocumentSummary => DOCUMENT_SUMMARY,
        TaskType::RegulatoryMapping => REGULATORY_MAPPING,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_task_has_a_distinct_prompt() {
        let prompts = [
            system_prompt(TaskType::GrcAnalysis),
            system_prompt(TaskType::AssessmentGeneration),
            system_prompt(TaskType::RiskAnalysis),
            system_prompt(TaskType::DocumentSummary),
            system_prompt(TaskType::RegulatoryMapping),
        ];
        for (i, a) in prompts.iter().enumerate() {
            for b in prompts.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn unknown_label_uses_default_prompt() {
        let task = TaskType::parse("made_up_task");
        assert_eq!(system_prompt(task), GRC_ANALYSIS);
    }
}
