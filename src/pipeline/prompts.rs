//! Stage instruction prompts.
//!
//! Every prompt ends by telling the reasoner to commit to exactly one of
//! the stage's declared branches — the "always hand off" contract that
//! keeps the engine from stalling mid-run.

use crate::pipeline::stage::Stage;
use crate::types::context::ScreenContext;

/// Instructions for the reachability check.
pub const URL_CHECKER_PROMPT: &str = "\
Check whether the URL is reachable with a single GET request. \
ALWAYS take exactly one of the two branches: \
'unreachable' if the request failed or returned an error status, \
'reachable' if it succeeded.";

/// Instructions for the page inspection.
pub const PAGE_INSPECTOR_PROMPT: &str = "\
Navigate to the URL and look at the page. \
ALWAYS take exactly one of the two branches: \
'not_job_posting' if the page is not a single job description \
(search results, a careers index, an expired posting, anything else), \
'is_job_posting' if the page contains exactly one job description.";

/// Instructions for the extraction stage.
pub const EXTRACTOR_PROMPT: &str = "\
Extract the company, job title, and job description from the page. \
Summarize the requirements, responsibilities, qualifications, and the \
software and tools of the job. Do not include unrelated text such as \
equal opportunity statements or company descriptions. \
Take the 'extracted' branch with the structured result.";

/// Instructions for the screening stage.
///
/// Resume and preferences are appended per run by [`prompt_for`].
pub const SCREENER_PROMPT: &str = "\
Given the job description, the resume, and the preferences, rate the fit \
of the job between 1 and 5 with a short reason. \
Take the 'scored' branch with the score and reason.";

/// Render the prompt for a stage against the current context.
///
/// Only the screener needs per-run material (job description, resume,
/// preferences); the other stages work from the URL alone.
pub fn prompt_for(stage: Stage, ctx: &ScreenContext) -> String {
    match stage {
        Stage::UrlChecker => format!("{URL_CHECKER_PROMPT}\n\nURL: {}", ctx.url),
        Stage::PageInspector => format!("{PAGE_INSPECTOR_PROMPT}\n\nURL: {}", ctx.url),
        Stage::Extractor => format!("{EXTRACTOR_PROMPT}\n\nURL: {}", ctx.url),
        Stage::Screener => {
            let mut prompt = String::from(SCREENER_PROMPT);
            if let Some(description) = &ctx.job_description {
                prompt.push_str("\n\nJob description:\n");
                prompt.push_str(description);
            }
            if let Some(resume) = &ctx.resume {
                prompt.push_str("\n\nResume:\n");
                prompt.push_str(resume);
            }
            if let Some(preferences) = &ctx.preferences {
                prompt.push_str("\n\nPreferences:\n");
                prompt.push_str(preferences);
            }
            prompt
        }
        // Terminal stage: never invoked, the record comes from the context.
        Stage::Summarizer => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checker_prompt_includes_url() {
        let ctx = ScreenContext::new("https://example.com/job");
        let prompt = prompt_for(Stage::UrlChecker, &ctx);
        assert!(prompt.contains("https://example.com/job"));
    }

    #[test]
    fn screener_prompt_includes_run_material() {
        let mut ctx = ScreenContext::new("https://example.com/job")
            .with_resume("Ten years of Rust")
            .with_preferences("Remote only");
        ctx.job_description = Some("Build pipelines".to_string());

        let prompt = prompt_for(Stage::Screener, &ctx);
        assert!(prompt.contains("Ten years of Rust"));
        assert!(prompt.contains("Remote only"));
        assert!(prompt.contains("Build pipelines"));
    }

    #[test]
    fn screener_prompt_omits_missing_sections() {
        let ctx = ScreenContext::new("https://example.com/job");
        let prompt = prompt_for(Stage::Screener, &ctx);
        assert!(!prompt.contains("Resume:"));
        assert!(!prompt.contains("Preferences:"));
    }
}
