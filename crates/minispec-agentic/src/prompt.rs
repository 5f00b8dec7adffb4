//! Prompt assembly
//!
//! Static planning context (syntax reference, rules, worked examples) ships
//! with the crate and goes into the system prompt; everything per-request
//! (task, scene, correction feedback) goes into the user prompt.

use minispec_core::Diagnostic;

/// System prompt for plan generation.
pub fn planning_system_prompt(high_level_skills: &str, low_level_skills: &str) -> String {
    let syntax = include_str!("prompts/minispec_syntax.md");
    let rules = include_str!("prompts/rules.md");
    let examples = include_str!("prompts/plan_examples.md");

    format!(
        r#"# MiniSpec Plan Generation

You are a robot task planner. Given a task description and the current scene,
generate a MiniSpec program that accomplishes the task using the skills below.

## MiniSpec Syntax

{syntax}

## High-level skills

{high_level_skills}

## Low-level skills

{low_level_skills}

## Rules

{rules}

## Examples

{examples}
"#
    )
}

/// User prompt for a first planning attempt.
pub fn planning_user_prompt(scene_description: &str, task_description: &str) -> String {
    format!(
        "## Current scene\n{}\n\n## Task\n{}\n\nGenerate the MiniSpec plan now.",
        scene_description, task_description
    )
}

/// User prompt for a retry after syntax diagnostics.
///
/// Shows the model exactly what it wrote and what was wrong with it.
pub fn correction_user_prompt(
    scene_description: &str,
    task_description: &str,
    failed_plan: &str,
    diagnostics: &[Diagnostic],
) -> String {
    let errors = diagnostics
        .iter()
        .map(|d| format!("- {}", d))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Your previous plan has syntax errors. Fix them and return ONLY the corrected plan.

## Errors
{}

## Previous plan
{}

## Current scene
{}

## Task
{}

Generate the corrected MiniSpec plan now."#,
        errors, failed_plan, scene_description, task_description
    )
}

/// System prompt for task verification.
pub fn verification_system_prompt() -> String {
    r#"You judge whether a robot's completed action satisfied its task.
Given the task, the action result, and the current scene, reply with either
the single word True or False, or a JSON object
{"success": true|false, "explanation": "..."} when an explanation helps.
No other text."#
        .to_string()
}

/// User prompt for task verification.
pub fn verification_user_prompt(
    scene_description: &str,
    task_description: &str,
    response: &str,
) -> String {
    format!(
        "## Task\n{}\n\n## Action result\n{}\n\n## Current scene\n{}\n\nDid the action satisfy the task?",
        task_description, response, scene_description
    )
}

/// System prompt for open-ended execution queries.
pub fn execution_system_prompt() -> String {
    r#"You answer questions about a robot's current scene. If the question
has a yes/no answer, reply with exactly true or false. Otherwise reply with
the shortest accurate answer, no other text."#
        .to_string()
}

/// User prompt for open-ended execution queries.
pub fn execution_user_prompt(scene_description: &str, question: &str) -> String {
    format!(
        "## Current scene\n{}\n\n## Question\n{}",
        scene_description, question
    )
}
