//! MiniSpec engine CLI
//!
//! Takes a natural-language task, asks the configured model for a MiniSpec
//! plan, validates it, and executes it against the registered skillset.
//! Reads tasks from stdin unless one is given with `--task`.
//!
//! The skills registered here are logging stubs so the full planning loop
//! can be exercised without hardware; a real deployment registers skills
//! backed by the robot bridge instead.
//!
//! Usage:
//!   cargo run -- --task "find an apple and go to it"
//!   cargo run -- --vision-url http://vision:8087

use anyhow::Result;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use minispec_agentic::{
    create_llm_client, HttpFrameSource, HttpVisionClient, SessionConfig, SessionController,
};
use minispec_runtime::{FnSkill, SkillRegistry, Value};

#[derive(Parser)]
#[command(name = "minispec")]
#[command(about = "Plan and execute robot tasks with model-generated MiniSpec programs")]
struct Args {
    /// Base URL of the object detection service
    #[arg(long, default_value = "http://127.0.0.1:8087")]
    vision_url: String,

    /// Base URL of the robot bridge serving camera frames
    #[arg(long, default_value = "http://127.0.0.1:8088")]
    robot_url: String,

    /// Maximum planning attempts per task
    #[arg(long, default_value = "5")]
    max_attempts: usize,

    /// Skip the post-execution verification request
    #[arg(long)]
    no_verify: bool,

    /// Run a single task and exit; without it, read tasks from stdin
    #[arg(short, long)]
    task: Option<String>,
}

fn stub_low(abbrev: &str, name: &str, arity: usize, description: &str) -> Arc<FnSkill> {
    let label = name.to_string();
    Arc::new(
        FnSkill::new(abbrev, name, arity, move |args: Vec<Value>| {
            let label = label.clone();
            async move {
                tracing::info!(skill = %label, ?args, "skill invoked");
                Ok(Value::None)
            }
        })
        .with_description(description),
    )
}

fn demo_registry() -> Result<SkillRegistry> {
    let mut reg = SkillRegistry::new();

    reg.register_low(stub_low("mf", "move_forward", 1, "move forward by [arg] cm"))?;
    reg.register_low(stub_low("mb", "move_backward", 1, "move backward by [arg] cm"))?;
    reg.register_low(stub_low("tc", "turn_cw", 1, "rotate clockwise by [arg] degrees"))?;
    reg.register_low(stub_low(
        "tu",
        "turn_ccw",
        1,
        "rotate counterclockwise by [arg] degrees",
    ))?;
    reg.register_low(stub_low("p", "take_picture", 0, "take a picture"))?;

    reg.register_high(Arc::new(
        FnSkill::new("s", "sweep", 1, |args: Vec<Value>| async move {
            tracing::info!(?args, "sweep invoked");
            Ok(Value::Bool(true))
        })
        .with_description("rotate in place until [arg] is in view; True if found"),
    ))?;
    reg.register_high(Arc::new(
        FnSkill::new("o", "orient", 1, |args: Vec<Value>| async move {
            tracing::info!(?args, "orient invoked");
            Ok(Value::None)
        })
        .with_description("center [arg] in the camera view"),
    ))?;
    reg.register_high(Arc::new(
        FnSkill::new("a", "approach", 0, |_| async {
            tracing::info!("approach invoked");
            Ok(Value::None)
        })
        .with_description("move toward the centered object until close"),
    ))?;
    reg.register_high(Arc::new(
        FnSkill::new("iv", "is_visible", 1, |args: Vec<Value>| async move {
            tracing::info!(?args, "is_visible invoked");
            Ok(Value::Bool(false))
        })
        .with_description("True if [arg] is in the current view"),
    ))?;
    reg.register_high(Arc::new(
        FnSkill::new("q", "query", 1, |args: Vec<Value>| async move {
            tracing::info!(?args, "query invoked");
            Ok(Value::Str("unknown".to_string()))
        })
        .with_description("answer [arg] about the current scene"),
    ))?;

    Ok(reg)
}

async fn run_task(controller: &SessionController, task: &str) {
    match controller.run(task).await {
        Ok(outcome) => {
            println!("plan:   {}", outcome.plan.source);
            println!("result: {}", outcome.result);
            if let Some(v) = outcome.verification {
                match v.explanation {
                    Some(why) => println!("verified: {} ({})", v.success, why),
                    None => println!("verified: {}", v.success),
                }
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "task failed");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let llm = create_llm_client()?;
    tracing::info!(
        provider = llm.provider_name(),
        model = llm.model_name(),
        "model client ready"
    );

    let controller = SessionController::new(
        llm,
        Arc::new(HttpVisionClient::new(&args.vision_url)),
        Arc::new(HttpFrameSource::new(&args.robot_url)),
        Arc::new(demo_registry()?),
    )
    .with_config(SessionConfig {
        max_planning_attempts: args.max_attempts,
        verify: !args.no_verify,
    });

    if let Some(task) = args.task {
        run_task(&controller, &task).await;
        return Ok(());
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("task> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let task = line?;
        let task = task.trim();
        if task.is_empty() || task == "quit" {
            break;
        }
        run_task(&controller, task).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use minispec_core::{parse_plan, Statement};

    fn collect_abbrevs(statements: &[Statement], out: &mut Vec<String>) {
        for statement in statements {
            match statement {
                Statement::Call(call) => out.push(call.abbrev.clone()),
                Statement::Assign { call, .. } => out.push(call.abbrev.clone()),
                Statement::Conditional { body, .. } | Statement::Loop { body, .. } => {
                    collect_abbrevs(body, out);
                }
                Statement::Return(_) => {}
            }
        }
    }

    // The static prompt examples must only call skills this binary
    // registers, or a model imitating them emits plans that die at
    // dispatch.
    #[test]
    fn test_prompt_examples_only_use_registered_skills() {
        let reg = demo_registry().unwrap();
        let examples = include_str!("../crates/minispec-agentic/src/prompts/plan_examples.md");
        for line in examples.lines() {
            if let Some(src) = line.strip_prefix("Plan: ") {
                let plan = parse_plan(src).unwrap();
                let mut abbrevs = Vec::new();
                collect_abbrevs(&plan.statements, &mut abbrevs);
                for abbrev in abbrevs {
                    assert!(
                        reg.resolve(&abbrev).is_ok(),
                        "example plan '{}' calls unregistered skill '{}'",
                        src,
                        abbrev
                    );
                }
            }
        }
    }
}
