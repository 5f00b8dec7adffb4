//! End-to-end pipeline tests: scripted model replies through planning,
//! validation, retry, execution, and verification, with skills that record
//! their invocations.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

use minispec_agentic::{
    DetectedObject, FrameSource, LlmClient, PlanningSession, SessionConfig, SessionController,
    VerificationResult, VisionService,
};
use minispec_runtime::{FnSkill, SkillRegistry, Value};

struct ScriptedLlm {
    replies: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat(&self, _system: &str, user: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(user.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| anyhow!("script exhausted"))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn provider_name(&self) -> &str {
        "test"
    }
}

struct EmptyVision;

#[async_trait]
impl VisionService for EmptyVision {
    async fn detect(&self, _image: &[u8]) -> Result<Vec<DetectedObject>> {
        Ok(Vec::new())
    }

    async fn set_classes(&self, _names: &[String]) -> Result<()> {
        Ok(())
    }
}

struct BlankFrames;

#[async_trait]
impl FrameSource for BlankFrames {
    async fn latest_frame(&self) -> Result<Vec<u8>> {
        Ok(vec![0u8; 4])
    }
}

type CallLog = Arc<Mutex<Vec<String>>>;

fn recording(abbrev: &str, name: &str, arity: usize, result: Value, log: CallLog) -> Arc<FnSkill> {
    let abbrev_owned = abbrev.to_string();
    Arc::new(FnSkill::new(abbrev, name, arity, move |args: Vec<Value>| {
        let log = Arc::clone(&log);
        let abbrev = abbrev_owned.clone();
        let result = result.clone();
        async move {
            let rendered: Vec<String> = args.iter().map(|a| a.to_string()).collect();
            log.lock().unwrap().push(format!("{}({})", abbrev, rendered.join(",")));
            Ok(result)
        }
    }))
}

fn apple_registry() -> (SkillRegistry, CallLog) {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    let mut reg = SkillRegistry::new();
    reg.register_high(recording("s", "sweep", 1, Value::Bool(true), Arc::clone(&log)))
        .unwrap();
    reg.register_high(recording("o", "orient", 1, Value::None, Arc::clone(&log)))
        .unwrap();
    reg.register_high(recording(
        "a",
        "approach",
        0,
        Value::Str("approached".to_string()),
        Arc::clone(&log),
    ))
    .unwrap();
    (reg, log)
}

fn controller(llm: Arc<dyn LlmClient>, registry: SkillRegistry) -> SessionController {
    SessionController::new(
        llm,
        Arc::new(EmptyVision),
        Arc::new(BlankFrames),
        Arc::new(registry),
    )
}

#[tokio::test]
async fn invalid_plan_is_regenerated_then_executed() {
    let llm = ScriptedLlm::new(&["8{_1=q,'x'", "_1=s,apple;?_1==True{o,apple;a}"]);
    let (registry, log) = apple_registry();
    let ctrl = controller(llm.clone(), registry);

    let mut session = PlanningSession::new("find an apple and go to it");
    let plan = ctrl.request_planning(&mut session).await.unwrap();

    // The rejected plan never reached the interpreter.
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(session.attempts.len(), 1);

    // The retry prompt carried the failed plan and its diagnostics.
    let prompts = llm.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("8{_1=q,'x'"));
    assert!(prompts[1].contains("never closed"));

    let result = ctrl.execute(&plan).await.unwrap();
    assert_eq!(result, Value::Str("approached".to_string()));
    assert_eq!(
        log.lock().unwrap().clone(),
        vec!["s(apple)", "o(apple)", "a()"]
    );
}

#[tokio::test]
async fn full_cycle_plans_executes_and_verifies() {
    let llm = ScriptedLlm::new(&["_1=s,apple;?_1==True{o,apple;a}", "True"]);
    let (registry, log) = apple_registry();
    let ctrl = controller(llm, registry);

    let outcome = ctrl.run("find an apple and go to it").await.unwrap();
    assert_eq!(outcome.plan.source, "_1=s,apple;?_1==True{o,apple;a}");
    assert_eq!(outcome.result, Value::Str("approached".to_string()));
    assert_eq!(
        outcome.verification,
        Some(VerificationResult {
            success: true,
            explanation: None
        })
    );
    assert_eq!(
        log.lock().unwrap().clone(),
        vec!["s(apple)", "o(apple)", "a()"]
    );
}

#[tokio::test]
async fn planning_gives_up_after_the_attempt_ceiling() {
    let llm = ScriptedLlm::new(&["{{", "{{"]);
    let (registry, log) = apple_registry();
    let ctrl = controller(llm.clone(), registry).with_config(SessionConfig {
        max_planning_attempts: 2,
        verify: false,
    });

    let err = ctrl.run("anything").await.unwrap_err();
    assert!(err.to_string().contains("2 attempt(s)"));
    assert!(log.lock().unwrap().is_empty());
    assert_eq!(llm.prompts.lock().unwrap().len(), 2);
}
