//! Session controller
//!
//! Drives one task's generate → validate → (retry on failure) → execute →
//! verify cycle. The controller is the only place the engine talks to the
//! model: planning requests, correction requests after syntax failures,
//! verification judgments, and open-ended scene queries all flow through
//! here.
//!
//! Only *syntax* failures are retried, and each retry carries the failed
//! plan text plus its diagnostics so the model sees what was wrong, not
//! just that something was. Execution errors and external-call failures
//! propagate to the caller untouched.
//!
//! Sessions are independent: each owns its task, retry history, and (during
//! execution) variable store. The skill registry is shared read-only
//! configuration, so any number of sessions can run concurrently against
//! one registry.

use anyhow::anyhow;
use std::sync::Arc;
use thiserror::Error;

use minispec_core::{check_syntax, parse_plan, Diagnostic, Plan};
use minispec_runtime::{interpreter, ExecError, SkillRegistry, SkillTier, Value};

use crate::llm_client::LlmClient;
use crate::prompt;
use crate::response::{
    coerce_query_reply, parse_verification, strip_code_blocks, QueryAnswer, VerificationResult,
};
use crate::scene::SceneDescription;
use crate::vision::{FrameSource, VisionService};

/// Tunables for one controller.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum planning attempts (first try included) before the session
    /// fails. The baseline protocol is unbounded; a ceiling is an
    /// operational necessity against a paid model API.
    pub max_planning_attempts: usize,
    /// Ask the model to verify task completion after execution.
    pub verify: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_planning_attempts: 5,
            verify: true,
        }
    }
}

/// One failed planning attempt: what the model wrote, and why it was
/// rejected.
#[derive(Debug, Clone)]
pub struct PlanningAttempt {
    pub plan_text: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// One task's planning lifecycle, including retry history.
#[derive(Debug, Default)]
pub struct PlanningSession {
    pub task: String,
    pub attempts: Vec<PlanningAttempt>,
}

impl PlanningSession {
    pub fn new(task: &str) -> Self {
        Self {
            task: task.to_string(),
            attempts: Vec::new(),
        }
    }
}

/// Session-level failures.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("model request failed: {0}")]
    Llm(#[source] anyhow::Error),

    #[error("perception request failed: {0}")]
    Vision(#[source] anyhow::Error),

    #[error("no syntactically valid plan after {attempts} attempt(s)")]
    RetriesExhausted {
        attempts: usize,
        history: Vec<PlanningAttempt>,
    },

    #[error("malformed model response: {0}")]
    Response(#[source] anyhow::Error),

    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Result of one full task cycle.
#[derive(Debug)]
pub struct TaskOutcome {
    pub plan: Plan,
    pub result: Value,
    pub verification: Option<VerificationResult>,
}

/// Orchestrates planning, execution, and verification for tasks.
pub struct SessionController {
    llm: Arc<dyn LlmClient>,
    vision: Arc<dyn VisionService>,
    frames: Arc<dyn FrameSource>,
    registry: Arc<SkillRegistry>,
    config: SessionConfig,
}

impl SessionController {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        vision: Arc<dyn VisionService>,
        frames: Arc<dyn FrameSource>,
        registry: Arc<SkillRegistry>,
    ) -> Self {
        Self {
            llm,
            vision,
            frames,
            registry,
            config: SessionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Fetch a fresh scene snapshot from the perception collaborator.
    pub async fn snapshot_scene(&self) -> Result<SceneDescription, SessionError> {
        let frame = self
            .frames
            .latest_frame()
            .await
            .map_err(SessionError::Vision)?;
        let objects = self
            .vision
            .detect(&frame)
            .await
            .map_err(SessionError::Vision)?;
        Ok(SceneDescription::new(objects))
    }

    /// Request a plan for the task, regenerating on syntax diagnostics.
    ///
    /// Failed attempts accumulate in `session.attempts`; each retry prompt
    /// embeds the most recent failed plan and its diagnostics.
    pub async fn request_planning(
        &self,
        session: &mut PlanningSession,
    ) -> Result<Plan, SessionError> {
        let task = normalize_task(&session.task);
        let system = prompt::planning_system_prompt(
            &self.registry.describe(SkillTier::High),
            &self.registry.describe(SkillTier::Low),
        );

        loop {
            let scene = self.snapshot_scene().await?;
            let user = match session.attempts.last() {
                None => prompt::planning_user_prompt(&scene.obj_list(), &task),
                Some(failed) => prompt::correction_user_prompt(
                    &scene.obj_list(),
                    &task,
                    &failed.plan_text,
                    &failed.diagnostics,
                ),
            };

            tracing::info!(
                task = %task,
                attempt = session.attempts.len() + 1,
                model = self.llm.model_name(),
                "requesting plan"
            );
            let reply = self
                .llm
                .chat(&system, &user)
                .await
                .map_err(SessionError::Llm)?;
            let plan_text = strip_code_blocks(&reply);

            let diagnostics = check_syntax(&plan_text);
            if diagnostics.is_empty() {
                // check_syntax passed, so this parse cannot fail; guard
                // anyway rather than unwrap.
                let plan = parse_plan(&plan_text)
                    .map_err(|e| SessionError::Response(anyhow!(e)))?;
                tracing::info!(statements = plan.statements.len(), "plan accepted");
                return Ok(plan);
            }

            tracing::warn!(
                errors = diagnostics.len(),
                plan = %plan_text,
                "plan rejected by validator"
            );
            session.attempts.push(PlanningAttempt {
                plan_text,
                diagnostics,
            });

            if session.attempts.len() >= self.config.max_planning_attempts {
                return Err(SessionError::RetriesExhausted {
                    attempts: session.attempts.len(),
                    history: std::mem::take(&mut session.attempts),
                });
            }
        }
    }

    /// Execute a validated plan with a fresh variable store.
    pub async fn execute(&self, plan: &Plan) -> Result<Value, SessionError> {
        Ok(interpreter::execute(plan, &self.registry).await?)
    }

    /// Ask the model whether the completed action satisfied the task.
    pub async fn request_verification(
        &self,
        task_description: &str,
        response: &str,
    ) -> Result<VerificationResult, SessionError> {
        let scene = self.snapshot_scene().await?;
        let system = prompt::verification_system_prompt();
        let user =
            prompt::verification_user_prompt(&scene.obj_list(), task_description, response);
        tracing::info!(task = %task_description, "requesting verification");
        let reply = self
            .llm
            .chat(&system, &user)
            .await
            .map_err(SessionError::Llm)?;
        parse_verification(&reply).map_err(SessionError::Response)
    }

    /// Resolve an open-ended question against the current scene.
    ///
    /// A reply of exactly "true"/"false" (case-insensitive) becomes a
    /// boolean; anything else is kept as the raw string.
    pub async fn request_execution(
        &self,
        question: &str,
    ) -> Result<QueryAnswer, SessionError> {
        let scene = self.snapshot_scene().await?;
        let system = prompt::execution_system_prompt();
        let user = prompt::execution_user_prompt(&scene.obj_list(), question);
        tracing::info!(question = %question, "requesting execution query");
        let reply = self
            .llm
            .chat(&system, &user)
            .await
            .map_err(SessionError::Llm)?;
        Ok(coerce_query_reply(&reply))
    }

    /// Full cycle for one task: plan (with retries), execute, verify.
    pub async fn run(&self, task_description: &str) -> Result<TaskOutcome, SessionError> {
        let mut session = PlanningSession::new(task_description);
        let plan = self.request_planning(&mut session).await?;
        let result = self.execute(&plan).await?;

        let verification = if self.config.verify {
            Some(
                self.request_verification(task_description, &result.to_string())
                    .await?,
            )
        } else {
            None
        };

        Ok(TaskOutcome {
            plan,
            result,
            verification,
        })
    }
}

/// Bare task descriptions default to actions; `[A]`/`[Q]` prefixes pass
/// through untouched.
fn normalize_task(task: &str) -> String {
    if task.starts_with('[') {
        task.to_string()
    } else {
        format!("[A] {}", task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use minispec_runtime::FnSkill;
    use std::sync::Mutex;

    /// LLM stub replaying scripted replies and recording prompts.
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
        async fn detect(&self, _image: &[u8]) -> Result<Vec<crate::vision::DetectedObject>> {
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

    fn controller(llm: Arc<dyn LlmClient>, registry: SkillRegistry) -> SessionController {
        SessionController::new(
            llm,
            Arc::new(EmptyVision),
            Arc::new(BlankFrames),
            Arc::new(registry),
        )
    }

    fn noop_registry() -> SkillRegistry {
        let mut reg = SkillRegistry::new();
        reg.register_low(Arc::new(FnSkill::new("tc", "turn_cw", 1, |_| async {
            Ok(Value::None)
        })))
        .unwrap();
        reg
    }

    #[tokio::test]
    async fn test_invalid_plan_is_retried_with_feedback() {
        let llm = ScriptedLlm::new(&["8{_1=q,'x'", "tc,90"]);
        let ctrl = controller(llm.clone(), noop_registry());

        let mut session = PlanningSession::new("spin around");
        let plan = ctrl.request_planning(&mut session).await.unwrap();
        assert_eq!(plan.source, "tc,90");

        // One failed attempt recorded, and the retry prompt carried both
        // the failed text and its diagnostics.
        assert_eq!(session.attempts.len(), 1);
        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("8{_1=q,'x'"));
        assert!(prompts[1].contains("never closed"));
    }

    #[tokio::test]
    async fn test_invalid_plan_is_never_executed() {
        let llm = ScriptedLlm::new(&["tc,90}"]);
        let ctrl = controller(llm, noop_registry()).with_config(SessionConfig {
            max_planning_attempts: 1,
            verify: false,
        });

        let mut session = PlanningSession::new("spin");
        let err = ctrl.request_planning(&mut session).await.unwrap_err();
        match err {
            SessionError::RetriesExhausted { attempts, history } => {
                assert_eq!(attempts, 1);
                assert_eq!(history[0].plan_text, "tc,90}");
                assert!(!history[0].diagnostics.is_empty());
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retry_ceiling_counts_attempts() {
        let llm = ScriptedLlm::new(&["{{", "{{", "{{", "{{", "{{"]);
        let ctrl = controller(llm.clone(), noop_registry());

        let mut session = PlanningSession::new("anything");
        let err = ctrl.request_planning(&mut session).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::RetriesExhausted { attempts: 5, .. }
        ));
        assert_eq!(llm.prompts.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_code_fences_are_stripped() {
        let llm = ScriptedLlm::new(&["```\ntc,90\n```"]);
        let ctrl = controller(llm, noop_registry());
        let mut session = PlanningSession::new("spin");
        let plan = ctrl.request_planning(&mut session).await.unwrap();
        assert_eq!(plan.source, "tc,90");
        assert!(session.attempts.is_empty());
    }

    #[tokio::test]
    async fn test_run_executes_and_verifies() {
        let llm = ScriptedLlm::new(&["tc,90", "True"]);
        let ctrl = controller(llm, noop_registry());
        let outcome = ctrl.run("spin around").await.unwrap();
        assert_eq!(outcome.result, Value::None);
        assert_eq!(
            outcome.verification,
            Some(VerificationResult {
                success: true,
                explanation: None
            })
        );
    }

    #[tokio::test]
    async fn test_request_execution_coercion() {
        for (reply, expected) in [
            ("True", QueryAnswer::Bool(true)),
            ("false", QueryAnswer::Bool(false)),
            ("TRUE", QueryAnswer::Bool(true)),
            ("maybe", QueryAnswer::Text("maybe".to_string())),
        ] {
            let llm = ScriptedLlm::new(&[reply]);
            let ctrl = controller(llm, noop_registry());
            assert_eq!(ctrl.request_execution("is it red?").await.unwrap(), expected);
        }
    }

    #[test]
    fn test_task_normalization() {
        assert_eq!(normalize_task("find an apple"), "[A] find an apple");
        assert_eq!(normalize_task("[Q] what do you see"), "[Q] what do you see");
    }
}
