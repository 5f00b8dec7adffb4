//! Two-tier skill registry
//!
//! Skills come in two tiers: high-level composites (sweep for an object,
//! orient toward a target, open-ended query) that may ground natural-language
//! arguments against a fresh scene, and low-level primitives (turn, move,
//! take picture) that map directly onto the robot. An abbreviation must
//! resolve in exactly one tier — resolving in both or neither is a
//! configuration defect, never an ambiguity the interpreter guesses at.
//!
//! The registry is read-mostly shared configuration: build it once, wrap it
//! in an `Arc`, and let concurrent sessions resolve against it.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::ExecError;
use crate::value::Value;

/// Which tier an abbreviation resolved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillTier {
    High,
    Low,
}

impl fmt::Display for SkillTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillTier::High => f.write_str("high"),
            SkillTier::Low => f.write_str("low"),
        }
    }
}

/// A dispatchable capability with a fixed arity.
///
/// Skill bodies are host concerns (motor control, camera, sub-queries);
/// the runtime only specifies how they are looked up and called.
#[async_trait]
pub trait Skill: Send + Sync {
    /// The abbreviation plans call this skill by, e.g. `s` or `mf`.
    fn abbrev(&self) -> &str;

    /// Human-readable name for prompts and logs, e.g. `sweep`.
    fn name(&self) -> &str;

    /// Exact number of arguments every call must supply.
    fn arity(&self) -> usize;

    /// One-line description for the planning prompt.
    fn description(&self) -> &str {
        ""
    }

    async fn invoke(&self, args: Vec<Value>) -> Result<Value>;
}

type SkillFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// Adapter wrapping an async closure as a [`Skill`].
pub struct FnSkill {
    abbrev: String,
    name: String,
    description: String,
    arity: usize,
    body: Box<dyn Fn(Vec<Value>) -> SkillFuture + Send + Sync>,
}

impl FnSkill {
    pub fn new<F, Fut>(abbrev: &str, name: &str, arity: usize, body: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            abbrev: abbrev.to_string(),
            name: name.to_string(),
            description: String::new(),
            arity,
            body: Box::new(move |args| Box::pin(body(args))),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

#[async_trait]
impl Skill for FnSkill {
    fn abbrev(&self) -> &str {
        &self.abbrev
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, args: Vec<Value>) -> Result<Value> {
        (self.body)(args).await
    }
}

/// Two disjoint abbreviation → skill mappings.
#[derive(Default)]
pub struct SkillRegistry {
    high: HashMap<String, Arc<dyn Skill>>,
    low: HashMap<String, Arc<dyn Skill>>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_high(&mut self, skill: Arc<dyn Skill>) -> Result<(), ExecError> {
        self.register(SkillTier::High, skill)
    }

    pub fn register_low(&mut self, skill: Arc<dyn Skill>) -> Result<(), ExecError> {
        self.register(SkillTier::Low, skill)
    }

    fn register(&mut self, tier: SkillTier, skill: Arc<dyn Skill>) -> Result<(), ExecError> {
        let abbrev = skill.abbrev().to_string();
        if self.high.contains_key(&abbrev) || self.low.contains_key(&abbrev) {
            return Err(ExecError::DuplicateSkill { abbrev });
        }
        match tier {
            SkillTier::High => self.high.insert(abbrev, skill),
            SkillTier::Low => self.low.insert(abbrev, skill),
        };
        Ok(())
    }

    /// Resolve an abbreviation, high tier first.
    ///
    /// Registration keeps the tiers disjoint, so the fixed query order can
    /// never mask a low-tier skill.
    pub fn resolve(&self, abbrev: &str) -> Result<(SkillTier, Arc<dyn Skill>), ExecError> {
        if let Some(skill) = self.high.get(abbrev) {
            return Ok((SkillTier::High, Arc::clone(skill)));
        }
        if let Some(skill) = self.low.get(abbrev) {
            return Ok((SkillTier::Low, Arc::clone(skill)));
        }
        Err(ExecError::UnknownSkill {
            abbrev: abbrev.to_string(),
        })
    }

    /// Arity of a registered skill, for call-time argument validation.
    pub fn arity(&self, abbrev: &str) -> Result<usize, ExecError> {
        self.resolve(abbrev).map(|(_, skill)| skill.arity())
    }

    /// Render one tier as prompt-ready skill documentation.
    pub fn describe(&self, tier: SkillTier) -> String {
        let map = match tier {
            SkillTier::High => &self.high,
            SkillTier::Low => &self.low,
        };
        let mut lines: Vec<String> = map
            .values()
            .map(|s| {
                let doc = if s.description().is_empty() {
                    String::new()
                } else {
                    format!(": {}", s.description())
                };
                format!("- {} ({}, {} arg(s)){}", s.abbrev(), s.name(), s.arity(), doc)
            })
            .collect();
        lines.sort();
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(abbrev: &str, name: &str, arity: usize) -> Arc<dyn Skill> {
        Arc::new(FnSkill::new(abbrev, name, arity, |_| async {
            Ok(Value::None)
        }))
    }

    #[test]
    fn test_resolve_by_tier() {
        let mut reg = SkillRegistry::new();
        reg.register_high(noop("s", "sweep", 1)).unwrap();
        reg.register_low(noop("mf", "move_forward", 1)).unwrap();

        let (tier, skill) = reg.resolve("s").unwrap();
        assert_eq!(tier, SkillTier::High);
        assert_eq!(skill.name(), "sweep");

        let (tier, _) = reg.resolve("mf").unwrap();
        assert_eq!(tier, SkillTier::Low);
    }

    #[test]
    fn test_unknown_abbreviation_errors() {
        let reg = SkillRegistry::new();
        assert!(matches!(
            reg.resolve("zz"),
            Err(ExecError::UnknownSkill { .. })
        ));
    }

    #[test]
    fn test_tiers_stay_disjoint() {
        let mut reg = SkillRegistry::new();
        reg.register_high(noop("s", "sweep", 1)).unwrap();
        let err = reg.register_low(noop("s", "shadow", 0)).unwrap_err();
        assert!(matches!(err, ExecError::DuplicateSkill { abbrev } if abbrev == "s"));
    }

    #[test]
    fn test_arity_lookup() {
        let mut reg = SkillRegistry::new();
        reg.register_low(noop("tc", "turn_cw", 1)).unwrap();
        assert_eq!(reg.arity("tc").unwrap(), 1);
        assert!(reg.arity("zz").is_err());
    }

    #[test]
    fn test_describe_lists_skills() {
        let mut reg = SkillRegistry::new();
        reg.register_high(
            Arc::new(
                FnSkill::new("s", "sweep", 1, |_| async { Ok(Value::Bool(false)) })
                    .with_description("rotate to find an object by name"),
            ),
        )
        .unwrap();
        let doc = reg.describe(SkillTier::High);
        assert!(doc.contains("- s (sweep, 1 arg(s)): rotate to find an object by name"));
    }

    #[tokio::test]
    async fn test_fn_skill_invokes_closure() {
        let skill = FnSkill::new("e", "echo", 1, |mut args: Vec<Value>| async move {
            Ok(args.remove(0))
        });
        let out = skill.invoke(vec![Value::Str("hi".into())]).await.unwrap();
        assert_eq!(out, Value::Str("hi".into()));
    }
}
