//! In-memory doubles for the probe and the operator.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::operator::{is_yes, Operator};
use crate::probe::{HostProbe, ProbeFailure};
use crate::types::{HostRecord, HostSet, NodeDefinition, Role};

pub fn host(address: &str) -> HostRecord {
    HostRecord::new(address, None, None)
}

pub fn hosts(addresses: &[&str]) -> HostSet {
    addresses.iter().map(|a| host(a)).collect()
}

pub fn node(name: &str, expected: &str, role: Role) -> NodeDefinition {
    NodeDefinition {
        name: name.into(),
        expected_address: expected.into(),
        role,
        containers: vec![format!("{name}-app")],
    }
}

/// Replays a fixed list of probe results, then reports malformed output.
pub struct ScriptedProbe {
    results: Mutex<VecDeque<Result<HostSet, ProbeFailure>>>,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn new(results: Vec<Result<HostSet, ProbeFailure>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostProbe for ScriptedProbe {
    async fn probe(&self, _target: &str) -> Result<HostSet, ProbeFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .lock()
            .expect("probe script lock")
            .pop_front()
            .unwrap_or_else(|| Err(ProbeFailure::MalformedOutput("script exhausted".into())))
    }
}

/// Answers prompts from a script; `None` simulates closed input.
///
/// With [`ScriptedOperator::then_wait`], running out of answers blocks
/// forever after notifying the given handle, like an operator who walked away.
#[derive(Default)]
pub struct ScriptedOperator {
    answers: VecDeque<Option<String>>,
    waiting: Option<Arc<Notify>>,
    pub shown: Vec<String>,
    pub prompts: Vec<String>,
}

impl ScriptedOperator {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|a| Some(a.to_string())).collect(),
            ..Self::default()
        }
    }

    pub fn then_eof(mut self) -> Self {
        self.answers.push_back(None);
        self
    }

    pub fn then_wait(mut self, waiting: Arc<Notify>) -> Self {
        self.waiting = Some(waiting);
        self
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    pub fn shown_text(&self) -> String {
        self.shown.join("\n")
    }

    async fn next(&mut self, prompt: &str) -> Option<String> {
        self.prompts.push(prompt.to_string());
        match (self.answers.pop_front(), &self.waiting) {
            (Some(answer), _) => answer,
            (None, Some(waiting)) => {
                waiting.notify_one();
                std::future::pending().await
            }
            (None, None) => None,
        }
    }
}

#[async_trait]
impl Operator for ScriptedOperator {
    async fn show(&mut self, text: &str) -> io::Result<()> {
        self.shown.push(text.to_string());
        Ok(())
    }

    async fn wait_for_ready(&mut self, prompt: &str) -> io::Result<()> {
        match self.next(prompt).await {
            Some(_) => Ok(()),
            None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "script closed")),
        }
    }

    async fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        let answer = self.next(prompt).await;
        Ok(is_yes(answer.as_deref()))
    }
}
