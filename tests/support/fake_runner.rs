// ABOUTME: Recording fake for the process runner.
// ABOUTME: Matches invocations by command prefix and answers with canned output or failures.

use async_trait::async_trait;
use containmint::engine::{CommandRunner, Invocation, SubprocessResult};
use containmint::error::{Error, Result, SubprocessError};
use parking_lot::Mutex;

/// Canned answer for a matched invocation.
pub enum Reply {
    Stdout(String),
    Fail(i32),
}

type Handler = Box<dyn Fn(&Invocation) -> Reply + Send + Sync>;

struct Rule {
    prefix: Vec<String>,
    remaining: Option<usize>,
    handler: Handler,
}

/// Records every invocation; unmatched invocations succeed with empty output.
#[derive(Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<Invocation>>,
    rules: Mutex<Vec<Rule>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn rule(self, prefix: &[&str], remaining: Option<usize>, handler: Handler) -> Self {
        self.rules.lock().push(Rule {
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            remaining,
            handler,
        });
        self
    }

    /// Fail every invocation starting with `prefix`.
    pub fn fail(self, prefix: &[&str]) -> Self {
        self.rule(prefix, None, Box::new(|_| Reply::Fail(1)))
    }

    /// Fail only the first invocation starting with `prefix`.
    pub fn fail_once(self, prefix: &[&str]) -> Self {
        self.rule(prefix, Some(1), Box::new(|_| Reply::Fail(1)))
    }

    /// Answer invocations starting with `prefix` with `stdout`.
    pub fn stdout(self, prefix: &[&str], stdout: &str) -> Self {
        let stdout = stdout.to_string();
        self.rule(prefix, None, Box::new(move |_| Reply::Stdout(stdout.clone())))
    }

    /// Answer invocations starting with `prefix` by calling `handler`.
    pub fn on<F>(self, prefix: &[&str], handler: F) -> Self
    where
        F: Fn(&Invocation) -> Reply + Send + Sync + 'static,
    {
        self.rule(prefix, None, Box::new(handler))
    }

    /// Every invocation so far.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().clone()
    }

    /// Every command so far, joined with spaces.
    pub fn commands(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|inv| inv.command.join(" "))
            .collect()
    }

    /// Number of recorded commands starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.commands().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: Invocation) -> Result<SubprocessResult> {
        self.calls.lock().push(invocation.clone());

        let reply = {
            let mut rules = self.rules.lock();
            rules
                .iter_mut()
                .find(|rule| {
                    rule.remaining != Some(0) && invocation.command.starts_with(&rule.prefix)
                })
                .map(|rule| {
                    if let Some(remaining) = rule.remaining.as_mut() {
                        *remaining -= 1;
                    }
                    (rule.handler)(&invocation)
                })
        };

        let (stdout, status) = match reply {
            Some(Reply::Stdout(stdout)) => (stdout, 0),
            Some(Reply::Fail(status)) => (String::new(), status),
            None => (String::new(), 0),
        };

        let result = SubprocessResult {
            command: invocation.command,
            stdout,
            stderr: String::new(),
            status,
        };

        if status != 0 {
            return Err(Error::from(SubprocessError::new(result)));
        }

        Ok(result)
    }
}
