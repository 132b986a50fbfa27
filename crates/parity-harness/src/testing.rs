//! Scripted command runner for unit tests

use crate::runner::{CommandRunner, ExecutionError, ExecutionResult, Invocation};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

struct Script {
    output: String,
    code: i32,
}

/// Answers invocations by command name; unknown commands fail to launch
#[derive(Default)]
pub struct ScriptedRunner {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// `command` prints `output` and exits with status zero
    pub fn output(self, command: &str, output: &str) -> Self {
        self.exit(command, output, 0)
    }

    /// `command` prints `output` and exits with `code`
    pub fn exit(mut self, command: &str, output: &str, code: i32) -> Self {
        self.scripts.insert(
            command.to_string(),
            Script {
                output: output.to_string(),
                code,
            },
        );
        self
    }

    /// Commands run so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> ExecutionResult {
        self.calls.lock().unwrap().push(invocation.command.clone());

        match self.scripts.get(&invocation.command) {
            Some(Script { output, code: 0 }) => ExecutionResult::success(output.clone()),
            Some(Script { output, code }) => ExecutionResult::failure(
                output.clone(),
                ExecutionError::ExitStatus {
                    command: invocation.command.clone(),
                    code: Some(*code),
                },
            ),
            None => ExecutionResult::failure(
                String::new(),
                ExecutionError::Launch {
                    command: invocation.command.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                },
            ),
        }
    }
}
