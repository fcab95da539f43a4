//! Operator confirmation tool.
//!
//! `confirm_action` is the one tool that waits on a human. The answer comes
//! from a [`ConfirmationSource`], so the terminal can be swapped for a
//! scripted source in tests or automation.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{ParamKind, ParamSpec, Tool};

/// Payload returned when the operator agrees.
pub const CONFIRMED: &str = "User confirmed, continue";

/// Payload returned for any other answer, including no answer at all.
pub const DECLINED: &str = "User cancelled the operation";

const CONFIRM_ACTION_PARAMS: &[ParamSpec] = &[ParamSpec::required(
    "prompt",
    ParamKind::String,
    "Confirmation message shown to the user",
)];

/// Where confirmation answers come from.
#[async_trait]
pub trait ConfirmationSource: Send + Sync {
    /// Show `prompt` and wait for one line of input.
    ///
    /// Returns `None` when no answer can be obtained (end of input, read
    /// error); callers treat that as a refusal.
    async fn ask(&self, prompt: &str) -> Option<String>;
}

/// Shows prompts on a writer and reads one line per answer from a reader.
///
/// Reads run on a blocking thread, so other tool calls in the same batch keep
/// making progress while a prompt is open. Prompts are shown one at a time.
pub struct LineConfirmation<R, W> {
    io: Arc<Mutex<(R, W)>>,
}

/// The interactive source: prompts on stdout, answers from stdin.
pub type StdinConfirmation = LineConfirmation<BufReader<Stdin>, Stdout>;

impl StdinConfirmation {
    pub fn new() -> Self {
        // One-byte buffer: never read past the answer line, the rest of stdin
        // belongs to the commands we spawn.
        Self::with_io(BufReader::with_capacity(1, std::io::stdin()), std::io::stdout())
    }
}

impl Default for StdinConfirmation {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, W> LineConfirmation<R, W>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
{
    pub fn with_io(input: R, output: W) -> Self {
        Self {
            io: Arc::new(Mutex::new((input, output))),
        }
    }
}

/// Write `prompt`, then read one line. `Ok(None)` at end of input.
pub fn read_answer<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> io::Result<Option<String>> {
    write!(output, "{} (y/N): ", prompt)?;
    output.flush()?;

    let mut line = String::new();
    let read = input.read_line(&mut line)?;
    Ok((read > 0).then_some(line))
}

#[async_trait]
impl<R, W> ConfirmationSource for LineConfirmation<R, W>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
{
    async fn ask(&self, prompt: &str) -> Option<String> {
        let shared = Arc::clone(&self.io);
        let prompt = prompt.to_string();

        let answer = tokio::task::spawn_blocking(move || -> io::Result<Option<String>> {
            let mut guard = shared
                .lock()
                .map_err(|_| io::Error::other("confirmation input poisoned"))?;
            let (input, output) = &mut *guard;
            read_answer(&prompt, input, output)
        })
        .await;

        match answer {
            Ok(Ok(line)) => line,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "failed to read confirmation answer");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "confirmation reader task failed");
                None
            }
        }
    }
}

/// Serves pre-recorded answers in order; `None` once they run out.
#[derive(Default)]
pub struct ScriptedConfirmation {
    answers: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirmation {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts shown so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ConfirmationSource for ScriptedConfirmation {
    async fn ask(&self, prompt: &str) -> Option<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.answers.lock().ok()?.pop_front()
    }
}

/// `y` or `yes` in any case, surrounding whitespace ignored.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[derive(Debug, Deserialize)]
struct ConfirmActionArgs {
    prompt: String,
}

/// Ask the operator before continuing.
pub struct ConfirmAction {
    source: Arc<dyn ConfirmationSource>,
}

impl ConfirmAction {
    pub fn new(source: Arc<dyn ConfirmationSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Tool for ConfirmAction {
    fn name(&self) -> &str {
        "confirm_action"
    }

    fn description(&self) -> &str {
        "Ask the user to confirm whether to continue with an operation. \
         Returns the user's decision."
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        CONFIRM_ACTION_PARAMS
    }

    async fn execute(&self, args: Value, _workspace: &Path) -> anyhow::Result<String> {
        let args: ConfirmActionArgs = serde_json::from_value(args)?;
        let answer = self.source.ask(&args.prompt).await;
        let confirmed = answer.as_deref().is_some_and(is_affirmative);

        tracing::info!(prompt = %args.prompt, confirmed, "confirm_action");
        let outcome = if confirmed { CONFIRMED } else { DECLINED };
        Ok(outcome.to_string())
    }
}
