use std::io::Write;
use std::process::{Command, Stdio};
use tracing::{debug, instrument};

/// Placeholder in picker arguments replaced by the prompt label.
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// Lets the user choose one item from a list.
pub trait Picker {
    /// Returns `None` when the user cancels or nothing could be selected.
    fn pick(&self, items: &[String], prompt: &str) -> Option<String>;
}

/// Runs an external fuzzy finder (fzf by default) over the items.
///
/// Items are written to the command's stdin one per line and the first line
/// of its stdout is the selection.
#[derive(Debug, Clone)]
pub struct ExternalPicker {
    program: String,
    args: Vec<String>,
}

impl ExternalPicker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build a picker from a full command line; `None` if it is empty.
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    fn run(&self, items: &[String], prompt: &str) -> std::io::Result<Option<String>> {
        let args = self
            .args
            .iter()
            .map(|arg| arg.replace(PROMPT_PLACEHOLDER, prompt));

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // The picker may exit before reading everything.
            let _ = stdin.write_all(items.join("\n").as_bytes());
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            debug!(status = %output.status, "picker exited without a selection");
            return Ok(None);
        }

        let selection = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string);

        Ok(selection)
    }
}

impl Picker for ExternalPicker {
    #[instrument(skip(self, items), fields(program = %self.program, count = items.len()))]
    fn pick(&self, items: &[String], prompt: &str) -> Option<String> {
        if items.is_empty() {
            return None;
        }

        match self.run(items, prompt) {
            Ok(selection) => selection,
            Err(e) => {
                debug!(error = %e, "picker failed");
                None
            }
        }
    }
}
