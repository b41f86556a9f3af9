//! Schema validation of serialized documents through an external tool.
//!
//! The validator is a configured command line. The document is piped to its
//! stdin; exit status 0 means valid and the combined output is the log.

use std::io::Write;
use std::process::{Command, Stdio};

use harmonizer_shared::{HarmonizerError, Result, ValidationConfig};
use tracing::debug;

/// Result of validating one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub passed: bool,
    /// Combined stdout and stderr of the validator.
    pub log: String,
}

impl ValidationReport {
    pub fn passed() -> Self {
        Self {
            passed: true,
            log: String::new(),
        }
    }
}

/// Validates serialized documents.
pub trait SchemaValidator: Send + Sync {
    /// Validate a document. `Err` means the validator itself could not run.
    fn validate(&self, document: &str) -> Result<ValidationReport>;

    fn name(&self) -> &str;
}

/// Accepts every document. Used when no validator command is configured.
pub struct NoopValidator;

impl SchemaValidator for NoopValidator {
    fn validate(&self, _document: &str) -> Result<ValidationReport> {
        Ok(ValidationReport::passed())
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Runs an external validator process per document.
#[derive(Debug, Clone)]
pub struct CommandValidator {
    program: String,
    args: Vec<String>,
}

impl CommandValidator {
    /// Build from an argv. Returns `None` for an empty argv.
    pub fn new(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl SchemaValidator for CommandValidator {
    fn validate(&self, document: &str) -> Result<ValidationReport> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                HarmonizerError::validation(format!(
                    "failed to spawn validator `{}`: {e}",
                    self.program
                ))
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            HarmonizerError::validation("failed to capture validator stdin")
        })?;

        // Write on a separate thread; the validator may fill stdout first.
        let input = document.to_owned();
        let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child
            .wait_with_output()
            .map_err(|e| HarmonizerError::validation(format!("validator did not finish: {e}")))?;

        match writer.join() {
            Ok(Ok(())) => {}
            // The validator may exit before reading all input.
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => {
                return Err(HarmonizerError::validation(format!(
                    "failed to write to validator stdin: {e}"
                )));
            }
            Err(_) => return Err(HarmonizerError::validation("validator stdin writer panicked")),
        }

        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        log.push_str(&String::from_utf8_lossy(&output.stderr));

        debug!(status = ?output.status, "validator finished");
        Ok(ValidationReport {
            passed: output.status.success(),
            log,
        })
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Validator for the configured command; [`NoopValidator`] when it is empty.
pub fn validator_from_config(config: &ValidationConfig) -> Box<dyn SchemaValidator> {
    match CommandValidator::new(&config.command) {
        Some(validator) => Box::new(validator),
        None => Box::new(NoopValidator),
    }
}
