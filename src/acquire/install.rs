use std::io;
use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Longest tail of installer output kept in error messages.
const OUTPUT_TAIL: usize = 4000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutput {
    /// stdout followed by stderr.
    pub combined: String,
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {status}: {output}")]
    Failed {
        program: String,
        status: String,
        output: String,
    },
}

/// Installs a project's dependencies inside its working directory.
pub trait Installer: Send + Sync {
    fn install(&self, dir: &Path) -> Result<InstallOutput, InstallError>;
}

/// Runs a configured command (e.g. `npm install`) in the project directory.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    program: String,
    args: Vec<String>,
}

impl CommandInstaller {
    pub fn new(program: &str, args: &[String]) -> Self {
        Self {
            program: program.to_string(),
            args: args.to_vec(),
        }
    }
}

impl Installer for CommandInstaller {
    fn install(&self, dir: &Path) -> Result<InstallOutput, InstallError> {
        debug!(program = %self.program, args = ?self.args, dir = %dir.display(), "installing dependencies");
        let out = Command::new(&self.program)
            .args(&self.args)
            .current_dir(dir)
            .output()
            .map_err(|source| InstallError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&out.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&out.stderr));

        if out.status.success() {
            Ok(InstallOutput { combined })
        } else {
            Err(InstallError::Failed {
                program: self.program.clone(),
                status: out.status.to_string(),
                output: tail(combined.trim_end(), OUTPUT_TAIL).to_string(),
            })
        }
    }
}

fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}
