use std::process::{Command, Stdio};

use tracing::debug;

/// Hands a URL to something outside the console.
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), String>;
}

/// Launches the platform's default URL handler.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemOpener;

impl SystemOpener {
    fn command(url: &str) -> Command {
        if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", "", url]);
            cmd
        } else if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(url);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(url);
            cmd
        }
    }
}

/// Runs a launcher to completion. The handlers hand the URL off and exit, so
/// waiting here reaps the child.
fn launch(mut cmd: Command) -> Result<(), String> {
    debug!(program = ?cmd.get_program(), "launching URL handler");
    let status = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| format!("{:?}: {}", cmd.get_program(), e))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("{:?} exited with {}", cmd.get_program(), status))
    }
}

impl UrlOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<(), String> {
        launch(Self::command(url))
    }
}
