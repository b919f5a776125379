use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};

use camino::Utf8Path;

use crate::errors::HookError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }

    /// Suffix Valve gives the compiler executables on each platform.
    pub fn compiler_suffix(self) -> &'static str {
        match self {
            Self::Windows => "",
            Self::Linux => "_linux",
            Self::MacOs => "_osx",
        }
    }

    /// File name the real compiler is renamed to when the hook is installed.
    pub fn compiler_name(self) -> String {
        format!("vrad{}_original", self.compiler_suffix())
    }
}

/// Display form of a command: the executable is always quoted, arguments
/// only when they contain whitespace.
pub fn command_line(exe: &Utf8Path, args: &[String]) -> String {
    let mut line = format!("\"{exe}\"");
    for arg in args {
        line.push(' ');
        if arg.contains(char::is_whitespace) {
            line.push('"');
            line.push_str(arg);
            line.push('"');
        } else {
            line.push_str(arg);
        }
    }
    line
}

/// Runs the real compiler and waits for it.
///
/// Its output goes straight to the terminal. Error output is captured into
/// the log.
pub fn run_compiler(exe: &Utf8Path, args: &[String]) -> Result<(), HookError> {
    tracing::info!("Calling original VRAD...");
    tracing::info!("{}", command_line(exe, args));

    let mut child = Command::new(exe)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| HookError::compiler_launch(exe.to_owned(), err))?;

    if let Some(stderr) = child.stderr.take() {
        for line in BufReader::new(stderr).split(b'\n') {
            let line = line?;
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end();
            if !line.is_empty() {
                tracing::warn!("VRAD: {}", line);
            }
        }
    }

    let status = child.wait()?;
    if status.success() {
        tracing::info!("Done!");
        return Ok(());
    }

    // Killed by a signal has no code.
    let code = status.code().unwrap_or(1);
    tracing::warn!("VRAD failed! ({})", code);
    Err(HookError::CompilerFailed { code })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(Platform::Windows.compiler_name(), "vrad_original");
        assert_eq!(Platform::Linux.compiler_name(), "vrad_linux_original");
        assert_eq!(Platform::MacOs.compiler_name(), "vrad_osx_original");
    }

    #[test]
    fn test_command_line_quoting() {
        let line = command_line(
            Utf8Path::new("/games/Portal 2/bin/vrad_linux_original"),
            &argv(&["-game", "/games/Portal 2/portal2", "maps/preview"]),
        );

        assert_eq!(
            line,
            "\"/games/Portal 2/bin/vrad_linux_original\" -game \"/games/Portal 2/portal2\" maps/preview"
        );
    }

    #[test]
    fn test_missing_compiler_is_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let exe = camino::Utf8PathBuf::from_path_buf(dir.path().join("vrad_missing_original"))
            .unwrap();

        let result = run_compiler(&exe, &argv(&["maps/preview"]));
        assert!(matches!(result, Err(HookError::CompilerLaunch { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_code_is_reported() {
        let result = run_compiler(
            Utf8Path::new("/bin/sh"),
            &argv(&["-c", "echo lighting failed >&2; exit 3"]),
        );
        assert!(matches!(result, Err(HookError::CompilerFailed { code: 3 })));

        assert!(run_compiler(Utf8Path::new("/bin/sh"), &argv(&["-c", "exit 0"])).is_ok());
    }
}
