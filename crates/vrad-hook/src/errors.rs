use camino::Utf8PathBuf;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum HookError {
    #[error("No map was passed to the compiler")]
    #[diagnostic(
        code(args::no_map),
        help("The map to light must be the last argument, the way Hammer and the puzzle editor call VRAD")
    )]
    NoMapPath,

    #[error("Failed to launch the lighting compiler: {path}")]
    #[diagnostic(
        code(compiler::launch_failed),
        help("The game's own VRAD executable must be renamed to {expected} next to this hook")
    )]
    CompilerLaunch {
        path: Utf8PathBuf,
        expected: String,
        #[source]
        source: std::io::Error,
    },

    #[error("The lighting compiler failed with exit code {code}")]
    #[diagnostic(code(compiler::failed))]
    CompilerFailed { code: i32 },

    #[error("Packing content into the map failed")]
    #[diagnostic(
        code(pack::failed),
        help("The map was compiled but is missing its custom content. Check the log for the file involved")
    )]
    Pack(#[from] bee_pack::PackError),

    #[error("Working directory is not valid UTF-8: {}", path.display())]
    #[diagnostic(code(fs::non_utf8_path))]
    NonUtf8Path { path: PathBuf },

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl HookError {
    pub fn compiler_launch(path: Utf8PathBuf, source: std::io::Error) -> Self {
        let expected = path.file_name().unwrap_or(path.as_str()).to_string();
        Self::CompilerLaunch {
            path,
            expected,
            source,
        }
    }

    pub fn non_utf8_path(path: PathBuf) -> Self {
        Self::NonUtf8Path { path }
    }
}
