use std::path::MAIN_SEPARATOR;

use camino::Utf8PathBuf;

use crate::config::HookConfig;
use crate::errors::HookError;

/// Flags only a final-quality compile uses. Dropped for cheap lighting.
pub const FINAL_ONLY_FLAGS: [&str; 5] = [
    "-both",
    "-final",
    "-staticproplighting",
    "-staticproppolys",
    "-textureshadows",
];

/// Flags meant for this hook. The real compiler rejects them.
pub const HOOK_FLAGS: [&str; 3] = [FORCE_PETI, FORCE_HAMMER, NO_PACK];

const FORCE_PETI: &str = "-force_peti";
const FORCE_HAMMER: &str = "-force_hammer";
const NO_PACK: &str = "-no_pack";

/// Prepended for cheap lighting.
const FAST_PREFIX: [&str; 3] = ["-bounce", "2", "-noextra"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightingMode {
    /// Quick lighting for maps built by the puzzle editor.
    Cheap,
    /// The arguments exactly as given, for Hammer maps.
    Faithful,
}

fn is_flag(arg: &str, flags: &[&str]) -> bool {
    flags.iter().any(|flag| arg.eq_ignore_ascii_case(flag))
}

/// Collapses duplicate separators and `.`/`..` components, writing the
/// platform separator. The editor sometimes mixes `/` and `\`.
pub fn normalize_map_path(raw: &str) -> String {
    let absolute = raw.starts_with(['/', '\\']);
    let mut parts: Vec<&str> = Vec::new();
    for part in raw.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." if parts.last().is_some_and(|last| *last != "..") => {
                parts.pop();
            }
            ".." if absolute => {}
            _ => parts.push(part),
        }
    }

    let joined = parts.join(&MAIN_SEPARATOR.to_string());
    match (absolute, joined.is_empty()) {
        (true, _) => format!("{MAIN_SEPARATOR}{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// The compiler command line as the hook received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerArgs {
    /// Arguments for cheap lighting.
    pub fast: Vec<String>,
    /// Arguments for full lighting, unchanged apart from hook flags.
    pub full: Vec<String>,
    /// The map file, always ending in `.bsp`.
    pub map_path: Utf8PathBuf,
    pub force_peti: bool,
    pub force_hammer: bool,
    pub no_pack: bool,
}

impl CompilerArgs {
    /// Splits the compiler arguments (without the program name). The last
    /// argument is the map.
    pub fn parse(argv: &[String]) -> Result<Self, HookError> {
        let Some((raw_map, rest)) = argv.split_last() else {
            return Err(HookError::NoMapPath);
        };
        if raw_map.trim().is_empty() {
            return Err(HookError::NoMapPath);
        }
        let has = |flag: &str| argv.iter().any(|arg| arg.eq_ignore_ascii_case(flag));

        let normalized = normalize_map_path(raw_map);

        let mut fast: Vec<String> = FAST_PREFIX.iter().map(|arg| arg.to_string()).collect();
        fast.extend(
            rest.iter()
                .filter(|arg| !is_flag(arg, &FINAL_ONLY_FLAGS) && !is_flag(arg, &HOOK_FLAGS))
                .cloned(),
        );
        fast.push(normalized.clone());

        let full = argv
            .iter()
            .filter(|arg| !is_flag(arg, &HOOK_FLAGS))
            .cloned()
            .collect();

        let map_path = if normalized.ends_with(".bsp") {
            normalized
        } else {
            normalized + ".bsp"
        };

        Ok(Self {
            fast,
            full,
            map_path: Utf8PathBuf::from(map_path),
            force_peti: has(FORCE_PETI),
            force_hammer: has(FORCE_HAMMER),
            no_pack: has(NO_PACK),
        })
    }

    pub fn for_mode(&self, mode: LightingMode) -> &[String] {
        match mode {
            LightingMode::Cheap => &self.fast,
            LightingMode::Faithful => &self.full,
        }
    }

    pub fn is_preview(&self) -> bool {
        self.map_path.file_name() == Some("preview.bsp")
    }
}

/// Picks the lighting mode. An override flag wins, then editor maps
/// (`preview.bsp`) and `force_full` get cheap lighting.
pub fn decide_mode(args: &CompilerArgs, config: &HookConfig) -> LightingMode {
    if args.force_peti {
        tracing::warn!("OVERRIDE: Applying cheap lighting!");
        return LightingMode::Cheap;
    }
    if args.force_hammer {
        tracing::warn!("OVERRIDE: Preserving args!");
        return LightingMode::Faithful;
    }

    if args.is_preview() || config.force_full {
        LightingMode::Cheap
    } else {
        LightingMode::Faithful
    }
}
