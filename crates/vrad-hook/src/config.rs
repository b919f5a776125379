//! Hook configuration and the fixed locations the hook works with.

use bee_keyvalues::{conv_bool, Property};
use bee_pack::{MusicScriptSpec, PackContext, ResourceResolver};
use camino::{Utf8Path, Utf8PathBuf};

use crate::args::LightingMode;
use crate::compiler::Platform;
use crate::errors::HookError;

/// Block of the config file holding the settings.
pub const CONFIG_BLOCK: &str = "Config";

/// The game the editor was run from, by Steam app id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameId {
    Portal2,
    ThinkingWithTimeMachine,
    ApertureTag,
    #[default]
    Unknown,
}

impl GameId {
    pub fn from_steam_id(id: &str) -> Self {
        match id.trim() {
            "620" => Self::Portal2,
            "286080" => Self::ThinkingWithTimeMachine,
            "280740" => Self::ApertureTag,
            _ => Self::Unknown,
        }
    }

    /// Folder the game keeps its own content and screenshots in.
    pub fn game_folder(self) -> &'static str {
        match self {
            Self::Portal2 | Self::Unknown => "portal2",
            Self::ThinkingWithTimeMachine => "twtm",
            Self::ApertureTag => "aperturetag",
        }
    }

    /// Folder holding the `game_sounds_manifest.txt` the game loads.
    pub fn sound_manifest_folder(self) -> &'static str {
        match self {
            Self::Portal2 => "portal2_dlc2",
            Self::ThinkingWithTimeMachine => "twtm",
            Self::ApertureTag => "aperturetag",
            Self::Unknown => "portal2",
        }
    }
}

/// Where the replacement screenshot comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenshotType {
    /// A fixed image named by the `screenshot` key.
    Custom,
    /// The newest recent screenshot the game took.
    Auto,
    /// Whatever the editor captures itself.
    #[default]
    Peti,
}

impl ScreenshotType {
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "cust" => Self::Custom,
            "auto" => Self::Auto,
            _ => Self::Peti,
        }
    }
}

/// Settings written by the editor's packager into `bee2/vrad_config.cfg`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookConfig {
    pub game_id: GameId,
    /// Treat every map like an editor map.
    pub force_full: bool,
    pub screenshot_type: ScreenshotType,
    /// Image used for [`ScreenshotType::Custom`].
    pub screenshot: String,
    /// Delete old game screenshots after picking one.
    pub clean_screenshots: bool,
    /// The `MusicScript` block, when it has any content.
    pub music: Option<Property>,
}

impl HookConfig {
    pub fn from_block(block: &Property) -> Self {
        Self {
            game_id: GameId::from_steam_id(block.value_or("game_id", "")),
            force_full: conv_bool(block.value_or("force_full", ""), false),
            screenshot_type: ScreenshotType::parse(block.value_or("screenshot_type", "PETI")),
            screenshot: block.value_or("screenshot", "").to_string(),
            clean_screenshots: conv_bool(block.value_or("clean_screenshots", "0"), false),
            music: block
                .find_key("MusicScript")
                .filter(|music| music.is_truthy())
                .cloned(),
        }
    }

    /// Reads the config file. A missing or broken file gives the defaults.
    pub fn load(path: &Utf8Path) -> Self {
        tracing::info!("Loading Settings...");
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config at {}, using defaults", path);
                return Self::default();
            }
            Err(err) => {
                tracing::warn!("Failed to read {}: {}", path, err);
                return Self::default();
            }
        };

        let config = match Property::parse(&text, path.as_str()) {
            Ok(root) => root
                .find_key(CONFIG_BLOCK)
                .map(Self::from_block)
                .unwrap_or_default(),
            Err(err) => {
                tracing::warn!("Ignoring broken config: {}", err);
                Self::default()
            }
        };
        tracing::info!("Config Loaded!");
        config
    }

    /// Music to generate for a map lit in `mode`. Only editor maps get it.
    pub fn music_for(&self, mode: LightingMode) -> Option<MusicScriptSpec> {
        if mode != LightingMode::Cheap {
            return None;
        }
        self.music.as_ref().and_then(MusicScriptSpec::from_config)
    }
}

/// Every location the hook reads or writes, relative to the directory the
/// compiler runs in (the game's `bin` folder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookPaths {
    root: Utf8PathBuf,
}

impl HookPaths {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_current_dir() -> Result<Self, HookError> {
        let dir = std::env::current_dir()?;
        let root = Utf8PathBuf::from_path_buf(dir).map_err(HookError::non_utf8_path)?;
        Ok(Self::new(root))
    }

    /// The hook's own folder, holding the config and the log.
    pub fn bee2_dir(&self) -> Utf8PathBuf {
        self.root.join("bee2")
    }

    pub fn config_file(&self) -> Utf8PathBuf {
        self.bee2_dir().join("vrad_config.cfg")
    }

    pub fn inject_dir(&self) -> Utf8PathBuf {
        self.bee2_dir().join("inject")
    }

    pub fn resolver(&self) -> ResourceResolver {
        ResourceResolver::for_bin_dir(&self.root)
    }

    /// Holds one folder per player, each with the editor's puzzle files.
    pub fn puzzles_dir(&self) -> Utf8PathBuf {
        // The editor always saves into portal2/, even when run from a mod.
        self.root.join("..").join("portal2").join("puzzles")
    }

    pub fn screenshots_dir(&self, game: GameId) -> Utf8PathBuf {
        self.root.join("..").join(game.game_folder()).join("screenshots")
    }

    pub fn original_sound_manifest(&self, game: GameId) -> Utf8PathBuf {
        self.root
            .join("..")
            .join(game.sound_manifest_folder())
            .join("scripts")
            .join("game_sounds_manifest.txt")
    }

    /// The real compiler, renamed next to this hook.
    pub fn compiler(&self, platform: Platform) -> Utf8PathBuf {
        self.root.join(platform.compiler_name())
    }

    pub fn pack_context(&self, config: &HookConfig, mode: LightingMode) -> PackContext {
        PackContext {
            resolver: self.resolver(),
            inject_dir: self.inject_dir(),
            original_manifest: self.original_sound_manifest(config.game_id),
            music: config.music_for(mode),
        }
    }
}
