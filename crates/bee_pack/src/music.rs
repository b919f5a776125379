//! Background music soundscript for the editor's music item.
//!
//! The base track always exists. Excursion funnels and the bounce and speed
//! gels can each add a track that fades in while the player uses them; the
//! base entry's operator stack starts and stops those tracks.

use bee_keyvalues::{Property, Value};

/// Archive path the generated script is packed under.
pub const MUSIC_SCRIPT_ARCHIVE_PATH: &str = "scripts/BEE2_generated_music.txt";

// Pieces of the base entry's operator stack. Track fragments open with a
// blank line, as the game's own scripts do.
macro_rules! base_stack {
    () => {
r#" "soundentry_version" "2"
 "operator_stacks"
  {
  "update_stack"
   {
   "import_stack" "update_music_stereo"
"#
    };
}

macro_rules! funnel_main {
    () => {
r#"
  "import_stack" "p2_update_music_play_tbeam"
  "play_entry"
   {
   "entry_name" "music.BEE2_funnel"
   }
  "stop_entry"
   {
   "match_entry" "music.BEE2_funnel"
   }
"#
    };
}

macro_rules! gel_bounce_main {
    () => {
r#"
  "import_stack" "p2_update_music_play_gel"
  "gel_play_entry"
   {
   "entry_name" "music.BEE2_gel_bounce"
   }
  "gel_stop_entry"
   {
   "match_entry" "music.BEE2_gel_bounce"
   }
"#
    };
}

macro_rules! gel_speed_main {
    () => {
r#"
  "import_stack" "p2_update_music_play_speed_gel"
  "speed_velocity_trigger"
   {
   "input2" "250"
   }
   "speed_play_entry"
    {
    "entry_name" "music.BEE2_gel_speed"
    }
   "speed_stop_entry"
    {
    "match_entry" "music.BEE2_gel_speed"
    }
"#
    };
}

macro_rules! close_main {
    () => {
        "  }\n }\n}\n"
    };
}

/// Complete operator stack of the base entry, indexed by [`TrackSet::index`].
const BASE_STACKS: [&str; 8] = [
    concat!(base_stack!(), close_main!()),
    concat!(base_stack!(), funnel_main!(), close_main!()),
    concat!(base_stack!(), gel_bounce_main!(), close_main!()),
    concat!(base_stack!(), funnel_main!(), gel_bounce_main!(), close_main!()),
    concat!(base_stack!(), gel_speed_main!(), close_main!()),
    concat!(base_stack!(), funnel_main!(), gel_speed_main!(), close_main!()),
    concat!(base_stack!(), gel_bounce_main!(), gel_speed_main!(), close_main!()),
    concat!(
        base_stack!(),
        funnel_main!(),
        gel_bounce_main!(),
        gel_speed_main!(),
        close_main!()
    ),
];

/// Aux track stack that stays in sync with the base track.
const GEL_STACK: &str = r#"
 "soundentry_version" "2"
 "operator_stacks"
  {
  "start_stack"
   {
   "import_stack" "start_sync_to_entry"
   "elapsed_time"
    {
    "entry" "music.BEE2"
    }
   "duration_div"
    {
    "input2" "1"
    }
   "div_mult"
    {
    "input1" "1.0"
    }
   }
  "update_stack"
   {
   "import_stack" "update_music_stereo"
   "volume_fade_in"
    {
     "input_max" "0.25"
    }
   "volume_fade_out"
    {
    "input_max" "1.0"
    }
   }
  }
 }
"#;

/// Aux track stack that starts at a random offset into the track.
const FUNNEL_STACK: &str = r#"
 "soundentry_version" "2"
 "operator_stacks"
  {
  "start_stack"
   {
   "random_offset"
    {
    "operator" "math_random"
    "input_min" "0.0"
    "input_max" "126"
    }
   "negative_delay"
    {
    "operator" "math_float"
    "apply" "mult"
    "input1" "@random_offset.output"
    "input2" "-1.0"
    }
   "delay_output"
    {
    "operator" "sys_output"
    "input_float" "@negative_delay.output"
    "output" "delay"
    }
   }
  "update_stack"
   {
   "import_stack" "update_music_stereo"
   "mixer"
    {
    "mixgroup" "unduckedMusic"
    }
   "volume_fade_in"
    {
    "input_max" "3.0"
    "input_map_min" "0.05"
    }
   "volume_fade_out"
    {
    "input_max" "0.75"
    "input_map_min" "0.05"
    }
   "volume_lfo_time_scale"
    {
    "input2" "0.3"
    }
   "volume_lfo_scale"
    {
    "input2" "0.4"
    }
   }
  }
 }
"#;

struct AuxTrack {
    suffix: &'static str,
    volume: &'static str,
    stack: &'static str,
}

const FUNNEL_TRACK: AuxTrack = AuxTrack {
    suffix: "_funnel",
    volume: "1",
    stack: FUNNEL_STACK,
};

const BOUNCE_TRACK: AuxTrack = AuxTrack {
    suffix: "_gel_bounce",
    volume: "0.5",
    stack: GEL_STACK,
};

const SPEED_TRACK: AuxTrack = AuxTrack {
    suffix: "_gel_speed",
    volume: "0.5",
    stack: GEL_STACK,
};

/// Which optional tracks a music item has.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackSet {
    pub funnel: bool,
    pub bounce: bool,
    pub speed: bool,
}

impl TrackSet {
    pub fn index(self) -> usize {
        usize::from(self.funnel) | (usize::from(self.bounce) << 1) | (usize::from(self.speed) << 2)
    }
}

/// A single wave file, or several picked from at random.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundRef {
    Single(String),
    Random(Vec<String>),
}

impl SoundRef {
    /// A leaf is a single sound, a block lists random choices. Empty
    /// values mean no sound.
    pub fn from_property(prop: &Property) -> Option<Self> {
        match prop.value() {
            Value::Leaf(wave) if !wave.is_empty() => Some(Self::Single(wave.clone())),
            Value::Leaf(_) => None,
            Value::Block(children) => {
                let waves: Vec<String> = children
                    .iter()
                    .filter_map(Property::as_str)
                    .map(str::to_string)
                    .collect();
                (!waves.is_empty()).then_some(Self::Random(waves))
            }
        }
    }

    fn write(&self, out: &mut String, prefix: &str) {
        match self {
            Self::Single(wave) => out.push_str(&format!(" \"wave\" \"{prefix}{wave}\"\n")),
            Self::Random(waves) => {
                out.push_str(" \"rndwave\"\n  {\n");
                for wave in waves {
                    out.push_str(&format!("  \"wave\" \"{prefix}{wave}\"\n"));
                }
                out.push_str("  }\n");
            }
        }
    }
}

/// The `MusicScript` configuration block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicScriptSpec {
    pub base: SoundRef,
    pub funnel: Option<SoundRef>,
    pub bounce_gel: Option<SoundRef>,
    pub speed_gel: Option<SoundRef>,
}

impl MusicScriptSpec {
    /// Reads the `base`, `tbeam`, `bouncegel` and `speedgel` keys. Without a
    /// base track there is no music.
    pub fn from_config(block: &Property) -> Option<Self> {
        let track = |name: &str| block.find_key(name).and_then(SoundRef::from_property);
        Some(Self {
            base: track("base")?,
            funnel: track("tbeam"),
            bounce_gel: track("bouncegel"),
            speed_gel: track("speedgel"),
        })
    }

    pub fn tracks(&self) -> TrackSet {
        TrackSet {
            funnel: self.funnel.is_some(),
            bounce: self.bounce_gel.is_some(),
            speed: self.speed_gel.is_some(),
        }
    }
}

fn write_header(out: &mut String, suffix: &str, volume: &str) {
    out.push_str(&format!(
        "\"music.BEE2{suffix}\"\n {{\n \"channel\" \"CHAN_STATIC\"\n \"soundlevel\" \"SNDLVL_NONE\"\n \"volume\" \"{volume}\"\n"
    ));
}

/// Renders the soundscript text.
pub fn generate(spec: &MusicScriptSpec) -> String {
    let mut out = String::new();

    write_header(&mut out, "", "1");
    spec.base.write(&mut out, "#*");
    out.push_str(BASE_STACKS[spec.tracks().index()]);

    let aux = [
        (&FUNNEL_TRACK, &spec.funnel),
        (&BOUNCE_TRACK, &spec.bounce_gel),
        (&SPEED_TRACK, &spec.speed_gel),
    ];
    for (track, sound) in aux {
        if let Some(sound) = sound {
            write_header(&mut out, track.suffix, track.volume);
            sound.write(&mut out, "*");
            out.push_str(track.stack);
        }
    }

    out
}
