//! Packs custom content into a compiled map.
//!
//! The editor writes a `<map>.filelist.txt` next to the map naming every
//! asset the map uses. [`pack_map`] looks those files up in the resource
//! folders, regenerates the sound manifest and music script, and stores
//! everything in the map's embedded zip archive.

pub mod archive;
mod error;
pub mod filelist;
pub mod music;
pub mod packer;
pub mod resolver;
pub mod sound_manifest;

pub use archive::EmbeddedArchive;
pub use error::{PackError, Result};
pub use filelist::{FileList, FileListEntry};
pub use music::{MusicScriptSpec, SoundRef, TrackSet};
pub use packer::{merge, pack_map, InjectedResource, MergeOutcome, PackContext, PackReport};
pub use resolver::ResourceResolver;
