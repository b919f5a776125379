use camino::{Utf8Path, Utf8PathBuf};

/// Resource folders next to the game's `bin` directory, searched in order.
pub const RESOURCE_FOLDERS: [&str; 3] = ["bee2", "bee2_dev", "portal2_dlc2"];

/// Finds a resource in the first of several root directories that has it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceResolver {
    roots: Vec<Utf8PathBuf>,
}

impl ResourceResolver {
    pub fn new(roots: Vec<Utf8PathBuf>) -> Self {
        Self { roots }
    }

    /// The standard search list for a compiler running in `bin_dir`.
    pub fn for_bin_dir(bin_dir: &Utf8Path) -> Self {
        Self::new(
            RESOURCE_FOLDERS
                .iter()
                .map(|folder| bin_dir.join("..").join(folder))
                .collect(),
        )
    }

    pub fn roots(&self) -> &[Utf8PathBuf] {
        &self.roots
    }

    /// Path of the first existing file matching `logical_path`.
    ///
    /// `logical_path` may use either separator.
    pub fn resolve(&self, logical_path: &str) -> Option<Utf8PathBuf> {
        let parts: Vec<&str> = logical_path
            .split(['/', '\\'])
            .filter(|part| !part.is_empty() && *part != ".")
            .collect();
        if parts.is_empty() {
            return None;
        }

        self.roots.iter().find_map(|root| {
            let candidate = parts.iter().fold(root.clone(), |path, part| path.join(part));
            candidate.is_file().then_some(candidate)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
    }

    #[test]
    fn test_first_root_wins() {
        let dir = tempdir().unwrap();
        let r1 = utf8(&dir.path().join("r1"));
        let r2 = utf8(&dir.path().join("r2"));
        for root in [&r1, &r2] {
            fs::create_dir_all(root.join("materials")).unwrap();
            fs::write(root.join("materials/a.vmt"), root.as_str()).unwrap();
        }

        let resolver = ResourceResolver::new(vec![r1.clone(), r2]);
        assert_eq!(
            resolver.resolve("materials/a.vmt"),
            Some(r1.join("materials").join("a.vmt"))
        );
    }

    #[test]
    fn test_falls_through_to_later_root() {
        let dir = tempdir().unwrap();
        let r1 = utf8(&dir.path().join("r1"));
        let r2 = utf8(&dir.path().join("r2"));
        fs::create_dir_all(&r1).unwrap();
        fs::create_dir_all(r2.join("sound")).unwrap();
        fs::write(r2.join("sound/x.wav"), b"RIFF").unwrap();

        let resolver = ResourceResolver::new(vec![r1, r2.clone()]);
        assert_eq!(
            resolver.resolve("sound\\x.wav"),
            Some(r2.join("sound").join("x.wav"))
        );
    }

    #[test]
    fn test_missing_everywhere() {
        let dir = tempdir().unwrap();
        let resolver = ResourceResolver::new(vec![utf8(dir.path())]);

        assert_eq!(resolver.resolve("models/nothing.mdl"), None);
        assert_eq!(resolver.resolve(""), None);
        // Never creates anything while looking.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_directories_do_not_match() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("scripts")).unwrap();
        let resolver = ResourceResolver::new(vec![utf8(dir.path())]);

        assert_eq!(resolver.resolve("scripts"), None);
    }

    #[test]
    fn test_bin_dir_roots() {
        let resolver = ResourceResolver::for_bin_dir(Utf8Path::new("game/bin"));
        assert_eq!(
            resolver.roots(),
            &[
                Utf8PathBuf::from("game/bin/../bee2"),
                Utf8PathBuf::from("game/bin/../bee2_dev"),
                Utf8PathBuf::from("game/bin/../portal2_dlc2"),
            ]
        );
    }
}
