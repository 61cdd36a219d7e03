use std::fs;
use std::io;
use std::path::Path;

use log::warn;

use crate::scan::domain::audio_file::AudioFile;

/// Recursively collect supported audio files under `root`, sorted by path.
///
/// Unreadable subdirectories are skipped with a warning; only a failure to
/// read `root` itself is an error.
pub fn discover(root: &Path) -> io::Result<Vec<AudioFile>> {
    let mut found = Vec::new();
    walk(root, root, &mut found)?;
    found.sort_by(|a, b| a.path().cmp(b.path()));
    Ok(found)
}

fn walk(root: &Path, dir: &Path, found: &mut Vec<AudioFile>) -> io::Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if dir != root => {
            warn!("skipping unreadable directory {}: {e}", dir.display());
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry in {}: {e}", dir.display());
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            walk(root, &path, found)?;
        } else if let Some(audio) = AudioFile::from_path(&path) {
            found.push(audio);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    fn paths(found: &[AudioFile]) -> Vec<PathBuf> {
        found.iter().map(|f| f.path().to_path_buf()).collect()
    }

    #[test]
    fn test_discovers_supported_extensions_at_any_depth() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("a.mp3"));
        touch(&root.join("sub/b.wav"));
        touch(&root.join("sub/deep/c.flac"));
        touch(&root.join("sub/deep/d.ogg"));
        touch(&root.join("e.m4a"));

        let found = discover(root).unwrap();
        assert_eq!(found.len(), 5);
    }

    #[test]
    fn test_ignores_unsupported_files() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("a.mp3"));
        touch(&root.join("notes.txt"));
        touch(&root.join("clip.mp4"));
        touch(&root.join("README"));

        let found = discover(root).unwrap();
        assert_eq!(paths(&found), vec![root.join("a.mp3")]);
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("loud.MP3"));
        touch(&root.join("quiet.Wav"));

        let found = discover(root).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_results_sorted_by_path() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("z.mp3"));
        touch(&root.join("a.mp3"));
        touch(&root.join("m/k.mp3"));

        let found = discover(root).unwrap();
        assert_eq!(
            paths(&found),
            vec![root.join("a.mp3"), root.join("m/k.mp3"), root.join("z.mp3")]
        );
    }

    #[test]
    fn test_empty_tree_finds_nothing() {
        let tmp = TempDir::new().unwrap();
        assert!(discover(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(discover(&missing).is_err());
    }
}
