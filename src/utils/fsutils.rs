use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Extensions the pipeline accepts as input screenshots.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Collects all image files directly inside `dir`, does not walk recursively.
/// Sorted by filename so every run enumerates images in the same order.
pub fn image_files(dir: impl AsRef<Path>) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<io::Result<Vec<_>>>()?
        .into_iter()
        .filter(|path| path.is_file() && has_image_extension(path))
        .collect();

    files.sort();
    Ok(files)
}

pub fn has_image_extension(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Try to read the file, return None if it doesn't exist
pub fn read_optional_file(path: impl AsRef<Path>) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
        Ok(s) => Ok(Some(s)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn extension_filter() {
        assert!(has_image_extension("a/b/shot.JPG"));
        assert!(has_image_extension("shot.png"));
        assert!(has_image_extension("shot.jpeg"));
        assert!(has_image_extension("shot.bmp"));
        assert!(!has_image_extension("shot.gif"));
        assert!(!has_image_extension("screens.json"));
        assert!(!has_image_extension("noext"));
    }

    #[test]
    fn listing_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.jpg", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("sub.png")).unwrap();

        let files = image_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(vec!["a.jpg", "b.png"], names);
    }

    #[test]
    fn optional_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rc");
        assert_eq!(None, read_optional_file(&path).unwrap());
        fs::write(&path, "--flag").unwrap();
        assert_eq!(Some("--flag".to_string()), read_optional_file(&path).unwrap());
    }
}
