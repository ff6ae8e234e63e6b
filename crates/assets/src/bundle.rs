use crate::{AssetError, AssetStore};
use std::path::{Path, PathBuf};

/// How a file is stored when bundling a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleKind {
    Script,
    Image,
    Generic,
}

impl BundleKind {
    pub fn for_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("rhai") => BundleKind::Script,
            Some("png") => BundleKind::Image,
            _ => BundleKind::Generic,
        }
    }
}

/// Load every file under `root` into a fresh store.
///
/// Files are visited in sorted path order, so the same folder always yields
/// the same indices. Scripts go through `validate`.
pub fn bundle_folder<F>(root: &Path, mut validate: F) -> Result<(AssetStore, Vec<(String, BundleKind)>), AssetError>
where
    F: FnMut(&str, &str) -> Result<(), String>,
{
    let mut files = Vec::new();
    collect_files(root, &mut files)?;
    files.sort();

    let mut store = AssetStore::new(root);
    let mut loaded = Vec::with_capacity(files.len());
    for path in files {
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let name = crate::normalize_name(&relative.to_string_lossy());
        let kind = BundleKind::for_name(&name);
        match kind {
            BundleKind::Script => {
                store.load_script(&name, &mut validate)?;
            }
            BundleKind::Image => {
                store.load_image(&name)?;
            }
            BundleKind::Generic => {
                store.load_generic(&name)?;
            }
        }
        tracing::debug!(%name, ?kind, "bundled");
        loaded.push((name, kind));
    }
    Ok((store, loaded))
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), AssetError> {
    let io_err = |source| AssetError::Io {
        path: dir.display().to_string(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        // file_type does not follow symlinks, so linked folders are never entered
        let file_type = entry.file_type().map_err(io_err)?;
        if file_type.is_dir() {
            collect_files(&entry.path(), out)?;
        } else if file_type.is_file() || (file_type.is_symlink() && entry.path().is_file()) {
            out.push(entry.path());
        } else {
            tracing::debug!(path = %entry.path().display(), "skipping entry");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_by_extension() {
        assert_eq!(BundleKind::for_name("scene.rhai"), BundleKind::Script);
        assert_eq!(BundleKind::for_name("a/b/TILE.PNG"), BundleKind::Image);
        assert_eq!(BundleKind::for_name("level.json"), BundleKind::Generic);
        assert_eq!(BundleKind::for_name("README"), BundleKind::Generic);
    }

    #[test]
    fn bundles_nested_folder() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("scripts")).unwrap();
        std::fs::write(tmp.path().join("scripts/main.rhai"), "fn main() {}").unwrap();
        std::fs::write(tmp.path().join("data.json"), "{}").unwrap();
        image::RgbaImage::from_raw(1, 1, vec![0, 0, 0, 255])
            .unwrap()
            .save(tmp.path().join("dot.png"))
            .unwrap();

        let mut checked = Vec::new();
        let (store, loaded) = bundle_folder(tmp.path(), |name, _| {
            checked.push(name.to_string());
            Ok(())
        })
        .unwrap();

        assert_eq!(
            loaded,
            vec![
                ("data.json".to_string(), BundleKind::Generic),
                ("dot.png".to_string(), BundleKind::Image),
                ("scripts/main.rhai".to_string(), BundleKind::Script),
            ]
        );
        assert_eq!(checked, vec!["scripts/main.rhai"]);
        assert!(store.is_image("dot.png"));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn rejected_script_fails_bundle() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("bad.rhai"), "fn (").unwrap();
        let result = bundle_folder(tmp.path(), |_, _| Err("parse error".into()));
        assert!(matches!(result, Err(AssetError::ScriptRejected { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_folders_are_not_followed() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("tiles")).unwrap();
        std::fs::write(tmp.path().join("tiles/a.txt"), "a").unwrap();
        std::os::unix::fs::symlink(tmp.path(), tmp.path().join("loop")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("tiles"), tmp.path().join("tiles_again")).unwrap();

        let (store, loaded) = bundle_folder(tmp.path(), |_, _| Ok(())).unwrap();
        assert_eq!(loaded, vec![("tiles/a.txt".to_string(), BundleKind::Generic)]);
        assert_eq!(store.len(), 1);
    }
}
