use crate::AssetError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub width: u16,
    pub height: u16,
    pub components: u8,
    pub data: Vec<u8>,
}

impl Image {
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.components as usize
    }
}

/// Opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Generic {
    pub data: Vec<u8>,
}

impl Generic {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Contents as text; invalid UTF-8 is replaced.
    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    pub fn as_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.data)
    }
}

/// Resource names always use `/`.
pub fn normalize_name(name: &str) -> String {
    name.replace('\\', "/")
}

/// Asset cache keyed by resource name.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    pub(crate) root: PathBuf,
    pub(crate) next_index: u64,
    pub(crate) names: BTreeMap<String, u64>,
    pub(crate) images: BTreeMap<u64, Image>,
    pub(crate) generics: BTreeMap<u64, Generic>,
}

enum Cached {
    Hit(u64),
    Miss(u64, Vec<u8>),
}

impl AssetStore {
    /// Empty store reading from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        tracing::debug!(root = %root.display(), "creating empty asset store");
        Self {
            root,
            ..Self::default()
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_of(&self, name: &str) -> Option<u64> {
        self.names.get(name).copied()
    }

    /// Resolve `name` to its index, reading the file if nothing is cached.
    fn load_file(&mut self, name: &str, kind: &str, cached: impl Fn(&Self, u64) -> bool) -> Result<Cached, AssetError> {
        if let Some(index) = self.index_of(name) {
            if cached(self, index) {
                return Ok(Cached::Hit(index));
            }
        }
        let path = self.root.join(name);
        tracing::debug!(%name, kind, path = %path.display(), "loading resource");
        let bytes = std::fs::read(&path).map_err(|source| AssetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let index = match self.index_of(name) {
            Some(index) => index,
            None => {
                let index = self.next_index;
                self.next_index += 1;
                self.names.insert(name.to_string(), index);
                index
            }
        };
        Ok(Cached::Miss(index, bytes))
    }

    /// Load and decode an image to RGBA8.
    pub fn load_image(&mut self, name: &str) -> Result<&Image, AssetError> {
        let name = normalize_name(name);
        let index = match self.load_file(&name, "image", |s, i| s.images.contains_key(&i))? {
            Cached::Hit(index) => index,
            Cached::Miss(index, bytes) => {
                let image = decode_image(&name, &bytes)?;
                self.images.insert(index, image);
                index
            }
        };
        self.images
            .get(&index)
            .ok_or(AssetError::NotLoaded(name))
    }

    /// Load raw bytes.
    pub fn load_generic(&mut self, name: &str) -> Result<&Generic, AssetError> {
        let name = normalize_name(name);
        let index = match self.load_file(&name, "generic", |s, i| s.generics.contains_key(&i))? {
            Cached::Hit(index) => index,
            Cached::Miss(index, bytes) => {
                self.generics.insert(index, Generic::new(bytes));
                index
            }
        };
        self.generics
            .get(&index)
            .ok_or(AssetError::NotLoaded(name))
    }

    /// Load a script, checking it with `validate` before caching it.
    ///
    /// `validate` receives the resource name and source text and returns a
    /// reason on rejection.
    pub fn load_script<F>(&mut self, name: &str, validate: F) -> Result<&Generic, AssetError>
    where
        F: FnOnce(&str, &str) -> Result<(), String>,
    {
        let name = normalize_name(name);
        let index = match self.load_file(&name, "script", |s, i| s.generics.contains_key(&i))? {
            Cached::Hit(index) => index,
            Cached::Miss(index, bytes) => {
                let source = String::from_utf8(bytes).map_err(|e| AssetError::ScriptRejected {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
                validate(&name, &source).map_err(|reason| AssetError::ScriptRejected {
                    name: name.clone(),
                    reason,
                })?;
                self.generics.insert(index, Generic::new(source.into_bytes()));
                index
            }
        };
        self.generics
            .get(&index)
            .ok_or(AssetError::NotLoaded(name))
    }

    /// A previously loaded image.
    pub fn image(&self, name: &str) -> Result<&Image, AssetError> {
        let name = normalize_name(name);
        self.index_of(&name)
            .and_then(|i| self.images.get(&i))
            .ok_or(AssetError::NotLoaded(name))
    }

    /// A previously loaded blob or script.
    pub fn generic(&self, name: &str) -> Result<&Generic, AssetError> {
        let name = normalize_name(name);
        self.index_of(&name)
            .and_then(|i| self.generics.get(&i))
            .ok_or(AssetError::NotLoaded(name))
    }

    /// Parse a previously loaded blob as JSON.
    pub fn json(&self, name: &str) -> Result<serde_json::Value, AssetError> {
        self.generic(name)?
            .as_json()
            .map_err(|source| AssetError::Json {
                name: normalize_name(name),
                source,
            })
    }

    /// Known resource names, sorted.
    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub fn is_image(&self, name: &str) -> bool {
        self.index_of(&normalize_name(name))
            .is_some_and(|i| self.images.contains_key(&i))
    }

    /// Number of named resources.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Drop decoded data. Names keep their indices; the next load re-reads the file.
    pub fn deallocate(&mut self) {
        tracing::debug!(
            images = self.images.len(),
            generics = self.generics.len(),
            "deallocating assets"
        );
        self.images.clear();
        self.generics.clear();
    }
}

fn decode_image(name: &str, bytes: &[u8]) -> Result<Image, AssetError> {
    let decode_err = |reason: String| AssetError::ImageDecode {
        name: name.to_string(),
        reason,
    };
    let rgba = image::load_from_memory(bytes)
        .map_err(|e| decode_err(e.to_string()))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();
    let width = u16::try_from(width).map_err(|_| decode_err(format!("width {width} exceeds {}", u16::MAX)))?;
    let height =
        u16::try_from(height).map_err(|_| decode_err(format!("height {height} exceeds {}", u16::MAX)))?;
    Ok(Image {
        width,
        height,
        components: 4,
        data: rgba.into_raw(),
    })
}
