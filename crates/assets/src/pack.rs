use crate::{AssetError, AssetStore, Generic, Image};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::PathBuf;

pub const PACK_MAGIC: &[u8; 4] = b"WGPK";
pub const PACK_VERSION: u32 = 1;

const HEADER_LEN: usize = 4 + 4 + 32;

#[derive(Serialize, Deserialize)]
struct PackBody {
    next_index: u64,
    names: BTreeMap<String, u64>,
    images: BTreeMap<u64, Image>,
    generics: BTreeMap<u64, Generic>,
}

impl AssetStore {
    /// Serialize every loaded asset into a pack.
    pub fn store(&self) -> Result<Vec<u8>, AssetError> {
        let body = PackBody {
            next_index: self.next_index,
            names: self.names.clone(),
            images: self.images.clone(),
            generics: self.generics.clone(),
        };
        let cbor = cbor_serialize(&body)?;
        let compressed = zstd_compress(&cbor)?;
        let digest = sha256(&compressed);

        let mut out = Vec::with_capacity(HEADER_LEN + compressed.len());
        out.extend_from_slice(PACK_MAGIC);
        out.extend_from_slice(&PACK_VERSION.to_le_bytes());
        out.extend_from_slice(&digest);
        out.extend_from_slice(&compressed);
        tracing::debug!(
            resources = self.names.len(),
            raw = cbor.len(),
            packed = out.len(),
            "assets serialized"
        );
        Ok(out)
    }

    /// Open a pack. Names missing from the pack still load from `root`.
    pub fn from_pack(root: impl Into<PathBuf>, bytes: &[u8]) -> Result<Self, AssetError> {
        if bytes.len() < HEADER_LEN || &bytes[..4] != PACK_MAGIC {
            return Err(AssetError::BadMagic);
        }
        let mut version = [0u8; 4];
        version.copy_from_slice(&bytes[4..8]);
        let version = u32::from_le_bytes(version);
        if version != PACK_VERSION {
            return Err(AssetError::UnsupportedVersion(version));
        }
        let expected = &bytes[8..HEADER_LEN];
        let body = &bytes[HEADER_LEN..];
        let actual = sha256(body);
        if expected != actual.as_slice() {
            return Err(AssetError::IntegrityMismatch {
                expected: hex(expected),
                actual: hex(&actual),
            });
        }

        let cbor = zstd_decompress(body)?;
        let body: PackBody = cbor_deserialize(&cbor)?;
        if let Some(bad) = body.images.values().find(|img| img.data.len() != img.byte_len()) {
            return Err(AssetError::Decode(format!(
                "image data is {} bytes, expected {}",
                bad.data.len(),
                bad.byte_len()
            )));
        }

        let root = root.into();
        tracing::debug!(
            root = %root.display(),
            resources = body.names.len(),
            "assets loaded from pack"
        );
        Ok(Self {
            root,
            next_index: body.next_index,
            names: body.names,
            images: body.images,
            generics: body.generics,
        })
    }
}

fn cbor_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, AssetError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| AssetError::Encode(e.to_string()))?;
    Ok(buf)
}

fn cbor_deserialize<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, AssetError> {
    ciborium::from_reader(data).map_err(|e| AssetError::Decode(e.to_string()))
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, AssetError> {
    let encode = |e: std::io::Error| AssetError::Encode(e.to_string());
    let mut encoder = zstd::Encoder::new(Vec::new(), 19).map_err(encode)?;
    encoder.write_all(data).map_err(encode)?;
    encoder.finish().map_err(encode)
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, AssetError> {
    let decode = |e: std::io::Error| AssetError::Decode(e.to_string());
    let mut decoder = zstd::Decoder::new(data).map_err(decode)?;
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf).map_err(decode)?;
    Ok(buf)
}

fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> (tempfile::TempDir, AssetStore) {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("hello.txt"), "hello pack").unwrap();
        let img = image::RgbaImage::from_raw(1, 2, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        img.save(tmp.path().join("tile.png")).unwrap();

        let mut store = AssetStore::new(tmp.path());
        store.load_generic("hello.txt").unwrap();
        store.load_image("tile.png").unwrap();
        (tmp, store)
    }

    #[test]
    fn pack_round_trip_without_files() {
        let (tmp, store) = sample_store();
        let bytes = store.store().unwrap();
        assert_eq!(&bytes[..4], PACK_MAGIC);
        drop(tmp);

        let mut loaded = AssetStore::from_pack("unused", &bytes).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.load_generic("hello.txt").unwrap().as_string(), "hello pack");
        let image = loaded.load_image("tile.png").unwrap();
        assert_eq!((image.width, image.height), (1, 2));
        assert_eq!(image.data, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn new_loads_continue_index_sequence() {
        let (_tmp, store) = sample_store();
        let bytes = store.store().unwrap();

        let extra = tempfile::tempdir().unwrap();
        std::fs::write(extra.path().join("more.txt"), "more").unwrap();
        let mut loaded = AssetStore::from_pack(extra.path(), &bytes).unwrap();
        loaded.load_generic("more.txt").unwrap();
        assert_eq!(loaded.names["more.txt"], 2);
    }

    #[test]
    fn rejects_bad_magic_and_version() {
        let (_tmp, store) = sample_store();
        let mut bytes = store.store().unwrap();

        assert!(matches!(AssetStore::from_pack(".", b"nope"), Err(AssetError::BadMagic)));

        bytes[4] = 9;
        assert!(matches!(
            AssetStore::from_pack(".", &bytes),
            Err(AssetError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn rejects_corrupted_body() {
        let (_tmp, store) = sample_store();
        let mut bytes = store.store().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(matches!(
            AssetStore::from_pack(".", &bytes),
            Err(AssetError::IntegrityMismatch { .. })
        ));
    }

    #[test]
    fn empty_store_packs() {
        let store = AssetStore::new(".");
        let bytes = store.store().unwrap();
        let loaded = AssetStore::from_pack(".", &bytes).unwrap();
        assert!(loaded.is_empty());
    }
}
