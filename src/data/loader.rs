// ============================================================
// Layer 4 — IDX Dataset Loader
// ============================================================
// Reads MNIST-format IDX files from a local directory.
//
// Expected directory contents (either plain or gzipped):
//   train-images-idx3-ubyte[.gz]   train-labels-idx1-ubyte[.gz]
//   t10k-images-idx3-ubyte[.gz]    t10k-labels-idx1-ubyte[.gz]
//
// Fashion-MNIST ships with exactly the same file names, so the
// same loader serves both datasets; only the class names differ.
//
// IDX layout (all integers big-endian i32):
//   magic (2051 = images, 2049 = labels)
//   dimension sizes (3 for images: count, rows, cols; 1 for labels)
//   payload: one unsigned byte per pixel / label
//
// Downloading the files is not handled here.
//
// Reference: http://yann.lecun.com/exdb/mnist/ (file format)
//            byteorder + flate2 crate documentation

use anyhow::{bail, ensure, Context, Result};
use byteorder::{BigEndian, ReadBytesExt};
use flate2::read::GzDecoder;
use std::{
    fs,
    io::{Cursor, Read},
    path::{Path, PathBuf},
};

use crate::domain::dataset_kind::{DatasetKind, Split};
use crate::domain::image::{ImageSample, IMAGE_PIXELS, IMAGE_SIDE};
use crate::domain::traits::ImageSource;

const IMAGES_MAGIC: i32 = 2051;
const LABELS_MAGIC: i32 = 2049;

/// Loads one dataset's IDX files from a directory.
/// Implements the ImageSource trait from Layer 3.
pub struct IdxLoader {
    dir:   PathBuf,
    kind:  DatasetKind,
    /// Keep only the first N samples of each split
    limit: Option<usize>,
}

impl IdxLoader {
    pub fn new(dir: impl Into<PathBuf>, kind: DatasetKind) -> Self {
        Self { dir: dir.into(), kind, limit: None }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Find `{stem}.gz`, falling back to the uncompressed `{stem}`
    fn resolve(&self, stem: &str) -> Result<PathBuf> {
        let gz = self.dir.join(format!("{stem}.gz"));
        if gz.is_file() {
            return Ok(gz);
        }
        let raw = self.dir.join(stem);
        if raw.is_file() {
            return Ok(raw);
        }
        bail!(
            "Cannot find '{stem}' or '{stem}.gz' in '{}'. \
             Download the {} IDX files into this directory first.",
            self.dir.display(),
            self.kind
        )
    }
}

impl ImageSource for IdxLoader {
    fn load_split(&self, split: Split) -> Result<Vec<ImageSample>> {
        let prefix      = split.file_prefix();
        let images_path = self.resolve(&format!("{prefix}-images-idx3-ubyte"))?;
        let labels_path = self.resolve(&format!("{prefix}-labels-idx1-ubyte"))?;

        let images = parse_images(&read_idx_file(&images_path)?)
            .with_context(|| format!("Invalid image file '{}'", images_path.display()))?;
        let labels = parse_labels(&read_idx_file(&labels_path)?)
            .with_context(|| format!("Invalid label file '{}'", labels_path.display()))?;

        ensure!(
            images.len() == labels.len(),
            "{} split has {} images but {} labels",
            split,
            images.len(),
            labels.len()
        );

        let num_classes = self.kind.num_classes();
        if let Some(bad) = labels.iter().find(|&&l| l as usize >= num_classes) {
            bail!("label {bad} is outside the {num_classes} classes of {}", self.kind);
        }

        let take = self.limit.unwrap_or(usize::MAX);
        let samples: Vec<ImageSample> = images
            .into_iter()
            .zip(labels)
            .take(take)
            .map(|(pixels, label)| ImageSample::new(pixels, label))
            .collect();

        tracing::info!("Loaded {} {} samples of {}", samples.len(), split, self.kind);
        Ok(samples)
    }
}

/// Read a file, transparently gunzipping `.gz` files
fn read_idx_file(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;

    if path.extension().and_then(|e| e.to_str()) != Some("gz") {
        return Ok(bytes);
    }

    let mut contents = Vec::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_end(&mut contents)
        .with_context(|| format!("Cannot decompress '{}'", path.display()))?;
    Ok(contents)
}

/// Parse an IDX3 image buffer into one Vec<u8> of 784 pixels per image
pub fn parse_images(bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut r = Cursor::new(bytes);

    let magic = r.read_i32::<BigEndian>().context("missing magic number")?;
    ensure!(magic == IMAGES_MAGIC, "bad magic number {magic}, expected {IMAGES_MAGIC}");

    let count = read_dim(&mut r, "image count")?;
    let rows  = read_dim(&mut r, "row count")?;
    let cols  = read_dim(&mut r, "column count")?;
    ensure!(
        rows == IMAGE_SIDE && cols == IMAGE_SIDE,
        "images are {rows}x{cols}, expected {IMAGE_SIDE}x{IMAGE_SIDE}"
    );

    let payload = &bytes[r.position() as usize..];
    ensure!(
        payload.len() >= count * IMAGE_PIXELS,
        "truncated payload: {} bytes for {count} images",
        payload.len()
    );

    Ok(payload
        .chunks_exact(IMAGE_PIXELS)
        .take(count)
        .map(|c| c.to_vec())
        .collect())
}

/// Parse an IDX1 label buffer
pub fn parse_labels(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut r = Cursor::new(bytes);

    let magic = r.read_i32::<BigEndian>().context("missing magic number")?;
    ensure!(magic == LABELS_MAGIC, "bad magic number {magic}, expected {LABELS_MAGIC}");

    let count   = read_dim(&mut r, "label count")?;
    let payload = &bytes[r.position() as usize..];
    ensure!(
        payload.len() >= count,
        "truncated payload: {} bytes for {count} labels",
        payload.len()
    );

    Ok(payload[..count].to_vec())
}

fn read_dim(r: &mut Cursor<&[u8]>, what: &str) -> Result<usize> {
    let n = r
        .read_i32::<BigEndian>()
        .with_context(|| format!("missing {what}"))?;
    ensure!(n >= 0, "negative {what}: {n}");
    Ok(n as usize)
}


// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::fixtures::{image_bytes, label_bytes};
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(bytes).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn test_parse_images() {
        let imgs   = vec![vec![1u8; IMAGE_PIXELS], vec![2u8; IMAGE_PIXELS]];
        let parsed = parse_images(&image_bytes(&imgs)).unwrap();
        assert_eq!(parsed, imgs);
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!(parse_labels(&label_bytes(&[7, 2, 1])).unwrap(), vec![7, 2, 1]);
    }

    #[test]
    fn test_rejects_wrong_magic() {
        // A label file is not an image file
        assert!(parse_images(&label_bytes(&[1, 2])).is_err());
        assert!(parse_labels(&image_bytes(&[vec![0u8; IMAGE_PIXELS]])).is_err());
    }

    #[test]
    fn test_rejects_truncated_payload() {
        let mut bytes = image_bytes(&[vec![0u8; IMAGE_PIXELS]]);
        bytes.truncate(bytes.len() - 10);
        assert!(parse_images(&bytes).is_err());

        let mut bytes = label_bytes(&[1, 2, 3]);
        bytes.pop();
        assert!(parse_labels(&bytes).is_err());
    }

    #[test]
    fn test_load_split_from_gz_and_plain_files() {
        let dir = tempfile::tempdir().unwrap();
        let imgs = vec![vec![0u8; IMAGE_PIXELS], vec![255u8; IMAGE_PIXELS], vec![9u8; IMAGE_PIXELS]];

        fs::write(dir.path().join("t10k-images-idx3-ubyte.gz"), gzip(&image_bytes(&imgs))).unwrap();
        fs::write(dir.path().join("t10k-labels-idx1-ubyte"), label_bytes(&[4, 5, 6])).unwrap();

        let loader  = IdxLoader::new(dir.path(), DatasetKind::Mnist);
        let samples = loader.load_split(Split::Test).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[1].label, 5);
        assert_eq!(samples[1].pixels, vec![255u8; IMAGE_PIXELS]);

        let limited = IdxLoader::new(dir.path(), DatasetKind::Mnist)
            .with_limit(Some(2))
            .load_split(Split::Test)
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_count_mismatch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("train-images-idx3-ubyte"),
            image_bytes(&[vec![0u8; IMAGE_PIXELS]]),
        ).unwrap();
        fs::write(dir.path().join("train-labels-idx1-ubyte"), label_bytes(&[1, 2])).unwrap();

        let err = IdxLoader::new(dir.path(), DatasetKind::FashionMnist)
            .load_split(Split::Train)
            .unwrap_err();
        assert!(err.to_string().contains("1 images but 2 labels"));
    }

    #[test]
    fn test_missing_files_name_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = IdxLoader::new(dir.path(), DatasetKind::Mnist)
            .load_split(Split::Train)
            .unwrap_err();
        assert!(err.to_string().contains("train-images-idx3-ubyte"));
    }
}
