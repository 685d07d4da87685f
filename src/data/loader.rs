// ============================================================
// Layer 4 — Image Folder Loader
// ============================================================
// Loads CIFAR-style image folders, the layout produced by most
// "CIFAR-10 as PNG" exports:
//
//   <root>/
//     train/  0_frog.png  1_truck.png  ...
//     test/   0_cat.png   1_ship.png   ...
//
// The class is the last `_`-separated part of the file stem.
// Each image is decoded to 8-bit RGB and stored CHW in [0, 1].
// A split is batched as one tensor, so every image must share
// the size of the first one loaded; others are skipped.

use anyhow::{anyhow, Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::class_label::ClassLabel;
use crate::domain::image::ImageSample;
use crate::domain::traits::{ImageSource, Split};

const EXTENSIONS: [&str; 1] = ["png"];

/// Loads every labelled image below `<root>/train` or `<root>/test`.
pub struct ImageFolderLoader {
    root: PathBuf,
}

impl ImageFolderLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn split_dir(&self, split: Split) -> PathBuf {
        match split {
            Split::Train => self.root.join("train"),
            Split::Test  => self.root.join("test"),
        }
    }
}

impl ImageSource for ImageFolderLoader {
    fn load(&self, split: Split) -> Result<Vec<ImageSample>> {
        let dir = self.split_dir(split);

        let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
            .with_context(|| format!("Cannot read directory '{}'", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            })
            .collect();
        // read_dir order is platform dependent
        paths.sort();

        let mut samples: Vec<ImageSample> = Vec::with_capacity(paths.len());
        for path in &paths {
            match load_single_image(path) {
                Ok(sample) => {
                    let expected = samples.first().map(ImageSample::shape);
                    match expected {
                        Some(shape) if shape != sample.shape() => tracing::warn!(
                            "Skipping '{}': size {:?} differs from {:?}",
                            path.display(),
                            sample.shape(),
                            shape
                        ),
                        _ => samples.push(sample),
                    }
                }
                // one unreadable file should not abort the whole split
                Err(e) => tracing::warn!("Skipping '{}': {:#}", path.display(), e),
            }
        }

        tracing::info!(
            "Loaded {} {:?} images from '{}'",
            samples.len(),
            split,
            dir.display()
        );
        Ok(samples)
    }
}

/// Extract the class label from a file name such as `123_airplane.png`.
pub fn label_from_file_name(path: &Path) -> Result<ClassLabel> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("file name is not valid UTF-8"))?;
    let class = stem.rsplit('_').next().unwrap_or(stem);
    ClassLabel::from_name(class).ok_or_else(|| anyhow!("unknown class '{class}'"))
}

fn load_single_image(path: &Path) -> Result<ImageSample> {
    let label = label_from_file_name(path)?;
    let rgb = image::open(path)
        .with_context(|| format!("Cannot decode '{}'", path.display()))?
        .to_rgb8();
    let (width, height) = rgb.dimensions();
    let (width, height) = (width as usize, height as usize);

    // HWC bytes → CHW floats
    let raw = rgb.as_raw();
    let mut pixels = vec![0.0f32; 3 * height * width];
    for y in 0..height {
        for x in 0..width {
            for c in 0..3 {
                pixels[(c * height + y) * width + x] = raw[(y * width + x) * 3 + c] as f32 / 255.0;
            }
        }
    }

    ImageSample::new(pixels, 3, height, width, label)
        .ok_or_else(|| anyhow!("pixel buffer does not match {height}x{width}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_file_name() {
        let label = label_from_file_name(Path::new("train/42_automobile.png")).unwrap();
        assert_eq!(label, ClassLabel::Automobile);
        assert!(label_from_file_name(Path::new("7_unicorn.png")).is_err());
    }

    #[test]
    fn test_loads_png_as_chw() {
        let root = std::env::temp_dir().join(format!("quiz_dnn_folder_{}", std::process::id()));
        let train = root.join("train");
        fs::create_dir_all(&train).unwrap();

        let mut img = image::RgbImage::new(2, 2);
        img.put_pixel(1, 0, image::Rgb([255, 0, 0]));
        img.save(train.join("0_bird.png")).unwrap();
        fs::write(train.join("notes.txt"), "ignored").unwrap();

        let samples = ImageFolderLoader::new(&root).load(Split::Train).unwrap();
        assert_eq!(samples.len(), 1);
        let s = &samples[0];
        assert_eq!(s.label, ClassLabel::Bird);
        assert_eq!(s.shape(), [3, 2, 2]);
        assert!((s.at(0, 0, 1) - 1.0).abs() < 1e-6);
        assert_eq!(s.at(1, 0, 1), 0.0);

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_mixed_sizes_keep_first_shape() {
        let root = std::env::temp_dir().join(format!("quiz_dnn_mixed_{}", std::process::id()));
        let test = root.join("test");
        fs::create_dir_all(&test).unwrap();

        image::RgbImage::new(32, 32).save(test.join("0_cat.png")).unwrap();
        image::RgbImage::new(28, 28).save(test.join("1_dog.png")).unwrap();
        image::RgbImage::new(32, 32).save(test.join("2_ship.png")).unwrap();

        let samples = ImageFolderLoader::new(&root).load(Split::Test).unwrap();
        let labels: Vec<ClassLabel> = samples.iter().map(|s| s.label).collect();
        assert_eq!(labels, vec![ClassLabel::Cat, ClassLabel::Ship]);
        assert!(samples.iter().all(|s| s.shape() == [3, 32, 32]));

        fs::remove_dir_all(&root).ok();
    }
}
