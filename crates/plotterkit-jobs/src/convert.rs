//! Image to motion program conversion
//!
//! For every image waiting in the attachments folder: trace it, import and
//! fit the drawing to the plot area, compile it with the pen strategy, then
//! keep the SVG as a companion and queue the program. The source image is
//! removed once its program is queued.

use crate::error::{JobError, JobResult};
use crate::intake::is_image_name;
use crate::job::{job_stem, PROGRAM_EXTENSION};
use plotterkit_camtools::{compile, import_svg, load_block, CamToolError, ProgramSettings, Vectorizer};
use plotterkit_core::{fit_to_area, PlotArea};
use plotterkit_settings::{FolderSettings, PlotterConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Outcome of one conversion sweep
#[derive(Debug, Default)]
pub struct ConversionReport {
    /// Queued program paths
    pub converted: Vec<PathBuf>,
    /// Images that could not be converted, with the reason
    pub failed: Vec<(PathBuf, JobError)>,
}

/// Converts queued images into pending programs
pub struct Converter<V: Vectorizer> {
    vectorizer: V,
    plot_area: PlotArea,
    settings: ProgramSettings,
    folders: FolderSettings,
}

impl<V: Vectorizer> Converter<V> {
    pub fn new(
        vectorizer: V,
        plot_area: PlotArea,
        settings: ProgramSettings,
        folders: FolderSettings,
    ) -> Self {
        Self {
            vectorizer,
            plot_area,
            settings,
            folders,
        }
    }

    /// Build from configuration, reading the preamble and postamble files
    pub fn from_config(vectorizer: V, config: &PlotterConfig) -> JobResult<Self> {
        let block = |file: &Option<PathBuf>| -> JobResult<Vec<String>> {
            match file {
                Some(path) => Ok(load_block(path)?),
                None => Ok(Vec::new()),
            }
        };

        let settings = ProgramSettings {
            feed_rate: config.pen.feed_rate_mm_min,
            tool_down_depth: config.pen.down_position_mm,
            tool_up_height: config.pen.travel_position_mm,
            preamble: block(&config.pen.preamble_file)?,
            postamble: block(&config.pen.postamble_file)?,
            passes: config.pen.passes,
            ..ProgramSettings::default()
        };

        Ok(Self::new(
            vectorizer,
            config.plot_area,
            settings,
            config.folders.clone(),
        ))
    }

    /// Images waiting in the attachments folder, sorted by name
    pub fn pending_images(&self) -> JobResult<Vec<PathBuf>> {
        let dir = &self.folders.attachments;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut images: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| JobError::store(dir, e))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(is_image_name)
                        .unwrap_or(false)
            })
            .collect();
        images.sort();
        Ok(images)
    }

    /// Convert every pending image; one failure does not stop the rest
    pub fn convert_pending(&self) -> JobResult<ConversionReport> {
        let mut report = ConversionReport::default();

        for image in self.pending_images()? {
            match self.convert_image(&image) {
                Ok(program) => report.converted.push(program),
                Err(e) => {
                    error!("Failed to convert {}: {}", image.display(), e);
                    report.failed.push((image, e));
                }
            }
        }

        info!(
            "Converted {} images, {} failed",
            report.converted.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Convert one image and queue its program
    pub fn convert_image(&self, image: &Path) -> JobResult<PathBuf> {
        let name = image
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| JobError::Configuration(format!("bad image name {}", image.display())))?;
        let stem = job_stem(name);

        let svg = self.vectorizer.vectorize(image)?;

        let mut drawing = import_svg(&svg)?;
        if drawing.is_empty() {
            return Err(CamToolError::SvgParse(format!("{} traced to an empty drawing", name)).into());
        }

        let fit = fit_to_area(&mut drawing, &self.plot_area)?;
        info!(
            "Fitted {} ({} curves) with scale {:.4}",
            name,
            drawing.len(),
            fit.scale_factor
        );

        let settings = ProgramSettings {
            title: Some(format!("Plot of {}", name)),
            ..self.settings.clone()
        };
        let program = compile(&drawing, &settings, &settings.pen_strategy())?;

        // Companions only for images that produced a program
        fs::create_dir_all(&self.folders.svgs).map_err(|e| JobError::store(&self.folders.svgs, e))?;
        let svg_path = self.folders.svgs.join(format!("{}.svg", stem));
        fs::write(&svg_path, &svg).map_err(|e| JobError::store(&svg_path, e))?;

        fs::create_dir_all(&self.folders.gcode).map_err(|e| JobError::store(&self.folders.gcode, e))?;
        let program_path = self
            .folders
            .gcode
            .join(format!("{}.{}", stem, PROGRAM_EXTENSION));
        program.write_to(&program_path)?;

        fs::remove_file(image).map_err(|e| JobError::store(image, e))?;
        info!("Queued {}", program_path.display());
        Ok(program_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotterkit_camtools::Result as CamResult;
    use tempfile::TempDir;

    struct FixedVectorizer(&'static str);

    impl Vectorizer for FixedVectorizer {
        fn vectorize(&self, _image: &Path) -> CamResult<String> {
            Ok(self.0.to_string())
        }
    }

    fn converter(dir: &TempDir, svg: &'static str) -> Converter<FixedVectorizer> {
        Converter::new(
            FixedVectorizer(svg),
            PlotArea::new(30.0, 30.0, 210.0, 275.0).unwrap(),
            ProgramSettings::default(),
            FolderSettings::default().rooted_at(dir.path()),
        )
    }

    #[test]
    fn test_empty_trace_is_rejected_and_image_kept() {
        let dir = TempDir::new().unwrap();
        let conv = converter(&dir, "<svg></svg>");
        fs::create_dir_all(&conv.folders.attachments).unwrap();
        let image = conv.folders.attachments.join("blank.png");
        fs::write(&image, b"png").unwrap();

        let report = conv.convert_pending().unwrap();

        assert!(report.converted.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert!(image.exists());
        assert!(!conv.folders.svgs.join("blank.svg").exists());
    }

    #[test]
    fn test_unparseable_trace_leaves_no_companion() {
        let dir = TempDir::new().unwrap();
        let conv = converter(&dir, "tracer printed garbage");
        fs::create_dir_all(&conv.folders.attachments).unwrap();
        let image = conv.folders.attachments.join("cat.png");
        fs::write(&image, b"png").unwrap();

        assert!(conv.convert_image(&image).is_err());

        assert!(image.exists());
        assert!(!conv.folders.svgs.join("cat.svg").exists());
        assert!(!conv.folders.gcode.join("cat.gcode").exists());
    }

    #[test]
    fn test_no_attachments_folder() {
        let dir = TempDir::new().unwrap();
        let conv = converter(&dir, "<svg></svg>");
        assert!(conv.pending_images().unwrap().is_empty());
    }
}
