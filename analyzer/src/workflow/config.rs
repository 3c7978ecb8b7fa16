use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use rallycore::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Directory of still frames; the synthetic generator is used when absent.
    pub images: Option<PathBuf>,
    pub fps: Option<f64>,
    /// Landmark sidecar exported by an external pose tool.
    pub landmarks: Option<PathBuf>,
    pub synthetic: GeneratorConfig,
    pub output: Option<PathBuf>,
    pub pipeline: PipelineConfig,
}

impl WorkflowConfig {
    pub const DEFAULT_IMAGE_FPS: f64 = 30.0;

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        images: Option<PathBuf>,
        fps: Option<f64>,
        landmarks: Option<PathBuf>,
        seed: Option<u64>,
        output: Option<PathBuf>,
    ) -> Self {
        let mut config = Self {
            images,
            fps,
            landmarks,
            output,
            ..Default::default()
        };
        if let Some(seed) = seed {
            config.synthetic.seed = seed;
        }
        config
    }

    /// Flags given on the command line win over values loaded from YAML.
    pub fn with_overrides(mut self, overrides: WorkflowConfig) -> Self {
        self.images = overrides.images.or(self.images);
        self.fps = overrides.fps.or(self.fps);
        self.landmarks = overrides.landmarks.or(self.landmarks);
        self.output = overrides.output.or(self.output);
        if overrides.synthetic.seed != GeneratorConfig::default().seed {
            self.synthetic.seed = overrides.synthetic.seed;
        }
        self
    }

    pub fn image_fps(&self) -> f64 {
        self.fps.unwrap_or(Self::DEFAULT_IMAGE_FPS)
    }

    pub fn to_pipeline_config(&self) -> PipelineConfig {
        self.pipeline.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_produces_pipeline_config() {
        let cfg = WorkflowConfig::from_args(Some("frames".into()), Some(60.0), None, Some(9), None);
        assert_eq!(cfg.image_fps(), 60.0);
        assert_eq!(cfg.synthetic.seed, 9);
        assert_eq!(cfg.to_pipeline_config(), PipelineConfig::default());
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"fps: 25\nsynthetic:\n  seed: 7\n  flights: [drive, lob]\npipeline:\n  sampling:\n    rally_gap_secs: 1.5\n  ball:\n    min_area: 30\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.image_fps(), 25.0);
        assert_eq!(cfg.synthetic.seed, 7);
        assert_eq!(cfg.synthetic.width, 320);
        assert_eq!(cfg.pipeline.sampling.rally_gap_secs, Some(1.5));
        assert_eq!(cfg.pipeline.ball.min_area, 30.0);
        assert_eq!(cfg.pipeline.ball.max_area, 5000.0);
    }

    #[test]
    fn config_load_names_missing_file() {
        let err = WorkflowConfig::load("/nonexistent/workflow.yaml").unwrap_err();
        assert!(format!("{}", err).contains("reading workflow config"));
    }

    #[test]
    fn cli_overrides_yaml_values() {
        let base = WorkflowConfig {
            fps: Some(24.0),
            images: Some("a".into()),
            ..Default::default()
        };
        let merged = base.with_overrides(WorkflowConfig::from_args(None, Some(50.0), None, Some(3), None));
        assert_eq!(merged.fps, Some(50.0));
        assert_eq!(merged.images, Some(PathBuf::from("a")));
        assert_eq!(merged.synthetic.seed, 3);
    }
}
