use crate::cache::CacheParams;
use crate::foundation::core::Dims;
use crate::foundation::error::{MatvizError, MatvizResult};
use crate::traversal::Variant;

/// Flat configuration record for one animation run.
///
/// The CLI (or any other front end) builds this from its own flags; the
/// simulator performs no parsing itself. `validate()` houses every
/// configuration check so errors surface before any output is produced.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SimConfig {
    /// Free text appended to the frame title.
    pub title: String,
    pub dims: Dims,
    pub variant: Variant,
    /// Frames per second of the encoded video.
    pub fps: u32,
    /// Raster scale: frames are `380*scale x 200*scale` pixels.
    pub scale: u32,
    /// Draw the linear-memory strips under the grids.
    pub show_linear: bool,
    pub cache: CacheParams,
}

impl SimConfig {
    /// A config with the defaults of the reference animation: 12x12x12,
    /// 24 fps, 3x raster scale, linear view on.
    pub fn new(title: impl Into<String>, dims: Dims, variant: Variant) -> Self {
        Self {
            title: title.into(),
            dims,
            variant,
            fps: 24,
            scale: 3,
            show_linear: true,
            cache: CacheParams::default(),
        }
    }

    pub fn validate(&self) -> MatvizResult<()> {
        Dims::new(self.dims.m, self.dims.n, self.dims.k)?;
        self.variant.validate()?;
        self.cache.validate()?;
        if self.fps == 0 {
            return Err(MatvizError::config("fps must be > 0"));
        }
        if self.scale == 0 {
            return Err(MatvizError::config("raster scale must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SimConfig {
        SimConfig::new("test", Dims::square(4).unwrap(), Variant::Naive)
    }

    #[test]
    fn defaults_are_valid() {
        base().validate().unwrap();
    }

    #[test]
    fn invalid_fields_are_config_errors() {
        let mut cfg = base();
        cfg.fps = 0;
        assert!(matches!(cfg.validate(), Err(MatvizError::Config(_))));

        let mut cfg = base();
        cfg.scale = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = base();
        cfg.dims.n = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = base();
        cfg.variant = Variant::Blocked2 {
            block1: 4,
            block2: 0,
        };
        assert!(cfg.validate().is_err());

        let mut cfg = base();
        cfg.cache.line_size = 6;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = SimConfig::new(
            "blocked demo",
            Dims::square(8).unwrap(),
            Variant::Blocked {
                block1: 4,
                l1: Some(2),
            },
        );
        let json = serde_json::to_string(&cfg).unwrap();
        let back: SimConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.dims, cfg.dims);
        assert_eq!(back.variant, cfg.variant);
        assert_eq!(back.title, cfg.title);
    }
}
