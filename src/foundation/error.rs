pub type MatvizResult<T> = Result<T, MatvizError>;

#[derive(thiserror::Error, Debug)]
pub enum MatvizError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MatvizError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            MatvizError::config("x")
                .to_string()
                .contains("configuration error:")
        );
        assert!(MatvizError::render("x").to_string().contains("render error:"));
        assert!(MatvizError::encode("x").to_string().contains("encode error:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = MatvizError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
