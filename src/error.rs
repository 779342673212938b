pub type WavefadeResult<T> = Result<T, WavefadeError>;

#[derive(thiserror::Error, Debug)]
pub enum WavefadeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("fade conflict: {0}")]
    Conflict(String),

    #[error("caption error: {0}")]
    Caption(String),

    #[error("frame source error: {0}")]
    FrameSource(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("process error: {0}")]
    Process(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WavefadeError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn caption(msg: impl Into<String>) -> Self {
        Self::Caption(msg.into())
    }

    pub fn frame_source(msg: impl Into<String>) -> Self {
        Self::FrameSource(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn process(msg: impl Into<String>) -> Self {
        Self::Process(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            WavefadeError::config("x")
                .to_string()
                .contains("config error:")
        );
        assert!(
            WavefadeError::conflict("x")
                .to_string()
                .contains("fade conflict:")
        );
        assert!(
            WavefadeError::frame_source("x")
                .to_string()
                .contains("frame source error:")
        );
        assert!(
            WavefadeError::encode("x")
                .to_string()
                .contains("encode error:")
        );
        assert!(
            WavefadeError::process("x")
                .to_string()
                .contains("process error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = WavefadeError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
