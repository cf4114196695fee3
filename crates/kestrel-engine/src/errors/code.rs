use std::fmt;

/// Category of a reported error.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum ErrorCode {
    /// Informational entry; not shown as an error.
    NoError,
    #[default]
    Unknown,
    /// Raised by game code built on the engine.
    Game,
    /// Raised by engine internals.
    Engine,
    /// Window or event-loop failure.
    Platform,
    /// GPU adapter, device or surface failure.
    Graphics,
    /// Shader module or pipeline failure.
    Shader,
    /// Input device failure.
    Input,
    /// Texture or font asset failure.
    Texture,
}

impl ErrorCode {
    /// Heading shown above the message.
    pub const fn title(self) -> &'static str {
        match self {
            ErrorCode::NoError => "NO ERROR",
            ErrorCode::Unknown => "UNKNOWN",
            ErrorCode::Game => "GAME",
            ErrorCode::Engine => "ENGINE",
            ErrorCode::Platform => "PLATFORM",
            ErrorCode::Graphics => "GRAPHICS",
            ErrorCode::Shader => "GRAPHICS SHADER",
            ErrorCode::Input => "INPUT",
            ErrorCode::Texture => "TEXTURE MANAGER",
        }
    }

    #[inline]
    pub const fn is_error(self) -> bool {
        !matches!(self, ErrorCode::NoError)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
