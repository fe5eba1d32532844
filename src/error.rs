use derive_more::{Display, From};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, From)]
pub enum Error {
    #[from]
    #[display("{_0}")]
    Custom(String),

    #[display("missing required environment variables: {}", missing.join(", "))]
    Config { missing: Vec<&'static str> },

    #[display("invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },

    #[display("trend fetch failed: {_0}")]
    Fetch(String),

    #[display("category lookup failed: {_0}")]
    CategoryLookup(String),

    #[display("idea generation failed: {_0}")]
    Generation(String),

    #[display("report could not be written: {_0}")]
    Report(String),

    #[display("report delivery failed: {_0}")]
    Delivery(String),
}

impl Error {
    pub fn custom(val: impl std::fmt::Display) -> Self {
        Self::Custom(val.to_string())
    }
}

impl std::error::Error for Error {}
