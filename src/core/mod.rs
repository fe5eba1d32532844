pub mod aggregate;
pub mod ideas;
pub mod mailer;
pub mod pipeline;
pub mod ranking;
pub mod spreadsheet;
pub mod trending;

pub use ideas::*;
pub use mailer::*;
pub use pipeline::*;
pub use spreadsheet::*;
pub use trending::*;
