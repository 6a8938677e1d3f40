pub mod background;
pub mod bbox;
pub mod config;
pub mod csv;
pub mod detection;
pub mod error;
pub mod event;
pub mod filter;
pub mod frame;
pub mod math;
pub mod motion;
pub mod segment;
pub mod session;
pub mod slot;
pub mod tracker;
pub mod velocity;

#[cfg(feature = "video")]
pub mod capture;
#[cfg(feature = "video")]
pub mod contour;
#[cfg(feature = "video")]
pub mod render;

pub use config::Config;
pub use detection::Blob;
pub use error::Error;
pub use frame::{Frame, GrayImage};
pub use session::{Control, FrameSource, ReportSink, Session};
pub use slot::Slot;
pub use tracker::{FrameReport, MotionTracker};
