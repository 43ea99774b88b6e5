//! Freehand image annotation with linear undo and COCO-style export.

pub mod app;
pub mod canvas;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod session;
pub mod surface;

pub use canvas::Canvas;
pub use export::{encode, ExportDocument};
pub use history::{HistoryLimit, HistoryLog};
pub use session::{Outcome, Session, SessionEvent, SessionSettings};
pub use surface::{AnnotationObject, BrushStyle, DrawingSurface, SessionMode};
