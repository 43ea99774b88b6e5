use eframe::egui;

/// Whether pointer input draws strokes or picks existing objects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionMode {
    #[default]
    Drawing,
    Selection,
}

impl SessionMode {
    pub fn label(self) -> &'static str {
        match self {
            SessionMode::Drawing => "Brush",
            SessionMode::Selection => "Polygon",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrushStyle {
    pub color: egui::Color32,
    pub width: f32,
}

impl Default for BrushStyle {
    fn default() -> Self {
        Self {
            color: egui::Color32::RED,
            width: 5.0,
        }
    }
}

/// Bounding box of one surface object, in surface coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnnotationObject {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// The canvas a session draws on.
///
/// Snapshots are opaque to everyone but the surface that produced them.
pub trait DrawingSurface {
    type Snapshot: Clone;

    fn serialize(&self) -> Self::Snapshot;

    fn restore(&mut self, snapshot: &Self::Snapshot);

    /// `Drawing` enables stroke input; `Selection` disables it. Implementations
    /// may drop their brush settings when stroke input is disabled.
    fn set_mode(&mut self, mode: SessionMode);

    /// Returns `false` when the surface has no brush to update.
    fn set_brush_style(&mut self, brush: BrushStyle) -> bool;

    /// Removes the topmost object under `point`. Returns whether one was hit.
    fn remove_object_at(&mut self, point: egui::Pos2) -> bool;

    /// Current objects in paint order.
    fn objects(&self) -> Vec<AnnotationObject>;

    fn size(&self) -> (u32, u32);

    fn resize(&mut self, width: u32, height: u32);
}
