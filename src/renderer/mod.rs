//! Frame composition and drawing surfaces
//!
//! The scene composer turns presentation state into a [`Frame`]: an ordered
//! display list tagged by [`Layer`]. A [`DrawSurface`] replays that list on a
//! concrete backend (Canvas2D in the browser, a recorder in tests and the
//! native replay tool).

pub mod palette;
pub mod scene;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

pub use palette::Rgba;
pub use scene::{PresentationState, SceneOptions, compose};

use glam::Vec2;

/// Draw layers, back to front. Later layers occlude earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Background,
    Boundary,
    Hazards,
    Collectibles,
    CollectibleRings,
    Player,
    Opponent,
    Projectiles,
    Effects,
    CrashMarker,
    Message,
}

/// Soft shadow around a shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub blur: f32,
    pub color: Rgba,
}

/// Rounded panel with centered text lines
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub center: Vec2,
    pub lines: Vec<String>,
    pub font_px: f32,
    pub bold: bool,
    pub text_color: Rgba,
    pub fill: Rgba,
    pub stroke: Rgba,
    pub stroke_width: f32,
    pub corner_radius: f32,
    /// Space between the widest line and the panel edge
    pub padding: Vec2,
    pub line_height: f32,
    pub shadow: Option<Glow>,
}

/// One drawing primitive
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    /// Fill the whole surface
    Clear { color: Rgba },
    Rect {
        pos: Vec2,
        size: Vec2,
        color: Rgba,
        glow: Option<Glow>,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Rgba,
        glow: Option<Glow>,
    },
    /// Stroked arc, angles in radians (0 = +x, clockwise on screen)
    Arc {
        center: Vec2,
        radius: f32,
        start: f32,
        end: f32,
        width: f32,
        color: Rgba,
        glow: Option<Glow>,
    },
    Line {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: Rgba,
    },
    /// Filled rectangle rotated about its center
    Quad {
        center: Vec2,
        size: Vec2,
        rotation: f32,
        color: Rgba,
    },
    /// Radial gradient disc through `palette::EXPLOSION_STOPS`
    Burst {
        center: Vec2,
        radius: f32,
        alpha: f32,
    },
    /// Centered text (glyphs included)
    Text {
        center: Vec2,
        text: String,
        font_px: f32,
        color: Rgba,
    },
    Label(Label),
}

/// Ordered display list for one render tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    items: Vec<(Layer, DrawCmd)>,
    placeholder: bool,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// The "waiting for server" frame
    pub fn placeholder() -> Self {
        Self {
            items: Vec::new(),
            placeholder: true,
        }
    }

    /// Append a command; layers must be pushed back to front
    pub fn push(&mut self, layer: Layer, cmd: DrawCmd) {
        debug_assert!(
            self.items.last().is_none_or(|(last, _)| *last <= layer),
            "layer {layer:?} pushed after a later layer"
        );
        self.items.push((layer, cmd));
    }

    pub fn items(&self) -> &[(Layer, DrawCmd)] {
        &self.items
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Commands drawn on `layer`
    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &DrawCmd> {
        self.items
            .iter()
            .filter(move |(l, _)| *l == layer)
            .map(|(_, cmd)| cmd)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A drawing backend
pub trait DrawSurface {
    fn draw(&mut self, cmd: &DrawCmd);

    /// Replay a whole frame, back to front
    fn present(&mut self, frame: &Frame) {
        for (_, cmd) in frame.items() {
            self.draw(cmd);
        }
    }
}

/// Surface that keeps the last presented frame (tests, headless replay)
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub frames_presented: u64,
    pub last: Frame,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DrawSurface for RecordingSurface {
    fn draw(&mut self, cmd: &DrawCmd) {
        // Loose commands land on the top layer
        self.last.items.push((Layer::Message, cmd.clone()));
    }

    fn present(&mut self, frame: &Frame) {
        self.frames_presented += 1;
        self.last = frame.clone();
    }
}
