//! Math space to screen space.
//!
//! The viewport is an explicit value: `x_screen = cx + x·scale`,
//! `y_screen = cy − y·scale`. Every primitive of a frame goes through the same
//! [`Viewport::to_screen`] so grid, vectors and labels stay aligned.

use crate::error::{CoreError, CoreResult};
use crate::frame::TransformSnapshot;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HEIGHT: f64 = 400.0;
pub const MIN_WIDTH: f64 = 320.0;
/// Horizontal padding subtracted from the container width.
pub const CONTAINER_PADDING: f64 = 40.0;
/// Fallback width when the container has no measurable width.
pub const MAX_FALLBACK_WIDTH: f64 = 800.0;
pub const WINDOW_GUTTER: f64 = 60.0;
/// Offset of a label from the point it annotates, in pixels.
pub const LABEL_OFFSET: f64 = 5.0;

/// Largest accepted width or height, in pixels.
pub const MAX_DIMENSION: f64 = 16384.0;
/// Smallest accepted background grid spacing, in pixels.
pub const MIN_GRID_SPACING: f64 = 1.0;

/// Deserialised values are checked the same way [`Viewport::with_layout`]
/// checks its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ViewportSpec")]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    /// Pixels per math unit.
    pub scale: f64,
    /// Background grid spacing in pixels.
    pub grid_spacing: f64,
    pub margin: f64,
}

/// Unchecked wire form of a [`Viewport`].
#[derive(Debug, Clone, Copy, Deserialize)]
struct ViewportSpec {
    width: f64,
    height: f64,
    #[serde(default = "default_scale")]
    scale: f64,
    #[serde(default = "default_grid_spacing")]
    grid_spacing: f64,
    #[serde(default = "default_margin")]
    margin: f64,
}

impl TryFrom<ViewportSpec> for Viewport {
    type Error = CoreError;

    fn try_from(spec: ViewportSpec) -> CoreResult<Self> {
        Viewport::with_layout(
            spec.width,
            spec.height,
            spec.scale,
            spec.grid_spacing,
            spec.margin,
        )
    }
}

fn default_scale() -> f64 {
    30.0
}

fn default_grid_spacing() -> f64 {
    20.0
}

fn default_margin() -> f64 {
    20.0
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: DEFAULT_HEIGHT,
            scale: default_scale(),
            grid_spacing: default_grid_spacing(),
            margin: default_margin(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenSegment {
    pub from: ScreenPoint,
    pub to: ScreenPoint,
    /// Drawn heavier: coordinate axes.
    pub emphasized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenLabel {
    pub text: String,
    pub at: ScreenPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenFrame {
    pub width: f64,
    pub height: f64,
    pub background_grid: Vec<ScreenSegment>,
    pub transformed_grid: Vec<ScreenSegment>,
    pub original_basis: [ScreenSegment; 2],
    pub transformed_basis: [ScreenSegment; 2],
    pub original_square: [ScreenPoint; 4],
    pub transformed_square: [ScreenPoint; 4],
    pub eigenrays: Vec<ScreenSegment>,
    pub labels: Vec<ScreenLabel>,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> CoreResult<Self> {
        Self::with_layout(
            width,
            height,
            default_scale(),
            default_grid_spacing(),
            default_margin(),
        )
    }

    pub fn with_layout(
        width: f64,
        height: f64,
        scale: f64,
        grid_spacing: f64,
        margin: f64,
    ) -> CoreResult<Self> {
        for (name, value) in [("width", width), ("height", height)] {
            if !value.is_finite() || value <= 0.0 || value > MAX_DIMENSION {
                return Err(CoreError::invalid_setting(
                    name,
                    value,
                    format!("must be in (0, {MAX_DIMENSION}]"),
                ));
            }
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(CoreError::invalid_setting(
                "scale",
                scale,
                "must be positive and finite",
            ));
        }
        if !grid_spacing.is_finite() || grid_spacing < MIN_GRID_SPACING {
            return Err(CoreError::invalid_setting(
                "grid_spacing",
                grid_spacing,
                format!("must be at least {MIN_GRID_SPACING}"),
            ));
        }
        if !margin.is_finite() || margin < 0.0 {
            return Err(CoreError::invalid_setting(
                "margin",
                margin,
                "must be non-negative and finite",
            ));
        }
        Ok(Self {
            width,
            height,
            scale,
            grid_spacing,
            margin,
        })
    }

    /// Sizes the viewport to a container. Without a container width the
    /// window width (less a gutter, capped) is used instead.
    pub fn fit(container_width: Option<f64>, window_width: f64) -> CoreResult<Self> {
        let available = match container_width {
            Some(w) if w.is_finite() && w > 0.0 => w,
            _ => (window_width - WINDOW_GUTTER).min(MAX_FALLBACK_WIDTH),
        };
        let width = (available - CONTAINER_PADDING).max(MIN_WIDTH);
        Self::new(width, DEFAULT_HEIGHT)
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint {
            x: self.width / 2.0,
            y: self.height / 2.0,
        }
    }

    pub fn to_screen(&self, p: Vector2<f64>) -> ScreenPoint {
        let c = self.center();
        ScreenPoint {
            x: c.x + p.x * self.scale,
            y: c.y - p.y * self.scale,
        }
    }

    fn segment(&self, from: Vector2<f64>, to: Vector2<f64>, emphasized: bool) -> ScreenSegment {
        ScreenSegment {
            from: self.to_screen(from),
            to: self.to_screen(to),
            emphasized,
        }
    }

    fn label(&self, text: impl Into<String>, anchor: Vector2<f64>) -> ScreenLabel {
        let p = self.to_screen(anchor);
        ScreenLabel {
            text: text.into(),
            at: ScreenPoint {
                x: p.x + LABEL_OFFSET,
                y: p.y + LABEL_OFFSET,
            },
        }
    }

    /// Untransformed pixel grid centred on the origin.
    pub fn grid_lines(&self) -> Vec<ScreenSegment> {
        let c = self.center();
        let extent = self.width.min(self.height) / 2.0 - self.margin;
        if extent <= 0.0 || self.grid_spacing <= 0.0 {
            return Vec::new();
        }
        let n = (extent / self.grid_spacing).floor() as i64;
        let mut lines = Vec::new();
        for i in -n..=n {
            let x = c.x + i as f64 * self.grid_spacing;
            if (0.0..=self.width).contains(&x) {
                lines.push(ScreenSegment {
                    from: ScreenPoint { x, y: c.y - extent },
                    to: ScreenPoint { x, y: c.y + extent },
                    emphasized: i == 0,
                });
            }
        }
        for i in -n..=n {
            let y = c.y + i as f64 * self.grid_spacing;
            if (0.0..=self.height).contains(&y) {
                lines.push(ScreenSegment {
                    from: ScreenPoint { x: c.x - extent, y },
                    to: ScreenPoint { x: c.x + extent, y },
                    emphasized: i == 0,
                });
            }
        }
        lines
    }

    pub fn project(&self, frame: &TransformSnapshot) -> ScreenFrame {
        let origin = Vector2::zeros();
        let basis = &frame.basis;

        let mut labels = vec![
            self.label("î", basis.i_original),
            self.label("ĵ", basis.j_original),
            self.label("î'", basis.i_transformed),
            self.label("ĵ'", basis.j_transformed),
        ];
        labels.extend(frame.eigenrays.iter().map(|ray| self.label(ray.label(), ray.tip)));

        ScreenFrame {
            width: self.width,
            height: self.height,
            background_grid: self.grid_lines(),
            transformed_grid: frame
                .grid
                .iter()
                .map(|line| self.segment(line.from, line.to, line.axis))
                .collect(),
            original_basis: [
                self.segment(origin, basis.i_original, false),
                self.segment(origin, basis.j_original, false),
            ],
            transformed_basis: [
                self.segment(origin, basis.i_transformed, false),
                self.segment(origin, basis.j_transformed, false),
            ],
            original_square: frame.original_square.vertices.map(|v| self.to_screen(v)),
            transformed_square: frame.transformed_square.vertices.map(|v| self.to_screen(v)),
            eigenrays: frame
                .eigenrays
                .iter()
                .map(|ray| self.segment(origin, ray.tip, true))
                .collect(),
            labels,
        }
    }
}
