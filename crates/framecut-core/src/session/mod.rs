//! Interactive box editing
//!
//! The operator corrects the detected boxes with pointer gestures before
//! anything is cropped. All of the editing logic lives in [`reduce`], a pure
//! function from `(model, event, scale)` to the next model; [`EditSession`]
//! wraps it with the commit/cancel lifecycle. Front-ends only translate their
//! native input into [`InputEvent`]s and draw [`EditSession::boxes`].


use crate::config::SessionParams;
use crate::geometry::{Point, Rect};

/// Corner of a box, in anchor order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// Position of this corner on `rect`.
    pub fn of(self, rect: &Rect) -> Point {
        let (x, y) = match self {
            Corner::TopLeft => (rect.x(), rect.y()),
            Corner::TopRight => (rect.right(), rect.y()),
            Corner::BottomLeft => (rect.x(), rect.bottom()),
            Corner::BottomRight => (rect.right(), rect.bottom()),
        };
        Point::new(x as f32, y as f32)
    }

    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }

    /// Rebuild `rect` with this corner moved to `(x, y)` and the opposite
    /// corner fixed. `None` if the result would be degenerate.
    pub fn drag(self, rect: &Rect, x: i32, y: i32) -> Option<Rect> {
        match self {
            Corner::TopLeft => Rect::from_corners(x, y, rect.right(), rect.bottom()),
            Corner::TopRight => Rect::from_corners(rect.x(), y, x, rect.bottom()),
            Corner::BottomLeft => Rect::from_corners(x, rect.y(), rect.right(), y),
            Corner::BottomRight => Rect::from_corners(rect.x(), rect.y(), x, y),
        }
    }
}

/// What the pointer is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    DraggingAnchor { index: usize, corner: Corner },
    DraggingBox { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    PointerDown(PointerButton),
    PointerMove,
    PointerUp(PointerButton),
    DoubleClick,
    Commit,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Primary button held during a move.
    pub primary_held: bool,
}

/// One pointer or keyboard event in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    pub kind: EventKind,
    pub position: Point,
    pub modifiers: Modifiers,
}

impl InputEvent {
    pub fn new(kind: EventKind, x: f32, y: f32) -> Self {
        Self {
            kind,
            position: Point::new(x, y),
            modifiers: Modifiers::default(),
        }
    }

    pub fn primary_down(x: f32, y: f32) -> Self {
        Self::new(EventKind::PointerDown(PointerButton::Primary), x, y)
    }

    pub fn secondary_down(x: f32, y: f32) -> Self {
        Self::new(EventKind::PointerDown(PointerButton::Secondary), x, y)
    }

    pub fn primary_up(x: f32, y: f32) -> Self {
        Self::new(EventKind::PointerUp(PointerButton::Primary), x, y)
    }

    /// Pointer motion; `primary_held` reports the button state.
    pub fn moved(x: f32, y: f32, primary_held: bool) -> Self {
        Self {
            modifiers: Modifiers { primary_held },
            ..Self::new(EventKind::PointerMove, x, y)
        }
    }

    pub fn double_click(x: f32, y: f32) -> Self {
        Self::new(EventKind::DoubleClick, x, y)
    }

    pub fn commit() -> Self {
        Self::new(EventKind::Commit, 0.0, 0.0)
    }

    pub fn cancel() -> Self {
        Self::new(EventKind::Cancel, 0.0, 0.0)
    }
}

/// The editable state: ordered boxes, pointer state and selection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditModel {
    pub boxes: Vec<Rect>,
    pub state: EditState,
    pub selected: Option<usize>,
}

impl EditModel {
    pub fn new(boxes: Vec<Rect>) -> Self {
        Self {
            boxes,
            ..Self::default()
        }
    }

    /// First `(index, corner)` whose anchor lies within `radius` of `point`.
    pub fn anchor_at(&self, point: Point, radius: f32) -> Option<(usize, Corner)> {
        let radius_sq = radius * radius;
        self.boxes.iter().enumerate().find_map(|(index, rect)| {
            Corner::ALL
                .into_iter()
                .find(|corner| corner.of(rect).distance_squared(point) <= radius_sq)
                .map(|corner| (index, corner))
        })
    }

    /// First box containing `point`.
    pub fn box_at(&self, point: Point) -> Option<usize> {
        self.boxes.iter().position(|rect| rect.contains(point))
    }
}

/// Display scale that fits an `image_size` image inside a `window_size` window.
pub fn fit_scale(image_size: (u32, u32), window_size: (f32, f32)) -> f32 {
    let (w, h) = image_size;
    if w == 0 || h == 0 {
        return 1.0;
    }
    let scale = (window_size.0 / w as f32).min(window_size.1 / h as f32);
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

/// Apply one event to the model.
///
/// `scale` is the display scale: event positions are divided by it, and the
/// anchor radius is in display pixels. Commit and cancel are lifecycle
/// events handled by [`EditSession`] and leave the model untouched, as does
/// any event arriving with a non-positive scale.
pub fn reduce(
    mut model: EditModel,
    event: &InputEvent,
    scale: f32,
    params: &SessionParams,
) -> EditModel {
    if !(scale.is_finite() && scale > 0.0) {
        return model;
    }
    let point = event.position.unscaled(scale);
    let (px, py) = (point.x.floor() as i32, point.y.floor() as i32);

    match event.kind {
        EventKind::PointerDown(PointerButton::Primary) => {
            model.state = EditState::Idle;
            if let Some((index, corner)) = model.anchor_at(point, params.anchor_radius / scale) {
                model.state = EditState::DraggingAnchor { index, corner };
                model.selected = Some(index);
            } else {
                model.selected = model.box_at(point);
            }
        }
        EventKind::PointerDown(PointerButton::Secondary) => {
            if model.state == EditState::Idle {
                let size = params.new_box_size;
                if let Some(rect) = Rect::centered_at(point, size, size) {
                    model.boxes.push(rect);
                    model.selected = None;
                }
            }
        }
        EventKind::PointerMove => match model.state {
            EditState::DraggingAnchor { index, corner } => {
                if let Some(updated) = model
                    .boxes
                    .get(index)
                    .and_then(|rect| corner.drag(rect, px, py))
                {
                    model.boxes[index] = updated;
                }
            }
            EditState::DraggingBox { index } if event.modifiers.primary_held => {
                recenter(&mut model.boxes, index, point);
            }
            EditState::Idle if event.modifiers.primary_held => {
                if let Some(index) = model.selected.filter(|&i| i < model.boxes.len()) {
                    model.state = EditState::DraggingBox { index };
                    recenter(&mut model.boxes, index, point);
                }
            }
            _ => {}
        },
        EventKind::PointerUp(PointerButton::Primary) => {
            model.state = EditState::Idle;
        }
        EventKind::PointerUp(PointerButton::Secondary) => {}
        EventKind::DoubleClick => {
            model.state = EditState::Idle;
            if let Some(index) = model.box_at(point) {
                model.boxes.remove(index);
                model.selected = None;
            }
        }
        EventKind::Commit | EventKind::Cancel => {}
    }

    model
}

fn recenter(boxes: &mut [Rect], index: usize, center: Point) {
    if let Some(moved) = boxes
        .get(index)
        .and_then(|rect| Rect::centered_at(center, rect.width(), rect.height()))
    {
        boxes[index] = moved;
    }
}

/// Result of feeding one event to an [`EditSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// Editing continues.
    Continue,
    /// The operator accepted these boxes.
    Committed(Vec<Rect>),
    /// The operator discarded every edit.
    Cancelled,
}

/// One editing pass over one image.
///
/// The session exclusively owns its box list and pointer state. Once it has
/// committed or cancelled, further events are ignored.
#[derive(Debug, Clone)]
pub struct EditSession {
    model: EditModel,
    initial: Vec<Rect>,
    scale: f32,
    params: SessionParams,
    finished: bool,
}

impl EditSession {
    pub fn new(boxes: Vec<Rect>, params: SessionParams) -> Self {
        Self {
            model: EditModel::new(boxes.clone()),
            initial: boxes,
            scale: 1.0,
            params,
            finished: false,
        }
    }

    /// Update the display scale; non-positive values are ignored.
    pub fn set_scale(&mut self, scale: f32) {
        if scale.is_finite() && scale > 0.0 {
            self.scale = scale;
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn boxes(&self) -> &[Rect] {
        &self.model.boxes
    }

    pub fn state(&self) -> EditState {
        self.model.state
    }

    pub fn selected(&self) -> Option<usize> {
        self.model.selected
    }

    /// Whether the boxes differ from the ones the session started with.
    pub fn is_modified(&self) -> bool {
        self.model.boxes != self.initial
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Apply one event and report whether the session ended.
    pub fn handle(&mut self, event: &InputEvent) -> SessionOutcome {
        if self.finished {
            return SessionOutcome::Continue;
        }

        match event.kind {
            EventKind::Commit => {
                self.finished = true;
                log::debug!("Edit session committed {} box(es)", self.model.boxes.len());
                SessionOutcome::Committed(std::mem::take(&mut self.model.boxes))
            }
            EventKind::Cancel => {
                self.finished = true;
                self.model = EditModel::new(self.initial.clone());
                log::debug!("Edit session cancelled");
                SessionOutcome::Cancelled
            }
            _ => {
                let model = std::mem::take(&mut self.model);
                self.model = reduce(model, event, self.scale, &self.params);
                SessionOutcome::Continue
            }
        }
    }
}
