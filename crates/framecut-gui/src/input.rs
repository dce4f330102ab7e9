//! Pointer and keyboard translation
//!
//! Turns what egui reports for one frame into edit-session events, and
//! queues them so the session sees at most one event per frame.

use framecut_core::session::EventKind;
use framecut_core::InputEvent;
use std::collections::VecDeque;

/// What happened during one UI frame, in display coordinates relative to
/// the top-left corner of the drawn image.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub pointer: Option<(f32, f32)>,
    pub over_image: bool,
    pub moved: bool,
    pub primary_held: bool,
    pub primary_pressed: bool,
    pub primary_released: bool,
    pub secondary_pressed: bool,
    pub double_clicked: bool,
    pub commit: bool,
    pub cancel: bool,
}

/// Events for one frame in the order they happened.
///
/// Pointer activity counts only over the image, except while a drag is in
/// progress so the release is never lost. In the frame of a primary press
/// the press already carries the position, and no move is emitted: a move
/// with the button held would drag whichever box was selected before.
pub fn translate(input: &FrameInput, dragging: bool) -> Vec<InputEvent> {
    let mut events = Vec::new();

    if let Some((x, y)) = input.pointer {
        if input.over_image || dragging {
            if input.moved && !input.primary_pressed {
                events.push(InputEvent::moved(x, y, input.primary_held));
            }
            if input.secondary_pressed {
                events.push(InputEvent::secondary_down(x, y));
            }
            if input.primary_pressed {
                events.push(InputEvent::primary_down(x, y));
            }
            if input.primary_released {
                events.push(InputEvent::primary_up(x, y));
            }
            if input.double_clicked {
                events.push(InputEvent::double_click(x, y));
            }
        }
    }

    if input.commit {
        events.push(InputEvent::commit());
    } else if input.cancel {
        events.push(InputEvent::cancel());
    }

    events
}

/// FIFO of pending events; consecutive moves collapse into the latest one.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<InputEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: InputEvent) {
        let is_move = matches!(event.kind, EventKind::PointerMove);
        if is_move {
            if let Some(last) = self.pending.back_mut() {
                if last.kind == event.kind && last.modifiers == event.modifiers {
                    *last = event;
                    return;
                }
            }
        }
        self.pending.push_back(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = InputEvent>) {
        for event in events {
            self.push(event);
        }
    }

    pub fn pop(&mut self) -> Option<InputEvent> {
        self.pending.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecut_core::config::SessionParams;
    use framecut_core::session::{reduce, EditModel, EditState, PointerButton};
    use framecut_core::Rect;

    fn kinds(events: &[InputEvent]) -> Vec<EventKind> {
        events.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_click_in_one_frame_keeps_order() {
        let input = FrameInput {
            pointer: Some((10.0, 20.0)),
            over_image: true,
            moved: true,
            primary_pressed: true,
            primary_released: true,
            ..FrameInput::default()
        };
        assert_eq!(
            kinds(&translate(&input, false)),
            vec![
                EventKind::PointerDown(PointerButton::Primary),
                EventKind::PointerUp(PointerButton::Primary),
            ]
        );
    }

    #[test]
    fn test_press_on_other_box_only_selects_it() {
        let first = Rect::new(0, 0, 100, 100).unwrap();
        let second = Rect::new(500, 500, 100, 100).unwrap();
        let mut model = EditModel::new(vec![first, second]);
        model.selected = Some(0);

        // egui keeps reporting motion for a while, so the press frame is
        // usually also a moving frame with the button already down
        let press = FrameInput {
            pointer: Some((550.0, 550.0)),
            over_image: true,
            moved: true,
            primary_held: true,
            primary_pressed: true,
            ..FrameInput::default()
        };
        let params = SessionParams::default();
        for event in translate(&press, false) {
            model = reduce(model, &event, 1.0, &params);
        }

        assert_eq!(model.boxes, vec![first, second]);
        assert_eq!(model.selected, Some(1));
        assert_eq!(model.state, EditState::Idle);
    }

    #[test]
    fn test_drag_after_press_moves_the_pressed_box() {
        let first = Rect::new(0, 0, 100, 100).unwrap();
        let second = Rect::new(500, 500, 100, 100).unwrap();
        let mut model = EditModel::new(vec![first, second]);
        model.selected = Some(0);
        let params = SessionParams::default();

        let frames = [
            FrameInput {
                pointer: Some((550.0, 550.0)),
                over_image: true,
                moved: true,
                primary_held: true,
                primary_pressed: true,
                ..FrameInput::default()
            },
            FrameInput {
                pointer: Some((560.0, 570.0)),
                over_image: true,
                moved: true,
                primary_held: true,
                ..FrameInput::default()
            },
        ];
        for frame in &frames {
            let dragging = model.state != EditState::Idle;
            for event in translate(frame, dragging) {
                model = reduce(model, &event, 1.0, &params);
            }
        }

        assert_eq!(model.boxes[0], first);
        assert_eq!(model.boxes[1], Rect::new(510, 520, 100, 100).unwrap());
        assert_eq!(model.state, EditState::DraggingBox { index: 1 });
    }

    #[test]
    fn test_pointer_outside_image_is_ignored_unless_dragging() {
        let input = FrameInput {
            pointer: Some((-5.0, 3.0)),
            over_image: false,
            primary_released: true,
            ..FrameInput::default()
        };
        assert!(translate(&input, false).is_empty());
        assert_eq!(
            translate(&input, true),
            vec![InputEvent::primary_up(-5.0, 3.0)]
        );
    }

    #[test]
    fn test_keys_without_pointer() {
        let commit = FrameInput {
            commit: true,
            cancel: true,
            ..FrameInput::default()
        };
        assert_eq!(translate(&commit, false), vec![InputEvent::commit()]);

        let cancel = FrameInput {
            cancel: true,
            ..FrameInput::default()
        };
        assert_eq!(translate(&cancel, false), vec![InputEvent::cancel()]);
    }

    #[test]
    fn test_queue_collapses_moves_only() {
        let mut queue = EventQueue::default();
        queue.extend([
            InputEvent::moved(1.0, 1.0, true),
            InputEvent::moved(2.0, 2.0, true),
            InputEvent::primary_up(2.0, 2.0),
            InputEvent::moved(3.0, 3.0, false),
        ]);

        assert_eq!(queue.pop(), Some(InputEvent::moved(2.0, 2.0, true)));
        assert_eq!(queue.pop(), Some(InputEvent::primary_up(2.0, 2.0)));
        assert_eq!(queue.pop(), Some(InputEvent::moved(3.0, 3.0, false)));
        assert!(queue.is_empty());
    }
}
