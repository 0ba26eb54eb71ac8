use crate::{notes::NoteEvent, theme::ThemePalette};
use iced::{
    advanced::{
        layout::{Limits, Node},
        renderer::{Quad, Style},
        widget::Tree,
        Layout, Renderer as _, Widget,
    },
    border,
    mouse::Cursor,
    Color, Element, Length, Point, Rectangle, Renderer, Shadow, Size, Theme, Vector,
};
use std::sync::Arc;

/// Length of the visible time window, in seconds.
pub const TIME_WINDOW: f32 = 10.0;

/// The playhead sits at this fraction of the width; notes scroll towards it
/// from the right.
pub const PLAYHEAD_FRACTION: f32 = 0.25;

/// Lowest rendered pitch (A0); the range covers the 88 keys of a piano.
pub const LOWEST_KEY: u8 = 21;
const KEY_COUNT: f32 = 88.0;

/// Zero-length notes still get this many pixels so they stay visible.
const MIN_NOTE_WIDTH: f32 = 3.0;

/// Off-screen test margin, so partially visible edge notes aren't culled.
const CULL_MARGIN: f32 = 100.0;

const CORNER_RADIUS: f32 = 2.0;

/// A scrolling time-window view of the loaded notes.
///
/// Drawing is pure: everything comes from the fields below and the layout
/// bounds, and the whole surface is repainted on every call.
#[derive(Clone, Debug)]
pub struct PianoRoll {
    pub notes: Arc<Vec<NoteEvent>>,
    pub current_time: f32,
    pub palette: ThemePalette,
}

impl PianoRoll {
    /// Where `note` lands on a surface of `size` at `current_time`.
    ///
    /// X position is linear in `start - current_time`; a note starting right
    /// now sits exactly on the playhead. Lower pitches render nearer the
    /// bottom.
    fn note_bounds(note: &NoteEvent, current_time: f32, size: Size) -> Rectangle {
        let pixels_per_second = size.width / TIME_WINDOW;
        let key_height = size.height / KEY_COUNT;

        let x = (note.start as f32 - current_time)
            .mul_add(pixels_per_second, size.width * PLAYHEAD_FRACTION);
        let y = (f32::from(note.key) - f32::from(LOWEST_KEY) + 1.0)
            .mul_add(-key_height, size.height);

        Rectangle::new(
            Point::new(x, y),
            Size::new(
                (note.duration as f32 * pixels_per_second).max(MIN_NOTE_WIDTH),
                key_height,
            ),
        )
    }

    /// Cheap horizontal culling test with a margin for edge notes.
    fn is_visible(bounds: Rectangle, width: f32) -> bool {
        bounds.x + bounds.width >= -CULL_MARGIN && bounds.x <= width + CULL_MARGIN
    }
}

impl<Message> Widget<Message, Theme, Renderer> for PianoRoll {
    fn size(&self) -> Size<Length> {
        Size::new(Length::Fill, Length::Fill)
    }

    fn layout(&self, _tree: &mut Tree, _renderer: &Renderer, limits: &Limits) -> Node {
        Node::new(limits.max())
    }

    fn draw(
        &self,
        _tree: &Tree,
        renderer: &mut Renderer,
        _theme: &Theme,
        _style: &Style,
        layout: Layout<'_>,
        _cursor: Cursor,
        viewport: &Rectangle,
    ) {
        let Some(bounds) = layout.bounds().intersection(viewport) else {
            return;
        };

        let dark = self.palette.is_dark();
        let origin = Vector::new(bounds.x, bounds.y);

        renderer.with_layer(bounds, |renderer| {
            renderer.fill_quad(
                Quad {
                    bounds,
                    ..Quad::default()
                },
                self.palette.background_color(),
            );

            for note in self.notes.iter() {
                let note_bounds = Self::note_bounds(note, self.current_time, bounds.size());

                if !Self::is_visible(note_bounds, bounds.width) {
                    continue;
                }

                let note_bounds = note_bounds + origin;
                let color = self.palette.track_color(note.track, note.channel);

                if note.is_active(f64::from(self.current_time)) {
                    Self::draw_active_note(renderer, note_bounds, color, dark);
                } else {
                    Self::draw_inactive_note(renderer, note_bounds, color, dark);
                }
            }

            Self::draw_playhead(renderer, bounds, dark);
        });
    }
}

impl PianoRoll {
    /// Currently sounding notes pop: a glow in the note's own color, a
    /// slightly enlarged box, and a pure white fill on dark backgrounds.
    fn draw_active_note(renderer: &mut Renderer, bounds: Rectangle, color: Color, dark: bool) {
        let bounds = Rectangle {
            x: bounds.x - 1.0,
            y: bounds.y - 1.0,
            width: bounds.width + 2.0,
            height: bounds.height + 2.0,
        };

        renderer.fill_quad(
            Quad {
                bounds,
                border: border::rounded(CORNER_RADIUS),
                shadow: Shadow {
                    color,
                    offset: Vector::ZERO,
                    blur_radius: 8.0,
                },
            },
            if dark { Color::WHITE } else { color },
        );
    }

    /// Upcoming and past notes sit back: slightly translucent, with a small
    /// drop shadow against the background.
    fn draw_inactive_note(renderer: &mut Renderer, bounds: Rectangle, color: Color, dark: bool) {
        let shadow_color = if dark {
            Color::WHITE.scale_alpha(0.25)
        } else {
            Color::BLACK.scale_alpha(0.3)
        };

        renderer.fill_quad(
            Quad {
                bounds,
                border: border::rounded(CORNER_RADIUS),
                shadow: Shadow {
                    color: shadow_color,
                    offset: Vector::new(0.0, 1.0),
                    blur_radius: 3.0,
                },
            },
            color.scale_alpha(0.9),
        );
    }

    fn draw_playhead(renderer: &mut Renderer, bounds: Rectangle, dark: bool) {
        let line = Rectangle::new(
            Point::new(
                bounds.width.mul_add(PLAYHEAD_FRACTION, bounds.x) - 1.0,
                bounds.y,
            ),
            Size::new(2.0, bounds.height),
        );

        renderer.fill_quad(
            Quad {
                bounds: line,
                ..Quad::default()
            },
            if dark {
                Color::WHITE.scale_alpha(0.5)
            } else {
                Color::BLACK.scale_alpha(0.5)
            },
        );
    }
}

impl<'a, Message> From<PianoRoll> for Element<'a, Message, Theme, Renderer> {
    fn from(value: PianoRoll) -> Self {
        Self::new(value)
    }
}
