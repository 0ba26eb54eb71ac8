use iced::{
    mouse::Cursor,
    widget::canvas::{self, Frame, Geometry, Path, Stroke},
    Color, Point, Rectangle, Renderer, Size, Theme,
};
use std::sync::Arc;

/// A live polyline trace of the latest audio sample buffer.
///
/// Samples are bytes with 128 at silence. When no source is attached or
/// playback is stopped, a flat center line is drawn instead of a waveform;
/// "ready but silent" rather than blank.
#[derive(Clone, Debug)]
pub struct Oscilloscope {
    pub samples: Option<Arc<Vec<u8>>>,
    pub playing: bool,
    pub color: Color,
    pub background: Color,
    pub line_width: f32,
}

impl Oscilloscope {
    fn is_idle(&self) -> bool {
        !self.playing || self.samples.as_ref().map_or(true, |samples| samples.is_empty())
    }

    /// Trace points at even horizontal spacing, terminating at the vertical
    /// center on the right edge. Works for whatever buffer length the audio
    /// source currently reports.
    fn trace(samples: &[u8], size: Size) -> Vec<Point> {
        let step = size.width / samples.len() as f32;
        let half_height = size.height / 2.0;

        samples
            .iter()
            .enumerate()
            .map(|(i, &sample)| {
                Point::new(
                    i as f32 * step,
                    f32::from(sample) / 128.0 * half_height,
                )
            })
            .chain(std::iter::once(Point::new(size.width, half_height)))
            .collect()
    }
}

impl<Message> canvas::Program<Message> for Oscilloscope {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let size = frame.size();

        frame.fill_rectangle(Point::ORIGIN, size, self.background);

        let path = match self.samples.as_deref() {
            Some(samples) if !self.is_idle() => {
                let points = Self::trace(samples, size);

                Path::new(|builder| {
                    builder.move_to(points[0]);

                    for &point in &points[1..] {
                        builder.line_to(point);
                    }
                })
            }
            _ => Path::line(
                Point::new(0.0, size.height / 2.0),
                Point::new(size.width, size.height / 2.0),
            ),
        };

        frame.stroke(
            &path,
            Stroke::default()
                .with_color(self.color)
                .with_width(self.line_width),
        );

        vec![frame.into_geometry()]
    }
}
