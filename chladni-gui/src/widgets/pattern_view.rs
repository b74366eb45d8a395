//! # Pattern View Widget
//!
//! Draws the nodal lines of the current result on a square white plate,
//! the same way the exported PNG looks.

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{mouse, Color, Element, Point, Rectangle, Renderer, Size, Theme};

use chladni_core::Contour;

/// Matches the colour of the exported image.
const LINE_COLOR: Color = Color::from_rgb(0x1f as f32 / 255.0, 0x77 as f32 / 255.0, 0xb4 as f32 / 255.0);
const LINE_WIDTH: f32 = 2.0;
/// Blank border around the plate as a fraction of its side.
const MARGIN: f32 = 0.02;

/// Polylines in plate-relative coordinates, both axes in `[0, 1]`.
pub struct PatternView {
    polylines: Vec<Vec<(f32, f32)>>,
}

impl PatternView {
    pub fn new(contour: Option<&Contour>) -> Self {
        let polylines = contour
            .filter(|c| c.side_length > 0.0)
            .map(|c| {
                let side = c.side_length;
                c.polylines
                    .iter()
                    .map(|line| line.iter().map(|p| ((p.x / side) as f32, (p.y / side) as f32)).collect())
                    .collect()
            })
            .unwrap_or_default();
        Self { polylines }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fill),
        )
        .into()
    }
}

impl<Message> canvas::Program<Message> for PatternView {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        if !bounds.width.is_finite() || !bounds.height.is_finite() {
            return vec![frame.into_geometry()];
        }

        // Keep the plate square and centred in whatever space we get.
        let side = bounds.width.min(bounds.height);
        let origin = Point::new((bounds.width - side) / 2.0, (bounds.height - side) / 2.0);
        frame.fill(&Path::rectangle(origin, Size::new(side, side)), Color::WHITE);

        if self.polylines.is_empty() {
            return vec![frame.into_geometry()];
        }

        let inner = side * (1.0 - 2.0 * MARGIN);
        let to_screen = |(u, v): (f32, f32)| {
            Point::new(
                origin.x + side * MARGIN + u * inner,
                origin.y + side * MARGIN + (1.0 - v) * inner,
            )
        };

        let lines = Path::new(|builder| {
            for line in &self.polylines {
                let mut points = line.iter().map(|&p| to_screen(p));
                if let Some(first) = points.next() {
                    builder.move_to(first);
                    for point in points {
                        builder.line_to(point);
                    }
                }
            }
        });
        frame.stroke(&lines, Stroke::default().with_width(LINE_WIDTH).with_color(LINE_COLOR));

        vec![frame.into_geometry()]
    }
}
