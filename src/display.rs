use std::io;

use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// Display is where the render pump presents frames. It should abstract the
/// implementation details, so a variety of kinds of screen would work.
pub trait Display {
    /// draw a frame: one intensity byte per pixel, row-major, sized to the
    /// display's resolution
    fn draw(&mut self, frame: &[u8]) -> Result<(), io::Error>;

    /// width and height in pixels
    fn resolution(&self) -> (usize, usize);
}

// store useful metadata about the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Resolution(usize, usize);

impl Resolution {
    fn pixel_count(&self) -> usize {
        self.0 * self.1
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// canvas coordinates of every pixel that is (or isn't) lit
    fn points_from_frame<'a>(
        &self,
        frame: &'a [u8],
        lit: bool,
    ) -> impl std::iter::Iterator<Item = (f64, f64)> + 'a {
        let w = self.0;
        frame
            .iter()
            .enumerate()
            .filter(move |(_, intensity)| (**intensity != 0) == lit)
            .map(move |(i, _)| {
                (
                    (i % w) as f64,        // x
                    -1.0 * (i / w) as f64, // y
                )
            })
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
}

impl MonoTermDisplay {
    pub fn new(x: usize, y: usize) -> Result<MonoTermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(MonoTermDisplay {
            terminal,
            resolution: Resolution(x, y),
        })
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, frame: &[u8]) -> Result<(), io::Error> {
        // make sure we're given exactly the right amount of data to draw
        if frame.len() != self.resolution.pixel_count() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "frame has {} pixels, display expects {}",
                    frame.len(),
                    self.resolution.pixel_count()
                ),
            ));
        }

        // for now this assumes a 1:1 ratio between terminal, chip8 and the
        // internal TUI canvas
        let resolution = self.resolution;
        self.terminal.draw(|f| {
            let size = Rect::new(0, 0, 2 + resolution.0 as u16, 2 + resolution.1 as u16);

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &resolution.points_from_frame(frame, false).collect::<Vec<_>>(),
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &resolution.points_from_frame(frame, true).collect::<Vec<_>>(),
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }

    fn resolution(&self) -> (usize, usize) {
        (self.resolution.0, self.resolution.1)
    }
}

/// keeps every presented frame; useful for testing and headless runs
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    width: usize,
    height: usize,
    pub frames: Vec<Vec<u8>>,
}

impl RecordingDisplay {
    pub fn new(width: usize, height: usize) -> Self {
        RecordingDisplay {
            width,
            height,
            frames: Vec::new(),
        }
    }

    pub fn last_frame(&self) -> Option<&[u8]> {
        self.frames.last().map(Vec::as_slice)
    }
}

impl Display for RecordingDisplay {
    fn draw(&mut self, frame: &[u8]) -> Result<(), io::Error> {
        self.frames.push(frame.to_vec());
        Ok(())
    }

    fn resolution(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Resolution tests
    #[test]
    fn test_pixel_count() {
        let r = Resolution(64, 32);
        assert_eq!(r.pixel_count(), 2048)
    }

    #[test]
    fn test_x_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.x_bounds(), [0.0, 63.0]);
    }

    #[test]
    fn test_y_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.y_bounds(), [-31.0, 0.0]);
    }

    #[test]
    fn test_points_split_by_intensity() {
        let r = Resolution(4, 2);
        let frame = [0xff, 0, 0, 0, 0, 0x80, 0, 0];
        let lit: Vec<_> = r.points_from_frame(&frame, true).collect();
        assert_eq!(lit, vec![(0.0, 0.0), (1.0, -1.0)]);
        assert_eq!(r.points_from_frame(&frame, false).count(), 6);
    }

    #[test]
    fn test_blank_frame_has_no_lit_points() {
        let r = Resolution(64, 32);
        assert_eq!(r.points_from_frame(&[0; 2048], true).count(), 0);
    }

    #[test]
    fn test_recording_display() {
        let mut d = RecordingDisplay::new(2, 1);
        assert!(d.last_frame().is_none());
        d.draw(&[1, 0]).unwrap();
        d.draw(&[0, 1]).unwrap();
        assert_eq!(d.frames.len(), 2);
        assert_eq!(d.last_frame(), Some(&[0u8, 1][..]));
        assert_eq!(d.resolution(), (2, 1));
    }
}
