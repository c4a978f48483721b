use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, Show};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use thiserror::Error;

use crate::gesture::{HandleKind, PointerButton, PointerInput};
use crate::registry::ItemId;
use crate::render::Styler;
use crate::runtime::autoscroll::ScrollMetrics;
use crate::runtime::{EventFlow, LayoutContainer};
use crate::{LayoutError, PixelRect, Point, ScrollPosition};

pub type DriverResult<T> = std::result::Result<T, TerminalDriverError>;

#[derive(Debug, Error)]
pub enum TerminalDriverError {
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Rows moved per wheel notch.
const WHEEL_ROWS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverControl {
    Continue,
    Exit,
}

/// Translates crossterm input into container calls.
///
/// Terminal cells are mapped to a pixel space of `cell_width` x
/// `cell_height` per cell so the container works exactly as it would in a
/// browser. The top cell row of an item is its drag handle and its
/// bottom-right cell is the resize handle.
#[derive(Debug, Clone)]
pub struct TerminalPointer {
    cell_width: f64,
    cell_height: f64,
    viewport: PixelRect,
}

impl Default for TerminalPointer {
    fn default() -> Self {
        Self::new(8.0, 16.0)
    }
}

impl TerminalPointer {
    pub fn new(cell_width: f64, cell_height: f64) -> Self {
        Self {
            cell_width: cell_width.max(1.0),
            cell_height: cell_height.max(1.0),
            viewport: PixelRect::default(),
        }
    }

    pub fn viewport(&self) -> PixelRect {
        self.viewport
    }

    /// Pixel point at the center of a terminal cell.
    pub fn cell_center(&self, column: u16, row: u16) -> Point {
        Point::new(
            (f64::from(column) + 0.5) * self.cell_width,
            (f64::from(row) + 0.5) * self.cell_height,
        )
    }

    /// Item and handle under `point`, if the point lies on a handle.
    pub fn hit_test<S: Styler>(
        &self,
        container: &LayoutContainer<S>,
        point: Point,
    ) -> Option<(ItemId, HandleKind)> {
        for id in container.ordered_items() {
            let Some(frame) = container.item_client_frame(id) else {
                continue;
            };
            if !frame.contains(point) {
                continue;
            }
            if point.x >= frame.right() - self.cell_width
                && point.y >= frame.bottom() - self.cell_height
            {
                return Some((id.clone(), HandleKind::Resize));
            }
            if point.y < frame.top + self.cell_height {
                return Some((id.clone(), HandleKind::Drag));
            }
            return None;
        }
        None
    }

    /// Terminal resized to `columns` x `rows` cells.
    pub fn resize<S: Styler>(&mut self, container: &mut LayoutContainer<S>, columns: u16, rows: u16) {
        let width = f64::from(columns) * self.cell_width;
        self.viewport = PixelRect::new(0.0, 0.0, width, f64::from(rows) * self.cell_height);
        container.set_viewport_width(width);
        let top = container.scroll_metrics().position.top;
        container.set_container_rect(PixelRect::new(0.0, -top, width, container.content_height()));
        self.sync_bounds(container);
    }

    /// Refresh the scroll range after the content height changed.
    pub fn sync_bounds<S: Styler>(&self, container: &mut LayoutContainer<S>) {
        let content = container.content_height();
        let position = container.scroll_metrics().position;
        container.set_scroll_metrics(ScrollMetrics::new(
            self.viewport,
            position,
            content - self.viewport.height,
        ));
        let rect = container.container_rect();
        if rect.height != content {
            container.set_container_rect(PixelRect { height: content, ..rect });
        }
    }

    pub fn handle_event<S: Styler>(
        &mut self,
        container: &mut LayoutContainer<S>,
        event: &Event,
        at: Duration,
    ) -> DriverControl {
        match event {
            Event::Key(key) => return self.handle_key(container, key),
            Event::Mouse(mouse) => {
                self.handle_mouse(container, mouse, at);
            }
            Event::Resize(columns, rows) => self.resize(container, *columns, *rows),
            _ => {}
        }
        DriverControl::Continue
    }

    pub fn handle_mouse<S: Styler>(
        &mut self,
        container: &mut LayoutContainer<S>,
        mouse: &MouseEvent,
        at: Duration,
    ) -> EventFlow {
        let point = self.cell_center(mouse.column, mouse.row);
        let input = |button: MouseButton| {
            PointerInput::mouse(point.x, point.y, at.as_millis() as u64)
                .with_button(map_button(button))
        };
        match mouse.kind {
            MouseEventKind::Down(button) => match self.hit_test(container, point) {
                Some((id, handle)) => container.pointer_down(&id, handle, input(button)),
                None => EventFlow::Continue,
            },
            MouseEventKind::Drag(button) => {
                container.pointer_move(input(button));
                EventFlow::Consumed
            }
            MouseEventKind::Moved => {
                container.pointer_move(input(MouseButton::Left));
                EventFlow::Continue
            }
            MouseEventKind::Up(button) => {
                container.pointer_up(input(button));
                EventFlow::Consumed
            }
            MouseEventKind::ScrollDown => {
                self.scroll_by(container, WHEEL_ROWS * self.cell_height);
                EventFlow::Consumed
            }
            MouseEventKind::ScrollUp => {
                self.scroll_by(container, -WHEEL_ROWS * self.cell_height);
                EventFlow::Consumed
            }
            _ => EventFlow::Continue,
        }
    }

    fn handle_key<S: Styler>(
        &mut self,
        container: &mut LayoutContainer<S>,
        key: &KeyEvent,
    ) -> DriverControl {
        if key.kind != KeyEventKind::Press {
            return DriverControl::Continue;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                DriverControl::Exit
            }
            KeyCode::Char('q') => DriverControl::Exit,
            KeyCode::Char('e') => {
                container.set_editable(!container.is_editable());
                DriverControl::Continue
            }
            _ => DriverControl::Continue,
        }
    }

    fn scroll_by<S: Styler>(&self, container: &mut LayoutContainer<S>, amount: f64) {
        let scroll = container.scroll_metrics();
        let top = (scroll.position.top + amount).clamp(0.0, scroll.max_top);
        container.on_scroll(ScrollPosition::new(top, scroll.position.left));
    }
}

fn map_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        MouseButton::Middle => PointerButton::Auxiliary,
    }
}

/// Owns a container and runs it against a real terminal: raw mode, mouse
/// capture, one animation frame per `frame_interval`.
pub struct TerminalDriver<S: Styler> {
    container: LayoutContainer<S>,
    pointer: TerminalPointer,
    frame_interval: Duration,
    should_exit: bool,
}

impl<S: Styler> TerminalDriver<S> {
    pub fn new(container: LayoutContainer<S>) -> Self {
        Self {
            container,
            pointer: TerminalPointer::default(),
            frame_interval: Duration::from_millis(16),
            should_exit: false,
        }
    }

    pub fn with_pointer(mut self, pointer: TerminalPointer) -> Self {
        self.pointer = pointer;
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn container(&self) -> &LayoutContainer<S> {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut LayoutContainer<S> {
        &mut self.container
    }

    /// Run until the user quits, drawing through `on_frame` after every
    /// animation frame. Returns the container so the caller can persist the
    /// final layout.
    pub fn run<F>(mut self, mut on_frame: F) -> DriverResult<LayoutContainer<S>>
    where
        F: FnMut(&LayoutContainer<S>, &mut io::Stdout) -> DriverResult<()>,
    {
        let mut stdout = io::stdout();
        self.enter(&mut stdout)?;
        let result = self.run_inner(&mut stdout, &mut on_frame);
        self.exit(&mut stdout);
        result.map(|_| self.container)
    }

    fn run_inner<F>(&mut self, stdout: &mut io::Stdout, on_frame: &mut F) -> DriverResult<()>
    where
        F: FnMut(&LayoutContainer<S>, &mut io::Stdout) -> DriverResult<()>,
    {
        let (columns, rows) = terminal::size()?;
        self.pointer.resize(&mut self.container, columns, rows);
        let started = Instant::now();
        let mut last_frame = Instant::now();
        self.frame(stdout, on_frame)?;

        while !self.should_exit {
            let timeout = self
                .frame_interval
                .checked_sub(last_frame.elapsed())
                .unwrap_or(Duration::ZERO);

            if event::poll(timeout)? {
                let event = event::read()?;
                let control =
                    self.pointer
                        .handle_event(&mut self.container, &event, started.elapsed());
                if control == DriverControl::Exit {
                    self.should_exit = true;
                    break;
                }
            }

            if last_frame.elapsed() >= self.frame_interval {
                last_frame = Instant::now();
                self.frame(stdout, on_frame)?;
            }
        }
        Ok(())
    }

    fn frame<F>(&mut self, stdout: &mut io::Stdout, on_frame: &mut F) -> DriverResult<()>
    where
        F: FnMut(&LayoutContainer<S>, &mut io::Stdout) -> DriverResult<()>,
    {
        let report = self.container.on_animation_frame();
        if report.reflowed || report.scroll_by.is_some() {
            self.pointer.sync_bounds(&mut self.container);
        }
        on_frame(&self.container, stdout)?;
        stdout.flush()?;
        Ok(())
    }

    fn enter(&self, stdout: &mut impl Write) -> DriverResult<()> {
        terminal::enable_raw_mode().map_err(|err| TerminalDriverError::Terminal(err.to_string()))?;
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            Hide,
            Clear(ClearType::All)
        )?;
        Ok(())
    }

    fn exit(&self, stdout: &mut impl Write) {
        execute!(stdout, Show, DisableMouseCapture, LeaveAlternateScreen).ok();
        terminal::disable_raw_mode().ok();
    }
}
