/// Terminal front-end for the Zont rasterizer
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{self, ClearType},
};
use std::io::{self, stdout, Write};
use std::thread;
use std::time::Duration;
use zont_core::{AnimationStats, LoopConfig, Mesh, RenderError, RenderSession, Shutdown};

pub mod config;

pub use config::{ConfigError, RenderConfig};

/// How often the key watcher checks for input and for shutdown.
const KEY_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs an animated render session in the terminal until the user quits.
pub struct TerminalApp {
    session: RenderSession,
    loop_config: LoopConfig,
}

impl TerminalApp {
    pub fn new(
        mesh: Mesh,
        cols: usize,
        rows: usize,
        loop_config: LoopConfig,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            session: RenderSession::new(mesh, cols, rows)?,
            loop_config,
        })
    }

    pub fn session(&self) -> &RenderSession {
        &self.session
    }

    pub fn run(&self) -> Result<AnimationStats, RenderError> {
        terminal::enable_raw_mode()?;
        let setup = execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            terminal::Clear(ClearType::All),
            cursor::Hide
        );

        let result = match setup {
            Ok(()) => self.main_loop(),
            Err(e) => Err(e.into()),
        };

        // Cleanup
        let raw_mode = terminal::disable_raw_mode();
        let screen = execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show);

        finish(result, [raw_mode, screen])
    }

    fn main_loop(&self) -> Result<AnimationStats, RenderError> {
        let shutdown = Shutdown::new();

        thread::scope(|scope| {
            scope.spawn(|| {
                if let Err(e) = watch_keys(&shutdown) {
                    tracing::warn!(error = %e, "key watcher failed, stopping");
                    shutdown.request();
                }
            });

            let out = RawModeWriter::new(stdout().lock());
            let result = self.session.render_animated(out, self.loop_config, &shutdown);
            shutdown.request();
            result
        })
    }
}

/// Combine the render outcome with every cleanup step, which have all run
/// already; the render error wins, then the first cleanup failure.
fn finish(
    result: Result<AnimationStats, RenderError>,
    cleanup: [io::Result<()>; 2],
) -> Result<AnimationStats, RenderError> {
    let stats = result?;
    for step in cleanup {
        step?;
    }
    Ok(stats)
}

/// Request shutdown on `q`, Esc or Ctrl-C.
fn watch_keys(shutdown: &Shutdown) -> io::Result<()> {
    while !shutdown.is_requested() {
        if !event::poll(KEY_POLL_INTERVAL)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if is_quit_key(&key) {
                tracing::debug!(code = ?key.code, "quit requested");
                shutdown.request();
            }
        }
    }
    Ok(())
}

fn is_quit_key(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Expands `\n` to `\r\n`; raw mode turns off the terminal's own translation.
pub struct RawModeWriter<W: Write> {
    inner: W,
}

impl<W: Write> RawModeWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for RawModeWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut lines = buf.split(|&b| b == b'\n');
        if let Some(first) = lines.next() {
            self.inner.write_all(first)?;
        }
        for line in lines {
            self.inner.write_all(b"\r\n")?;
            self.inner.write_all(line)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
