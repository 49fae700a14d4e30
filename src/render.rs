use std::io::{self, Write};

/// Sink for user-visible incremental assistant output.
pub trait Renderer {
    fn render_fragment(&mut self, fragment: &str) -> io::Result<()>;
}

/// Writes fragments straight to stdout, flushing per fragment so partial
/// output stays visible while the stream is live.
#[derive(Debug, Default)]
pub struct StdoutRenderer;

impl Renderer for StdoutRenderer {
    fn render_fragment(&mut self, fragment: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(fragment.as_bytes())?;
        stdout.flush()
    }
}
