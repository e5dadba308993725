//! Console I/O for the chat loop: line input, unbuffered fragment output.
//!
//! Generic over tokio reader/writer halves so tests can drive the loop with
//! in-memory buffers instead of a terminal.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

pub struct Console<R, W> {
    input: R,
    output: W,
}

/// Console over the process's stdin/stdout.
pub fn stdio() -> Console<BufReader<Stdin>, Stdout> {
    Console::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Read one line without its terminator. `Ok(None)` at end of input.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    /// Write `text` as-is and flush immediately. Empty text is not written.
    pub async fn write(&mut self, text: &str) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await
    }

    /// Write `text` followed by a newline, flushed.
    pub async fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.write(&format!("{text}\n")).await
    }

    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }
}
