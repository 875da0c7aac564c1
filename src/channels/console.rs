//! Interactive console source
//!
//! Reads one message per line. Blank lines are skipped and the prompt is
//! shown again after every spoken line, successful or not.

use async_trait::async_trait;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines, Stdin, Stdout,
};

use super::{Channel, IncomingText};
use crate::{Error, Result};

/// Prompt printed before each read
pub const PROMPT: &str = "Input text...";

/// Line-oriented console channel
pub struct ConsoleChannel<R, W> {
    lines: Lines<R>,
    output: W,
}

impl ConsoleChannel<BufReader<Stdin>, Stdout> {
    /// Console on the process's stdin and stdout
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> ConsoleChannel<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Console over arbitrary streams
    pub fn new(input: R, output: W) -> Self {
        Self {
            lines: input.lines(),
            output,
        }
    }

    /// The output stream
    pub const fn output(&self) -> &W {
        &self.output
    }

    async fn say(&mut self, line: &str) -> Result<()> {
        self.output.write_all(line.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<R, W> Channel for ConsoleChannel<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &'static str {
        "console"
    }

    async fn connect(&mut self) -> Result<()> {
        self.say(PROMPT).await
    }

    async fn next_text(&mut self) -> Result<Option<IncomingText>> {
        while let Some(line) = self.lines.next_line().await? {
            let text = line.trim();
            if !text.is_empty() {
                return Ok(Some(IncomingText::plain(text)));
            }
        }
        Ok(None)
    }

    async fn acknowledge(&mut self, _incoming: &IncomingText, outcome: &Result<()>) -> Result<()> {
        if let Err(e) = outcome {
            let line = match e {
                Error::Synthesis(_) => format!("Failed to synthesize sound: {e}"),
                _ => format!("Failed to play sound: {e}"),
            };
            self.say(&line).await?;
        }
        self.say(PROMPT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlaybackError;

    #[tokio::test]
    async fn skips_blank_lines_and_trims() {
        let mut console = ConsoleChannel::new(&b"  hello  \n\n   \nworld\n"[..], Vec::new());
        console.connect().await.unwrap();

        let first = console.next_text().await.unwrap().unwrap();
        assert_eq!(first.text, "hello");
        let second = console.next_text().await.unwrap().unwrap();
        assert_eq!(second.text, "world");
        assert!(console.next_text().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reports_failures_and_prompts_again() {
        let mut console = ConsoleChannel::new(&b""[..], Vec::new());
        let incoming = IncomingText::plain("hi");

        console.connect().await.unwrap();
        console.acknowledge(&incoming, &Ok(())).await.unwrap();
        let timeout: Result<()> = Err(PlaybackError::Timeout("message was too long, interrupted".to_string()).into());
        console.acknowledge(&incoming, &timeout).await.unwrap();
        let synthesis: Result<()> = Err(Error::Synthesis("bad text".to_string()));
        console.acknowledge(&incoming, &synthesis).await.unwrap();

        let output = String::from_utf8(console.output().clone()).unwrap();
        assert_eq!(
            output,
            "Input text...\nInput text...\n\
             Failed to play sound: message was too long, interrupted\nInput text...\n\
             Failed to synthesize sound: synthesis failed: bad text\nInput text...\n"
        );
    }
}
