//! Line-based prompt/response channel to the person plugging in machines.

use std::io::{self, BufRead, BufReader};
use std::thread;

use async_trait::async_trait;
use tokio::io::{stdout, AsyncWriteExt};
use tokio::sync::mpsc;

#[async_trait]
pub trait Operator: Send {
    /// Print informational text.
    async fn show(&mut self, text: &str) -> io::Result<()>;

    /// Block until the operator signals readiness.  Any line advances.
    async fn wait_for_ready(&mut self, prompt: &str) -> io::Result<()>;

    /// Ask a yes/no question.  Only `y` counts as yes.
    async fn confirm(&mut self, prompt: &str) -> io::Result<bool>;
}

/// Interprets an answer to a yes/no prompt; end of input is "no".
pub fn is_yes(answer: Option<&str>) -> bool {
    answer.is_some_and(|a| a.trim().eq_ignore_ascii_case("y"))
}

/// Operator on the controlling terminal.
///
/// Input is read on a plain thread that feeds a channel, so a pending read
/// never holds up runtime shutdown after Ctrl+C.  Lines are decoded lossily:
/// bytes that are not UTF-8 still count as an answer.
pub struct TerminalOperator {
    lines: mpsc::Receiver<io::Result<String>>,
}

impl TerminalOperator {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(io::stdin()))
    }

    pub fn from_reader<R: BufRead + Send + 'static>(mut reader: R) -> Self {
        let (tx, rx) = mpsc::channel(1);
        thread::spawn(move || loop {
            let line = match read_line(&mut reader) {
                Ok(Some(line)) => Ok(line),
                Ok(None) => break,
                Err(e) => Err(e),
            };
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        });
        Self { lines: rx }
    }

    async fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut out = stdout();
        out.write_all(prompt.as_bytes()).await?;
        out.flush().await?;
        self.lines.recv().await.transpose()
    }
}

fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

impl Default for TerminalOperator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Operator for TerminalOperator {
    async fn show(&mut self, text: &str) -> io::Result<()> {
        let mut out = stdout();
        out.write_all(text.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await
    }

    async fn wait_for_ready(&mut self, prompt: &str) -> io::Result<()> {
        match self.ask(prompt).await? {
            Some(_) => Ok(()),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed while waiting for the operator",
            )),
        }
    }

    async fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        let answer = self.ask(prompt).await?;
        Ok(is_yes(answer.as_deref()))
    }
}
