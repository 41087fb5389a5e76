//! Line-oriented operator input

use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Source of operator answers, one line at a time.
#[async_trait]
pub trait LineSource: Send {
    /// Next line without its terminator; `None` once input is exhausted.
    async fn next_line(&mut self) -> std::io::Result<Option<String>>;
}

/// Lines read from standard input.
pub struct StdinLines {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinLines {
    /// Reader over the process's standard input.
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinLines {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LineSource for StdinLines {
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        let line = self.lines.next_line().await?;
        Ok(line.map(|l| l.trim_end_matches('\r').to_string()))
    }
}

/// Pre-recorded answers, for tests and scripted runs.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLines {
    lines: VecDeque<String>,
}

impl ScriptedLines {
    /// Answers returned in order, then end of input.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[async_trait]
impl LineSource for ScriptedLines {
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}
