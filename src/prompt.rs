use std::io::{BufRead, Write};

use crate::error::{PluginError, Result};
use crate::placer::{Conflict, ConflictResolver};

/// Asks on a terminal (or any reader/writer pair) before overwriting.
/// Repeats the question until it gets `y` or `n`; end of input declines.
pub struct PromptResolver<R, W> {
    input: R,
    output: W,
}

impl PromptResolver<std::io::StdinLock<'static>, std::io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> PromptResolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> ConflictResolver for PromptResolver<R, W> {
    fn confirm_overwrite(&mut self, conflict: &Conflict<'_>) -> Result<bool> {
        let io_err = |e: std::io::Error| PluginError::io(conflict.existing, e);
        writeln!(
            self.output,
            "Please confirm overwrite file with different hash at location: {}",
            conflict.existing.display()
        )
        .map_err(io_err)?;

        let mut line = String::new();
        loop {
            write!(self.output, "Overwrite file? [y/n] ").map_err(io_err)?;
            self.output.flush().map_err(io_err)?;

            line.clear();
            if self.input.read_line(&mut line).map_err(io_err)? == 0 {
                return Ok(false);
            }
            match line.trim() {
                "y" => return Ok(true),
                "n" => return Ok(false),
                _ => {}
            }
        }
    }
}
