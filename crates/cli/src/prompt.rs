//! Line-oriented prompts over any reader/writer pair.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// Asks questions on `output` and reads answers from `input`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print a line.
    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text).context("Failed to write to terminal")
    }

    /// Read one line without its line ending. `None` once input is closed.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read from terminal")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Ask a free-text question. `None` once input is closed.
    pub fn ask(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "{}: ", question).context("Failed to write to terminal")?;
        self.output.flush().context("Failed to write to terminal")?;
        self.read_line()
    }

    /// Ask a yes/no question. Blank input or closed input takes the default.
    pub fn ask_bool(&mut self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "S/n" } else { "s/N" };
        loop {
            let Some(answer) = self.ask(&format!("{} [{}]", question, hint))? else {
                return Ok(default);
            };
            match answer.trim().to_lowercase().as_str() {
                "" => return Ok(default),
                "s" | "si" | "sí" | "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.say("Responda 's' o 'n'.")?,
            }
        }
    }

    /// Ask for a number in `min..=max`. Blank input or closed input takes the
    /// default.
    pub fn ask_count(&mut self, question: &str, default: usize, min: usize, max: usize) -> Result<usize> {
        loop {
            let Some(answer) = self.ask(&format!("{} ({}-{}) [{}]", question, min, max, default))? else {
                return Ok(default);
            };
            let answer = answer.trim();
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<usize>() {
                Ok(n) if (min..=max).contains(&n) => return Ok(n),
                _ => self.say(&format!("Escriba un número entre {} y {}.", min, max))?,
            }
        }
    }

    /// Ask for several lines, ending at the first blank line or closed input.
    pub fn ask_lines(&mut self, question: &str) -> Result<String> {
        self.say(&format!("{} (línea vacía para terminar):", question))?;
        let mut lines = Vec::new();
        while let Some(line) = self.read_line()? {
            if line.trim().is_empty() {
                break;
            }
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}
