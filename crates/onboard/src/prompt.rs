use onboard_cloud::Confirm;
use std::io::{self, BufRead, Write};

/// Asks on the terminal
pub struct TerminalPrompt;

impl Confirm for TerminalPrompt {
    fn confirm(&self, question: &str) -> onboard_cloud::Result<bool> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        Ok(ask(question, &mut stdin.lock(), &mut stdout)?)
    }
}

/// `[y/n]` を受け付けるまで聞き直す
pub fn ask<R: BufRead, W: Write>(question: &str, input: &mut R, output: &mut W) -> io::Result<bool> {
    loop {
        write!(output, "{} [y/n]: ", question)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed before an answer was given (use --yes for unattended runs)",
            ));
        }

        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => writeln!(output, "Please answer y or n.")?,
        }
    }
}
