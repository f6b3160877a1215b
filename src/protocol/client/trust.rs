/*!
Trust-on-first-use confirmation of the server's public key.

The client has no certificate chain to check the key against; a human (or
an automation policy) looks at the key and says yes or no.
*/

use std::io::{self, BufRead, Write};
use tracing::warn;

/// Decides whether a server public key is trusted.
pub trait TrustPrompt {
    /// Show `key_text` (base64 of the raw key) and return whether to accept it.
    fn confirm(&mut self, key_text: &str) -> bool;
}

impl<F> TrustPrompt for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, key_text: &str) -> bool {
        self(key_text)
    }
}

/// Accepts every key without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl TrustPrompt for AcceptAll {
    fn confirm(&mut self, _key_text: &str) -> bool {
        warn!("server public key accepted without confirmation");
        true
    }
}

/// Asks on an interactive console.
///
/// Prints the key and `Accept? (y/N)` to `output`, then reads one line from
/// `input`. Only an answer of `y` or `yes` (any case) accepts; anything else,
/// including end of input or an I/O error, rejects.
#[derive(Debug)]
pub struct ConsolePrompt<I, O> {
    input: I,
    output: O,
}

impl ConsolePrompt<io::StdinLock<'static>, io::Stdout> {
    /// Prompt on the process's stdin/stdout
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<I: BufRead, O: Write> ConsolePrompt<I, O> {
    /// Prompt on arbitrary streams
    pub fn new(input: I, output: O) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, key_text: &str) -> io::Result<bool> {
        writeln!(self.output, "Public key from server:\n{}\nAccept? (y/N)", key_text)?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;

        let answer = answer.trim();
        Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
    }
}

impl<I: BufRead, O: Write> TrustPrompt for ConsolePrompt<I, O> {
    fn confirm(&mut self, key_text: &str) -> bool {
        match self.ask(key_text) {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "trust prompt failed, rejecting key");
                false
            }
        }
    }
}
