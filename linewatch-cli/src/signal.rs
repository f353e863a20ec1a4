// Linewatch CLI - Console driver for the Linewatch SPC engine
//
// Licensed under AGPL-3.0.
// See LICENSE file for details.

//! Interactive continue/stop prompt.

use linewatch::{ControlSignal, Decision};
use std::io::{BufRead, Write};
use tracing::warn;

/// Prompt text shown after every tick.
pub const PROMPT: &str = "\n> continue with ENTER, quit with 'q': ";

/// Asks the operator after every tick whether to continue.
///
/// `q` (any case, surrounding whitespace ignored) stops the run, as does end
/// of input. Anything else continues.
pub struct PromptSignal<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSignal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> ControlSignal for PromptSignal<R, W> {
    fn next_decision(&mut self, _ticks_completed: u64) -> Decision {
        if let Err(e) = write!(self.output, "{}", PROMPT).and_then(|_| self.output.flush()) {
            warn!("Failed to write prompt: {}", e);
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => Decision::Stop,
            Ok(_) => parse_decision(&line),
            Err(e) => {
                warn!("Failed to read control input, stopping: {}", e);
                Decision::Stop
            }
        }
    }
}

/// Map one line of operator input to a decision.
pub fn parse_decision(input: &str) -> Decision {
    if input.trim().eq_ignore_ascii_case("q") {
        Decision::Stop
    } else {
        Decision::Continue
    }
}
