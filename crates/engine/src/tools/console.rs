use std::collections::VecDeque;

const CONSOLE_PROMPT_PREFIX: &str = "> ";

pub(crate) const MAX_HISTORY_LINES: usize = 64;
pub(crate) const MAX_OUTPUT_LINES: usize = 256;
pub(crate) const MAX_PENDING_LINES: usize = 64;
pub(crate) const MAX_LINE_CHARS: usize = 256;

/// Line-oriented debug console: submitted lines wait in a pending queue until
/// the command processor drains them, and command output accumulates below.
#[derive(Debug, Default)]
pub struct ConsoleState {
    history: VecDeque<String>,
    output_lines: VecDeque<String>,
    pending_lines: VecDeque<String>,
}

impl ConsoleState {
    pub fn submit_line(&mut self, raw_line: &str) {
        let line = sanitize_line(raw_line);
        push_bounded(&mut self.history, line.clone(), MAX_HISTORY_LINES);
        push_bounded(
            &mut self.output_lines,
            format!("{CONSOLE_PROMPT_PREFIX}{line}"),
            MAX_OUTPUT_LINES,
        );
        push_bounded(&mut self.pending_lines, line, MAX_PENDING_LINES);
    }

    pub fn output_lines(&self) -> impl Iterator<Item = &str> {
        self.output_lines.iter().map(String::as_str)
    }

    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    pub fn append_output_line(&mut self, line: impl Into<String>) {
        push_bounded(&mut self.output_lines, line.into(), MAX_OUTPUT_LINES);
    }

    pub fn clear_output_lines(&mut self) {
        self.output_lines.clear();
    }

    pub(crate) fn drain_pending_lines_into(&mut self, out: &mut Vec<String>) {
        out.extend(self.pending_lines.drain(..));
    }

    #[cfg(test)]
    pub(crate) fn push_pending_line_for_test(&mut self, line: &str) {
        push_bounded(&mut self.pending_lines, line.to_string(), MAX_PENDING_LINES);
    }
}

fn sanitize_line(raw_line: &str) -> String {
    raw_line
        .chars()
        .filter(|ch| !ch.is_control())
        .take(MAX_LINE_CHARS)
        .collect()
}

fn push_bounded(queue: &mut VecDeque<String>, value: String, max_len: usize) {
    if queue.len() == max_len {
        queue.pop_front();
    }
    queue.push_back(value);
}
