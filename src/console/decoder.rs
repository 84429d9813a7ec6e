const REPLACEMENT: char = '\u{FFFD}';

/// Accumulates the text of one streamed reply from raw body chunks.
///
/// Multi-byte characters split across chunk boundaries are held back until
/// the rest of their bytes arrive. Invalid sequences decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Accumulator {
    text: String,
    partial: Vec<u8>,
}

impl Utf8Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `chunk` and returns everything decoded so far.
    pub fn push(&mut self, chunk: &[u8]) -> &str {
        let mut input = std::mem::take(&mut self.partial);
        input.extend_from_slice(chunk);

        let mut rest: &[u8] = &input;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    if let Ok(valid) = std::str::from_utf8(valid) {
                        self.text.push_str(valid);
                    }
                    match e.error_len() {
                        Some(len) => {
                            self.text.push(REPLACEMENT);
                            rest = &after[len..];
                        }
                        None => {
                            self.partial = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        &self.text
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Flushes a dangling incomplete sequence as U+FFFD and returns the full text.
    pub fn finish(mut self) -> String {
        if !self.partial.is_empty() {
            self.partial.clear();
            self.text.push(REPLACEMENT);
        }
        self.text
    }
}
