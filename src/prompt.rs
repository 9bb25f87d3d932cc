use std::io::{self, BufRead, Write};

pub struct ShellPrompt {}

impl ShellPrompt {
    pub fn new() -> Self {
        ShellPrompt {}
    }

    pub fn show_prompt(&self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()
    }

    /// Next line of standard input. See [`ShellPrompt::read_line_from`].
    pub fn read_line(&self) -> io::Result<Option<String>> {
        self.read_line_from(&mut io::stdin().lock())
    }

    /// Next input line without its line terminator, or `None` at end of input.
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than rejected. A read
    /// interrupted by a signal fails with [`io::ErrorKind::Interrupted`] and the
    /// partial line is dropped.
    pub fn read_line_from<R: BufRead + ?Sized>(&self, input: &mut R) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        loop {
            // `read_until` would retry on EINTR, so fill the buffer by hand
            let available = input.fill_buf()?;
            if available.is_empty() {
                break;
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(i) => {
                    buf.extend_from_slice(&available[..=i]);
                    input.consume(i + 1);
                    break;
                }
                None => {
                    let n = available.len();
                    buf.extend_from_slice(available);
                    input.consume(n);
                }
            }
        }

        if buf.is_empty() {
            // EOF (e.g., Ctrl-D)
            println!();
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&buf);
        let line = text.strip_suffix('\n').unwrap_or(&text);
        Ok(Some(line.strip_suffix('\r').unwrap_or(line).to_string()))
    }
}

impl Default for ShellPrompt {
    fn default() -> Self {
        Self::new()
    }
}
