use crate::domain::ports::PathPicker;
use std::io::{BufRead, Stderr, StdinLock, Write};
use std::path::{Path, PathBuf};

/// 在終端機詢問路徑；空白輸入採用預設值，EOF 或沒有預設值時視為取消
pub struct PromptPicker<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptPicker<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptPicker<StdinLock<'static>, Stderr> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> PathPicker for PromptPicker<R, W> {
    fn pick(&mut self, prompt: &str, default: Option<&Path>) -> Option<PathBuf> {
        let written = match default {
            Some(path) => write!(self.output, "{} [{}]: ", prompt, path.display()),
            None => write!(self.output, "{}: ", prompt),
        };
        if written.and_then(|_| self.output.flush()).is_err() {
            return None;
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => match line.trim() {
                "" => default.map(Path::to_path_buf),
                chosen => Some(PathBuf::from(chosen)),
            },
        }
    }
}
