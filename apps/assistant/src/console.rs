// apps/assistant/src/console.rs
use async_trait::async_trait;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

use booking_cell::services::PatientChannel;
use shared_models::AppError;

/// Line-oriented terminal input shared by the chat loop and the booking flow.
pub struct Console<R> {
    lines: Lines<R>,
}

impl Console<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> Console<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines() }
    }

    /// Print `prompt` and read one line. `None` once input is exhausted.
    pub async fn read_line(&mut self, prompt: &str) -> Result<Option<String>, AppError> {
        print!("{} ", prompt);
        std::io::stdout()
            .flush()
            .map_err(|e| AppError::Internal(format!("stdout: {}", e)))?;

        self.lines
            .next_line()
            .await
            .map_err(|e| AppError::Internal(format!("stdin: {}", e)))
    }

    /// Like `read_line`, substituting `default` for a blank answer.
    pub async fn read_line_or(
        &mut self,
        prompt: &str,
        default: &str,
    ) -> Result<Option<String>, AppError> {
        let line = self.read_line(&format!("{} [{}]:", prompt, default)).await?;
        Ok(line.map(|l| {
            let l = l.trim();
            if l.is_empty() {
                default.to_string()
            } else {
                l.to_string()
            }
        }))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> PatientChannel for Console<R> {
    async fn ask(&mut self, prompt: &str) -> Result<String, AppError> {
        self.read_line(prompt)
            .await?
            .ok_or_else(|| AppError::Internal("input closed".into()))
    }

    fn notify(&mut self, message: &str) {
        println!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ask_reads_lines_until_closed() {
        let input = tokio_test::io::Builder::new()
            .read("Nguyễn Văn An\nD04\n".as_bytes())
            .build();
        let mut console = Console::new(BufReader::new(input));

        assert_eq!(console.ask("Họ tên:").await.unwrap(), "Nguyễn Văn An");
        assert_eq!(console.ask("Mã khoa:").await.unwrap(), "D04");
        assert!(matches!(console.ask("Ngày:").await, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_blank_answer_takes_default() {
        let input = tokio_test::io::Builder::new().read(b"\n2026-10-20\n").build();
        let mut console = Console::new(BufReader::new(input));

        assert_eq!(
            console.read_line_or("Ngày", "2026-10-17").await.unwrap().as_deref(),
            Some("2026-10-17")
        );
        assert_eq!(
            console.read_line_or("Ngày", "2026-10-17").await.unwrap().as_deref(),
            Some("2026-10-20")
        );
    }
}
