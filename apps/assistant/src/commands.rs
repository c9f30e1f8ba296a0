// apps/assistant/src/commands.rs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    History,
    Clear,
    SaveLast,
    CheckSlots,
    Book,
    MyAppointments,
    Exit,
    Unknown(String),
}

pub const HELP_ROWS: &[(&str, &str)] = &[
    ("/help", "Hiển thị danh sách lệnh khả dụng"),
    ("/history", "Hiển thị lịch sử tương tác trước đó"),
    ("/clear", "Xóa toàn bộ màn hình CLI"),
    ("/save last", "Lưu đoạn hội thoại cuối cùng ra file text"),
    ("/check slots", "Kiểm tra lịch trống của từng khoa"),
    ("/book", "Đặt lịch khám"),
    ("/my appointments", "Xem lịch hẹn đã đặt"),
    ("/exit", "Thoát ứng dụng"),
];

impl Command {
    /// `None` when the input is free text rather than a slash command.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let body = input.strip_prefix('/')?;
        let normalized = body
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let command = match normalized.as_str() {
            "help" => Command::Help,
            "history" => Command::History,
            "clear" => Command::Clear,
            "save last" => Command::SaveLast,
            "check slots" => Command::CheckSlots,
            "book" => Command::Book,
            "my appointments" => Command::MyAppointments,
            "exit" | "quit" => Command::Exit,
            _ => Command::Unknown(input.to_string()),
        };
        Some(command)
    }
}

pub fn help_text() -> String {
    let width = HELP_ROWS.iter().map(|(cmd, _)| cmd.len()).max().unwrap_or(0);
    let rows = HELP_ROWS
        .iter()
        .map(|(cmd, description)| format!("  {:<width$}  {}", cmd, description, width = width))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Available Commands\n{}", rows)
}
