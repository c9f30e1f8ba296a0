// apps/assistant/src/app.rs
use anyhow::Result;
use chrono::Local;
use futures::StreamExt;
use std::io::Write;
use std::sync::Arc;
use tokio::io::AsyncBufRead;
use tracing::{debug, error, info};

use appointment_cell::models::department_by_name;
use appointment_cell::services::{AppointmentStore, DateResolver};
use assistant_cell::models::Intent;
use assistant_cell::services::{ChatAssistant, IntentClassifier};
use assistant_cell::Collaborators;
use booking_cell::models::ConversationContext;
use booking_cell::services::BookingWorkflow;
use doctor_cell::services::DoctorDirectory;
use shared_config::AppConfig;
use shared_models::ChatRole;

use crate::commands::{help_text, Command};
use crate::console::Console;
use crate::transcript::save_transcript;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// One interactive session: owns the store and the conversation.
pub struct Assistant {
    config: AppConfig,
    store: AppointmentStore,
    collaborators: Collaborators,
    workflow: BookingWorkflow,
    resolver: DateResolver,
    ctx: ConversationContext,
}

impl Assistant {
    pub fn new(
        config: AppConfig,
        store: AppointmentStore,
        collaborators: Collaborators,
        doctors: Arc<dyn DoctorDirectory>,
    ) -> Self {
        let workflow = BookingWorkflow::new(collaborators.symptoms.clone(), doctors);
        Self {
            config,
            store,
            collaborators,
            workflow,
            resolver: DateResolver::new(),
            ctx: ConversationContext::new(),
        }
    }

    pub fn welcome(&self) -> String {
        let mut text = String::from(
            "🏥 Medical Assistant CLI\nPhòng khám đa khoa - Trợ lý thông minh\n\
             Nhập lệnh /help để xem hướng dẫn sử dụng.\n",
        );
        if !self.config.is_ai_configured() {
            text.push_str(
                "⚠️ Azure OpenAI is not properly configured. Please check your .env file.\n\
                 You can still use appointment scheduling features, \
                 but AI-powered responses won't be available.\n",
            );
        }
        text
    }

    pub async fn handle_line<R>(&mut self, line: &str, console: &mut Console<R>) -> Result<Flow>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        match Command::parse(line) {
            Some(command) => self.run_command(command, console).await,
            None => {
                self.handle_free_text(line, console).await?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn run_command<R>(&mut self, command: Command, console: &mut Console<R>) -> Result<Flow>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        debug!("Command: {:?}", command);
        match command {
            Command::Help => println!("{}", help_text()),
            Command::History => self.print_history(),
            Command::Clear => {
                print!("\x1B[2J\x1B[1;1H");
                println!("{}", self.welcome());
            }
            Command::SaveLast => {
                let now = Local::now().naive_local();
                match save_transcript(&self.config.conversation_log_dir, &self.ctx.history, now) {
                    Ok(Some(path)) => println!("Conversation saved to {}", path.display()),
                    Ok(None) => println!("No conversation to save."),
                    Err(e) => {
                        error!("Failed to save conversation: {:#}", e);
                        println!("Error saving conversation: {}", e);
                    }
                }
            }
            Command::CheckSlots => self.check_slots(console).await?,
            Command::Book => self.book(console).await,
            Command::MyAppointments => self.my_appointments(console).await?,
            Command::Exit => {
                println!("Goodbye!");
                return Ok(Flow::Exit);
            }
            Command::Unknown(input) => {
                debug!("Unknown command {}", input);
                println!("Unknown command. Type /help for available commands.");
            }
        }
        Ok(Flow::Continue)
    }

    async fn handle_free_text<R>(&mut self, text: &str, console: &mut Console<R>) -> Result<()>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let intent = self.collaborators.intents.classify(text).await;
        info!("Intent: {:?}", intent);

        match intent {
            Intent::BookAppointment => self.book(console).await,
            Intent::CheckSlots => self.check_slots(console).await?,
            Intent::MyAppointments => self.my_appointments(console).await?,
            Intent::DepartmentInfo => self.print_departments(),
            Intent::General => self.chat(text).await,
        }
        Ok(())
    }

    async fn chat(&mut self, text: &str) {
        println!("\nAssistant:");
        let mut reply = String::new();
        let mut stream_failed = false;

        match self.collaborators.chat.respond_streaming(text, &self.ctx.history).await {
            Ok(mut stream) => {
                while let Some(chunk) = stream.next().await {
                    match chunk {
                        Ok(chunk) => {
                            print!("{}", chunk);
                            let _ = std::io::stdout().flush();
                            reply.push_str(&chunk);
                        }
                        Err(e) => {
                            error!("Chat stream failed: {}", e);
                            println!("\n[Đã xảy ra lỗi khi nhận phản hồi]");
                            stream_failed = true;
                            break;
                        }
                    }
                }
                println!("\n");
            }
            Err(e) => {
                e.log();
                println!("Error: {}\n", e);
                return;
            }
        }

        // A cut-off reply never reaches the history.
        if !stream_failed && !reply.is_empty() {
            self.ctx.record_exchange(text, reply);
        }
    }

    async fn book<R>(&mut self, console: &mut Console<R>)
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let outcome = self.workflow.run(&mut self.ctx, &mut self.store, console).await;
        debug!("Booking finished, committed: {}", outcome.is_committed());
    }

    async fn check_slots<R>(&mut self, console: &mut Console<R>) -> Result<()>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let today = DateResolver::today();
        let default_date = today.to_string();
        let Some(expression) = console.read_line_or("Ngày (YYYY-MM-DD)", &default_date).await?
        else {
            return Ok(());
        };
        let date = self.resolver.resolve(&expression, today);

        self.print_departments();
        let prompt = "Tên khoa (để trống để xem tất cả):";
        let Some(answer) = console.read_line(prompt).await? else {
            return Ok(());
        };
        let answer = answer.trim();
        let department = department_by_name(answer).map_or(answer, |d| d.name);
        let filter = (!department.is_empty()).then_some(department);

        let slots = self.store.available_slots(date, filter);
        println!("\n📅 Date: {}\n", DateResolver::format_with_weekday(&date.to_string()));
        if slots.is_empty() {
            println!(
                "Chưa có lịch hẹn nào, tất cả các khoa đều còn trống. \
                 Nhập tên khoa để xem chi tiết."
            );
        }
        for (name, times) in &slots {
            println!("{} Khoa {}:", department_emoji(name), name);
            if times.is_empty() {
                println!("  ❌ No available slots");
            } else {
                let times = times.iter().map(|t| t.to_string()).collect::<Vec<_>>();
                println!("  ✅ Available: {}", times.join(", "));
            }
        }
        println!();
        Ok(())
    }

    async fn my_appointments<R>(&mut self, console: &mut Console<R>) -> Result<()>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let Some(name) = console.read_line("Họ tên bệnh nhân:").await? else {
            return Ok(());
        };

        let appointments = self.store.appointments_for_patient(&name);
        if appointments.is_empty() {
            println!("Không tìm thấy lịch hẹn nào cho {}.", name.trim());
            return Ok(());
        }

        for (i, a) in appointments.iter().enumerate() {
            println!(
                "{}. {} lúc {} - Khoa {} - {}",
                i + 1,
                DateResolver::format_with_weekday(&a.date.to_string()),
                a.time,
                a.department,
                a.doctor
            );
        }
        Ok(())
    }

    fn print_departments(&self) {
        println!("Danh sách khoa");
        for d in self.store.departments() {
            println!("  {}  {:<14} {}", d.code, d.name, d.description);
        }
    }

    fn print_history(&self) {
        let turns = self.ctx.history.iter().filter(|m| m.role != ChatRole::System);
        let mut empty = true;
        for message in turns {
            empty = false;
            let speaker = if message.role == ChatRole::User { "User" } else { "Assistant" };
            println!("{}: {}", speaker, message.content);
        }
        if empty {
            println!("No conversation history.");
        }
    }
}

fn department_emoji(name: &str) -> &'static str {
    match name {
        "Nội tổng hợp" => "🩺",
        "Răng hàm mặt" => "🦷",
        "Mắt" => "👁️",
        "Tai mũi họng" => "👂",
        "Nhi khoa" => "👶",
        "Da liễu" => "🧬",
        _ => "🏥",
    }
}
