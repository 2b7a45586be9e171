//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::ConsoleFormatter;
use crate::StageSpinner;
use colored::Colorize;
use grounded_application::{
    NoProgress, PipelineProgress, ProcessQueryError, ProcessQueryUseCase, QueryOutcome,
};
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const HISTORY_CAPACITY: usize = 1000;

/// What a slash command asks the loop to do.
#[derive(Debug, PartialEq, Eq)]
enum CommandResult {
    Continue,
    Exit,
}

/// Interactive chat REPL
pub struct ChatRepl {
    pipeline: ProcessQueryUseCase,
    session_id: Option<String>,
    show_progress: bool,
    show_sources: bool,
}

impl ChatRepl {
    pub fn new(pipeline: ProcessQueryUseCase) -> Self {
        Self {
            pipeline,
            session_id: None,
            show_progress: true,
            show_sources: false,
        }
    }

    /// Set whether to show progress
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Set whether to list sources under each answer
    pub fn with_sources(mut self, show: bool) -> Self {
        self.show_sources = show;
        self
    }

    /// Resume an existing session instead of starting a new one
    pub fn with_session(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Run the interactive REPL until `/quit` or end of input
    pub async fn run(&mut self) -> std::io::Result<()> {
        let mut editor = Self::editor();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("grounded".to_string()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            match editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if line.starts_with('/') {
                        if self.handle_command(line) == CommandResult::Exit {
                            break;
                        }
                        continue;
                    }
                    self.ask(line).await;
                }
                Signal::CtrlC => {
                    println!("^C");
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
            }
        }

        Ok(())
    }

    fn editor() -> Reedline {
        let editor = Reedline::create();
        let Some(path) = Self::history_path() else {
            return editor;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match FileBackedHistory::with_file(HISTORY_CAPACITY, path) {
            Ok(history) => editor.with_history(Box::new(history)),
            Err(e) => {
                warn!(error = %e, "Could not open chat history; continuing without it");
                editor
            }
        }
    }

    fn history_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("grounded").join("history.txt"))
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Grounded - Chat Mode".cyan().bold());
        println!("Answers come from the indexed documents only.");
        println!();
        if self.session_id.is_some() {
            println!("{}", ConsoleFormatter::format_session(self.session_id()));
            println!();
        }
        Self::print_help();
    }

    fn print_help() {
        println!("Commands:");
        println!("  /new             - Start a new conversation");
        println!("  /session         - Show the current session id");
        println!("  /help, /h, /?    - Show this help");
        println!("  /quit, /exit, /q - Exit chat");
        println!();
    }

    /// Handle slash commands.
    fn handle_command(&mut self, cmd: &str) -> CommandResult {
        match cmd {
            "/quit" | "/exit" | "/q" => {
                println!("Bye!");
                CommandResult::Exit
            }
            "/help" | "/h" | "/?" => {
                println!();
                Self::print_help();
                CommandResult::Continue
            }
            "/new" => {
                self.session_id = None;
                println!("Started a new conversation.");
                CommandResult::Continue
            }
            "/session" => {
                println!("{}", ConsoleFormatter::format_session(self.session_id()));
                CommandResult::Continue
            }
            _ => {
                println!("Unknown command: {cmd}. Type /help for commands.");
                CommandResult::Continue
            }
        }
    }

    async fn ask(&mut self, question: &str) {
        let result = if self.show_progress {
            let spinner = StageSpinner::new();
            let result = self.run_cancellable(question, &spinner).await;
            spinner.finish();
            result
        } else {
            self.run_cancellable(question, &NoProgress).await
        };

        match result {
            Ok(outcome) => {
                self.session_id = Some(outcome.session_id.clone());
                println!();
                print!(
                    "{}",
                    ConsoleFormatter::format_answer(&outcome, self.show_sources)
                );
                println!();
            }
            Err(e) => {
                debug!(error = %e, "Chat query failed");
                println!("{}", ConsoleFormatter::format_failure(&e));
            }
        }
    }

    /// Ctrl-C while a query runs abandons that query, not the chat.
    async fn run_cancellable(
        &self,
        question: &str,
        progress: &dyn PipelineProgress,
    ) -> Result<QueryOutcome, ProcessQueryError> {
        let cancel = CancellationToken::new();
        let watcher = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            }
        });

        let result = self
            .pipeline
            .process_query_cancellable(question, self.session_id(), progress, &cancel)
            .await;
        watcher.abort();
        result
    }
}
