use std::path::PathBuf;
use std::sync::Arc;

use manjaword_core::EditorWidget;
use manjaword_session::{
    ExportOutcome, GrammarOutcome, HeadlessEditor, OpenOutcome, SaveOutcome, SessionController,
    SessionError,
};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::picker::{PickPurpose, QueuedPicker};

const HELP: &str = "\
Commands:
  type <text>          append text at the end of the document
  newline              start a new line
  new                  discard the document and start an empty one
  open <path>          open a .manjaword.json document
  save [path]          save the document
  export-docx [path]   export as DOCX
  export-pdf [path]    export as PDF
  grammar              toggle grammar checking
  theme                toggle light/dark theme
  status               show title, word count and grammar matches
  help                 show this help
  quit                 leave the editor";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ShellError {
    #[error("Unknown command: {0} (try 'help')")]
    UnknownCommand(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),
}

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Type(String),
    Newline,
    New,
    Open(Option<PathBuf>),
    Save(Option<PathBuf>),
    ExportDocx(Option<PathBuf>),
    ExportPdf(Option<PathBuf>),
    Grammar,
    Theme,
    Status,
    Help,
    Quit,
}

impl ShellCommand {
    /// Parse one input line. Blank lines parse to `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ShellError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (word, rest) = match line.trim_start().split_once(' ') {
            Some((word, rest)) => (word, rest),
            None => (line.trim(), ""),
        };
        let path = || {
            let rest = rest.trim();
            (!rest.is_empty()).then(|| PathBuf::from(rest))
        };

        let command = match word {
            "" => return Ok(None),
            "type" if rest.is_empty() => return Err(ShellError::MissingArgument("type")),
            // Keep inner spacing as typed
            "type" => ShellCommand::Type(rest.to_string()),
            "newline" => ShellCommand::Newline,
            "new" => ShellCommand::New,
            "open" => ShellCommand::Open(path()),
            "save" => ShellCommand::Save(path()),
            "export-docx" => ShellCommand::ExportDocx(path()),
            "export-pdf" => ShellCommand::ExportPdf(path()),
            "grammar" => ShellCommand::Grammar,
            "theme" => ShellCommand::Theme,
            "status" => ShellCommand::Status,
            "help" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            other => return Err(ShellError::UnknownCommand(other.to_string())),
        };
        Ok(Some(command))
    }
}

/// Line-oriented front end driving a session over a headless editor.
pub struct Shell {
    session: SessionController,
    editor: Arc<HeadlessEditor>,
    picker: Arc<QueuedPicker>,
}

impl Shell {
    pub fn new(session: SessionController, editor: Arc<HeadlessEditor>, picker: Arc<QueuedPicker>) -> Self {
        Self {
            session,
            editor,
            picker,
        }
    }

    /// Queue the path for the next picker request. Without one, save and export
    /// fall back to a default file name in the working directory and open cancels.
    fn queue_path(&self, path: Option<PathBuf>, purpose: PickPurpose) {
        self.picker.clear();
        if let Some(path) = path.or_else(|| purpose.default_file_name().map(PathBuf::from)) {
            self.picker.push(path);
        }
    }

    /// Run one command and describe what happened.
    pub async fn execute(&self, command: ShellCommand) -> Result<String, SessionError> {
        let message = match command {
            ShellCommand::Type(text) => {
                self.editor.type_text(&text);
                String::new()
            }
            ShellCommand::Newline => {
                self.editor.type_text("\n");
                String::new()
            }
            ShellCommand::New => {
                self.session.new_document().await?;
                "New document".to_string()
            }
            ShellCommand::Open(path) => {
                self.queue_path(path, PickPurpose::Open);
                match self.session.open().await? {
                    OpenOutcome::Opened { path } => format!("Opened {}", path),
                    OpenOutcome::Canceled => "Open canceled".to_string(),
                }
            }
            ShellCommand::Save(path) => {
                self.queue_path(path, PickPurpose::Save);
                match self.session.save().await? {
                    SaveOutcome::Saved { path } => format!("Saved {}", path),
                    SaveOutcome::Canceled => "Save canceled".to_string(),
                }
            }
            ShellCommand::ExportDocx(path) => {
                self.queue_path(path, PickPurpose::ExportDocx);
                describe_export(self.session.export_docx().await?)
            }
            ShellCommand::ExportPdf(path) => {
                self.queue_path(path, PickPurpose::ExportPdf);
                describe_export(self.session.export_pdf().await?)
            }
            ShellCommand::Grammar => match self.session.toggle_grammar().await? {
                GrammarOutcome::Applied { matches } => {
                    let mut out = format!("Grammar checking on, {} issue(s)", matches);
                    for m in self.session.snapshot().grammar_matches() {
                        out.push_str(&format!("\n  [{}+{}] {}", m.offset, m.length, m.message));
                    }
                    out
                }
                GrammarOutcome::Discarded => "Grammar result discarded".to_string(),
                GrammarOutcome::Disabled => "Grammar checking off".to_string(),
            },
            ShellCommand::Theme => format!("Theme: {}", self.session.toggle_theme()),
            ShellCommand::Status => self.status(),
            ShellCommand::Help => HELP.to_string(),
            ShellCommand::Quit => String::new(),
        };
        Ok(message)
    }

    fn status(&self) -> String {
        let state = self.session.snapshot();
        format!(
            "{} | {} word(s) | theme {} | grammar {} ({} issue(s))\n{}",
            self.session.title(),
            state.word_count(),
            state.theme(),
            if state.grammar_enabled() { "on" } else { "off" },
            state.grammar_matches().len(),
            self.editor.get_text().trim_end_matches('\n'),
        )
    }

    /// Read commands from stdin until `quit`, end of input or shutdown.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("{}", HELP);

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = shutdown_rx.wait_for(|&stop| stop) => {
                    debug!("Shutdown requested");
                    break;
                }
            };
            let Some(line) = line else {
                debug!("End of input");
                break;
            };

            let command = match ShellCommand::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    eprintln!("{}", e);
                    continue;
                }
            };
            if command == ShellCommand::Quit {
                break;
            }

            match self.execute(command).await {
                Ok(message) if message.is_empty() => {}
                Ok(message) => println!("{}", message),
                Err(e) => eprintln!("Error: {}", e),
            }
            // Let the adapter forward the edit before the next command
            tokio::task::yield_now().await;
        }

        info!("Closing session");
        self.session.shutdown().await;
        Ok(())
    }
}

fn describe_export(outcome: ExportOutcome) -> String {
    match outcome {
        ExportOutcome::Exported { path } => format!("Exported {}", path),
        ExportOutcome::Canceled => "Export canceled".to_string(),
    }
}
