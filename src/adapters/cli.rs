//! CLI adapter — terminal rendering surface and interactive session.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Select, Text};

use crate::clipboard::{Clipboard, SystemClipboard};
use crate::controller::{Generated, InteractionController, Surface};
use crate::history::HistoryItem;
use crate::error::Error;
use crate::llm::GenerationBackend;
use crate::ui;
use crate::Result;

/// Terminal surface: two input slots, spinner while awaiting, colored output.
#[derive(Default)]
pub struct TerminalSurface {
    client: String,
    short: String,
    spinner: Option<ProgressBar>,
    last_output: Option<String>,
}

impl TerminalSurface {
    pub fn new(client: impl Into<String>, short: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            short: short.into(),
            ..Default::default()
        }
    }

    /// Last answer or suggestion block shown.
    pub fn last_output(&self) -> Option<&str> {
        self.last_output.as_deref()
    }
}

impl Surface for TerminalSurface {
    fn client_message(&self) -> String {
        self.client.clone()
    }

    fn short_answer(&self) -> String {
        self.short.clone()
    }

    fn set_client_message(&mut self, text: &str) {
        self.client = text.to_string();
    }

    fn set_short_answer(&mut self, text: &str) {
        self.short = text.to_string();
    }

    fn set_busy(&mut self, busy: bool) {
        if busy {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("  {spinner:.magenta} {msg}") {
                spinner.set_style(style);
            }
            spinner.set_message("Writing...");
            spinner.enable_steady_tick(Duration::from_millis(100));
            self.spinner = Some(spinner);
        } else if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    fn show_answer(&mut self, answer: &str) {
        ui::print_answer(answer);
        self.last_output = Some(answer.to_string());
    }

    fn show_suggestions(&mut self, suggestions: &[String]) {
        if suggestions.is_empty() {
            ui::print_warning("The model returned no numbered suggestions.");
        }
        ui::print_suggestions(suggestions);
        self.last_output = Some(suggestions.join("\n\n"));
    }

    fn clear_inputs(&mut self) {
        self.client.clear();
        self.short.clear();
    }

    fn notify_error(&mut self, error: &Error) {
        if error.is_user_visible() {
            ui::print_error(&error.to_string());
        }
    }

    fn notify(&mut self, message: &str) {
        ui::print_success(message);
    }
}

const ACTION_GENERATE: &str = "Write a reply (leave the short answer empty for suggestions)";
const ACTION_PASTE: &str = "Paste client message from clipboard";
const ACTION_COPY: &str = "Copy last result";
const ACTION_HISTORY: &str = "Show history";
const ACTION_COPY_HISTORY: &str = "Copy from history";
const ACTION_CLEAR: &str = "Clear history";
const ACTION_KEY: &str = "Set API key";
const ACTION_TEST: &str = "Test API key";
const ACTION_QUIT: &str = "Quit";

const KEEP_SUGGESTIONS: &str = "None, keep the suggestions";

fn prompt_text(message: &str, initial: &str) -> Result<String> {
    Text::new(message)
        .with_initial_value(initial)
        .prompt()
        .map_err(|e| Error::Other(format!("Prompt failed: {}", e)))
}

/// One-line menu label for a history entry.
fn history_label(index: usize, item: &HistoryItem) -> String {
    let mut preview: String = item.client_message.chars().take(48).collect();
    if item.client_message.chars().count() > 48 {
        preview.push('…');
    }
    let kind = if item.is_suggestions() { "suggestions" } else { "reply" };
    format!("{}. [{}] {} ({})", index + 1, item.timestamp, preview, kind)
}

/// Offer the suggestions as short answers; `None` keeps them as they are.
fn pick_suggestion(suggestions: &[String]) -> Option<String> {
    if suggestions.is_empty() {
        return None;
    }
    let mut options: Vec<String> = suggestions.to_vec();
    options.push(KEEP_SUGGESTIONS.to_string());

    match Select::new("Use a suggestion as your short answer?", options).prompt() {
        Ok(choice) if choice != KEEP_SUGGESTIONS => Some(choice),
        _ => None,
    }
}

fn with_system_clipboard<B: GenerationBackend>(
    controller: &mut InteractionController<B, TerminalSurface>,
    action: impl FnOnce(&mut InteractionController<B, TerminalSurface>, &mut dyn Clipboard),
) {
    match SystemClipboard::new() {
        Ok(mut clipboard) => action(controller, &mut clipboard),
        Err(e) => controller.surface_mut().notify_error(&e),
    }
}

/// Menu-driven session until the user quits.
pub async fn run_interactive<B: GenerationBackend>(
    controller: &mut InteractionController<B, TerminalSurface>,
) -> Result<()> {
    let actions = vec![
        ACTION_GENERATE,
        ACTION_PASTE,
        ACTION_COPY,
        ACTION_HISTORY,
        ACTION_COPY_HISTORY,
        ACTION_CLEAR,
        ACTION_KEY,
        ACTION_TEST,
        ACTION_QUIT,
    ];

    loop {
        let action = match Select::new("What next?", actions.clone()).prompt() {
            Ok(action) => action,
            // Esc / Ctrl+C ends the session
            Err(_) => break,
        };

        // Failures are already shown by the surface; the loop lets the user retry
        match action {
            ACTION_GENERATE => {
                let client = prompt_text("Client message:", &controller.surface().client_message())?;
                controller.surface_mut().set_client_message(&client);
                let short = prompt_text(
                    "Your short answer (empty for suggestions):",
                    &controller.surface().short_answer(),
                )?;
                controller.surface_mut().set_short_answer(&short);

                if let Ok(Some(Generated::Suggestions(suggestions))) = controller.generate().await {
                    if let Some(choice) = pick_suggestion(&suggestions) {
                        controller.use_suggestion(&choice);
                        let _ = controller.generate().await;
                    }
                }
            }
            ACTION_PASTE => with_system_clipboard(controller, |controller, clipboard| {
                if controller.paste_client_message(clipboard).is_ok() {
                    ui::print_step("Client message pasted.");
                }
            }),
            ACTION_COPY => {
                let Some(text) = controller.surface().last_output().map(str::to_string) else {
                    ui::print_step("Nothing to copy yet.");
                    continue;
                };
                with_system_clipboard(controller, |controller, clipboard| {
                    let _ = controller.copy_text(clipboard, &text);
                });
            }
            ACTION_HISTORY => ui::print_history(controller.history()),
            ACTION_COPY_HISTORY => {
                if controller.history().is_empty() {
                    ui::print_step("No history yet.");
                    continue;
                }
                let labels: Vec<String> = controller
                    .history()
                    .iter()
                    .enumerate()
                    .map(|(i, item)| history_label(i, item))
                    .collect();
                let Ok(choice) = Select::new("Copy which entry?", labels.clone()).prompt() else {
                    continue;
                };
                if let Some(index) = labels.iter().position(|l| *l == choice) {
                    with_system_clipboard(controller, |controller, clipboard| {
                        let _ = controller.copy_from_history(clipboard, index);
                    });
                }
            }
            ACTION_CLEAR => controller.clear_history(),
            ACTION_KEY => {
                let key = inquire::Password::new("New API key (empty to clear):")
                    .without_confirmation()
                    .prompt()
                    .map_err(|e| Error::Other(format!("Prompt failed: {}", e)))?;
                controller.set_credential(&key);
            }
            ACTION_TEST => {
                let _ = controller.test_credential(None).await;
            }
            _ => break,
        }
    }

    println!("👋 Bye!");
    Ok(())
}
