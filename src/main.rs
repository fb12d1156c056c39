//! Guru CLI entry point

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use guru::adapters::{run_interactive, TerminalSurface};
use guru::clipboard::{Clipboard, SystemClipboard};
use guru::config::Config;
use guru::controller::{Generated, InteractionController, SessionContext, Surface};
use guru::llm::GeminiClient;
use guru::store::PersistentStore;
use guru::ui;

#[derive(Parser)]
#[command(name = "guru")]
#[command(about = "✍ Guru - polished client replies from a short instruction")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up the model and API key
    Onboard,

    /// Turn a short answer into a full reply (no short answer: suggestions)
    Answer {
        /// The client's message
        #[arg(short, long)]
        client: Option<String>,

        /// Your short answer
        #[arg(short, long)]
        short: Option<String>,

        /// Read the client's message from the clipboard
        #[arg(long, conflicts_with = "client")]
        paste: bool,

        /// Copy the reply to the clipboard
        #[arg(long)]
        copy: bool,
    },

    /// Suggest three short replies
    Suggest {
        /// The client's message
        #[arg(short, long)]
        client: Option<String>,

        /// Read the client's message from the clipboard
        #[arg(long, conflicts_with = "client")]
        paste: bool,

        /// Copy suggestion N (1-3) to the clipboard
        #[arg(long, value_name = "N", conflicts_with = "use_suggestion")]
        copy: Option<usize>,

        /// Turn suggestion N (1-3) into a full reply
        #[arg(long = "use", value_name = "N")]
        use_suggestion: Option<usize>,
    },

    /// Show recent replies
    History {
        /// Delete all history
        #[arg(long, conflicts_with = "copy")]
        clear: bool,

        /// Copy the text of entry N (1 = newest) to the clipboard
        #[arg(long, value_name = "N")]
        copy: Option<usize>,
    },

    /// Manage the API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Menu-driven session
    Interactive,

    /// Show Guru status
    Status,

    /// Delete configuration, API key and history
    Reset,
}

#[derive(Subcommand)]
enum KeyAction {
    /// Save a new API key
    Set { key: String },
    /// Check the saved API key against the API
    Test,
    /// Remove the saved API key
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard => {
            guru::config::onboard().await?;
        }

        Commands::Answer {
            client,
            short,
            paste,
            copy,
        } => {
            let config = guru::config::load()?;
            let mut controller = build_controller(
                &config,
                TerminalSurface::new(client.unwrap_or_default(), short.unwrap_or_default()),
            );

            if paste {
                paste_into(&mut controller);
            }

            match controller.generate().await {
                Ok(Some(Generated::Answer(answer))) if copy => copy_out(&mut controller, &answer),
                Ok(_) => {}
                Err(_) => std::process::exit(1),
            }
        }

        Commands::Suggest {
            client,
            paste,
            copy,
            use_suggestion,
        } => {
            let config = guru::config::load()?;
            let mut controller =
                build_controller(&config, TerminalSurface::new(client.unwrap_or_default(), ""));

            if paste {
                paste_into(&mut controller);
            }

            let suggestions = match controller.generate().await {
                Ok(Some(Generated::Suggestions(suggestions))) => suggestions,
                Ok(_) => return Ok(()),
                Err(_) => std::process::exit(1),
            };

            if let Some(n) = copy {
                match nth(&suggestions, n) {
                    Some(text) => copy_out(&mut controller, text),
                    None => ui::print_warning(&format!("No suggestion #{}", n)),
                }
            }

            if let Some(n) = use_suggestion {
                let Some(text) = nth(&suggestions, n) else {
                    ui::print_error(&format!("No suggestion #{}", n));
                    std::process::exit(1);
                };
                controller.use_suggestion(text);
                if controller.generate().await.is_err() {
                    std::process::exit(1);
                }
            }
        }

        Commands::History { clear, copy } => {
            let config = guru::config::load()?;
            let mut controller = build_controller(&config, TerminalSurface::default());
            if clear {
                controller.clear_history();
            } else if let Some(n) = copy {
                let Some(index) = n.checked_sub(1) else {
                    ui::print_error("History entries are numbered from 1");
                    std::process::exit(1);
                };
                let mut clipboard = system_clipboard(&mut controller);
                if controller.copy_from_history(&mut clipboard, index).is_err() {
                    std::process::exit(1);
                }
            } else {
                ui::print_history(controller.history());
            }
        }

        Commands::Key { action } => {
            let config = guru::config::load()?;
            let mut controller = build_controller(&config, TerminalSurface::default());
            match action {
                KeyAction::Set { key } => controller.set_credential(&key),
                KeyAction::Clear => controller.set_credential(""),
                KeyAction::Test => {
                    if controller.test_credential(None).await.is_err() {
                        std::process::exit(1);
                    }
                }
            }
        }

        Commands::Interactive => {
            install_ctrlc_handler();

            let config = guru::config::load()?;
            ui::print_guru_header(&config.model, "Gemini");
            let mut controller = build_controller(&config, TerminalSurface::default());
            if !controller.context().has_credential() {
                ui::print_warning("No API key yet. Choose 'Set API key' before generating.");
            }
            run_interactive(&mut controller).await?;
        }

        Commands::Status => {
            let config = guru::config::load()?;
            let store = config.store();
            let has_key = store
                .get(guru::store::API_KEY)
                .ok()
                .flatten()
                .is_some_and(|k| !k.trim().is_empty());
            let history = guru::history::HistoryLog::load_from_store(&store);

            println!("✍ Guru Status\n");
            println!("Config: {:?}", guru::config::config_path());
            println!("Data: {:?}", config.data_dir);
            println!("Model: {}", config.model);
            println!(
                "API key: {}",
                if has_key {
                    "✓"
                } else if guru::config::env_api_key().is_some() {
                    "from $GEMINI_API_KEY"
                } else {
                    "not set (run 'guru onboard')"
                }
            );
            println!("History: {} item(s)", history.len());
        }

        Commands::Reset => {
            guru::config::reset()?;
        }
    }

    Ok(())
}

fn build_controller(
    config: &Config,
    surface: TerminalSurface,
) -> InteractionController<GeminiClient, TerminalSurface> {
    let store: Arc<dyn PersistentStore> = Arc::new(config.store());
    let fallback = guru::config::env_api_key();
    let context = SessionContext::load(store, fallback.as_deref());
    InteractionController::new(config.service(), context, surface)
}

/// Suggestion `n`, counted from 1.
fn nth(suggestions: &[String], n: usize) -> Option<&String> {
    n.checked_sub(1).and_then(|i| suggestions.get(i))
}

// The surface has already shown the failure; exit without a second report
fn system_clipboard(
    controller: &mut InteractionController<GeminiClient, TerminalSurface>,
) -> SystemClipboard {
    match SystemClipboard::new() {
        Ok(clipboard) => clipboard,
        Err(e) => {
            controller.surface_mut().notify_error(&e);
            std::process::exit(1);
        }
    }
}

fn paste_into(controller: &mut InteractionController<GeminiClient, TerminalSurface>) {
    let mut clipboard = system_clipboard(controller);
    if controller.paste_client_message(&mut clipboard).is_err() {
        std::process::exit(1);
    }
}

// Clipboard failures are reported but do not fail the command
fn copy_out(controller: &mut InteractionController<GeminiClient, TerminalSurface>, text: &str) {
    match SystemClipboard::new() {
        Ok(mut clipboard) => {
            let _ = controller.copy_text(&mut clipboard as &mut dyn Clipboard, text);
        }
        Err(e) => controller.surface_mut().notify_error(&e),
    }
}

fn install_ctrlc_handler() {
    let exit_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let r = exit_flag.clone();

    ctrlc::set_handler(move || {
        if r.load(std::sync::atomic::Ordering::SeqCst) {
            println!("\n👋 Bye!");
            std::process::exit(0);
        } else {
            println!("\n⚠️  Press Ctrl+C again to exit");
            r.store(true, std::sync::atomic::Ordering::SeqCst);

            // Reset flag after 3 seconds
            let r2 = r.clone();
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_secs(3));
                r2.store(false, std::sync::atomic::Ordering::SeqCst);
            });
        }
    })
    .ok();
}
