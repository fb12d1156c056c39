use colored::*;
use terminal_size::{terminal_size, Height, Width};

use crate::history::HistoryItem;

pub fn print_guru_header(model: &str, provider: &str) {
    let (width, _) = terminal_size().unwrap_or((Width(80), Height(24)));
    let width = width.0 as usize;

    let line = "─".repeat(width);
    println!("{}", line.black().bold());

    let name = "Guru".yellow().bold();
    let version = format!("v{}", env!("CARGO_PKG_VERSION")).black().bold();
    println!("  {} {} {}", "✍", name, version);

    let info = format!("  {}  •  {}", model, provider).cyan();
    println!("{}", info);

    println!("{}", line.black().bold());
}

pub fn print_step(msg: &str) {
    println!("  {} {}", "•".green(), msg);
}

pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green().bold(), msg.green());
}

pub fn print_warning(msg: &str) {
    println!("  {} {}", "⚠️ ".yellow().bold(), msg.yellow());
}

pub fn print_error(msg: &str) {
    println!("  {} {}", "❌".red().bold(), msg.red());
}

pub fn print_thinking(msg: &str) {
    println!("  {} {}...", "∴".magenta(), msg);
}

pub fn print_answer(answer: &str) {
    println!();
    println!("{}", answer);
    println!();
}

pub fn print_suggestions(suggestions: &[String]) {
    println!();
    for (i, s) in suggestions.iter().enumerate() {
        println!("  {} {}", format!("{}.", i + 1).cyan().bold(), s);
    }
    println!();
}

pub fn print_history(items: &[HistoryItem]) {
    if items.is_empty() {
        print_step("History is empty.");
        return;
    }

    for item in items {
        println!("{}", format!("── {} ──", item.timestamp).black().bold());
        let client = if item.client_message.is_empty() {
            "(none)"
        } else {
            item.client_message.as_str()
        };
        println!("  {} {}", "Client:".cyan(), client);
        if item.is_suggestions() {
            for (i, s) in item.suggestions().iter().enumerate() {
                println!("  {} {}", format!("{}.", i + 1).green(), s);
            }
        } else {
            println!("  {} {}", "Short:".cyan(), item.short_answer_or_marker);
            println!("  {} {}", "Reply:".green(), item.generated_text);
        }
        println!();
    }
}
