use std::sync::{Arc, Mutex, PoisonError};

use console::{style, Emoji};
use dialoguer::theme::ColorfulTheme;
use itertools::Itertools;
use portal_view::{BackupControl, ChartCard, Confirm, Notice, Notifier, Severity};

/// Prints notices as they come, they stay in the scrollback.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.severity {
            Severity::Error => println!(
                "{} {}: {}",
                Emoji("❌", "x"),
                style(notice.title()).red().bold(),
                notice.plain_text()
            ),
            Severity::Success => println!(
                "{} {}: {}",
                Emoji("✅", "v"),
                style(notice.title()).green().bold(),
                notice.plain_text()
            ),
        }
    }
}

#[derive(Default)]
pub struct DialoguerConfirm {
    theme: ColorfulTheme,
}

impl DialoguerConfirm {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Confirm for DialoguerConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        dialoguer::Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// Tracks whether the backup command should be offered.
#[derive(Debug, Default, Clone)]
pub struct BackupSwitch {
    enabled: Arc<Mutex<Option<bool>>>,
}

impl BackupSwitch {
    pub fn is_hidden(&self) -> bool {
        *self.enabled.lock().unwrap_or_else(PoisonError::into_inner) == Some(false)
    }
}

impl BackupControl for BackupSwitch {
    fn hide(&mut self) {
        *self.enabled.lock().unwrap_or_else(PoisonError::into_inner) = Some(false);
    }

    fn enable(&mut self) {
        *self.enabled.lock().unwrap_or_else(PoisonError::into_inner) = Some(true);
    }
}

pub fn print_card(card: &ChartCard) {
    if card.is_removed() {
        return;
    }
    println!("{} {}", Emoji("📦", "*"), style(card.name()).bold());
    let versions = card
        .versions()
        .iter()
        .map(|v| match card.selected() {
            Some(selected) if selected == v => style(v).cyan().bold().to_string(),
            _ => v.to_string(),
        })
        .join(", ");
    println!("    versions:    {}", versions);
    println!("    app version: {}", card.app_version());
    if !card.description().is_empty() {
        println!("    description: {}", card.description());
    }
    if let Some(links) = card.links() {
        println!("    details:     {}", style(&links.info).underlined());
        println!("    download:    {}", style(&links.download).underlined());
    }
}
