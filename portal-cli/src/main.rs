use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::{style, Emoji};
use dialoguer::{theme::ColorfulTheme, Select};
use itertools::Itertools;
use portal_client::{api::chart::Chart, client::PortalClient, files::Portalrc};
use portal_view::{
    AssumeYes, BackupOutcome, ChartCard, Confirm, DeleteOutcome, Page, SharedCard, UploadOutcome,
};
use tracing_subscriber::EnvFilter;
use url::Url;

mod terminal;

use terminal::{print_card, BackupSwitch, ConsoleNotifier, DialoguerConfirm};

#[derive(Parser, Debug)]
struct Cli {
    /// Portal URL, or an alias from the configuration file
    #[arg(short, long)]
    api_url: Option<String>,
    #[arg(short, long)]
    username: Option<String>,
    #[arg(short, long)]
    password: Option<String>,
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, action=clap::ArgAction::Count)]
    verbose: u8,
    #[arg(short, long, action=clap::ArgAction::Count, conflicts_with="verbose")]
    quiet: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List charts and their versions
    List,
    /// Show a chart, optionally switching to another version
    Show {
        chart: String,
        #[arg(long)]
        version: Option<String>,
    },
    /// Delete one version of a chart
    Delete {
        chart: String,
        version: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// Trigger a backup of the portal storage
    Backup,
    /// Upload a packaged chart (.tgz)
    Upload { file: PathBuf },
    /// Download a packaged chart
    Download {
        chart: String,
        version: String,
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Pick charts and actions interactively
    Browse,
}

static VERBOSITY: AtomicU8 = AtomicU8::new(2);
macro_rules! warn {
    ($fmt:literal $(, $arg:expr)*) => {
        if VERBOSITY.load(Ordering::Acquire) >= 2 {
            println!(concat!("{} ", $fmt), Emoji("⚠️", "!"), $(style($arg).bold()),*);
        }
    };
}
macro_rules! info {
    ($fmt:literal $(, $arg:expr)*) => {
        if VERBOSITY.load(Ordering::Acquire) >= 3 {
            println!(concat!("{} ", $fmt), Emoji("ℹ️", "i"), $(style($arg).bold()),*);
        }
    };
}

type PortalPage = Page<Arc<PortalClient>>;

struct Session {
    page: PortalPage,
    cards: Vec<SharedCard>,
    backup: BackupSwitch,
}

impl Session {
    /// Builds a card per chart on the portal, then bootstraps the page.
    async fn open(client: Arc<PortalClient>, confirm: Arc<dyn Confirm>) -> anyhow::Result<Self> {
        let groups = Chart::list(&client)
            .await
            .context("Unable to list charts")?;
        let cards = groups
            .iter()
            .filter(|g| !g.versions.is_empty())
            .map(|g| SharedCard::new(ChartCard::with_versions(&g.name, &g.versions)))
            .collect_vec();
        let backup = BackupSwitch::default();
        let page = cards.iter().fold(
            Page::new(client, Arc::new(ConsoleNotifier), confirm)
                .with_upload_form()
                .with_backup_control(Box::new(backup.clone())),
            |page, card| page.with_card(Box::new(card.clone())),
        );
        page.bootstrap().await;
        info!("Loaded {} charts", cards.len());
        Ok(Self {
            page,
            cards,
            backup,
        })
    }

    fn card(&self, chart: &str) -> Option<&SharedCard> {
        self.cards.iter().find(|c| c.get().name() == chart)
    }

    fn visible_cards(&self) -> Vec<&SharedCard> {
        self.cards.iter().filter(|c| !c.get().is_removed()).collect()
    }

    fn print(&self, chart: &str) {
        if let Some(card) = self.card(chart) {
            print_card(&card.get());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let args = Cli::parse();
    VERBOSITY.fetch_add(args.verbose, Ordering::AcqRel);
    VERBOSITY.fetch_sub(args.quiet.min(2), Ordering::AcqRel);

    let cfg = Portalrc::new(args.config.as_deref()).context("Unable to read portalrc")?;
    let api_url = match args.api_url {
        Some(alias) => match cfg.apiurl_from_alias(&alias) {
            Some(url) => url,
            None => Url::parse(&alias).context("Invalid portal URL")?,
        },
        None => cfg.apiurl.clone(),
    };
    let authenticator = cfg.authenticator(&api_url, args.username, args.password);
    let client = Arc::new(PortalClient::new(
        api_url.clone(),
        authenticator,
        cfg.http_headers(&api_url),
    )?);
    info!("Using portal {}", &api_url);

    let ok = match args.command {
        Command::List => {
            let session = Session::open(client, Arc::new(DialoguerConfirm::new())).await?;
            if session.cards.is_empty() {
                warn!("No chart on {}", &api_url);
            }
            for card in session.cards.iter() {
                print_card(&card.get());
            }
            true
        }
        Command::Show { chart, version } => {
            let session = Session::open(client, Arc::new(DialoguerConfirm::new())).await?;
            if let Some(version) = version {
                session.page.select_version(&chart, &version).await?;
            }
            session.print(&chart);
            true
        }
        Command::Delete {
            chart,
            version,
            yes,
        } => {
            let confirm: Arc<dyn Confirm> = match yes {
                true => Arc::new(AssumeYes),
                false => Arc::new(DialoguerConfirm::new()),
            };
            let session = Session::open(client, confirm).await?;
            delete(&session, &chart, &version).await
        }
        Command::Backup => {
            let session = Session::open(client, Arc::new(DialoguerConfirm::new())).await?;
            backup(&session).await
        }
        Command::Upload { file } => {
            let session = Session::open(client, Arc::new(DialoguerConfirm::new())).await?;
            upload(&session, &file).await
        }
        Command::Download {
            chart,
            version,
            output,
        } => {
            let data = Chart::from_name(client, &chart)
                .download(&version)
                .await
                .with_context(|| format!("Unable to download {} {}", chart, version))?;
            let path = output.join(format!("{}-{}.tgz", chart, version));
            std::fs::write(&path, data)
                .with_context(|| format!("Unable to write {}", path.display()))?;
            println!(
                "{} Saved {}",
                Emoji("📥", "->"),
                style(path.display()).bold()
            );
            true
        }
        Command::Browse => {
            let session = Session::open(client, Arc::new(DialoguerConfirm::new())).await?;
            browse(&session).await?;
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

async fn delete(session: &Session, chart: &str, version: &str) -> bool {
    match session.page.delete(chart, version).await {
        DeleteOutcome::Declined => {
            info!("Doing nothing !");
            true
        }
        DeleteOutcome::AlreadyInFlight => true,
        DeleteOutcome::Failed(_) => false,
        DeleteOutcome::VersionDeleted => {
            session.print(chart);
            true
        }
        DeleteOutcome::ChartRemoved => true,
    }
}

async fn backup(session: &Session) -> bool {
    match session.page.backup().await {
        BackupOutcome::Completed(_) => true,
        BackupOutcome::Failed(_) => false,
        BackupOutcome::Disabled => {
            warn!("Backups are disabled on this portal");
            false
        }
    }
}

async fn upload(session: &Session, file: &std::path::Path) -> bool {
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if let Some(indicator) = session.page.upload_started(&file_name) {
        println!("{} {}", Emoji("⏳", "..."), style(indicator).blue());
    }
    matches!(session.page.upload(file).await, UploadOutcome::Uploaded(_))
}

async fn browse(session: &Session) -> anyhow::Result<()> {
    let theme = ColorfulTheme::default();
    loop {
        session.page.dismiss_notice();
        let cards = session.visible_cards();
        let mut items = cards.iter().map(|c| c.get().name().to_string()).collect_vec();
        if !session.backup.is_hidden() {
            items.push("[backup]".to_string());
        }
        let Some(choice) = Select::with_theme(&theme)
            .with_prompt("Select a chart (press Esc to quit)")
            .items(&items)
            .default(0)
            .interact_opt()?
        else {
            return Ok(());
        };
        let Some(card) = cards.get(choice) else {
            backup(session).await;
            continue;
        };
        let chart = card.get().name().to_string();
        session.print(&chart);

        let actions = ["Switch version", "Delete selected version", "Back"];
        let action = Select::with_theme(&theme)
            .with_prompt(format!("Action on {}", chart))
            .items(&actions)
            .default(0)
            .interact_opt()?;
        match action {
            Some(0) => {
                let versions = card.get().versions().to_vec();
                if let Some(index) = Select::with_theme(&theme)
                    .with_prompt("Version")
                    .items(&versions)
                    .default(0)
                    .interact_opt()?
                {
                    session.page.select_version(&chart, &versions[index]).await?;
                    session.print(&chart);
                }
            }
            Some(1) => {
                let target = card.get().links().map(|l| l.delete.version.clone());
                match target {
                    Some(version) => {
                        delete(session, &chart, &version).await;
                    }
                    None => warn!("No version selected for {}", &chart),
                }
            }
            _ => {}
        }
    }
}
