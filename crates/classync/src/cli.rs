//! Command line front end driving a class editor against a JSON document.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::app::commit::{CommitOutcome, SelectorCapture};
use crate::app::notify::NotificationCenter;
use crate::app::ports::Services;
use crate::app::selection::SelectionFeed;
use crate::app::session::ClassEditor;
use crate::domain::model::BufferTarget;
use crate::infra::config::Config;
use crate::infra::logging;
use crate::infra::memory::{MemoryDocument, MemoryLiveViews};
use crate::infra::telemetry::TracingUsageReporter;
use crate::ui::panel;

#[derive(Debug, Parser)]
#[command(
    name = "classync",
    author,
    version,
    about = "Edit the utility classes of a selected element and its component root"
)]
pub struct Cli {
    /// Extra config file layered above the global and workspace configs.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the class buffers for a selector.
    Show(Target),
    /// Commit new classes for the instance and/or root of a selector.
    Edit {
        #[command(flatten)]
        target: Target,
        /// New classes for the selected element.
        #[arg(long)]
        instance: Option<String>,
        /// New classes for the enclosing component root.
        #[arg(long)]
        root: Option<String>,
        /// Write the edited document back to disk.
        #[arg(long)]
        write: bool,
        /// Milliseconds to wait before reconciling with the document.
        #[arg(long, value_name = "MS")]
        settle_delay: Option<u64>,
        /// Which selection a commit is attributed to.
        #[arg(long, value_enum)]
        capture: Option<SelectorCapture>,
    },
    /// Print the effective configuration.
    Config,
    /// Generate shell completions.
    Completions { shell: Shell },
}

#[derive(Debug, Args)]
struct Target {
    /// JSON document describing nodes, their classes, and selectable elements.
    #[arg(long, value_name = "FILE")]
    document: PathBuf,
    /// Selector of the element to edit.
    #[arg(long)]
    select: String,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    });

    let mut config = Config::load_with_file(cli.config.as_deref())?;
    match cli.command {
        Command::Config => print!("{}", config.to_toml()?),
        Command::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "classync", &mut io::stdout());
        }
        Command::Show(target) => {
            let session = Session::open(&target, &config)?;
            runtime()?.block_on(session.show());
        }
        Command::Edit {
            target,
            instance,
            root,
            write,
            settle_delay,
            capture,
        } => {
            if let Some(millis) = settle_delay {
                config.set_settle_delay_ms(millis);
            }
            if let Some(capture) = capture {
                config.set_selector_capture(capture);
            }
            let session = Session::open(&target, &config)?;
            let edits = [(BufferTarget::Instance, instance), (BufferTarget::Root, root)];
            let failures = runtime()?.block_on(session.edit(edits))?;
            if write {
                session.document.save(&target.document)?;
            }
            if failures > 0 {
                bail!("{failures} commit(s) failed");
            }
        }
    }
    Ok(())
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

struct Session {
    document: Arc<MemoryDocument>,
    notices: Arc<NotificationCenter>,
    editor: ClassEditor,
    // Keeps the selection alive for the lifetime of the editor.
    _feed: SelectionFeed,
}

impl Session {
    fn open(target: &Target, config: &Config) -> Result<Self> {
        let document = Arc::new(MemoryDocument::load(&target.document)?);
        let views = Arc::new(MemoryLiveViews::new());
        views.open("preview");
        let notices = Arc::new(NotificationCenter::new());

        let feed = SelectionFeed::new();
        feed.select([target.select.as_str()]);

        let services = Services {
            resolver: document.clone(),
            classes: document.clone(),
            code: document.clone(),
            views,
            usage: Arc::new(TracingUsageReporter),
            notifier: notices.clone(),
        };
        let editor = ClassEditor::new(services, feed.tracker(), config.editor());

        Ok(Self {
            document,
            notices,
            editor,
            _feed: feed,
        })
    }

    async fn show(&self) {
        self.editor.sync_selection().await;
        print!("{}", panel::render(&self.editor.panel(), &self.notices.active()));
    }

    /// Commit each requested edit through the editor's commit keys. Returns how many failed.
    async fn edit(&self, edits: [(BufferTarget, Option<String>); 2]) -> Result<usize> {
        self.editor.sync_selection().await;

        let mut failures = 0;
        for (target, text) in edits {
            let Some(text) = text else {
                continue;
            };
            self.editor.focus(target)?;
            self.editor.input(target, text)?;

            let outcome = match self.editor.config().commit_keys.first() {
                Some(key) => match self.editor.key(target, key).await {
                    Some(outcome) => outcome,
                    None => self.editor.blur(target).await,
                },
                None => self.editor.blur(target).await,
            };
            match outcome {
                Ok(CommitOutcome::Applied(report)) => println!(
                    "applied {target}: {} -> \"{}\"",
                    report.request.template_node, report.request.attributes.class_name
                ),
                Ok(CommitOutcome::NoTarget) => {
                    println!("skipped {target}: selection has no {target} node")
                }
                Ok(CommitOutcome::NotEditing) => {}
                Err(_) => failures += 1,
            }
        }

        self.editor.wait_for_reconciliation().await;
        print!("{}", panel::render(&self.editor.panel(), &self.notices.active()));
        Ok(failures)
    }
}
