//! Compiled-in extensions: the installer cog and help

use tokio::sync::Mutex;
use crate::application::context::CommandContext;
use crate::application::errors::{CommandError, RegistryError};
use crate::application::services::{HelpService, HelpTopic, InstallProgress};
use crate::application::widgets::{ListPageSource, PageContent};
use crate::domain::entities::{Command, ExtensionKind};
use crate::domain::traits::OutgoingMessage;
use super::trait_def::Extension;

pub const INSTALLER: &str = "installer";
pub const HELP: &str = "help";

const EXTENSIONS_PER_PAGE: usize = 10;

/// Installs, unloads and lists cogs and features
pub struct InstallerCog;

impl Extension for InstallerCog {
    fn name(&self) -> &str {
        "Installer"
    }

    fn description(&self) -> Option<&str> {
        Some("Manage installed cogs and features")
    }

    fn hidden(&self) -> bool {
        true
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::new("install")
                .with_description("Install a cog or feature from a git repository")
                .with_usage("<repo>")
                .owner_only()
                .hidden()
                .with_handler(install),
            Command::new("unload")
                .with_description("Unload a cog or feature")
                .with_usage("<raw_name>")
                .owner_only()
                .hidden()
                .with_handler(unload),
            Command::new("extensions")
                .with_description("List loaded cogs and features")
                .with_aliases(vec!["exts".to_string()])
                .with_handler(list_extensions),
        ]
    }
}

/// Status message that is posted once and edited on every later update
struct StatusProgress {
    ctx: CommandContext,
    message_id: Mutex<Option<String>>,
}

impl StatusProgress {
    fn new(ctx: CommandContext) -> Self {
        Self {
            ctx,
            message_id: Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl InstallProgress for StatusProgress {
    async fn update(&self, status: &str) {
        let mut message_id = self.message_id.lock().await;
        let result = match message_id.as_deref() {
            Some(id) => self.ctx.edit_status(id, status).await,
            None => self.ctx.status(status).await.map(|id| {
                *message_id = Some(id);
            }),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to post install status: {}", e);
        }
    }
}

async fn install(ctx: CommandContext) -> Result<(), CommandError> {
    let Some(repo) = ctx.arg(0).map(str::to_string) else {
        ctx.status("You need to provide a repo to install").await?;
        return Ok(());
    };

    let progress = StatusProgress::new(ctx.clone());
    match ctx.installer().install(&repo, ctx.is_owner(), &progress).await {
        Ok(report) => progress.update(&report.summary()).await,
        Err(e) => progress.update(&e.user_message()).await,
    }
    Ok(())
}

async fn unload(ctx: CommandContext) -> Result<(), CommandError> {
    let raw_name = ctx
        .arg(0)
        .map(str::to_string)
        .ok_or_else(|| CommandError::MissingArgument("raw_name".to_string()))?;

    let record = ctx
        .registry()
        .record(&raw_name)
        .ok_or_else(|| RegistryError::NotFound(raw_name.clone()))?;
    if record.kind == ExtensionKind::Internal {
        return Err(RegistryError::Protected(raw_name).into());
    }

    let answer = ctx
        .confirm(&format!("Unload the {} '{}'?", record.kind, raw_name), true)
        .await?;

    let status = match answer {
        Some(true) => {
            ctx.registry().unload(&raw_name)?;
            format!("Unloaded '{}'.", raw_name)
        }
        Some(false) => "Cancelled.".to_string(),
        None => "Timed out.".to_string(),
    };
    ctx.status(&status).await?;
    Ok(())
}

async fn list_extensions(ctx: CommandContext) -> Result<(), CommandError> {
    let loaded: Vec<(ExtensionKind, String)> = ctx.registry().list_loaded().into_iter().collect();
    if loaded.is_empty() {
        ctx.status("No cogs or features are installed.").await?;
        return Ok(());
    }

    let pages = loaded.len().div_ceil(EXTENSIONS_PER_PAGE);
    let base = ctx.embed().with_title("Loaded extensions");
    let source = ListPageSource::new(loaded, EXTENSIONS_PER_PAGE, move |index, entries| {
        let lines: Vec<String> = entries
            .iter()
            .map(|(kind, raw_name)| format!("`{}` {}", kind, raw_name))
            .collect();
        PageContent::Embed(
            base.clone()
                .with_description(lines.join("\n"))
                .with_footer(format!("Page {}/{}", index + 1, pages)),
        )
    });

    ctx.paginate(source).await?;
    Ok(())
}

/// `help`, `help <extension>` and `help <command>`
pub struct HelpCog;

impl Extension for HelpCog {
    fn name(&self) -> &str {
        "Help"
    }

    fn hidden(&self) -> bool {
        true
    }

    fn commands(&self) -> Vec<Command> {
        vec![Command::new("help")
            .with_description("Show the loaded extensions, or help for one extension or command")
            .with_usage("[extension|command]")
            .with_handler(help)]
    }
}

async fn help(ctx: CommandContext) -> Result<(), CommandError> {
    let config = ctx.config();
    let service = HelpService::new(&config.bot.name, &ctx.prefix, config.bot.color, &config.help.blacklist);
    let extensions = ctx.registry().extensions();

    let embed = match ctx.arg(0) {
        None => service.overview(&extensions),
        Some(query) => match service.find_extension(&extensions, query) {
            Some(info) => service.render(HelpTopic::Extension(info)),
            None => match ctx.registry().find_command(query).filter(|c| !c.hidden) {
                Some(command) => service.render(HelpTopic::Command(&command)),
                None => service.render(HelpTopic::Missing(query)),
            },
        },
    };

    ctx.reply(OutgoingMessage::embed(embed)).await?;
    Ok(())
}
