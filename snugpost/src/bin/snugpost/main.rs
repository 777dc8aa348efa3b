mod context;
mod output;
mod theme;

use anyhow::{Context, Result};
use clap::{
    Args, ColorChoice, CommandFactory, FromArgMatches, Parser, Subcommand, ValueEnum,
    builder::{
        Styles,
        styling::{AnsiColor, Style},
    },
};
use colored::control::ShouldColorize;
use log::debug;
use snugpost::{Actor, ReactionKind, SocialEngine, Target};
use std::path::PathBuf;

use context::CliConfig;
use output::{GlobalOptions, OutputFormat, OutputManager};

#[derive(Parser)]
#[command(name = "snugpost")]
#[command(version = "0.1.0")]
#[command(
    about = "Posts, comments, replies and reactions on Redis Stack",
    long_about = r#"Social content and reaction engine on Redis Stack.

Commands:
  post      Publish, show, list and hide posts
  react     Toggle a like or dislike on a post or comment
  comment   Add, list and delete comments
  reply     Add, react to and remove replies
  share     Share a post (or a share) to the feed
  audit     Recompute a post's counters and optionally repair them
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to snugpost.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Redis connection URL, overriding the config file
    #[arg(long, env = "REDIS_URL", global = true)]
    redis_url: Option<String>,

    #[command(flatten)]
    actor: ActorArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ActorArgs {
    /// Acting user id
    #[arg(long = "as", env = "SNUGPOST_ACTOR", global = true, default_value = "")]
    actor_id: String,

    /// Display name recorded on anything the actor writes
    #[arg(long, env = "SNUGPOST_ACTOR_NAME", global = true)]
    actor_name: Option<String>,

    /// Avatar URL recorded on anything the actor writes
    #[arg(long, env = "SNUGPOST_ACTOR_AVATAR", global = true)]
    actor_avatar: Option<String>,
}

impl ActorArgs {
    fn actor(&self) -> Actor {
        let name = self.actor_name.clone().unwrap_or_else(|| self.actor_id.clone());
        let actor = Actor::new(self.actor_id.clone(), name);
        match &self.actor_avatar {
            Some(avatar) => actor.with_avatar(avatar.clone()),
            None => actor,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ReactionArg {
    Like,
    Dislike,
}

impl From<ReactionArg> for ReactionKind {
    fn from(value: ReactionArg) -> Self {
        match value {
            ReactionArg::Like => ReactionKind::Like,
            ReactionArg::Dislike => ReactionKind::Dislike,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum TargetArg {
    Post,
    Comment,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish, show, list and hide posts
    #[command(subcommand)]
    Post(PostCommands),

    /// Toggle a reaction on a post or comment
    React {
        #[arg(value_enum)]
        target: TargetArg,
        id: String,
        #[arg(value_enum)]
        kind: ReactionArg,
    },

    /// Add, list and delete comments
    #[command(subcommand)]
    Comment(CommentCommands),

    /// Add, react to and remove replies
    #[command(subcommand)]
    Reply(ReplyCommands),

    /// Share a post to the feed; shares of shares credit the root post
    Share {
        post_id: String,
        #[arg(long)]
        caption: Option<String>,
    },

    /// Compare a post's counters against its records
    Audit {
        post_id: String,
        /// Apply corrective deltas for any drift found
        #[arg(long)]
        repair: bool,
    },
}

#[derive(Subcommand)]
enum PostCommands {
    /// Publish a post
    Create {
        content: String,
        #[arg(long)]
        image: Option<String>,
    },
    /// Show one post
    Show { post_id: String },
    /// List the feed, newest first
    Feed {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Hide a post from the acting user's feed
    Hide { post_id: String },
}

#[derive(Subcommand)]
enum CommentCommands {
    /// Comment on a post
    Add { post_id: String, content: String },
    /// List a post's comments in order
    List { post_id: String },
    /// Show one comment with its replies
    Show { comment_id: String },
    /// Delete one of the acting user's comments
    Delete { post_id: String, comment_id: String },
}

#[derive(Subcommand)]
enum ReplyCommands {
    /// Reply to a comment, or to another reply with --to
    Add {
        post_id: String,
        comment_id: String,
        content: String,
        #[arg(long)]
        to: Option<String>,
    },
    /// Toggle a reaction on a reply
    React {
        post_id: String,
        comment_id: String,
        reply_id: String,
        #[arg(value_enum)]
        kind: ReactionArg,
    },
    /// Remove a reply
    Remove {
        post_id: String,
        comment_id: String,
        reply_id: String,
    },
}

fn help_styles() -> Styles {
    Styles::styled()
        .usage(Style::new().fg_color(Some(AnsiColor::BrightBlue.into())).bold())
        .header(Style::new().fg_color(Some(AnsiColor::Cyan.into())).bold())
        .literal(Style::new().fg_color(Some(AnsiColor::Magenta.into())))
        .placeholder(Style::new().fg_color(Some(AnsiColor::BrightBlack.into())))
        .error(Style::new().fg_color(Some(AnsiColor::Red.into())).bold())
}

fn parse_cli() -> Cli {
    let use_color = ShouldColorize::from_env().should_colorize();
    let command = Cli::command()
        .styles(help_styles())
        .color(if use_color { ColorChoice::Auto } else { ColorChoice::Never });
    let matches = command.get_matches();
    Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = parse_cli();
    let output = OutputManager::new(GlobalOptions {
        output_format: cli.output.clone(),
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color,
    });
    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(err) = execute(cli, &output).await {
        output.error(&format!("{err:#}"));
        std::process::exit(1);
    }
}

async fn execute(cli: Cli, output: &OutputManager) -> Result<()> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let redis_url = config.redis_url(cli.redis_url.as_deref())?;
    output.verbose(&format!(
        "namespace {}:{} on {redis_url}",
        config.engine.prefix, config.engine.service
    ));

    let engine = SocialEngine::connect(&redis_url, &config.engine)
        .await
        .with_context(|| format!("Failed to connect to {redis_url}"))?;
    let actor = cli.actor.actor();
    debug!("acting as {:?}", actor.id);

    match cli.command {
        Commands::Post(command) => match command {
            PostCommands::Create { content, image } => {
                let post = engine.publish(&actor, &content, image).await?;
                output.success(&format!("Published post {}", post.id));
                output.display(&post)?;
            }
            PostCommands::Show { post_id } => {
                output.display(&engine.post(&post_id).await?)?;
            }
            PostCommands::Feed { limit } => {
                let viewer = (!actor.id.trim().is_empty()).then_some(actor.id.as_str());
                output.display(&engine.feed(viewer, limit).await?)?;
            }
            PostCommands::Hide { post_id } => {
                if engine.hide_post(&post_id, &actor).await? {
                    output.success(&format!("Post {post_id} hidden"));
                } else {
                    output.info(&format!("Post {post_id} was already hidden"));
                }
            }
        },
        Commands::React { target, id, kind } => {
            let target = match target {
                TargetArg::Post => Target::Post(id),
                TargetArg::Comment => Target::Comment(id),
            };
            output.display(&engine.toggle_reaction(&target, &actor, kind.into()).await?)?;
        }
        Commands::Comment(command) => match command {
            CommentCommands::Add { post_id, content } => {
                let comment = engine.add_comment(&post_id, &actor, &content).await?;
                output.success(&format!("Added comment {}", comment.id));
                output.display(&comment)?;
            }
            CommentCommands::List { post_id } => {
                output.display(&engine.comments(&post_id).await?)?;
            }
            CommentCommands::Show { comment_id } => {
                output.display(&engine.comment(&comment_id).await?)?;
            }
            CommentCommands::Delete { post_id, comment_id } => {
                engine.delete_comment(&post_id, &comment_id, &actor).await?;
                output.success(&format!("Deleted comment {comment_id}"));
            }
        },
        Commands::Reply(command) => match command {
            ReplyCommands::Add {
                post_id,
                comment_id,
                content,
                to,
            } => {
                let reply = engine
                    .add_reply(&post_id, &comment_id, &actor, &content, to.as_deref())
                    .await?;
                output.success(&format!("Added reply {}", reply.id));
                output.display(&reply)?;
            }
            ReplyCommands::React {
                post_id,
                comment_id,
                reply_id,
                kind,
            } => {
                let outcome = engine
                    .toggle_reply_reaction(&post_id, &comment_id, &reply_id, &actor, kind.into())
                    .await?;
                output.display(&outcome)?;
            }
            ReplyCommands::Remove {
                post_id,
                comment_id,
                reply_id,
            } => {
                engine.remove_reply(&post_id, &comment_id, &reply_id, &actor).await?;
                output.success(&format!("Removed reply {reply_id}"));
            }
        },
        Commands::Share { post_id, caption } => {
            let original = engine.post(&post_id).await?;
            let share = engine.share_to_feed(&original, &actor, caption.as_deref()).await?;
            output.success(&format!("Shared {} as {}", share.root_id(), share.id));
            output.display(&share)?;
        }
        Commands::Audit { post_id, repair } => {
            let report = engine.audit_post(&post_id, repair).await?;
            if report.is_consistent() {
                output.success(&format!("Counters on {post_id} are consistent"));
            } else {
                output.warning(&format!("{} counter(s) drifted on {post_id}", report.drifts.len()));
            }
            output.display(&report)?;
            for target in &report.conflicts {
                output.warning(&format!("{target} changed during repair; run the audit again"));
            }
        }
    }

    Ok(())
}
