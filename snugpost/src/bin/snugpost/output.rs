use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{Attribute, Cell, Color as TableColor, Table};
use serde::Serialize;
use snugpost::{AuditReport, Comment, Post, ReactionKind, ReactionOutcome, Reply};

use crate::theme::{ICONS, THEME};

/// Output format options for CLI commands
#[derive(Clone, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    /// Formatted table output (default)
    #[default]
    Table,
    /// JSON output for scripting
    Json,
    /// Compact single-line output
    Compact,
}

/// Global CLI options that affect output and behavior
#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
    pub no_color: bool,
}

/// Data that can be displayed as a table
pub trait TableDisplay {
    fn to_table(&self, options: &GlobalOptions) -> Table;
    fn to_compact(&self) -> String;
}

/// Output manager handles formatting and display
pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        Self { options }
    }

    /// Display data according to the configured output format
    pub fn display<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + TableDisplay + ?Sized,
    {
        if self.options.quiet {
            return Ok(());
        }

        match self.options.output_format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(data)?;
                println!("{json}");
            }
            OutputFormat::Table => {
                let table = data.to_table(&self.options);
                println!("{table}");
            }
            OutputFormat::Compact => {
                println!("{}", data.to_compact());
            }
        }
        Ok(())
    }

    fn tagged(&self, icon: &str, color: colored::Color, message: &str) -> String {
        if self.options.no_color {
            format!("{icon} {message}")
        } else {
            format!("{} {}", icon.color(color), message.color(color))
        }
    }

    /// Display a success message with color and icon
    pub fn success(&self, message: &str) {
        if !self.options.quiet && self.options.output_format != OutputFormat::Json {
            println!("{}", self.tagged(ICONS.success, THEME.success, message));
        }
    }

    /// Display an error message with color and icon
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.tagged(ICONS.error, THEME.error, message));
    }

    pub fn warning(&self, message: &str) {
        if !self.options.quiet && self.options.output_format != OutputFormat::Json {
            println!("{}", self.tagged(ICONS.warning, THEME.warning, message));
        }
    }

    pub fn info(&self, message: &str) {
        if !self.options.quiet && self.options.output_format != OutputFormat::Json {
            println!("{}", self.tagged(ICONS.info, THEME.info, message));
        }
    }

    /// Display verbose information (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.options.verbose && !self.options.quiet {
            eprintln!("{}", self.tagged(ICONS.arrow, THEME.muted, message));
        }
    }
}

fn themed_table(options: &GlobalOptions, headers: &[&str]) -> Table {
    let mut table = Table::new();
    if options.no_color {
        table.load_preset(comfy_table::presets::ASCII_FULL);
    } else {
        table.load_preset(comfy_table::presets::UTF8_FULL_CONDENSED);
    }
    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|header| {
            let cell = Cell::new(header).add_attribute(Attribute::Bold);
            if options.no_color { cell } else { cell.fg(TableColor::Cyan) }
        })
        .collect();
    table.set_header(header_cells);
    table
}

fn key_value_table(options: &GlobalOptions, rows: Vec<(&str, String)>) -> Table {
    let mut table = themed_table(options, &["Field", "Value"]);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    table
}

fn reaction_label(kind: Option<ReactionKind>) -> &'static str {
    kind.map(ReactionKind::as_str).unwrap_or("none")
}

fn post_content(post: &Post) -> String {
    match &post.origin {
        Some(origin) => format!(
            "{} {} {} @{}: {}",
            post.content, ICONS.share, origin.original_post_id, origin.original_author_name, origin.original_content
        )
        .trim_start()
        .to_string(),
        None => post.content.clone(),
    }
}

impl TableDisplay for Post {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut rows = vec![
            ("Id", self.id.clone()),
            ("Author", format!("{} ({})", self.author.author_name, self.author.author_id)),
            ("Content", self.content.clone()),
            ("Created", self.created_at.to_rfc3339()),
            ("Likes", self.like_count.to_string()),
            ("Dislikes", self.dislike_count.to_string()),
            ("Comments", self.comment_count.to_string()),
            ("Shares", self.share_count.to_string()),
        ];
        if let Some(image_url) = &self.image_url {
            rows.push(("Image", image_url.clone()));
        }
        if let Some(origin) = &self.origin {
            rows.push(("Shared from", format!("{} by {}", origin.original_post_id, origin.original_author_name)));
            rows.push(("Original", origin.original_content.clone()));
        }
        key_value_table(options, rows)
    }

    fn to_compact(&self) -> String {
        format!(
            "{} {} {}{} {}{} {}",
            self.id, self.author.author_id, ICONS.like, self.like_count, ICONS.dislike, self.dislike_count, post_content(self)
        )
    }
}

impl TableDisplay for Vec<Post> {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = themed_table(options, &["Id", "Author", "Content", "Likes", "Dislikes", "Comments", "Shares"]);
        for post in self {
            table.add_row(vec![
                Cell::new(&post.id),
                Cell::new(&post.author.author_name),
                Cell::new(post_content(post)),
                Cell::new(post.like_count),
                Cell::new(post.dislike_count),
                Cell::new(post.comment_count),
                Cell::new(post.share_count),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.iter().map(TableDisplay::to_compact).collect::<Vec<_>>().join("\n")
    }
}

impl TableDisplay for Comment {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = themed_table(options, &["Id", "Author", "Content", "Likes", "Dislikes"]);
        table.add_row(vec![
            Cell::new(&self.id),
            Cell::new(&self.author.author_name),
            Cell::new(&self.content),
            Cell::new(self.likes_count),
            Cell::new(self.dislikes_count),
        ]);
        for reply in &self.replies {
            table.add_row(vec![
                Cell::new(format!("  {} {}", ICONS.arrow, reply.id)),
                Cell::new(&reply.author.author_name),
                Cell::new(&reply.content),
                Cell::new(reply.likes_count),
                Cell::new(reply.dislikes_count),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        format!(
            "{} {} {}{} {}{} replies={} {}",
            self.id,
            self.author.author_id,
            ICONS.like,
            self.likes_count,
            ICONS.dislike,
            self.dislikes_count,
            self.replies.len(),
            self.content
        )
    }
}

impl TableDisplay for Vec<Comment> {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = themed_table(options, &["Id", "Author", "Content", "Likes", "Dislikes", "Replies"]);
        for comment in self {
            table.add_row(vec![
                Cell::new(&comment.id),
                Cell::new(&comment.author.author_name),
                Cell::new(&comment.content),
                Cell::new(comment.likes_count),
                Cell::new(comment.dislikes_count),
                Cell::new(comment.replies.len()),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        self.iter().map(TableDisplay::to_compact).collect::<Vec<_>>().join("\n")
    }
}

impl TableDisplay for Reply {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        key_value_table(
            options,
            vec![
                ("Id", self.id.clone()),
                ("Comment", self.comment_id.clone()),
                ("Author", format!("{} ({})", self.author.author_name, self.author.author_id)),
                ("Content", self.content.clone()),
                ("Likes", self.likes_count.to_string()),
                ("Dislikes", self.dislikes_count.to_string()),
            ],
        )
    }

    fn to_compact(&self) -> String {
        format!("{} {} {}", self.id, self.author.author_id, self.content)
    }
}

impl TableDisplay for ReactionOutcome {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        key_value_table(
            options,
            vec![
                ("Previous", reaction_label(self.previous).to_string()),
                ("Current", reaction_label(self.current).to_string()),
                ("Likes", self.likes.to_string()),
                ("Dislikes", self.dislikes.to_string()),
            ],
        )
    }

    fn to_compact(&self) -> String {
        format!(
            "{}->{} {}{} {}{}",
            reaction_label(self.previous),
            reaction_label(self.current),
            ICONS.like,
            self.likes,
            ICONS.dislike,
            self.dislikes
        )
    }
}

impl TableDisplay for AuditReport {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = themed_table(options, &["Target", "Field", "Stored", "Expected"]);
        for drift in &self.drifts {
            table.add_row(vec![
                Cell::new(&drift.target_id),
                Cell::new(drift.field),
                Cell::new(drift.stored),
                Cell::new(drift.expected),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        format!(
            "{} drifts={} repaired={} conflicts={}",
            self.post_id,
            self.drifts.len(),
            self.repaired,
            self.conflicts.len()
        )
    }
}
