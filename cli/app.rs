use std::{
    fs::File,
    io::{self, IsTerminal, Write},
    path::PathBuf,
};

use anyhow::{anyhow, Context};
use clap::Parser;
use pgex_core::{parse_explain, PlanTree, RenderContext, StatDisplay, StyleSet};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StatMode};
use crate::utils::{read_file, read_piped_stdin, terminal_width};

const DEFAULT_WIDTH: usize = 120;

#[derive(Parser, Debug)]
#[command(name = "pgex")]
#[command(author, version, about = "Browse PostgreSQL EXPLAIN plans in the terminal", long_about = None)]
pub struct Opts {
    #[clap(
        index = 1,
        help = "File with EXPLAIN (FORMAT JSON) output; read from stdin when omitted"
    )]
    pub plan: Option<PathBuf>,
    #[clap(short, long, help = "Show the join view instead of the plan view")]
    pub join_view: bool,
    #[clap(short, long, value_enum, help = "Statistic shown on the right of each line")]
    pub stat: Option<StatMode>,
    #[clap(short, long, help = "Output width, defaults to $COLUMNS")]
    pub width: Option<usize>,
    #[clap(long, help = "Do not indent nodes by depth")]
    pub no_indent: bool,
    #[clap(short, long, help = "Show the parallel worker column")]
    pub parallel: bool,
    #[clap(long, help = "Line to place the cursor on (1-based)", default_value_t = 1)]
    pub cursor: usize,
    #[clap(long, help = "Line of the node whose children are highlighted (1-based)")]
    pub select: Option<usize>,
    #[clap(short, long, help = "Print the detail panel of the cursor line")]
    pub detail: bool,
    #[clap(long, help = "Include the planned/actual row estimate in the detail panel")]
    pub row_deviation: bool,
    #[clap(long, help = "Never emit color codes")]
    pub no_color: bool,
    #[clap(short, long, help = "Configuration file, defaults to <config dir>/pgex/pgex.toml")]
    pub config: Option<PathBuf>,
    #[clap(short, long, default_value = "", help = "Write output to this file")]
    pub output: String,
    #[clap(short, long, help = "Don't print the column heading line")]
    pub quiet: bool,
    #[clap(short = 't', long, help = "specify output file for log traces")]
    pub tracing_output: Option<String>,
    #[clap(long, help = "Print the JSON schema of the configuration file and exit")]
    pub print_config_schema: bool,
}

/// View toggles after merging the command line over the configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub join_view: bool,
    pub stat: StatDisplay,
    pub indent: bool,
    pub parallel: bool,
    pub row_deviation: bool,
    pub width: usize,
    pub color: bool,
    pub cursor: usize,
    pub select: Option<usize>,
    pub detail: bool,
    pub quiet: bool,
}

impl Settings {
    pub fn resolve(opts: &Opts, config: &Config, stdout_is_terminal: bool) -> Self {
        let view = &config.view;
        Self {
            join_view: opts.join_view || view.join_view,
            stat: opts.stat.unwrap_or(view.stat).into(),
            indent: !opts.no_indent && view.indent,
            parallel: opts.parallel || view.parallel,
            row_deviation: opts.row_deviation || view.row_deviation,
            width: opts
                .width
                .or(view.width)
                .unwrap_or_else(|| terminal_width(DEFAULT_WIDTH)),
            color: !opts.no_color && view.color && stdout_is_terminal,
            cursor: opts.cursor.saturating_sub(1),
            select: opts.select.map(|line| line.saturating_sub(1)),
            detail: opts.detail,
            quiet: opts.quiet,
        }
    }
}

pub struct Pgex {
    opts: Opts,
    config: Config,
    writer: Box<dyn Write>,
}

impl Pgex {
    pub fn new() -> anyhow::Result<(Self, WorkerGuard)> {
        let opts = Opts::parse();
        let guard = Self::init_tracing(&opts)?;

        let config_path = opts.config.clone().unwrap_or_else(Config::default_path);
        let config = Config::from_config_file(&config_path);
        debug!("Configuration: {:?}", config);

        let writer = get_writer(&opts.output)?;
        Ok((
            Self {
                opts,
                config,
                writer,
            },
            guard,
        ))
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        if self.opts.print_config_schema {
            writeln!(self.writer, "{}", Config::schema())?;
            return Ok(());
        }

        let input = self.read_input()?;
        let root = match parse_explain(&input) {
            Ok(root) => root,
            Err(err) => {
                let report = miette::Error::from(err).with_source_code(input);
                eprintln!("{report:?}");
                anyhow::bail!("could not decode the EXPLAIN output");
            }
        };
        let tree = PlanTree::new(root);
        info!(nodes = tree.len(), analyzed = tree.is_analyzed(), "loaded plan");

        let stdout_is_terminal = self.opts.output.is_empty() && io::stdout().is_terminal();
        let settings = Settings::resolve(&self.opts, &self.config, stdout_is_terminal);
        let styles = self.config.style_set(settings.color);
        let output = render(&tree, &settings, &styles);
        self.writer.write_all(output.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    fn read_input(&self) -> anyhow::Result<String> {
        if let Some(path) = &self.opts.plan {
            return read_file(path).with_context(|| format!("failed to read plan from {path:?}"));
        }
        read_piped_stdin()
            .context("failed to read plan from stdin")?
            .ok_or_else(|| anyhow!("no plan given: pass a file or pipe EXPLAIN (FORMAT JSON) output"))
    }

    pub fn init_tracing(opts: &Opts) -> Result<WorkerGuard, std::io::Error> {
        let ((non_blocking, guard), should_emit_ansi) = if let Some(file) = &opts.tracing_output {
            (
                tracing_appender::non_blocking(
                    std::fs::File::options()
                        .append(true)
                        .create(true)
                        .open(file)?,
                ),
                false,
            )
        } else {
            (
                tracing_appender::non_blocking(std::io::stderr()),
                IsTerminal::is_terminal(&std::io::stderr()),
            )
        };
        let default_env_filter = EnvFilter::builder()
            .with_default_directive(tracing::level_filters::LevelFilter::WARN.into())
            .from_env_lossy();

        if let Err(e) = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_line_number(true)
                    .with_thread_ids(true)
                    .with_ansi(should_emit_ansi),
            )
            .with(default_env_filter)
            .try_init()
        {
            eprintln!("Unable to setup tracing appender: {e:?}");
        }
        Ok(guard)
    }
}

fn get_writer(output: &str) -> anyhow::Result<Box<dyn Write>> {
    if output.is_empty() {
        return Ok(Box::new(io::stdout()));
    }
    let file = File::create(output).with_context(|| format!("failed to create {output}"))?;
    Ok(Box::new(file))
}

/// Renders the heading line, the frame and optionally the detail panel.
pub fn render(tree: &PlanTree, settings: &Settings, styles: &StyleSet) -> String {
    let mut ctx = RenderContext::new(styles);
    ctx.join_view = settings.join_view;
    ctx.indent = settings.indent;
    ctx.display_parallel = settings.parallel;
    ctx.stat_display = settings.stat;
    ctx.width = settings.width;
    ctx.analyzed = tree.is_analyzed();
    ctx.row_deviation = settings.row_deviation;

    let view = ctx.view();
    let lines = tree.line_count(view);
    ctx.cursor = if settings.cursor < lines {
        settings.cursor
    } else {
        warn!(
            cursor = settings.cursor + 1,
            lines, "cursor is past the last line, using the last line"
        );
        lines.saturating_sub(1)
    };
    ctx.selected = settings.select.and_then(|line| {
        let node = tree.line_node(view, line);
        if node.is_none() {
            warn!(select = line + 1, lines, "selected line does not exist");
        }
        node
    });

    let mut out = String::new();
    if !settings.quiet {
        out.push_str(&heading(settings));
    }
    out.push_str(&tree.render_frame(&ctx));
    if settings.detail {
        if let Some(detail) = tree.render_cursor_detail(&ctx) {
            out.push('\n');
            out.push_str(&detail);
        }
    }
    out
}

fn heading(settings: &Settings) -> String {
    let left = if settings.join_view {
        "join view"
    } else {
        "plan view"
    };
    match settings.stat.headings() {
        Some((first, second)) => {
            let columns = format!("{first:>15}{second:>15}");
            let pad = settings.width.saturating_sub(left.len());
            format!("{left}{columns:>pad$}\n")
        }
        None => format!("{left}\n"),
    }
}
