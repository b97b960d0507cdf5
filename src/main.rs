use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use ratatui::DefaultTerminal;
use ratatui::crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use ratatui::crossterm::execute;
use tracing::{debug, error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use datagrid::loader::{self, Record};
use datagrid::pagination::DEFAULT_PAGE_SIZE;
use datagrid::{GridConfig, GridError, GridModel, SortDirection, SortState};

mod controller;
mod inputter;
mod ui;

use controller::{Action, Controller};
use ui::TableUI;

/// Page, search, sort and filter a CSV, Parquet or Arrow file in the terminal.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// File to open; `~` and environment variables are expanded.
    path: String,

    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Columns visible at start, comma separated. All when omitted.
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Columns searched by the search box, comma separated. All when omitted.
    #[arg(long, value_delimiter = ',')]
    search_fields: Vec<String>,

    /// Column to sort by at start.
    #[arg(long)]
    sort: Option<String>,

    /// Start with a descending sort.
    #[arg(long, requires = "sort")]
    desc: bool,

    #[arg(long, default_value = "datagrid.log")]
    log_file: PathBuf,

    /// Default filter when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Input poll interval in milliseconds.
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_logging(&args) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }
    match run(args) {
        Err(e) => {
            error!("{e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_logging(args: &Args) -> Result<(), GridError> {
    let file = File::create(&args.log_file)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| GridError::Logging(e.to_string()))
}

fn grid_config(args: &Args) -> GridConfig {
    let mut config = GridConfig::default()
        .page_size(args.page_size)
        .structured_filters(true);
    if !args.columns.is_empty() {
        config = config.initial_visible_columns(args.columns.clone());
    }
    if let Some(field) = &args.sort {
        let direction = if args.desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        config = config.initial_sort(SortState::new(field.as_str(), direction));
    }
    config
}

fn run(args: Args) -> Result<(), GridError> {
    let path = shellexpand::full(&args.path)
        .map_err(|e| GridError::LoadingFailed(e.to_string()))?;
    info!("Starting datagrid on {path}");

    let table = loader::load_data_file(PathBuf::from(path.as_ref()))?;
    let columns = table
        .columns
        .into_iter()
        .map(|column| {
            let searchable = args.search_fields.iter().any(|f| f == column.key());
            column.searchable(searchable)
        })
        .collect();
    let mut model = GridModel::new(columns, Some(table.rows), grid_config(&args))?;
    let mut ui = TableUI::new(table.name);
    let mut controller = Controller::new(args.poll_ms);

    let mut terminal = ratatui::init();
    execute!(stdout(), EnableMouseCapture)?;
    let result = event_loop(&mut terminal, &mut model, &mut ui, &mut controller);
    execute!(stdout(), DisableMouseCapture)?;
    ratatui::restore();
    model.unmount();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut GridModel<Record>,
    ui: &mut TableUI,
    controller: &mut Controller,
) -> Result<(), GridError> {
    loop {
        terminal.draw(|f| ui.draw(model, controller, f))?;

        match controller.handle_event(model, ui)? {
            Some(Action::Quit) => return Ok(()),
            Some(Action::Grid(message)) => {
                model.update(message);
            }
            None => {}
        }
        controller.sync(model);
        for event in model.take_events() {
            debug!("Grid event: {event:?}");
            ui.on_event(&event);
        }
    }
}
