//! tygia-report - Exchange rates and gold prices in the terminal

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use tygia::config::AppConfig;
use tygia::logging;
use tygia::rates::RatesService;
use tygia::report::{
    render_currency_rates, render_gold_charts, render_gold_prices, render_summary, Palette,
};

#[derive(Parser, Debug)]
#[command(name = "tygia-report")]
#[command(about = "FX rate & gold price report", version)]
struct Cli {
    /// Show currency exchange rates
    #[arg(short, long)]
    currency: bool,

    /// Show gold prices
    #[arg(short, long)]
    gold: bool,

    /// Show gold chart URLs
    #[arg(long)]
    charts: bool,

    /// Show market summary
    #[arg(short, long)]
    summary: bool,

    /// Show currency rates and gold prices
    #[arg(short, long)]
    all: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Log source activity to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn nothing_selected(&self) -> bool {
        !(self.currency || self.gold || self.charts || self.summary || self.all)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let palette = Palette::new(!cli.no_color);

    tokio::select! {
        result = run(&cli, palette) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("\n{}", palette.error(&format!("Error: {:#}", e)));
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            println!("\nOperation cancelled by user");
            ExitCode::SUCCESS
        }
    }
}

async fn run(cli: &Cli, palette: Palette) -> Result<()> {
    let mut config = AppConfig::load()?;
    config.logging.level = if cli.verbose { "info" } else { "warn" }.to_string();
    logging::init(&config.logging)?;

    let service = RatesService::from_config(&config)?;

    if cli.currency || cli.all {
        let rates = service.rates().await;
        println!("{}", render_currency_rates(&rates, palette));
    }

    if cli.gold || cli.all {
        let gold = service.gold().await;
        println!("{}", render_gold_prices(&gold, palette));
    }

    if cli.charts {
        let charts = service.charts().await;
        println!("{}", render_gold_charts(&charts, palette));
    }

    if cli.summary || cli.nothing_selected() {
        let (rates, gold) = tokio::join!(service.rates(), service.gold());
        println!("{}", render_summary(&rates, &gold, palette));
    }

    if cli.nothing_selected() {
        println!("Use --help for more options");
    }

    Ok(())
}

