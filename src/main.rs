mod args;
mod dashboard;

use clap::Parser;
use log::{info, LevelFilter};
use snafu::ErrorCompat;

use crate::args::{Args, Command};
use crate::dashboard::{export_countries, run_dashboard, run_precompute, DashboardRequest};

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
    info!("args: {:?}", args);

    let res = match &args.command {
        Command::Dashboard {
            config,
            countries,
            group,
            countries_file,
            year,
            out,
            reference,
        } => run_dashboard(&DashboardRequest {
            config_path: config.clone(),
            countries: countries.clone(),
            group: group.clone(),
            countries_file: countries_file.clone(),
            year: *year,
            out: out.clone(),
            reference: reference.clone(),
        }),
        Command::Precompute { config, out_dir } => run_precompute(config, out_dir),
        Command::ExportCountries {
            countries,
            group,
            out,
        } => export_countries(countries, group, out),
    };

    if let Err(e) = res {
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
