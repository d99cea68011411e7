use clap::{Parser, Subcommand};

/// Derived deployment metrics and the Military Deployment Index.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Computes the metrics, the trends and the index for a selection of countries and writes
    /// a JSON summary.
    Dashboard {
        /// (file path) The configuration file describing the data sources.
        #[clap(short, long, value_parser)]
        config: String,

        /// (list of comma-separated ISO3 codes) The selected countries.
        #[clap(long, value_parser, value_delimiter = ',')]
        countries: Option<Vec<String>>,

        /// (all, nato or eu) Selects a preset group of countries.
        #[clap(long, value_parser)]
        group: Option<String>,

        /// (file path) A CSV file with a 'countries' column listing the selected countries.
        #[clap(long, value_parser)]
        countries_file: Option<String>,

        /// The year to display. Defaults to the year of the configuration, or the last year of the data.
        #[clap(short, long, value_parser)]
        year: Option<i32>,

        /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
        /// location.
        #[clap(short, long, value_parser)]
        out: Option<String>,

        /// (file path) A reference file containing a summary in JSON format. If provided, mdi will
        /// check that the computed summary matches the reference.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },
    /// Computes the tables for every country and year and writes them as CSV files.
    Precompute {
        /// (file path) The configuration file describing the data sources.
        #[clap(short, long, value_parser)]
        config: String,

        /// (directory) Where the tables are written. It is created if needed.
        #[clap(long, value_parser)]
        out_dir: String,
    },
    /// Writes a country selection as a CSV file that can be read back with --countries-file.
    ExportCountries {
        /// (list of comma-separated ISO3 codes) The selected countries.
        #[clap(long, value_parser, value_delimiter = ',')]
        countries: Option<Vec<String>>,

        /// (all, nato or eu) Selects a preset group of countries.
        #[clap(long, value_parser)]
        group: Option<String>,

        /// (file path) The output file.
        #[clap(short, long, value_parser)]
        out: String,
    },
}
