use log::{debug, info, warn};

use deployment_index::countries::{display_name, CountryGroup};
use deployment_index::precompute::precompute_tables;
use deployment_index::trends::{deployments_over_time, mdi_series, theatre_over_time};
use deployment_index::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::dashboard::config_reader::*;
use crate::dashboard::io_common::*;

pub mod config_reader;
mod io_common;
mod io_csv;
pub mod io_selection;
mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum MdiError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Expected a number or a string containing a number"))]
    ParsingJsonNumber {},
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("The workbook {path} has no worksheet named {name}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of a CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing CSV file {path}"))]
    CsvWrite { source: csv::Error, path: String },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Cannot find column {column} in the header of {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Line {lineno}: cannot read column {column} from {content}"))]
    WrongCellType {
        lineno: usize,
        column: String,
        content: String,
    },
    #[snafu(display("{path}: the column header {content} is not a year"))]
    BadYearHeader { content: String, path: String },
    #[snafu(display("Provider not implemented {provider:?}"))]
    UnknownProvider { provider: String },
    #[snafu(display("Unknown country group {name:?} (expected all, nato or eu)"))]
    UnknownGroup { name: String },
    #[snafu(display("{source}"))]
    Metrics { source: MetricsError },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},
    #[snafu(display("The path {path} has no parent directory"))]
    MissingParentDir { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type MdiResult<T> = Result<T, MdiError>;

fn read_table(root: &Path, source: &FileSource) -> MdiResult<RawTable> {
    let p: PathBuf = root.join(&source.file_path);
    let path = p.display().to_string();
    info!("Attempting to read {:?} ({})", path, source.provider);
    match source.provider.as_str() {
        "xlsx" => io_xlsx::read_excel_table(&path, source.worksheet_name.as_deref()),
        "csv" => io_csv::read_csv_table(&path),
        x => UnknownProviderSnafu { provider: x }.fail(),
    }
}

/// Loads the three datasets described in the configuration.
/// Relative paths are resolved against the directory of the configuration file.
pub fn load_store(config_path: &str, config: &MdiConfig) -> MdiResult<RecordStore> {
    let root = Path::new(config_path)
        .parent()
        .context(MissingParentDirSnafu { path: config_path })?;
    let sources = &config.data_sources;

    let mut builder = builder::Builder::new();
    let deployments = deployments_from_table(&read_table(root, &sources.deployments)?)?;
    builder
        .add_deployments(deployments)
        .context(MetricsSnafu {})?;
    for r in population_from_wide_table(&read_table(root, &sources.population)?)? {
        builder.add_population(r).context(MetricsSnafu {})?;
    }
    for r in active_duty_from_table(&read_table(root, &sources.active_duty)?)? {
        builder.add_active_duty(r).context(MetricsSnafu {})?;
    }
    let store = builder.build();
    info!(
        "load_store: {} deployment rows, {} countries, years {:?}",
        store.deployments().len(),
        store.countries().len(),
        store.years()
    );
    Ok(store)
}

/// The selection of countries given on the command line.
/// Without any option, the default selection of the dashboard is used.
pub fn resolve_selection(
    countries: &Option<Vec<String>>,
    group: &Option<String>,
    countries_file: &Option<String>,
) -> MdiResult<CountrySelection> {
    match (countries, group, countries_file) {
        (None, None, None) => Ok(CountrySelection::from_codes(&["USA", "DEU"])),
        (Some(codes), None, None) => Ok(CountrySelection::new(
            codes
                .iter()
                .filter(|c| !c.trim().is_empty())
                .map(|c| CountryCode::new(c)),
        )),
        (None, Some(name), None) => {
            let g = CountryGroup::parse(name).context(UnknownGroupSnafu { name })?;
            Ok(g.selection())
        }
        (None, None, Some(path)) => {
            let imported = io_selection::read_country_list(path)?;
            if !imported.invalid.is_empty() {
                warn!(
                    "The following country codes are invalid: {:?}",
                    imported.invalid
                );
            }
            Ok(imported.selection)
        }
        _ => whatever!("Only one of --countries, --group and --countries-file may be given"),
    }
}

fn ratios_js(r: &Result<RankedRatios, MetricsError>) -> JSValue {
    match r {
        Ok(ranked) => {
            let rows: Vec<JSValue> = ranked
                .rows
                .iter()
                .map(|x| {
                    json!({
                        "country": x.country.as_str(),
                        "countryName": display_name(&x.country),
                        "totalDeployed": x.total_deployed,
                        "value": x.value,
                    })
                })
                .collect();
            json!({"condensed": ranked.condensed, "rows": rows})
        }
        Err(e) => json!({ "error": e.to_string() }),
    }
}

fn theatre_js(t: &Option<TheatreShare>) -> JSValue {
    match t {
        Some(t) => json!({"theatre": t.theatre, "deployed": t.deployed, "share": t.share}),
        None => JSValue::Null,
    }
}

fn metrics_js(store: &RecordStore, selection: &CountrySelection, m: &DerivedCountryMetrics) -> JSValue {
    let by_country: Vec<JSValue> = m
        .dominant_theatre_by_country
        .iter()
        .map(|(c, t)| json!({"country": c.as_str(), "dominantTheatre": theatre_js(t)}))
        .collect();
    let organisations: Vec<JSValue> = m
        .organisation_breakdown
        .iter()
        .map(|o| {
            json!({
                "organisation": o.organisation,
                "deployed": o.deployed,
                "percentOfTotal": o.percent_of_total,
            })
        })
        .collect();
    let missions: Vec<JSValue> = m
        .mission_breakdown
        .iter()
        .map(|x| {
            json!({
                "organisation": x.organisation,
                "missionName": x.mission_name,
                "deployed": x.deployed,
            })
        })
        .collect();
    let country_org_rows: Vec<JSValue> = m
        .country_organisations
        .rows
        .iter()
        .map(|r| {
            json!({
                "country": r.country.as_str(),
                "organisation": r.organisation,
                "deployed": r.deployed,
                "percentOfCountryTotal": r.percent_of_country_total,
            })
        })
        .collect();
    let country_order: Vec<&str> = m
        .country_organisations
        .country_order
        .iter()
        .map(|c| c.as_str())
        .collect();
    let presence: Vec<JSValue> = store
        .presence_for(selection, m.year)
        .map(|r| {
            json!({
                "country": r.country.as_str(),
                "theatre": r.theatre,
                "missionName": r.mission_name,
                "deployed": r.deployed,
                "lat": r.location.map(|(lat, _)| lat),
                "lon": r.location.map(|(_, lon)| lon),
            })
        })
        .collect();
    let breakdown_axis = match m.breakdown_axis {
        BreakdownAxis::Country => "country",
        BreakdownAxis::Organisation => "organisation",
    };
    json!({
        "totalDeployed": m.total_deployed,
        "deploymentPerCapita": ratios_js(&m.per_capita),
        "percentActivePersonnel": ratios_js(&m.percent_active_personnel),
        "dominantTheatre": theatre_js(&m.dominant_theatre),
        "dominantTheatreByCountry": by_country,
        "organisations": organisations,
        "missions": missions,
        "breakdownAxis": breakdown_axis,
        "countryOrganisations": {
            "condensed": m.country_organisations.condensed,
            "countryOrder": country_order,
            "rows": country_org_rows,
        },
        "presence": presence,
    })
}

fn trends_js(
    store: &RecordStore,
    selection: &CountrySelection,
    dominant_theatre: &Option<TheatreShare>,
    table: &[MdiYearOutcome],
) -> JSValue {
    let deployments: Vec<JSValue> = deployments_over_time(store, selection)
        .computed()
        .unwrap_or_default()
        .iter()
        .map(|s| {
            let points: Vec<JSValue> = s
                .points
                .iter()
                .map(|(y, d)| json!({"year": y, "deployed": d}))
                .collect();
            json!({"country": s.country.as_str(), "points": points})
        })
        .collect();
    let theatre: JSValue = match dominant_theatre {
        Some(t) => {
            let points: Vec<JSValue> = theatre_over_time(store, selection, &t.theatre)
                .computed()
                .unwrap_or_default()
                .iter()
                .map(|(y, d)| json!({"year": y, "deployed": d}))
                .collect();
            json!({"theatre": t.theatre, "points": points})
        }
        None => JSValue::Null,
    };
    let mdi: Vec<JSValue> = mdi_series(table, selection)
        .iter()
        .map(|s| {
            let points: Vec<JSValue> = s
                .points
                .iter()
                .map(|(y, v)| json!({"year": y, "mdi": v}))
                .collect();
            json!({"country": s.country.as_str(), "points": points})
        })
        .collect();
    json!({
        "deploymentsOverTime": deployments,
        "dominantTheatreOverTime": theatre,
        "mdiOverTime": mdi,
    })
}

fn mdi_js(outcome: Option<&MdiYearOutcome>, selection: &CountrySelection) -> JSValue {
    match outcome {
        Some(MdiYearOutcome::NotComputable { reason, .. }) => {
            json!({"computed": false, "reason": reason.to_string()})
        }
        Some(o) => {
            let scores: Vec<JSValue> = mdi_for_selection(std::slice::from_ref(o), selection)
                .iter()
                .map(|s| {
                    json!({
                        "country": s.country.as_str(),
                        "countryName": display_name(&s.country),
                        "mdi": s.mdi,
                    })
                })
                .collect();
            json!({"computed": true, "scores": scores})
        }
        None => json!({"computed": false, "reason": "no data for this year"}),
    }
}

/// Assembles the summary of the dashboard for a selection and a year.
pub fn build_summary_js(
    store: &RecordStore,
    selection: &CountrySelection,
    year: Year,
    rules: &MetricsRules,
) -> MdiResult<JSValue> {
    let countries: Vec<&str> = selection.iter().map(|c| c.as_str()).collect();
    let combination_js = match rules.combination {
        ZScoreCombination::Sum => json!("sum"),
        ZScoreCombination::Weighted { total, per_capita } => {
            json!({"weighted": {"total": total, "perCapita": per_capita}})
        }
    };
    let config_js = json!({
        "year": year,
        "countries": countries,
        "topN": rules.top_n,
        "combination": combination_js,
    });

    let metrics = compute_country_metrics(store, selection, year, rules).context(MetricsSnafu {})?;
    let metrics = match metrics {
        SelectionOutcome::NoSelection => {
            info!("build_summary_js: no country selected");
            return Ok(json!({"config": config_js, "results": {"noSelection": true}}));
        }
        SelectionOutcome::Computed(m) => m,
    };
    let table = compute_mdi_table(store, rules);
    let outcome = table.iter().find(|o| o.year() == year);
    debug!("build_summary_js: index for {}: {:?}", year, outcome);

    Ok(json!({
        "config": config_js,
        "results": {
            "metrics": metrics_js(store, selection, &metrics),
            "mdi": mdi_js(outcome, selection),
            "trends": trends_js(store, selection, &metrics.dominant_theatre, &table),
        }
    }))
}

fn write_output(out: &Option<String>, contents: &str) -> MdiResult<()> {
    match out.as_deref() {
        None | Some("stdout") | Some("") => {
            println!("{}", contents);
            Ok(())
        }
        Some(path) => {
            info!("Writing summary to {}", path);
            fs::write(path, contents).context(WritingFileSnafu { path })
        }
    }
}

/// Options of the dashboard command.
#[derive(Debug, Clone, Default)]
pub struct DashboardRequest {
    pub config_path: String,
    pub countries: Option<Vec<String>>,
    pub group: Option<String>,
    pub countries_file: Option<String>,
    pub year: Option<Year>,
    pub out: Option<String>,
    pub reference: Option<String>,
}

pub fn run_dashboard(req: &DashboardRequest) -> MdiResult<()> {
    let config = read_config(&req.config_path)?;
    let rules = validate_rules(&config.rules)?;
    let store = load_store(&req.config_path, &config)?;
    let selection = resolve_selection(&req.countries, &req.group, &req.countries_file)?;

    let year = match req.year.or(config.default_year).or_else(|| store.latest_year()) {
        Some(y) => y,
        None => whatever!("The deployment dataset is empty"),
    };
    info!(
        "run_dashboard: year {}, {} countries selected",
        year,
        selection.len()
    );

    let summary_js = build_summary_js(&store, &selection, year, &rules)?;
    let pretty_js_stats =
        serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu { path: "summary" })?;
    write_output(&req.out, &pretty_js_stats)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &req.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu { path: summary_p })?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return ReferenceMismatchSnafu {}.fail();
        }
    }
    Ok(())
}

fn write_csv(dir: &Path, name: &str, header: &[&str], rows: Vec<Vec<String>>) -> MdiResult<()> {
    let path = dir.join(name).display().to_string();
    let mut wtr = csv::Writer::from_path(&path).context(CsvWriteSnafu { path: path.clone() })?;
    wtr.write_record(header)
        .context(CsvWriteSnafu { path: path.clone() })?;
    for row in rows.iter() {
        wtr.write_record(row)
            .context(CsvWriteSnafu { path: path.clone() })?;
    }
    wtr.flush().context(WritingFileSnafu { path: path.clone() })?;
    info!("Saved {} rows to {}", rows.len(), path);
    Ok(())
}

/// Writes the tables of every country and year to a directory.
pub fn run_precompute(config_path: &str, out_dir: &str) -> MdiResult<()> {
    let config = read_config(config_path)?;
    let rules = validate_rules(&config.rules)?;
    let store = load_store(config_path, &config)?;
    let tables = precompute_tables(&store, &rules);

    let dir = Path::new(out_dir);
    fs::create_dir_all(dir).context(WritingFileSnafu { path: out_dir })?;

    write_csv(
        dir,
        "deployment_per_capita.csv",
        &["Country", "Country Name", "Year", "Deployment Per Capita"],
        tables
            .per_capita
            .iter()
            .map(|r| {
                vec![
                    r.ratio.country.to_string(),
                    display_name(&r.ratio.country),
                    r.year.to_string(),
                    r.ratio.value.to_string(),
                ]
            })
            .collect(),
    )?;
    write_csv(
        dir,
        "active_personnel.csv",
        &[
            "Country",
            "Country Name",
            "Year",
            "Percent of Active Personnel",
            "Total Deployed",
        ],
        tables
            .active_personnel
            .iter()
            .map(|r| {
                vec![
                    r.country.to_string(),
                    display_name(&r.country),
                    r.year.to_string(),
                    r.percent.to_string(),
                    r.total_deployed.to_string(),
                ]
            })
            .collect(),
    )?;
    write_csv(
        dir,
        "top_organisations.csv",
        &[
            "Country",
            "Year",
            "Organisation",
            "Deployed",
            "Percentage of Total Deployment",
        ],
        tables
            .organisations
            .iter()
            .map(|r| {
                vec![
                    r.country.to_string(),
                    r.year.to_string(),
                    r.organisation.clone(),
                    r.deployed.to_string(),
                    r.percent_of_country_total.to_string(),
                ]
            })
            .collect(),
    )?;
    write_csv(
        dir,
        "mdi.csv",
        &["Country", "Country Name", "Year", "MDI"],
        tables
            .mdi
            .iter()
            .flat_map(|o| o.scores().iter())
            .map(|s| {
                vec![
                    s.country.to_string(),
                    display_name(&s.country),
                    s.year.to_string(),
                    s.mdi.to_string(),
                ]
            })
            .collect(),
    )?;
    Ok(())
}

pub fn export_countries(
    countries: &Option<Vec<String>>,
    group: &Option<String>,
    out: &str,
) -> MdiResult<()> {
    if countries.is_none() && group.is_none() {
        whatever!("One of --countries and --group is required")
    }
    let selection = resolve_selection(countries, group, &None)?;
    io_selection::write_country_list(out, &selection)
}
