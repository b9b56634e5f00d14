mod graph;
mod error;
mod config;
mod csse;
mod population;
mod countries;
mod derive;

use std::path::PathBuf;

use chrono::naive::NaiveDate;
use clap::Parser;
use tracing::{debug,error};
use tracing_subscriber::EnvFilter;

use config::Config;
use countries::CountryMap;
use derive::StartDate;
use error::Result;


#[derive(Parser,Debug)]
#[command(author, version, about = "COVID-19 cases, deaths and growth per million inhabitants", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output HTML file
    #[arg(long)]
    output: Option<PathBuf>,
    /// Population CSV (name, pop2020 in thousands)
    #[arg(long)]
    population: Option<PathBuf>,
    /// Confirmed cases time series (URL or path)
    #[arg(long)]
    confirmed: Option<String>,
    /// Deaths time series (URL or path)
    #[arg(long)]
    deaths: Option<String>,
    /// Start all series at this date (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<NaiveDate>,
    /// Start each country the day before its own first case
    #[arg(long, conflicts_with = "start_date")]
    per_country_start: bool,
}

impl Args {

    fn config(&self) -> Result<Config> {
	let mut config = match &self.config {
	    Some(path) => Config::load(path)?,
	    None => Config::default(),
	};
	if let Some(output) = &self.output {
	    config.output = output.clone();
	}
	if let Some(population) = &self.population {
	    config.population = population.clone();
	}
	if let Some(confirmed) = &self.confirmed {
	    config.confirmed = confirmed.clone();
	}
	if let Some(deaths) = &self.deaths {
	    config.deaths = deaths.clone();
	}
	if let Some(date) = self.start_date {
	    config.start = StartDate::Fixed(date);
	}
	if self.per_country_start {
	    config.start = StartDate::PerCountry;
	}
	config.validate()
    }

}


fn main() {

    tracing_subscriber::fmt()
	.with_env_filter(EnvFilter::try_from_default_env()
			 .unwrap_or_else(|_| EnvFilter::new("covid19_percapita=info")))
	.init();

    if let Err(err) = Args::parse().config().and_then(|config| run(&config)) {
	error!("{}", err);
	std::process::exit(1);
    }

}


fn run(config: &Config) -> Result<()> {

    let confirmed = csse::load(&config.confirmed, "cases")?;
    let deaths = csse::load(&config.deaths, "deaths")?;
    let population = population::load(&config.population)?;

    let records = csse::join(&confirmed, &deaths);
    debug!(records = records.len(), "joined cases and deaths");

    let map = CountryMap::new(&population, &config.aliases);
    let data = derive::countries(&records, &config.names(), &map, config.start,
				 config.window, config.span)?;

    graph::covid_page(&config.output, &data, &config.colors(), &config.reference_rates)

}


#[derive(Clone,Debug)]
pub struct NaiveDateRange(NaiveDate,Option<NaiveDate>);

impl Iterator for NaiveDateRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<NaiveDate> {
	match self.1.map_or(true, |end| self.0 <= end) {
	    false => None,
	    true => {
		let current = self.0;
		self.0 = current.succ_opt()?;
		Some(current)
	    }
	}
    }
}
