use std::{fs,io};
use std::collections::{HashMap,HashSet};

use chrono::naive::NaiveDate;
use tracing::{info,debug};

use super::error::{Result,Error};


pub const CONFIRMED_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19\
				 /master/csse_covid_19_data/csse_covid_19_time_series\
				 /time_series_covid19_confirmed_global.csv";

pub const DEATHS_URL: &str = "https://raw.githubusercontent.com/CSSEGISandData/COVID-19\
			      /master/csse_covid_19_data/csse_covid_19_time_series\
			      /time_series_covid19_deaths_global.csv";


#[derive(Clone,Debug,PartialEq)]
pub struct WideTable {
    pub value: String,
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<WideRow>,
}

#[derive(Clone,Debug,PartialEq)]
pub struct WideRow {
    pub region: Option<String>,
    pub country: String,
    pub values: Vec<Option<i64>>,
}

/// One-row-per-date table. Regions and values are always filled in.
#[derive(Clone,Debug,PartialEq)]
pub struct LongTable {
    pub value: String,
    pub rows: Vec<Observation>,
}

#[derive(Clone,Debug,PartialEq)]
pub struct Observation {
    pub region: String,
    pub country: String,
    pub date: NaiveDate,
    pub value: i64,
}

/// Region-date record carrying both cumulative cases and deaths.
#[derive(Clone,Debug,PartialEq)]
pub struct Record {
    pub region: String,
    pub country: String,
    pub date: NaiveDate,
    pub cases: i64,
    pub deaths: i64,
}


pub fn fetch(locator: &str) -> Result<String> {
    match locator.starts_with("http://") || locator.starts_with("https://") {
	true => {
	    info!("Downloading {}...", locator);
	    let res = reqwest::blocking::get(locator)?;
	    match res.status().is_success() {
		true => Ok(res.text()?),
		false => Err(Error::HttpError(res.status())),
	    }
	}
	false => {
	    info!("Reading {}...", locator);
	    Ok(fs::read_to_string(locator)?)
	}
    }
}


pub fn load(locator: &str, value: &str) -> Result<LongTable> {
    let table = normalize(WideTable::from_reader(value, fetch(locator)?.as_bytes())?);
    debug!(value, rows = table.rows.len(), "normalized table");
    Ok(table)
}


impl WideTable {

    pub fn from_reader<R: io::Read>(value: &str, reader: R) -> Result<Self> {

	let mut reader = csv::Reader::from_reader(reader);
	let headers = reader.headers()?.clone();

	if headers.len() < 4 {
	    return Err(Error::MalformedTable(format!(
		"expected region, country, latitude and longitude columns, got {} columns",
		headers.len())));
	}

	let dates = headers.iter().skip(4).map(parse_date).collect::<Result<Vec<_>>>()?;
	let mut seen = HashSet::new();
	let rows = reader.records().map(|record| {
	    let record = record?;
	    let row = WideRow {
		region: non_blank(record.get(0)).map(str::to_string),
		country: record.get(1).unwrap_or("").trim().to_string(),
		values: record.iter().skip(4).map(parse_count).collect::<Result<_>>()?,
	    };
	    // a blank region stands for the country itself
	    let key = (row.region.clone().unwrap_or_else(|| row.country.clone()), row.country.clone());
	    if !seen.insert(key) {
		return Err(Error::MalformedTable(format!(
		    "duplicate row for {}, {}",
		    row.region.as_deref().unwrap_or(""), row.country)));
	    }
	    Ok(row)
	}).collect::<Result<_>>()?;

	Ok(Self { value: value.to_string(), dates, rows })

    }

}


impl From<WideTable> for LongTable {

    // dates outer, regions inner
    fn from(table: WideTable) -> Self {
	let rows = table.dates.iter().enumerate().flat_map(
	    |(i,date)| table.rows.iter().map(move |row| Observation {
		region: row.region.clone().unwrap_or_else(|| row.country.clone()),
		country: row.country.clone(),
		date: *date,
		value: row.values.get(i).copied().flatten().unwrap_or(0),
	    })
	).collect();
	Self { value: table.value, rows }
    }

}


impl LongTable {

    fn normalized(self) -> Self {
	Self {
	    value: self.value,
	    rows: self.rows.into_iter().map(|row| Observation {
		region: match row.region.trim().is_empty() {
		    true => row.country.clone(),
		    false => row.region,
		},
		..row
	    }).collect(),
	}
    }

}


/// Reshape into a long table with blank regions and values filled in.
/// Already-long tables pass through unchanged apart from the fill.
pub fn normalize<T: Into<LongTable>>(table: T) -> LongTable {
    table.into().normalized()
}


/// Inner join on (region, country, date), in the order of `confirmed`.
pub fn join(confirmed: &LongTable, deaths: &LongTable) -> Vec<Record> {

    let mut index = HashMap::new();
    for row in &deaths.rows {
	index.entry((row.region.as_str(), row.country.as_str(), row.date))
	    .or_insert(row.value);
    }

    confirmed.rows.iter().filter_map(
	|row| index.get(&(row.region.as_str(), row.country.as_str(), row.date)).map(
	    |deaths| Record {
		region: row.region.clone(),
		country: row.country.clone(),
		date: row.date,
		cases: row.value,
		deaths: *deaths,
	    })
    ).collect()

}


fn non_blank(val: Option<&str>) -> Option<&str> {
    val.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(val: &str) -> Result<NaiveDate> {
    let val = val.trim();
    NaiveDate::parse_from_str(val, "%m/%d/%y")
	.or_else(|_| NaiveDate::parse_from_str(val, "%Y-%m-%d"))
	.map_err(Error::from)
}

fn parse_count(val: &str) -> Result<Option<i64>> {
    match non_blank(Some(val)) {
	None => Ok(None),
	Some(val) => Ok(Some(val.parse()?)),
    }
}
