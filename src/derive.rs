use chrono::naive::NaiveDate;
use serde::Deserialize;
use tracing::info;

use super::csse::Record;
use super::countries::CountryMap;
use super::error::{Result,Error};
use super::graph::Series;


#[derive(Clone,Copy,Debug,PartialEq,Eq,Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StartDate {
    /// Day before the first non-zero case count of any selected country.
    Shared,
    /// Day before each country's own first non-zero case count.
    PerCountry,
    Fixed(NaiveDate),
}

impl Default for StartDate {
    fn default() -> Self {
	Self::Shared
    }
}


#[derive(Clone,Debug,PartialEq)]
pub struct CountrySeries {
    pub country: String,
    pub population: f64,
    pub cases: Series,
    pub deaths: Series,
    pub cases_per_million: Series,
    pub deaths_per_million: Series,
    pub growth: Series,
    pub growth_sma: Series,
    pub growth_ewm: Series,
}

impl CountrySeries {

    pub fn start(&self) -> Option<NaiveDate> {
	self.cases.first().map(|(date,_)| *date)
    }

    pub fn end(&self) -> Option<NaiveDate> {
	self.cases.last().map(|(date,_)| *date)
    }

}


fn is_national(record: &Record) -> bool {
    record.region == record.country
}


/// Day before the first non-zero case count among the national rows of
/// `countries`.
pub fn first_case_eve(records: &[Record], countries: &[&str]) -> Result<NaiveDate> {
    records.iter()
	.filter(|r| is_national(r) && r.cases != 0 && countries.contains(&r.country.as_str()))
	.map(|r| r.date)
	.min()
	.and_then(|date| date.pred_opt())
	.ok_or(Error::MissingData)
}


pub fn national<'a>(records: &'a [Record], country: &str, start: NaiveDate) -> Vec<&'a Record> {
    let mut rows: Vec<_> = records.iter()
	.filter(|r| r.country == country && is_national(r) && r.date >= start)
	.collect();
    rows.sort_by_key(|r| r.date);
    rows
}


pub fn per_capita(data: &Series, population: f64) -> Series {
    data.iter().map(|(date,val)| (*date, val / population)).collect()
}


/// Day-over-day percentage change. The first sample and 0/0 are 0;
/// growth from zero stays infinite.
pub fn growth(data: &Series) -> Series {
    (0..data.len()).map(|i| {
	let g = match i {
	    0 => 0.0,
	    i => (data[i].1 / data[i-1].1 - 1.0) * 100.0,
	};
	(data[i].0, if g.is_nan() { 0.0 } else { g })
    }).collect()
}


/// Trailing mean over `window` samples; NaN until the window is full.
pub fn rolling_mean(data: &Series, window: usize) -> Series {
    let window = window.max(1);
    (0..data.len()).map(|i| {
	(data[i].0, match i + 1 >= window {
	    false => f64::NAN,
	    true => data[i+1-window..=i].iter().map(|(_,v)| v).sum::<f64>() / window as f64,
	})
    }).collect()
}


/// Exponentially weighted mean with adjusted weights, alpha = 2 / (span + 1).
pub fn ewm_mean(data: &Series, span: f64) -> Series {
    let decay = 1.0 - 2.0 / (span + 1.0);
    let mut num = 0.0;
    let mut den = 0.0;
    data.iter().map(|(date,val)| {
	num *= decay;
	den *= decay;
	if !val.is_nan() {
	    num += val;
	    den += 1.0;
	}
	(*date, if den > 0.0 { num / den } else { f64::NAN })
    }).collect()
}


pub fn country_series(records: &[Record], country: &str, population: f64,
		      start: NaiveDate, window: usize, span: f64) -> Result<CountrySeries> {

    let rows = national(records, country, start);
    if rows.is_empty() {
	return Err(Error::MissingData);
    }

    let cases: Series = rows.iter().map(|r| (r.date, r.cases as f64)).collect();
    let deaths: Series = rows.iter().map(|r| (r.date, r.deaths as f64)).collect();
    let growth = growth(&cases);

    Ok(CountrySeries {
	country: country.to_string(),
	population,
	cases_per_million: per_capita(&cases, population),
	deaths_per_million: per_capita(&deaths, population),
	growth_sma: rolling_mean(&growth, window),
	growth_ewm: ewm_mean(&growth, span),
	growth,
	cases,
	deaths,
    })

}


pub fn countries(records: &[Record], countries: &[&str], map: &CountryMap,
		 start: StartDate, window: usize, span: f64) -> Result<Vec<CountrySeries>> {

    for country in countries {
	if !records.iter().any(|r| r.country == *country && is_national(r)) {
	    return Err(Error::MissingRegion(country.to_string()));
	}
    }

    let shared = match start {
	StartDate::Shared => {
	    let date = first_case_eve(records, countries)?;
	    info!("Start date: {}", date);
	    Some(date)
	}
	StartDate::Fixed(date) => Some(date),
	StartDate::PerCountry => None,
    };

    countries.iter().map(|country| {
	let start = match shared {
	    Some(date) => date,
	    None => first_case_eve(records, &[*country])?,
	};
	country_series(records, country, map.population(country)?, start, window, span)
    }).collect()

}


#[cfg(test)]
mod tests {

    use super::*;
    use std::collections::HashMap;
    use approx::assert_relative_eq;
    use crate::population::Population;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
	NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(vals: &[f64]) -> Series {
	vals.iter().enumerate()
	    .map(|(i,v)| (date(2020, 3, 1) + chrono::Duration::days(i as i64), *v))
	    .collect()
    }

    fn values(data: &Series) -> Vec<f64> {
	data.iter().map(|(_,v)| *v).collect()
    }

    fn record(region: &str, country: &str, date: NaiveDate, cases: i64, deaths: i64) -> Record {
	Record { region: region.to_string(), country: country.to_string(), date, cases, deaths }
    }

    fn records() -> Vec<Record> {
	let italy = [0, 0, 3, 20, 79, 150];
	let greece = [0, 0, 0, 0, 1, 4];
	let mut records = Vec::new();
	for i in 0..6 {
	    let day = date(2020, 2, 20) + chrono::Duration::days(i as i64);
	    records.push(record("Italy", "Italy", day, italy[i], italy[i] / 10));
	    records.push(record("Greece", "Greece", day, greece[i], 0));
	    records.push(record("Hubei", "China", day, 400 + i as i64, 17));
	}
	records
    }

    fn population() -> Population {
	vec![("Italy".to_string(), 60.0), ("Greece".to_string(), 10.0)].into_iter().collect()
    }

    #[test]
    fn growth_scenario() {
	let g = values(&growth(&series(&[0.0, 0.0, 10.0, 20.0, 20.0, 40.0, 80.0, 80.0, 80.0, 160.0])));
	assert_eq!(g[0], 0.0);
	assert_eq!(g[1], 0.0);
	assert!(g[2].is_infinite() && g[2] > 0.0);
	assert_eq!(&g[3..], &[100.0, 0.0, 100.0, 100.0, 0.0, 0.0, 100.0]);
    }

    #[test]
    fn negative_growth_passes_through() {
	let g = values(&growth(&series(&[100.0, 90.0])));
	assert_relative_eq!(g[1], -10.0, epsilon = 1e-9);
    }

    #[test]
    fn per_capita_divides_by_population() {
	assert_eq!(values(&per_capita(&series(&[300.0]), 60.0)), vec![5.0]);
	let data = series(&[0.0, 12.0, 1234.0]);
	for ((_,pc),(_,v)) in per_capita(&data, 10.423).iter().zip(data.iter()) {
	    assert_relative_eq!(*pc, v / 10.423);
	}
    }

    #[test]
    fn per_capita_zero_population_is_not_finite() {
	let pc = values(&per_capita(&series(&[0.0, 5.0]), 0.0));
	assert!(pc[0].is_nan());
	assert!(pc[1].is_infinite());
    }

    #[test]
    fn rolling_mean_window() {
	let data = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
	let sma = values(&rolling_mean(&data, 7));
	assert!(sma[..6].iter().all(|v| v.is_nan()));
	assert_relative_eq!(sma[6], 4.0);
	assert_relative_eq!(sma[7], 5.0);
	assert_relative_eq!(sma[8], 6.0);
    }

    #[test]
    fn rolling_mean_recovers_after_infinity() {
	let mut vals = vec![0.0, f64::INFINITY];
	vals.extend(std::iter::repeat(7.0).take(7));
	let sma = values(&rolling_mean(&series(&vals), 7));
	assert!(sma[7].is_infinite());
	assert_relative_eq!(sma[8], 7.0);
    }

    #[test]
    fn ewm_matches_adjusted_weights() {
	let ewm = values(&ewm_mean(&series(&[0.0, 100.0, 0.0]), 7.0));
	assert_relative_eq!(ewm[0], 0.0);
	assert_relative_eq!(ewm[1], 100.0 / 1.75, epsilon = 1e-9);
	assert_relative_eq!(ewm[2], 75.0 / (1.0 + 0.75 + 0.5625), epsilon = 1e-9);
    }

    #[test]
    fn ewm_keeps_previous_mean_over_nan() {
	let ewm = values(&ewm_mean(&series(&[10.0, f64::NAN]), 7.0));
	assert_relative_eq!(ewm[1], 10.0);
    }

    #[test]
    fn start_is_day_before_first_case() {
	let records = records();
	assert_eq!(first_case_eve(&records, &["Italy", "Greece"]).unwrap(), date(2020, 2, 21));
	assert_eq!(first_case_eve(&records, &["Greece"]).unwrap(), date(2020, 2, 23));
	// sub-national rows never count
	assert!(matches!(first_case_eve(&records, &["China"]), Err(Error::MissingData)));
    }

    #[test]
    fn start_day_is_included() {
	let records = records();
	let start = first_case_eve(&records, &["Italy"]).unwrap();
	let italy = country_series(&records, "Italy", 60.0, start, 7, 7.0).unwrap();
	assert_eq!(italy.start(), Some(start));
	assert_eq!(italy.cases[0].1, 0.0);
	assert_eq!(italy.cases_per_million[0].1, 0.0);
	assert_eq!(italy.growth[0].1, 0.0);
	assert_eq!(italy.cases.len(), 5);
    }

    #[test]
    fn shared_start_date() {
	let records = records();
	let population = population();
	let map = CountryMap::new(&population, &HashMap::new());
	let data = countries(&records, &["Italy", "Greece"], &map, StartDate::Shared, 7, 7.0).unwrap();
	assert_eq!(data.len(), 2);
	assert!(data.iter().all(|c| c.start() == Some(date(2020, 2, 21))));
	assert!(data.iter().all(|c| c.growth[0].1 == 0.0));
	assert_eq!(data[1].end(), Some(date(2020, 2, 25)));
    }

    #[test]
    fn per_country_start_date() {
	let records = records();
	let population = population();
	let map = CountryMap::new(&population, &HashMap::new());
	let data = countries(&records, &["Italy", "Greece"], &map, StartDate::PerCountry, 7, 7.0).unwrap();
	assert_eq!(data[0].start(), Some(date(2020, 2, 21)));
	assert_eq!(data[1].start(), Some(date(2020, 2, 23)));
    }

    #[test]
    fn fixed_start_date() {
	let records = records();
	let population = population();
	let map = CountryMap::new(&population, &HashMap::new());
	let data = countries(&records, &["Greece"], &map, StartDate::Fixed(date(2020, 2, 24)), 7, 7.0).unwrap();
	assert_eq!(values(&data[0].cases), vec![1.0, 4.0]);
	assert_relative_eq!(data[0].cases_per_million[1].1, 0.4);
    }

    #[test]
    fn fixed_start_after_last_observation() {
	let records = records();
	let population = population();
	let map = CountryMap::new(&population, &HashMap::new());
	assert!(matches!(countries(&records, &["Italy"], &map, StartDate::Fixed(date(2020, 3, 1)), 7, 7.0),
			 Err(Error::MissingData)));
    }

    #[test]
    fn missing_country_and_population() {
	let records = records();
	let population = population();
	let map = CountryMap::new(&population, &HashMap::new());
	assert!(matches!(countries(&records, &["Spain"], &map, StartDate::Shared, 7, 7.0),
			 Err(Error::MissingRegion(name)) if name == "Spain"));
	assert!(matches!(countries(&records, &["China"], &map, StartDate::Fixed(date(2020, 2, 20)), 7, 7.0),
			 Err(Error::MissingRegion(_))));
	let mut records = records;
	records.push(record("Spain", "Spain", date(2020, 2, 22), 2, 0));
	assert!(matches!(countries(&records, &["Italy", "Spain"], &map, StartDate::Shared, 7, 7.0),
			 Err(Error::MissingPopulation(name)) if name == "Spain"));
    }

}
