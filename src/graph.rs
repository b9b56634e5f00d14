use std::{io,fs};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::naive::NaiveDate;
use serde_json::{Value,json};
use tracing::info;

use super::derive::CountrySeries;
use super::error::{Result,Error};
use super::NaiveDateRange;


pub type Series = Vec<(NaiveDate,f64)>;
pub type Refs = Vec<(String,Series)>;


/// Exponential reference curves `(1 + rate/100)^n` over `start..=end`.
pub fn reference_curves(start: NaiveDate, end: NaiveDate, rates: &[f64]) -> Refs {
    rates.iter().map(|rate| {
	let base = 1.0 + rate / 100.0;
	(format!("{}^n", base), NaiveDateRange(start, Some(end)).enumerate().map(
	    |(n,date)| (date, base.powi(n as i32))
	).collect())
    }).collect()
}


/// Write the three-chart page for `data`, coloured by the parallel `colors`.
pub fn covid_page(path: &Path, data: &[CountrySeries], colors: &[String],
		  rates: &[f64]) -> Result<()> {

    let start = data.iter().filter_map(CountrySeries::start).min().ok_or(Error::MissingData)?;
    let end = data.iter().filter_map(CountrySeries::end).max().ok_or(Error::MissingData)?;
    let title = format!("COVID-19 cases per million inhabitants since {}", start.format("%Y-%m-%d"));

    page(path, &title, &json!({
	"$schema": "https://vega.github.io/schema/vega-lite/v4.json",
	"title": title,
	"background": "lightgray",
	"vconcat": [
	    per_capita_chart(data, colors, &reference_curves(start, end, rates)),
	    growth_chart("Growth", "Cases Growth Rate (%)", data, colors,
			 &[Metric::Growth, Metric::RollingMean]),
	    growth_chart("Smoothed", "Cases Growth Rate (%) - Exponential Moving Average",
			 data, colors, &[Metric::Exponential]),
	]
    }))?;

    info!("Wrote {}", path.display());
    Ok(())

}


fn per_capita_chart(data: &[CountrySeries], colors: &[String], refs: &Refs) -> Value {

    let labels = |c: &CountrySeries| (format!("{} (Cases)", c.country),
				      format!("{} (Deaths)", c.country));

    // log scale: zero and negative values cannot be drawn
    let values = data.iter().flat_map(|c| {
	let (cases,deaths) = labels(c);
	points(&c.cases_per_million, move |date,val| json!({
	    "Date": date, "Series": cases.clone(), "Kind": "Cases", "Value": val,
	    "Population": c.population
	})).chain(points(&c.deaths_per_million, move |date,val| json!({
	    "Date": date, "Series": deaths.clone(), "Kind": "Deaths", "Value": val,
	    "Population": c.population
	})))
    }).filter(|v| v["Value"].as_f64().map_or(false, |v| v > 0.0)).collect::<Vec<_>>();

    let (domain,range): (Vec<_>,Vec<_>) = data.iter().zip(colors.iter().cycle()).flat_map(
	|(c,color)| {
	    let (cases,deaths) = labels(c);
	    vec![(cases, color.clone()), (deaths, color.clone())]
	}).unzip();

    let mid = refs.first().and_then(|(_,series)| series.get(series.len() / 2)).map(|(date,_)| *date);

    json!({
	"width": 900,
	"height": 450,
	"layer": [
	    {
		"data": {"values": values},
		"mark": {"type": "line", "strokeWidth": 2},
		"selection": {
		    "HighlightCapita": {"bind":"legend","type":"multi","fields":["Series"]},
		    "GridCapita": {"bind":"scales","type":"interval"}
		},
		"encoding": {
		    "x": date_axis(),
		    "y": {
			"field": "Value",
			"title": "# of Confirmed Incidents Per Million Inhabitants",
			"scale": {"type": "log"},
			"type": "quantitative"
		    },
		    "color": {
			"field": "Series",
			"type": "nominal",
			"title": null,
			"scale": {"domain": domain, "range": range}
		    },
		    "strokeDash": {
			"field": "Kind",
			"type": "nominal",
			"legend": null,
			"scale": {"domain": ["Cases", "Deaths"], "range": [[1, 0], [2, 2]]}
		    },
		    "opacity": {"value":0.1,"condition":{"value":1,"selection":"HighlightCapita"}},
		    "tooltip": [
			{"field": "Date", "type": "temporal"},
			{"field": "Series", "type": "nominal"},
			{"field": "Value", "type": "quantitative", "format": ".3f"},
			{"field": "Population", "type": "quantitative", "format": ".2f", "title": "Population (M)"}
		    ]
		}
	    },
	    {
		"data": {"values": refs.iter().flat_map(
		    |(name,series)| points(series, move |date,val| json!({
			"Date": date, "Name": name, "Value": val
		    }))).collect::<Vec<_>>()},
		"mark": {"type": "line", "color": "lightgrey"},
		"encoding": {
		    "x": date_axis(),
		    "y": {"field": "Value", "type": "quantitative"},
		    "detail": {"field": "Name", "type": "nominal"},
		    "strokeDash": {
			"field": "Name",
			"type": "nominal",
			"legend": null,
			"scale": {
			    "domain": refs.iter().map(|(name,_)| name.clone()).collect::<Vec<_>>(),
			    "range": refs.iter().enumerate().map(
				|(i,_)| if i % 2 == 0 { json!([6, 4]) } else { json!([6, 3, 1, 3]) }
			    ).collect::<Vec<_>>()
			}
		    }
		}
	    },
	    {
		"data": {"values": refs.iter().filter_map(
		    |(name,series)| series.iter().find(|(date,_)| Some(*date) == mid).map(
			|(date,val)| json!({
			    "Date": date.format("%Y-%m-%d").to_string(),
			    "Name": name,
			    "Value": val
			}))
		).collect::<Vec<_>>()},
		"mark": {"type": "text", "color": "gray", "fontSize": 10, "align": "left", "dy": -6},
		"encoding": {
		    "x": date_axis(),
		    "y": {"field": "Value", "type": "quantitative"},
		    "text": {"field": "Name"}
		}
	    }
	]
    })

}


#[derive(Clone,Copy,Debug,PartialEq)]
pub enum Metric {
    Growth,
    RollingMean,
    Exponential,
}

impl Metric {

    fn series(self, c: &CountrySeries) -> &Series {
	match self {
	    Self::Growth => &c.growth,
	    Self::RollingMean => &c.growth_sma,
	    Self::Exponential => &c.growth_ewm,
	}
    }

    fn label(self) -> &'static str {
	match self {
	    Self::Growth => "Daily",
	    Self::RollingMean => "Rolling mean",
	    Self::Exponential => "Exponential mean",
	}
    }

}


fn growth_chart(name: &str, ytitle: &str, data: &[CountrySeries], colors: &[String],
		metrics: &[Metric]) -> Value {

    let values = data.iter().flat_map(
	|c| metrics.iter().flat_map(move |metric| points(metric.series(c), move |date,val| json!({
	    "Date": date, "Country": c.country, "Kind": metric.label(), "Value": val
	})))
    ).collect::<Vec<_>>();
    let highlight = format!("Highlight{}", name);
    let grid = format!("Grid{}", name);

    json!({
	"width": 900,
	"height": 300,
	"data": {"values": values},
	"mark": {"type": "line", "strokeWidth": 2},
	"selection": {
	    highlight.clone(): {"bind":"legend","type":"multi","fields":["Country"]},
	    grid: {"bind":"scales","type":"interval"}
	},
	"encoding": {
	    "x": date_axis(),
	    "y": {
		"field": "Value",
		"title": ytitle,
		"type": "quantitative"
	    },
	    "color": {
		"field": "Country",
		"type": "nominal",
		"scale": {
		    "domain": data.iter().map(|c| c.country.clone()).collect::<Vec<_>>(),
		    "range": colors.iter().cycle().take(data.len()).collect::<Vec<_>>()
		}
	    },
	    "strokeDash": {
		"field": "Kind",
		"type": "nominal",
		"title": null,
		"scale": {
		    "domain": metrics.iter().map(|m| m.label()).collect::<Vec<_>>(),
		    "range": metrics.iter().enumerate().map(
			|(i,_)| if i == 0 { json!([1, 0]) } else { json!([2, 2]) }
		    ).collect::<Vec<_>>()
		}
	    },
	    "opacity": {"value":0.1,"condition":{"value":1,"selection":highlight}},
	    "tooltip": [
		{"field": "Date", "type": "temporal"},
		{"field": "Country", "type": "nominal"},
		{"field": "Kind", "type": "nominal"},
		{"field": "Value", "type": "quantitative", "format": ".2f"}
	    ]
	}
    })

}


fn points<'a, F>(series: &'a Series, row: F) -> impl Iterator<Item = Value> + 'a
where F: Fn(String, f64) -> Value + 'a {
    series.iter().filter(|(_,val)| val.is_finite()).map(
	move |(date,val)| row(date.format("%Y-%m-%d").to_string(), *val)
    )
}


fn date_axis() -> Value {
    json!({
	"field": "Date",
	"timeUnit": "utcyearmonthdate",
	"title": "Date",
	"type": "temporal"
    })
}


fn page(path: &Path, title: &str, spec: &Value) -> Result<()> {

    if let Some(dir) = path.parent() {
	fs::create_dir_all(dir)?;
    }
    let mut out = io::BufWriter::new(File::create(path)?);

    write!(out, "<!DOCTYPE html><html><head>")?;
    write!(out, "<meta charset=\"UTF-8\">")?;
    write!(out, "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">")?;
    write!(out, "<title>{}</title>", title)?;
    write!(out, "<script src=\"https://cdn.jsdelivr.net/npm/vega@5\"></script>")?;
    write!(out, "<script src=\"https://cdn.jsdelivr.net/npm/vega-lite@4\"></script>")?;
    write!(out, "<script src=\"https://cdn.jsdelivr.net/npm/vega-embed\"></script>")?;
    write!(out, "</head>")?;
    write!(out, "<body>")?;
    write!(out, "<div id=\"vis\"></div>")?;
    write!(out, "<script type=\"text/javascript\">")?;
    write!(out, "var spec = ")?;
    serde_json::to_writer_pretty(out.by_ref(), spec)?;
    write!(out, ";vegaEmbed('#vis', spec,{{}}).then(function(result) {{")?;
    write!(out, "}}).catch(console.error);")?;
    write!(out, "</script>")?;
    write!(out, "</body></html>")?;

    out.flush()?;
    Ok(())

}
