use std::fs;
use std::path::{Path,PathBuf};
use std::collections::HashMap;

use serde::Deserialize;

use super::csse::{CONFIRMED_URL,DEATHS_URL};
use super::derive::StartDate;
use super::error::{Result,Error};


#[derive(Clone,Debug,PartialEq,Deserialize)]
pub struct CountryStyle {
    pub name: String,
    pub color: String,
}


#[derive(Clone,Debug,PartialEq,Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub countries: Vec<CountryStyle>,
    pub confirmed: String,
    pub deaths: String,
    pub population: PathBuf,
    pub output: PathBuf,
    pub start: StartDate,
    pub window: usize,
    pub span: f64,
    /// Daily growth rates (%) of the reference curves.
    pub reference_rates: Vec<f64>,
    /// CSSE country name -> population table name.
    pub aliases: HashMap<String,String>,
}


impl Default for Config {
    fn default() -> Self {
	Self {
	    countries: vec![("Italy", "blue"), ("Spain", "green"),
			    ("United Kingdom", "purple"), ("France", "orange"),
			    ("Greece", "black"), ("US", "lightcoral"),
			    ("Germany", "olive")]
		.into_iter().map(|(name,color)| CountryStyle {
		    name: name.to_string(),
		    color: color.to_string()
		}).collect(),
	    confirmed: CONFIRMED_URL.to_string(),
	    deaths: DEATHS_URL.to_string(),
	    population: PathBuf::from("population.csv"),
	    output: PathBuf::from("covid_data.html"),
	    start: StartDate::Shared,
	    window: 7,
	    span: 7.0,
	    reference_rates: vec![10.0, 20.0],
	    aliases: HashMap::new(),
	}
    }
}


impl Config {

    pub fn load(path: &Path) -> Result<Self> {
	Self::parse(&fs::read_to_string(path)?)
    }

    pub fn parse(text: &str) -> Result<Self> {
	toml::from_str::<Self>(text)?.validate()
    }

    pub fn validate(self) -> Result<Self> {
	if self.countries.is_empty() {
	    return Err(Error::InvalidConfig("no countries selected".to_string()));
	}
	if self.window == 0 {
	    return Err(Error::InvalidConfig("window must be at least 1".to_string()));
	}
	if !(self.span >= 1.0) {
	    return Err(Error::InvalidConfig(format!("span must be at least 1, got {}", self.span)));
	}
	Ok(self)
    }

    pub fn names(&self) -> Vec<&str> {
	self.countries.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn colors(&self) -> Vec<String> {
	self.countries.iter().map(|c| c.color.clone()).collect()
    }

}
