use std::fs;
use std::path::Path;
use std::borrow::Cow;
use std::collections::HashMap;

use serde::Deserialize;
use encoding_rs::mem::decode_latin1;
use tracing::info;

use super::error::{Result,Error};


/// Population in millions, by country name.
pub type Population = HashMap<String,f64>;


/// Population table row; `pop2020` is given in thousands.
#[derive(Deserialize,Debug)]
struct Row {
    name: String,
    pop2020: f64,
}


pub fn load(path: &Path) -> Result<Population> {
    info!("Reading population data from {}...", path.display());
    parse(&fs::read(path)?)
}


pub fn parse(bytes: &[u8]) -> Result<Population> {

    // Spreadsheet exports are often Latin-1.
    let text = match std::str::from_utf8(bytes) {
	Ok(text) => Cow::Borrowed(text),
	Err(_) => decode_latin1(bytes),
    };

    let mut population = HashMap::new();
    for row in csv::Reader::from_reader(text.as_bytes()).deserialize() {
	let row: Row = row?;
	let name = row.name.trim().to_string();
	if population.insert(name.clone(), row.pop2020 / 1000.0).is_some() {
	    return Err(Error::DuplicatePopulation(name));
	}
    }

    Ok(population)

}
