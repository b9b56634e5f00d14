use std::collections::HashMap;

use lazy_static::lazy_static;
use unidecode::unidecode;
use tracing::{debug,warn};

use super::error::{Result,Error};
use super::population::Population;


lazy_static! {
    /// CSSE country names that differ from common population tables.
    static ref DEFAULT_ALIASES: HashMap<&'static str,&'static str> = vec![
	("US", "United States"),
	("Korea, South", "South Korea"),
	("Korea, North", "North Korea"),
	("Czechia", "Czech Republic"),
	("Taiwan*", "Taiwan"),
	("Burma", "Myanmar"),
	("Congo (Kinshasa)", "DR Congo"),
	("Congo (Brazzaville)", "Republic of the Congo"),
	("Cabo Verde", "Cape Verde"),
	("Holy See", "Vatican City"),
	("West Bank and Gaza", "Palestine"),
	("Timor-Leste", "East Timor"),
	("Eswatini", "Swaziland"),
    ].into_iter().collect();
}


/// Resolves disease-table country names to population-table entries.
pub struct CountryMap<'a> {
    population: &'a Population,
    aliases: HashMap<String,String>,
    folded: HashMap<String,&'a str>,
}


impl<'a> CountryMap<'a> {

    // configured aliases win over built-in ones
    pub fn new(population: &'a Population, aliases: &HashMap<String,String>) -> Self {
	let mut all: HashMap<String,String> = DEFAULT_ALIASES.iter()
	    .map(|(k,v)| (k.to_string(), v.to_string())).collect();
	all.extend(aliases.iter().map(|(k,v)| (k.clone(), v.clone())));
	Self {
	    population,
	    aliases: all,
	    folded: population.keys().map(|name| (fold(name), name.as_str())).collect(),
	}
    }

    pub fn resolve(&self, country: &str) -> Result<&'a str> {
	if let Some((name,_)) = self.population.get_key_value(country) {
	    return Ok(name.as_str());
	}
	if let Some(alias) = self.aliases.get(country) {
	    if let Some(name) = self.lookup(alias) {
		debug!(country, name, "resolved country through alias");
		return Ok(name);
	    }
	}
	match self.folded.get(&fold(country)) {
	    Some(name) => {
		warn!(country, name = *name, "country name matched loosely");
		Ok(*name)
	    }
	    None => Err(Error::MissingPopulation(country.to_string())),
	}
    }

    pub fn population(&self, country: &str) -> Result<f64> {
	let name = self.resolve(country)?;
	self.population.get(name).copied()
	    .ok_or_else(|| Error::MissingPopulation(country.to_string()))
    }

    fn lookup(&self, name: &str) -> Option<&'a str> {
	self.population.get_key_value(name).map(|(k,_)| k.as_str())
	    .or_else(|| self.folded.get(&fold(name)).copied())
    }

}


/// Case, accent and punctuation insensitive key.
fn fold(name: &str) -> String {
    unidecode(name).chars()
	.filter(|c| c.is_alphanumeric())
	.flat_map(char::to_lowercase)
	.collect()
}


#[cfg(test)]
mod tests {

    use super::*;

    fn population() -> Population {
	vec![("Italy", 60.46), ("United States", 331.0), ("Côte d'Ivoire", 26.38),
	     ("South Korea", 51.27), ("Kosovo", 1.8)]
	    .into_iter().map(|(k,v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn exact_match() {
	let population = population();
	let map = CountryMap::new(&population, &HashMap::new());
	assert_eq!(map.resolve("Italy").unwrap(), "Italy");
	assert_eq!(map.population("Italy").unwrap(), 60.46);
    }

    #[test]
    fn builtin_alias() {
	let population = population();
	let map = CountryMap::new(&population, &HashMap::new());
	assert_eq!(map.resolve("US").unwrap(), "United States");
	assert_eq!(map.resolve("Korea, South").unwrap(), "South Korea");
    }

    #[test]
    fn configured_alias_overrides_builtin() {
	let mut population = population();
	population.insert("USA".to_string(), 330.0);
	let aliases = vec![("US".to_string(), "USA".to_string())].into_iter().collect();
	let map = CountryMap::new(&population, &aliases);
	assert_eq!(map.population("US").unwrap(), 330.0);
    }

    #[test]
    fn accent_insensitive_match() {
	let population = population();
	let map = CountryMap::new(&population, &HashMap::new());
	assert_eq!(map.resolve("Cote d'Ivoire").unwrap(), "Côte d'Ivoire");
	assert_eq!(map.resolve("ITALY").unwrap(), "Italy");
    }

    #[test]
    fn unmapped_country_is_an_error() {
	let population = population();
	let map = CountryMap::new(&population, &HashMap::new());
	assert!(matches!(map.population("Atlantis"),
			 Err(Error::MissingPopulation(name)) if name == "Atlantis"));
    }

}
