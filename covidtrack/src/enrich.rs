//! Stage 4: attach category and population. Lookup misses leave the field `None`; the
//! filtered views on [`crate::table::CanonicalTable`] decide what that excludes.

use log::debug;

use crate::lookup::{CategoryLookup, PopulationLookup};
use crate::observation::Observation;

pub fn enrich(
    observations: &mut [Observation],
    categories: &CategoryLookup,
    populations: &PopulationLookup,
) {
    for observation in observations.iter_mut() {
        observation.category = categories.get(&observation.region);
        observation.population = populations.get(&observation.region);
    }
    debug!(
        "Enriched {} rows: {} with a category, {} with a population",
        observations.len(),
        observations.iter().filter(|o| o.category.is_some()).count(),
        observations.iter().filter(|o| o.population.is_some()).count(),
    );
}
