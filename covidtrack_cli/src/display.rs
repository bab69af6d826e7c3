use comfy_table::{presets::NOTHING, *};
use covidtrack::lookup::{region_name, CategoryLookup, PopulationLookup, REGIONS};
use covidtrack::region::RegionCode;
use covidtrack::table::CanonicalTable;

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_style(comfy_table::TableComponent::BottomBorder, '─')
        .set_style(comfy_table::TableComponent::MiddleHeaderIntersections, '─')
        .set_style(comfy_table::TableComponent::HeaderLines, '─')
        .set_style(comfy_table::TableComponent::BottomBorderIntersections, '─')
        .set_style(comfy_table::TableComponent::TopBorder, '─')
        .set_style(comfy_table::TableComponent::TopBorderIntersections, '─');
    table
}

/// Region selector options with the lookups each one joins to.
pub fn regions_table() -> Table {
    let categories = CategoryLookup::default();
    let populations = PopulationLookup::default();
    let mut table = base_table();
    table.set_header(vec![
        Cell::new("Code").add_attribute(Attribute::Bold),
        Cell::new("Name").add_attribute(Attribute::Bold),
        Cell::new("Category").add_attribute(Attribute::Bold),
        Cell::new("Population").add_attribute(Attribute::Bold),
    ]);
    for (code, name) in REGIONS {
        let region: Option<RegionCode> = code.parse().ok();
        let category = region.as_ref().and_then(|r| categories.get(r));
        let population = region.as_ref().and_then(|r| populations.get(r));
        table.add_row(vec![
            code.to_string(),
            name.to_string(),
            category.map(|c| c.to_string()).unwrap_or_default(),
            population.map(|p| format!("{p:.0}")).unwrap_or_default(),
        ]);
    }
    if let Some(column) = table.column_mut(3) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    table
}

pub fn display_regions() {
    println!("\n{}", regions_table());
}

/// Row counts of a freshly built canonical table.
pub fn refresh_summary_table(canonical: &CanonicalTable) -> Table {
    let regions = canonical.regions();
    let latest = canonical.observations().iter().map(|obs| obs.date).max();
    let unnamed = regions.iter().filter(|r| region_name(r).is_none()).count();
    let mut table = base_table();
    table
        .add_row(vec![
            Cell::new("Built at").add_attribute(Attribute::Bold),
            canonical.built_at().to_rfc3339().into(),
        ])
        .add_row(vec![
            Cell::new("Rows").add_attribute(Attribute::Bold),
            canonical.len().into(),
        ])
        .add_row(vec![
            Cell::new("Regions").add_attribute(Attribute::Bold),
            regions.len().into(),
        ])
        .add_row(vec![
            Cell::new("Regions outside the selector").add_attribute(Attribute::Bold),
            unnamed.into(),
        ])
        .add_row(vec![
            Cell::new("With category").add_attribute(Attribute::Bold),
            canonical.categorized().count().into(),
        ])
        .add_row(vec![
            Cell::new("With population").add_attribute(Attribute::Bold),
            canonical.population_scaled().count().into(),
        ])
        .add_row(vec![
            Cell::new("Latest date").add_attribute(Attribute::Bold),
            latest.map(|d| d.to_string()).unwrap_or_default().into(),
        ]);
    if let Some(column) = table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    table
}

pub fn display_refresh_summary(canonical: &CanonicalTable) {
    println!("\n{}", refresh_summary_table(canonical));
}
