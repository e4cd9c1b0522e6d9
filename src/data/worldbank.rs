//! World Bank reference data and indicator observations.
//!
//! Raw API records are deserialized into explicit shapes (`RawCountry`,
//! `RawObservation`) and then mapped into domain rows. Records that do not fit
//! the shape are skipped rather than failing the run.

use std::thread;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::data::fetch::Pager;
use crate::domain::{AGGREGATES_REGION, EntityInfo, EntityMap, RawRow, SourceIndicator, YearWindow};
use crate::error::AppError;

/// `{"id": "...", "value": "..."}` reference used all over the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdValue {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// One record of `/country`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCountry {
    /// ISO3 code.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub iso2_code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub region: Option<IdValue>,
    #[serde(default)]
    pub income_level: Option<IdValue>,
}

/// One record of `/country/all/indicator/{code}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawObservation {
    #[serde(default)]
    pub country: Option<IdValue>,
    #[serde(default)]
    pub indicator: Option<IdValue>,
    /// Usually a year string (`"2021"`).
    #[serde(default)]
    pub date: Option<Value>,
    /// Number or `null`.
    #[serde(default)]
    pub value: Option<Value>,
}

/// Fetch the country catalog, dropping aggregates and records without an ISO2 code.
pub fn resolve_entities(pager: &Pager<'_>) -> Result<EntityMap, AppError> {
    let records = pager.fetch_all("/country", &[])?;
    let total = records.len();

    let mut entities = EntityMap::new();
    for record in records {
        let Ok(raw) = serde_json::from_value::<RawCountry>(record) else {
            continue;
        };
        if let Some(entity) = entity_from_raw(raw) {
            entities.insert(entity.code.clone(), entity);
        }
    }

    info!(fetched = total, kept = entities.len(), "resolved countries");
    Ok(entities)
}

fn entity_from_raw(raw: RawCountry) -> Option<EntityInfo> {
    let region = raw.region.and_then(|r| r.value).unwrap_or_default();
    if region == AGGREGATES_REGION {
        return None;
    }
    let code = raw.iso2_code.filter(|c| !c.trim().is_empty())?;
    Some(EntityInfo {
        code,
        secondary_code: raw.id,
        name: raw.name,
        region,
        income_level: raw.income_level.and_then(|i| i.value).unwrap_or_default(),
    })
}

/// Map one raw observation into a `RawRow`; `None` if its country is not resolved.
pub fn normalize(raw: &RawObservation, entities: &EntityMap) -> Option<RawRow> {
    let country = raw.country.as_ref()?;
    let code = country.id.as_deref()?;
    let entity = entities.get(code)?;

    let indicator = raw.indicator.clone().unwrap_or_default();
    Some(RawRow {
        country_code: entity.code.clone(),
        country_name: country.value.clone(),
        region: Some(entity.region.clone()),
        income_level: Some(entity.income_level.clone()),
        indicator_code: indicator.id,
        indicator_name: indicator.value,
        year: raw.date.as_ref().and_then(scalar_text),
        value: raw.value.as_ref().and_then(scalar_text),
    })
}

/// Render a JSON scalar as text; `null` and containers are missing.
fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Fetch all configured indicators for all countries within `window`.
pub fn fetch_indicator_rows(
    pager: &Pager<'_>,
    indicators: &[SourceIndicator],
    window: YearWindow,
    entities: &EntityMap,
) -> Result<Vec<RawRow>, AppError> {
    let mut rows = Vec::new();

    for (idx, indicator) in indicators.iter().enumerate() {
        if idx > 0 {
            thread::sleep(pager.delay());
        }

        let endpoint = format!("/country/all/indicator/{}", indicator.code);
        let records = pager.fetch_all(&endpoint, &[("date", window.as_query())])?;
        let fetched = records.len();

        let before = rows.len();
        for record in records {
            let Ok(raw) = serde_json::from_value::<RawObservation>(record) else {
                continue;
            };
            if let Some(row) = normalize(&raw, entities) {
                rows.push(row);
            }
        }

        debug!(indicator = %indicator.code, fetched, kept = rows.len() - before, "normalized indicator");
    }

    info!(rows = rows.len(), indicators = indicators.len(), "fetched indicator data");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::data::fetch::tests::FakeTransport;

    const BASE: &str = "http://api.test/v2";

    fn country_page() -> Value {
        json!([
            {"page": 1, "pages": 1, "per_page": "20000", "total": 4},
            [
                {"id": "DEU", "iso2Code": "DE", "name": "Germany",
                 "region": {"id": "ECS", "value": "Europe & Central Asia"},
                 "incomeLevel": {"id": "HIC", "value": "High income"}},
                {"id": "WLD", "iso2Code": "1W", "name": "World",
                 "region": {"id": "NA", "value": "Aggregates"},
                 "incomeLevel": {"id": "NA", "value": "Aggregates"}},
                {"id": "XXX", "iso2Code": "", "name": "Nowhere",
                 "region": {"id": "ECS", "value": "Europe & Central Asia"}},
                {"id": "FRA", "iso2Code": "FR", "name": "France",
                 "region": {"id": "ECS", "value": "Europe & Central Asia"},
                 "incomeLevel": {"id": "HIC", "value": "High income"}}
            ]
        ])
    }

    fn entities() -> EntityMap {
        let t = FakeTransport::default().with(&format!("{BASE}/country"), 1, country_page());
        let pager = Pager::new(&t, BASE, 20_000, Duration::ZERO);
        resolve_entities(&pager).unwrap()
    }

    #[test]
    fn resolver_drops_aggregates_and_missing_codes() {
        let e = entities();
        assert_eq!(e.keys().cloned().collect::<Vec<_>>(), vec!["DE", "FR"]);
        let de = &e["DE"];
        assert_eq!(de.secondary_code.as_deref(), Some("DEU"));
        assert_eq!(de.income_level, "High income");
    }

    #[test]
    fn resolver_accepts_empty_catalog() {
        let t = FakeTransport::default().with(&format!("{BASE}/country"), 1, json!([{"message": "x"}]));
        let pager = Pager::new(&t, BASE, 20_000, Duration::ZERO);
        assert!(resolve_entities(&pager).unwrap().is_empty());
    }

    #[test]
    fn normalize_joins_on_resolved_countries() {
        let e = entities();
        let raw: RawObservation = serde_json::from_value(json!({
            "indicator": {"id": "SP.POP.TOTL", "value": "Population, total"},
            "country": {"id": "DE", "value": "Germany"},
            "countryiso3code": "DEU",
            "date": "2022",
            "value": 83797985,
            "unit": "", "obs_status": "", "decimal": 0
        }))
        .unwrap();

        let row = normalize(&raw, &e).unwrap();
        assert_eq!(row.country_code, "DE");
        assert_eq!(row.region.as_deref(), Some("Europe & Central Asia"));
        assert_eq!(row.indicator_code.as_deref(), Some("SP.POP.TOTL"));
        assert_eq!(row.year.as_deref(), Some("2022"));
        assert_eq!(row.value.as_deref(), Some("83797985"));

        let aggregate: RawObservation = serde_json::from_value(json!({
            "indicator": {"id": "SP.POP.TOTL", "value": "Population, total"},
            "country": {"id": "1W", "value": "World"},
            "date": "2022", "value": 1
        }))
        .unwrap();
        assert!(normalize(&aggregate, &e).is_none());
    }

    #[test]
    fn null_value_is_kept_as_missing() {
        let e = entities();
        let raw: RawObservation = serde_json::from_value(json!({
            "indicator": {"id": "NY.GDP.MKTP.CD", "value": "GDP (current US$)"},
            "country": {"id": "FR", "value": "France"},
            "date": "2023", "value": null
        }))
        .unwrap();
        let row = normalize(&raw, &e).unwrap();
        assert_eq!(row.value, None);
    }

    #[test]
    fn fetches_each_indicator_with_date_range() {
        let url = format!("{BASE}/country/all/indicator/SP.POP.TOTL");
        let t = FakeTransport::default().with(
            &url,
            1,
            json!([{"pages": 1}, [
                {"country": {"id": "DE", "value": "Germany"},
                 "indicator": {"id": "SP.POP.TOTL", "value": "Population"},
                 "date": "2021", "value": 83000000},
                {"country": {"id": "ZZ", "value": "Unknown"},
                 "indicator": {"id": "SP.POP.TOTL", "value": "Population"},
                 "date": "2021", "value": 1},
                "not an object"
            ]]),
        );
        let pager = Pager::new(&t, BASE, 20_000, Duration::ZERO);
        let indicators = vec![SourceIndicator::new("SP.POP.TOTL", "Population")];

        let rows = fetch_indicator_rows(&pager, &indicators, YearWindow::new(2019, 2023), &entities()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country_code, "DE");

        let calls = t.calls.borrow();
        assert!(calls[0].1.contains(&("date".to_string(), "2019:2023".to_string())));
    }
}
