//! Open-Meteo forecast client and weather reply formatting
//!
//! Current conditions and a next-day aggregate (min/max temperature, max
//! precipitation probability, max wind). Missing values stay `None` and are
//! rendered as `?` instead of failing the reply.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{check_status, JarvisError, Result};
use crate::types::{CurrentConditions, DailyOutlook, Language, Location};

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

// ============================================================================
// Temperature Unit
// ============================================================================

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    #[serde(alias = "c", alias = "C")]
    Celsius,
    #[serde(alias = "f", alias = "F")]
    Fahrenheit,
}

impl TemperatureUnit {
    /// Parse from string (case-insensitive); anything unknown is Celsius
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "f" | "fahrenheit" => TemperatureUnit::Fahrenheit,
            _ => TemperatureUnit::Celsius,
        }
    }

    /// Unit suffix for display
    pub fn suffix(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    /// Value of Open-Meteo's `temperature_unit` parameter
    fn api_param(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
        }
    }
}

// ============================================================================
// Forecast Service
// ============================================================================

/// Current conditions and tomorrow's outlook for a location
#[async_trait]
pub trait ForecastService: Send + Sync {
    async fn current(&self, location: &Location) -> Result<CurrentConditions>;
    async fn tomorrow(&self, location: &Location) -> Result<DailyOutlook>;
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: Option<CurrentBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: Option<f64>,
    apparent_temperature: Option<f64>,
    wind_speed_10m: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DailyResponse {
    daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DailyBlock {
    temperature_2m_min: Vec<Option<f64>>,
    temperature_2m_max: Vec<Option<f64>>,
    precipitation_probability_max: Vec<Option<f64>>,
    wind_speed_10m_max: Vec<Option<f64>>,
}

/// Index of tomorrow in a two-day daily series
const TOMORROW: usize = 1;

fn nth(series: &[Option<f64>], index: usize) -> Option<f64> {
    series.get(index).copied().flatten()
}

impl CurrentResponse {
    fn into_conditions(self) -> Result<CurrentConditions> {
        let block = self
            .current
            .ok_or_else(|| JarvisError::ParseFailure("no `current` block in forecast".to_string()))?;

        if block.temperature_2m.is_none() {
            return Err(JarvisError::EmptyResult(
                "forecast returned no current temperature".to_string(),
            ));
        }

        Ok(CurrentConditions {
            temperature: block.temperature_2m,
            apparent_temperature: block.apparent_temperature,
            wind_speed: block.wind_speed_10m,
        })
    }
}

impl DailyResponse {
    fn into_tomorrow(self) -> DailyOutlook {
        let daily = self.daily.unwrap_or_default();
        DailyOutlook {
            temperature_min: nth(&daily.temperature_2m_min, TOMORROW),
            temperature_max: nth(&daily.temperature_2m_max, TOMORROW),
            precipitation_probability: nth(&daily.precipitation_probability_max, TOMORROW),
            wind_speed_max: nth(&daily.wind_speed_10m_max, TOMORROW),
        }
    }
}

/// Open-Meteo forecast API client
pub struct OpenMeteoForecast {
    client: Client,
    unit: TemperatureUnit,
}

impl OpenMeteoForecast {
    pub fn new(client: Client, unit: TemperatureUnit) -> Self {
        Self { client, unit }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        location: &Location,
        extra: &[(&str, &str)],
    ) -> Result<T> {
        let latitude = location.latitude.to_string();
        let longitude = location.longitude.to_string();
        let mut query = vec![
            ("latitude", latitude.as_str()),
            ("longitude", longitude.as_str()),
            ("timezone", "auto"),
            ("wind_speed_unit", "kmh"),
            ("temperature_unit", self.unit.api_param()),
        ];
        query.extend_from_slice(extra);

        let response = self.client.get(FORECAST_URL).query(&query).send().await?;
        Ok(check_status("forecast API", response).await?.json().await?)
    }
}

#[async_trait]
impl ForecastService for OpenMeteoForecast {
    async fn current(&self, location: &Location) -> Result<CurrentConditions> {
        let resp: CurrentResponse = self
            .get(
                location,
                &[("current", "temperature_2m,apparent_temperature,wind_speed_10m")],
            )
            .await?;
        resp.into_conditions()
    }

    async fn tomorrow(&self, location: &Location) -> Result<DailyOutlook> {
        let resp: DailyResponse = self
            .get(
                location,
                &[
                    (
                        "daily",
                        "temperature_2m_min,temperature_2m_max,precipitation_probability_max,wind_speed_10m_max",
                    ),
                    ("forecast_days", "2"),
                ],
            )
            .await?;
        Ok(resp.into_tomorrow())
    }
}

// ============================================================================
// Reply Formatting
// ============================================================================

/// Round to a whole number, rendering -0 as 0
fn whole(value: f64) -> String {
    let rounded = value.round();
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{:.0}", rounded)
    }
}

fn whole_or_unknown(value: Option<f64>) -> String {
    value.map(whole).unwrap_or_else(|| "?".to_string())
}

/// "{temp}{unit} now in {place}[, feels like ...][, wind ... km/h]."
pub fn format_current(
    place: &str,
    conditions: &CurrentConditions,
    unit: TemperatureUnit,
    lang: Language,
) -> String {
    let suffix = unit.suffix();
    let temp = whole_or_unknown(conditions.temperature);

    let mut reply = match lang {
        Language::Ro => format!("{}{} acum în {}", temp, suffix, place),
        Language::En => format!("{}{} now in {}", temp, suffix, place),
    };

    if let Some(feels) = conditions.apparent_temperature {
        let label = match lang {
            Language::Ro => "se simte ca",
            Language::En => "feels like",
        };
        reply.push_str(&format!(", {} {}{}", label, whole(feels), suffix));
    }

    if let Some(wind) = conditions.wind_speed {
        let label = match lang {
            Language::Ro => "vânt",
            Language::En => "wind",
        };
        reply.push_str(&format!(", {} {} km/h", label, whole(wind)));
    }

    reply.push('.');
    reply
}

/// "Tomorrow in {place}: {min}–{max}{unit}, rain {rain}%, wind {wind} km/h."
pub fn format_tomorrow(
    place: &str,
    outlook: &DailyOutlook,
    unit: TemperatureUnit,
    lang: Language,
) -> String {
    let min = whole_or_unknown(outlook.temperature_min);
    let max = whole_or_unknown(outlook.temperature_max);
    let rain = whole_or_unknown(outlook.precipitation_probability);
    let wind = whole_or_unknown(outlook.wind_speed_max);
    let suffix = unit.suffix();

    match lang {
        Language::Ro => format!(
            "Mâine în {}: {}–{}{}, ploaie {}%, vânt {} km/h.",
            place, min, max, suffix, rain, wind
        ),
        Language::En => format!(
            "Tomorrow in {}: {}–{}{}, rain {}%, wind {} km/h.",
            place, min, max, suffix, rain, wind
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_unit_from_str() {
        assert_eq!(TemperatureUnit::from_str("F"), TemperatureUnit::Fahrenheit);
        assert_eq!(TemperatureUnit::from_str("fahrenheit"), TemperatureUnit::Fahrenheit);
        assert_eq!(TemperatureUnit::from_str("FAHRENHEIT"), TemperatureUnit::Fahrenheit);
        assert_eq!(TemperatureUnit::from_str("C"), TemperatureUnit::Celsius);
        assert_eq!(TemperatureUnit::from_str("anything"), TemperatureUnit::Celsius);
    }

    #[test]
    fn test_parse_current_response() {
        let resp: CurrentResponse = serde_json::from_str(
            r#"{"latitude":44.43,"current":{"time":"2026-01-27T10:00","temperature_2m":3.6,"apparent_temperature":-0.2,"wind_speed_10m":14.8}}"#,
        )
        .unwrap();
        let conditions = resp.into_conditions().unwrap();
        assert_eq!(conditions.temperature, Some(3.6));
        assert_eq!(conditions.apparent_temperature, Some(-0.2));
        assert_eq!(conditions.wind_speed, Some(14.8));
    }

    #[test]
    fn test_current_without_temperature_is_empty() {
        let resp: CurrentResponse =
            serde_json::from_str(r#"{"current":{"temperature_2m":null}}"#).unwrap();
        assert!(matches!(resp.into_conditions(), Err(JarvisError::EmptyResult(_))));

        let resp: CurrentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(matches!(resp.into_conditions(), Err(JarvisError::ParseFailure(_))));
    }

    #[test]
    fn test_parse_daily_takes_second_day() {
        let resp: DailyResponse = serde_json::from_str(
            r#"{"daily":{"time":["2026-01-27","2026-01-28"],
                "temperature_2m_min":[-1.0,2.4],
                "temperature_2m_max":[5.0,9.6],
                "precipitation_probability_max":[10,65],
                "wind_speed_10m_max":[20.0,null]}}"#,
        )
        .unwrap();
        let outlook = resp.into_tomorrow();
        assert_eq!(outlook.temperature_min, Some(2.4));
        assert_eq!(outlook.temperature_max, Some(9.6));
        assert_eq!(outlook.precipitation_probability, Some(65.0));
        assert_eq!(outlook.wind_speed_max, None);
    }

    #[test]
    fn test_parse_daily_short_series() {
        let resp: DailyResponse =
            serde_json::from_str(r#"{"daily":{"temperature_2m_min":[1.0]}}"#).unwrap();
        assert_eq!(resp.into_tomorrow(), DailyOutlook::default());
    }

    #[test]
    fn test_format_current_english_full() {
        let conditions = CurrentConditions {
            temperature: Some(21.4),
            apparent_temperature: Some(20.6),
            wind_speed: Some(11.2),
        };
        assert_eq!(
            format_current("Paris", &conditions, TemperatureUnit::Celsius, Language::En),
            "21°C now in Paris, feels like 21°C, wind 11 km/h."
        );
    }

    #[test]
    fn test_format_current_romanian_optional_parts() {
        let conditions = CurrentConditions {
            temperature: Some(-0.3),
            apparent_temperature: None,
            wind_speed: None,
        };
        assert_eq!(
            format_current("București", &conditions, TemperatureUnit::Celsius, Language::Ro),
            "0°C acum în București."
        );
    }

    #[test]
    fn test_format_tomorrow_missing_fields() {
        let outlook = DailyOutlook {
            temperature_min: Some(2.4),
            temperature_max: None,
            precipitation_probability: None,
            wind_speed_max: Some(18.0),
        };
        assert_eq!(
            format_tomorrow("Paris", &outlook, TemperatureUnit::Celsius, Language::En),
            "Tomorrow in Paris: 2–?°C, rain ?%, wind 18 km/h."
        );
        assert_eq!(
            format_tomorrow("Paris", &DailyOutlook::default(), TemperatureUnit::Fahrenheit, Language::Ro),
            "Mâine în Paris: ?–?°F, ploaie ?%, vânt ? km/h."
        );
    }
}
