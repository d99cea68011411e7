use crate::dashboard::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "worksheetName")]
    pub worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DataSources {
    pub deployments: FileSource,
    pub population: FileSource,
    #[serde(rename = "activeDuty")]
    pub active_duty: FileSource,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Weights {
    pub total: f64,
    #[serde(rename = "perCapita")]
    pub per_capita: f64,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(rename = "topN")]
    pub top_n: Option<JSValue>,
    pub combination: Option<String>,
    pub weights: Option<Weights>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MdiConfig {
    #[serde(rename = "dataSources")]
    pub data_sources: DataSources,
    pub rules: Option<RulesConfig>,
    #[serde(rename = "defaultYear")]
    pub default_year: Option<i32>,
}

pub fn read_config(path: &str) -> MdiResult<MdiConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: MdiConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> MdiResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

/// Checks the rules of the configuration and fills in the defaults.
pub fn validate_rules(rules: &Option<RulesConfig>) -> MdiResult<MetricsRules> {
    let rules = match rules {
        Some(r) => r,
        None => return Ok(MetricsRules::DEFAULT_RULES),
    };
    let top_n = match rules.top_n {
        Some(_) => read_js_int(&rules.top_n)?,
        None => MetricsRules::DEFAULT_RULES.top_n,
    };
    if top_n == 0 {
        whatever!("topN must be at least 1")
    }
    let combination = match (rules.combination.as_deref(), &rules.weights) {
        (None, None) | (Some("sum"), None) => ZScoreCombination::Sum,
        (Some("sum"), Some(_)) => {
            whatever!("weights are only used with the 'weighted' combination")
        }
        (Some("weighted"), Some(w)) => {
            let valid = |x: f64| x.is_finite() && x >= 0.0;
            if !valid(w.total) || !valid(w.per_capita) || w.total + w.per_capita == 0.0 {
                whatever!(
                    "Cannot use weights {:?}: they must be non-negative and not both zero",
                    w
                )
            }
            ZScoreCombination::Weighted {
                total: w.total,
                per_capita: w.per_capita,
            }
        }
        (Some("weighted"), None) | (None, Some(_)) => {
            whatever!("the 'weighted' combination requires weights for the total and the per capita values")
        }
        (Some(x), _) => {
            whatever!("Cannot use combination {:?}: currently not implemented", x)
        }
    };
    Ok(MetricsRules {
        top_n,
        combination,
        ..MetricsRules::DEFAULT_RULES
    })
}

fn read_js_int(x: &Option<JSValue>) -> MdiResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) => s
            .trim()
            .parse::<usize>()
            .ok()
            .context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules(js: JSValue) -> MdiResult<MetricsRules> {
        let r: RulesConfig = serde_json::from_value(js).unwrap();
        validate_rules(&Some(r))
    }

    #[test]
    fn defaults() {
        assert_eq!(validate_rules(&None).unwrap(), MetricsRules::DEFAULT_RULES);
        assert_eq!(rules(json!({})).unwrap(), MetricsRules::DEFAULT_RULES);
        assert_eq!(rules(json!({"topN": "3"})).unwrap().top_n, 3);
        assert_eq!(rules(json!({"topN": 7})).unwrap().top_n, 7);
    }

    #[test]
    fn weighted() {
        let r = rules(json!({"combination": "weighted", "weights": {"total": 2, "perCapita": 1}}))
            .unwrap();
        assert_eq!(
            r.combination,
            ZScoreCombination::Weighted {
                total: 2.0,
                per_capita: 1.0
            }
        );
    }

    #[test]
    fn invalid_rules() {
        assert!(rules(json!({"topN": 0})).is_err());
        assert!(matches!(
            rules(json!({"topN": "five"})),
            Err(MdiError::ParsingJsonNumber {})
        ));
        assert!(rules(json!({"combination": "product"})).is_err());
        assert!(rules(json!({"combination": "weighted"})).is_err());
        assert!(rules(json!({"combination": "weighted", "weights": {"total": 0, "perCapita": 0}})).is_err());
        assert!(rules(json!({"combination": "weighted", "weights": {"total": -1, "perCapita": 2}})).is_err());
    }
}
