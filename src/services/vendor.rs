// src/services/vendor.rs

//! Vendor API adapter.
//!
//! Knows the endpoints of both API generations and turns their responses
//! into [`OutletRef`]s and [`RawDetail`]s. Field-level quirks stay here so the
//! normalizer only sees one shape.

use std::sync::Arc;

use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{
    ApiGeneration, CurrentDetail, LegacyDetail, OutletRef, RawDetail, Station, StatusHint,
    VendorConfig,
};
use crate::utils::http::{PayloadFormat, Transport};

/// Client for one vendor API generation over a [`Transport`].
#[derive(Clone)]
pub struct VendorApi {
    transport: Arc<dyn Transport>,
    generation: ApiGeneration,
    base_url: String,
}

impl VendorApi {
    pub fn new(transport: Arc<dyn Transport>, config: &VendorConfig) -> Self {
        Self {
            transport,
            generation: config.generation,
            base_url: config.base_url().to_string(),
        }
    }

    pub fn liveness_url(&self) -> String {
        match self.generation {
            ApiGeneration::Current => {
                format!("{}/recharge/v1/registerCard/checkSign", self.base_url)
            }
            ApiGeneration::Legacy => format!("{}/issksapi/V2/ec/stationList/json.shtml", self.base_url),
        }
    }

    pub fn outlet_list_url(&self, station: &Station) -> String {
        match self.generation {
            ApiGeneration::Current => format!(
                "{}/charge/v1/outlet/station/outlets/{}",
                self.base_url, station.id
            ),
            ApiGeneration::Legacy => format!(
                "{}/issksapi/V2/ec/chargingList.shtml?stationId={}",
                self.base_url, station.id
            ),
        }
    }

    pub fn outlet_detail_url(&self, outlet_no: &str) -> String {
        match self.generation {
            ApiGeneration::Current => {
                format!("{}/charge/v1/charging/outlet/{}", self.base_url, outlet_no)
            }
            ApiGeneration::Legacy => format!(
                "{}/issksapi/V2/ec/charging/{}.shtml",
                self.base_url, outlet_no
            ),
        }
    }

    /// Probe whether the configured credential is still accepted.
    pub async fn check_alive(&self) -> Result<bool> {
        let url = self.liveness_url();
        let json = self
            .transport
            .fetch(&url, PayloadFormat::Json)
            .await?
            .into_json(&url)?;

        Ok(match self.generation {
            ApiGeneration::Current => json.get("success").and_then(Value::as_bool).unwrap_or(false),
            ApiGeneration::Legacy => json.get("list").is_some_and(Value::is_array),
        })
    }

    /// Fetch the outlets of one station.
    pub async fn fetch_outlet_list(&self, station: &Station) -> Result<Vec<OutletRef>> {
        let url = self.outlet_list_url(station);
        let json = self
            .transport
            .fetch(&url, PayloadFormat::Json)
            .await?
            .into_json(&url)?;

        match self.generation {
            ApiGeneration::Current => parse_current_outlets(&json, station, &url),
            ApiGeneration::Legacy => parse_legacy_outlets(&json, station, &url),
        }
    }

    /// Fetch the raw detail of one outlet.
    pub async fn fetch_outlet_detail(&self, outlet: &OutletRef) -> Result<RawDetail> {
        let url = self.outlet_detail_url(&outlet.outlet_no);
        match self.generation {
            ApiGeneration::Current => {
                let json = self
                    .transport
                    .fetch(&url, PayloadFormat::Json)
                    .await?
                    .into_json(&url)?;
                parse_current_detail(&json, &url).map(RawDetail::Current)
            }
            ApiGeneration::Legacy => {
                let html = self
                    .transport
                    .fetch(&url, PayloadFormat::Html)
                    .await?
                    .into_html(&url)?;
                parse_legacy_detail(&html).map(RawDetail::Legacy)
            }
        }
    }
}

/// Parse `{"data": [{"outletNo", "outletSerialNo", "currentChargingRecordId"}]}`.
pub fn parse_current_outlets(json: &Value, station: &Station, url: &str) -> Result<Vec<OutletRef>> {
    let items = json
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::parse(url, "missing `data` array"))?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let Some(outlet_no) = text_field(item, "/outletNo") else {
                log::debug!("Skipping outlet without number at station {}", station.id);
                return None;
            };
            let serial = text_field(item, "/outletSerialNo").unwrap_or_default();
            let record_id = int_field(item, "/currentChargingRecordId").unwrap_or(0);
            Some(OutletRef {
                outlet_no,
                name: format!("插座{serial}"),
                station: station.clone(),
                hint: Some(StatusHint::from_record_id(record_id)),
            })
        })
        .collect())
}

/// Parse `{"list": [{"vOutletNo", "vOutletName"}]}`.
///
/// The legacy list carries no status, so the hint is left empty and the
/// detail page decides.
pub fn parse_legacy_outlets(json: &Value, station: &Station, url: &str) -> Result<Vec<OutletRef>> {
    let items = json
        .get("list")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::parse(url, "missing `list` array"))?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let outlet_no = text_field(item, "/vOutletNo")?;
            let name = text_field(item, "/vOutletName").unwrap_or_else(|| outlet_no.clone());
            Some(OutletRef {
                outlet_no,
                name,
                station: station.clone(),
                hint: None,
            })
        })
        .collect())
}

/// Parse the current-generation detail JSON.
///
/// `data` and the device state are required; timing, power and the error
/// counter default to zero/absent.
pub fn parse_current_detail(json: &Value, url: &str) -> Result<CurrentDetail> {
    let data = json
        .get("data")
        .filter(|d| d.is_object())
        .ok_or_else(|| AppError::parse(url, "missing `data` object"))?;

    let hardware_state = int_field(data, "/station/hardWareState")
        .ok_or_else(|| AppError::parse(url, "missing `data.station.hardWareState`"))?;

    let billing_power = text_field(json, "/powerFee/billingPower")
        .or_else(|| text_field(data, "/powerFee/billingPower"));

    Ok(CurrentDetail {
        hardware_state,
        used_minutes: int_field(data, "/usedmin").unwrap_or(0),
        rest_minutes: int_field(data, "/restmin").unwrap_or(0),
        error_count: int_field(data, "/errorCount").unwrap_or(0),
        billing_power,
    })
}

/// Scrape the legacy detail page.
///
/// A charging outlet shows `.state_item` blocks: the first holds the power,
/// the second the elapsed minutes and, in its third `span`, the number of
/// booked half-hour slots.
pub fn parse_legacy_detail(html: &str) -> Result<LegacyDetail> {
    let document = Html::parse_document(html);

    let item_sel = parse_selector(".state_item")?;
    if document.select(&item_sel).next().is_none() {
        return Ok(LegacyDetail::default());
    }

    let power_sel = parse_selector(".state_item:nth-child(1) p")?;
    let used_sel = parse_selector(".state_item:nth-child(2) p")?;
    let slots_sel = parse_selector(".state_item:nth-child(2) span")?;

    let text_of = |el: scraper::ElementRef| el.text().collect::<String>().trim().to_string();

    Ok(LegacyDetail {
        charging: true,
        power_text: document.select(&power_sel).next().map(text_of),
        used_text: document.select(&used_sel).next().map(text_of),
        booked_slots_text: document.select(&slots_sel).nth(2).map(text_of),
    })
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::parse(format!("selector '{s}'"), format!("{e:?}")))
}

/// Integer at a JSON pointer, accepting numbers and numeric strings.
fn int_field(value: &Value, pointer: &str) -> Option<i64> {
    let field = value.pointer(pointer)?;
    field
        .as_i64()
        .or_else(|| field.as_f64().map(|f| f as i64))
        .or_else(|| field.as_str()?.trim().parse().ok())
}

/// Text at a JSON pointer, accepting strings and numbers.
fn text_field(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::utils::http::Payload;

    fn station() -> Station {
        Station {
            id: 117379,
            name: "第十餐厅1号机".to_string(),
            area: "仙林".to_string(),
        }
    }

    struct Canned(Value);

    #[async_trait::async_trait]
    impl Transport for Canned {
        async fn fetch(&self, _url: &str, _format: PayloadFormat) -> Result<Payload> {
            Ok(Payload::Json(self.0.clone()))
        }
    }

    fn api(generation: ApiGeneration, body: Value) -> VendorApi {
        let config = VendorConfig {
            generation,
            base_url: Some("https://vendor.test/".to_string()),
            ..VendorConfig::default()
        };
        VendorApi::new(Arc::new(Canned(body)), &config)
    }

    #[test]
    fn test_urls_per_generation() {
        let current = api(ApiGeneration::Current, Value::Null);
        assert_eq!(
            current.outlet_list_url(&station()),
            "https://vendor.test/charge/v1/outlet/station/outlets/117379"
        );
        assert_eq!(
            current.outlet_detail_url("0101"),
            "https://vendor.test/charge/v1/charging/outlet/0101"
        );

        let legacy = api(ApiGeneration::Legacy, Value::Null);
        assert_eq!(
            legacy.outlet_list_url(&station()),
            "https://vendor.test/issksapi/V2/ec/chargingList.shtml?stationId=117379"
        );
        assert_eq!(
            legacy.outlet_detail_url("0101"),
            "https://vendor.test/issksapi/V2/ec/charging/0101.shtml"
        );
    }

    #[tokio::test]
    async fn test_check_alive() {
        assert!(api(ApiGeneration::Current, json!({"success": true})).check_alive().await.unwrap());
        assert!(!api(ApiGeneration::Current, json!({"success": false})).check_alive().await.unwrap());
        assert!(!api(ApiGeneration::Current, json!({})).check_alive().await.unwrap());
        assert!(api(ApiGeneration::Legacy, json!({"list": []})).check_alive().await.unwrap());
        assert!(!api(ApiGeneration::Legacy, json!({"msg": "login"})).check_alive().await.unwrap());
    }

    #[test]
    fn test_parse_current_outlets() {
        let json = json!({"data": [
            {"outletNo": "0101", "outletSerialNo": 1, "currentChargingRecordId": 0},
            {"outletNo": 102, "outletSerialNo": "2", "currentChargingRecordId": 5521},
            {"outletSerialNo": "3"}
        ]});
        let outlets = parse_current_outlets(&json, &station(), "u").unwrap();
        assert_eq!(outlets.len(), 2);
        assert_eq!(outlets[0].outlet_no, "0101");
        assert_eq!(outlets[0].name, "插座1");
        assert_eq!(outlets[0].hint, Some(StatusHint::Idle));
        assert_eq!(outlets[1].outlet_no, "102");
        assert_eq!(outlets[1].hint, Some(StatusHint::Charging));
        assert_eq!(outlets[1].station, station());
    }

    #[test]
    fn test_parse_current_outlets_requires_data() {
        let err = parse_current_outlets(&json!({"data": null}), &station(), "u").unwrap_err();
        assert!(matches!(err, AppError::Parse { .. }));
    }

    #[test]
    fn test_parse_legacy_outlets() {
        let json = json!({"list": [
            {"vOutletNo": "A01", "vOutletName": "1号插座"},
            {"vOutletNo": "A02"}
        ]});
        let outlets = parse_legacy_outlets(&json, &station(), "u").unwrap();
        assert_eq!(outlets.len(), 2);
        assert_eq!(outlets[0].name, "1号插座");
        assert_eq!(outlets[1].name, "A02");
        assert!(outlets.iter().all(|o| o.hint.is_none()));
    }

    #[test]
    fn test_parse_current_detail() {
        let json = json!({
            "data": {"usedmin": 30, "restmin": "45", "station": {"hardWareState": 1}},
            "powerFee": {"billingPower": "1000W"}
        });
        let detail = parse_current_detail(&json, "u").unwrap();
        assert_eq!(
            detail,
            CurrentDetail {
                hardware_state: 1,
                used_minutes: 30,
                rest_minutes: 45,
                error_count: 0,
                billing_power: Some("1000W".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_current_detail_missing_fields() {
        let json = json!({"data": {"station": {"hardWareState": 0}, "errorCount": 2}});
        let detail = parse_current_detail(&json, "u").unwrap();
        assert_eq!(detail.used_minutes, 0);
        assert_eq!(detail.error_count, 2);
        assert_eq!(detail.billing_power, None);

        assert!(parse_current_detail(&json!({"data": {}}), "u").is_err());
        assert!(parse_current_detail(&json!({"success": false}), "u").is_err());
    }

    #[test]
    fn test_parse_legacy_detail_charging() {
        let html = r#"
            <html><body><div class="state">
              <div class="state_item"><p>245瓦</p><span>功率</span></div>
              <div class="state_item"><p>50分钟</p><span>已充</span><span>/</span><span>4</span></div>
            </div></body></html>"#;
        let detail = parse_legacy_detail(html).unwrap();
        assert!(detail.charging);
        assert_eq!(detail.power_text.as_deref(), Some("245瓦"));
        assert_eq!(detail.used_text.as_deref(), Some("50分钟"));
        assert_eq!(detail.booked_slots_text.as_deref(), Some("4"));
    }

    #[test]
    fn test_parse_legacy_detail_idle() {
        let detail = parse_legacy_detail("<html><body><p>空闲</p></body></html>").unwrap();
        assert_eq!(detail, LegacyDetail::default());
    }
}
