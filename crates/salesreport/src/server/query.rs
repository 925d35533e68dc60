//! Render requests as query strings: repeated `year`, repeated `region`, optional `drill`.

use salesreport_core::RenderRequest;
use url::form_urlencoded;

/// Reads a render request from decoded query pairs. Unknown keys and unparseable years
/// are ignored.
pub fn parse_request(params: &[(String, String)]) -> RenderRequest {
    let mut request = RenderRequest::default();
    for (key, value) in params {
        let value = value.trim();
        match key.as_str() {
            "year" => {
                if let Ok(year) = value.parse::<i64>() {
                    request.filters.years.insert(year);
                }
            }
            "region" if !value.is_empty() => {
                request.filters.regions.insert(value.to_string());
            }
            "drill" if !value.is_empty() => {
                request.drilldown_region = Some(value.to_string());
            }
            _ => {}
        }
    }
    request
}

pub fn query_string(request: &RenderRequest) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for year in &request.filters.years {
        serializer.append_pair("year", &year.to_string());
    }
    for region in &request.filters.regions {
        serializer.append_pair("region", region);
    }
    if let Some(drill) = &request.drilldown_region {
        serializer.append_pair("drill", drill);
    }
    serializer.finish()
}
