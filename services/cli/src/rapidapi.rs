use clap::ValueEnum;
use house_hunter::ingest::realtor::{extract_results, listing_from_value, rental_comp_from_value};
use house_hunter::underwriting::{
    FetchError, Listing, LocationFilter, RentalComp, RentalCompFetcher,
};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub(crate) enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub(crate) struct EndpointSettings {
    pub(crate) path: String,
    pub(crate) limit: u32,
    pub(crate) method: HttpMethod,
    pub(crate) location_param: String,
}

#[derive(Debug, Clone)]
pub(crate) struct RapidApiSettings {
    pub(crate) host: String,
    pub(crate) sale: EndpointSettings,
    pub(crate) rent: EndpointSettings,
}

/// Buyer constraints forwarded to the for-sale search so the API returns fewer misses.
#[derive(Debug, Clone)]
pub(crate) struct SaleQuery {
    pub(crate) location: LocationFilter,
    pub(crate) max_price: f64,
    pub(crate) min_bedrooms: f64,
    pub(crate) min_bathrooms: f64,
    pub(crate) min_sqft: f64,
    pub(crate) property_types: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum RapidApiError {
    #[error("unable to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("unreadable payload from {url}: {source}")]
    Payload {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl From<RapidApiError> for FetchError {
    fn from(err: RapidApiError) -> Self {
        match err {
            RapidApiError::Payload { .. } => FetchError::InvalidResponse(err.to_string()),
            other => FetchError::Unavailable(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Purpose {
    Sale,
    Rent,
}

/// Transport-independent view of one API call.
#[derive(Debug, Clone, PartialEq)]
struct PreparedRequest {
    method: HttpMethod,
    url: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

/// Blocking client for the realtor search endpoints on RapidAPI.
pub(crate) struct RapidApiClient {
    http: Client,
    api_key: String,
    settings: RapidApiSettings,
    rent_cache: Mutex<HashMap<String, Vec<RentalComp>>>,
}

impl RapidApiClient {
    pub(crate) fn new(settings: RapidApiSettings, api_key: String) -> Result<Self, RapidApiError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(RapidApiError::Client)?;

        Ok(Self {
            http,
            api_key,
            settings,
            rent_cache: Mutex::new(HashMap::new()),
        })
    }

    pub(crate) fn search_listings(&self, query: &SaleQuery) -> Result<Vec<Listing>, RapidApiError> {
        let request = sale_request(&self.settings, query);
        let payload = self.send(&request)?;

        let listings: Vec<Listing> = extract_results(&payload)
            .into_iter()
            .filter_map(listing_from_value)
            .collect();
        info!(count = listings.len(), "fetched for-sale listings");
        Ok(listings)
    }

    fn send(&self, request: &PreparedRequest) -> Result<Value, RapidApiError> {
        let host = self.settings.host.as_str();
        let builder = match (&request.method, &request.body) {
            (HttpMethod::Post, Some(body)) => self.http.post(&request.url).json(body),
            (HttpMethod::Post, None) => self.http.post(&request.url),
            (HttpMethod::Get, _) => self.http.get(&request.url).query(&request.query),
        };

        debug!(url = %request.url, method = ?request.method, "calling rapidapi");
        let response = builder
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", host)
            .header("X-API-Host", host)
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|source| RapidApiError::Transport {
                url: request.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RapidApiError::Status {
                url: request.url.clone(),
                status,
            });
        }

        response.json::<Value>().map_err(|source| RapidApiError::Payload {
            url: request.url.clone(),
            source,
        })
    }
}

impl RentalCompFetcher for RapidApiClient {
    fn fetch_rental_comps(&self, zip_code: &str) -> Result<Vec<RentalComp>, FetchError> {
        if let Some(cached) = self
            .rent_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(zip_code)
        {
            return Ok(cached.clone());
        }

        let endpoint = &self.settings.rent;
        let request = prepare(
            &self.settings.host,
            endpoint,
            Purpose::Rent,
            &endpoint.location_param,
            zip_code,
            Map::new(),
        );
        let payload = self.send(&request)?;
        let comps: Vec<RentalComp> = extract_results(&payload)
            .into_iter()
            .filter_map(rental_comp_from_value)
            .collect();
        debug!(zip_code, count = comps.len(), "fetched rental comps");

        self.rent_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(zip_code.to_string(), comps.clone());
        Ok(comps)
    }
}

fn sale_request(settings: &RapidApiSettings, query: &SaleQuery) -> PreparedRequest {
    let mut filters = Map::new();
    filters.insert("list_price".to_string(), json!({ "max": query.max_price }));
    filters.insert(
        "beds".to_string(),
        json!({ "min": query.min_bedrooms.max(0.0).floor() as i64 }),
    );
    filters.insert(
        "baths".to_string(),
        json!({ "min": query.min_bathrooms.max(0.0).floor() as i64 }),
    );
    filters.insert(
        "sqft".to_string(),
        json!({ "min": query.min_sqft.max(0.0).floor() as i64 }),
    );
    if !query.property_types.is_empty() {
        filters.insert("prop_type".to_string(), json!(query.property_types));
    }

    let endpoint = &settings.sale;
    let (param, value) = match &query.location {
        LocationFilter::Zip(zip) => (endpoint.location_param.clone(), zip.clone()),
        LocationFilter::State(state) => ("state_code".to_string(), state.clone()),
        LocationFilter::City { city, state } => {
            if let Some(state) = state {
                filters.insert("state_code".to_string(), json!(state));
            }
            ("city".to_string(), title_case(city))
        }
    };

    prepare(&settings.host, endpoint, Purpose::Sale, &param, &value, filters)
}

fn prepare(
    host: &str,
    endpoint: &EndpointSettings,
    purpose: Purpose,
    location_param: &str,
    location_value: &str,
    filters: Map<String, Value>,
) -> PreparedRequest {
    let path = endpoint.path.trim();
    let url = if path.starts_with('/') {
        format!("https://{host}{path}")
    } else {
        format!("https://{host}/{path}")
    };

    match endpoint.method {
        HttpMethod::Post => {
            let status = match purpose {
                Purpose::Rent => json!(["for_rent"]),
                Purpose::Sale => json!(["for_sale", "ready_to_build"]),
            };
            let mut body = Map::new();
            body.insert("limit".to_string(), json!(endpoint.limit));
            body.insert("offset".to_string(), json!(0));
            body.insert(location_param.to_string(), json!(location_value));
            body.insert("status".to_string(), status);
            body.insert(
                "sort".to_string(),
                json!({ "direction": "desc", "field": "list_date" }),
            );
            body.extend(filters);

            PreparedRequest {
                method: HttpMethod::Post,
                url,
                query: Vec::new(),
                body: Some(Value::Object(body)),
            }
        }
        HttpMethod::Get => {
            let mut query = vec![
                (location_param.to_string(), location_value.to_string()),
                ("offset".to_string(), "0".to_string()),
                ("limit".to_string(), endpoint.limit.to_string()),
                ("sort".to_string(), "relevance".to_string()),
            ];
            // structured filters travel as compact JSON in the query string
            query.extend(filters.into_iter().map(|(key, value)| {
                let encoded = match value {
                    Value::String(raw) => raw,
                    other => other.to_string(),
                };
                (key, encoded)
            }));

            PreparedRequest {
                method: HttpMethod::Get,
                url,
                query,
                body: None,
            }
        }
    }
}

fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
