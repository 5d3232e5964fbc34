use super::{parse_amount, parse_year, IngestError};
use crate::underwriting::domain::{Listing, RentalComp};
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;
use tracing::debug;

pub fn load_listings<P: AsRef<Path>>(path: P) -> Result<Vec<Listing>, IngestError> {
    let file = std::fs::File::open(path)?;
    read_listings(file)
}

pub fn read_listings<R: Read>(reader: R) -> Result<Vec<Listing>, IngestError> {
    let mut csv_reader = ::csv::ReaderBuilder::new()
        .trim(::csv::Trim::All)
        .from_reader(reader);
    let mut listings = Vec::new();

    for (index, record) in csv_reader.deserialize::<ListingRow>().enumerate() {
        listings.push(record?.into_listing(index));
    }

    debug!(count = listings.len(), "loaded listings from csv");
    Ok(listings)
}

pub fn load_rental_comps<P: AsRef<Path>>(path: P) -> Result<Vec<RentalComp>, IngestError> {
    let file = std::fs::File::open(path)?;
    read_rental_comps(file)
}

pub fn read_rental_comps<R: Read>(reader: R) -> Result<Vec<RentalComp>, IngestError> {
    let mut csv_reader = ::csv::ReaderBuilder::new()
        .trim(::csv::Trim::All)
        .from_reader(reader);
    let mut comps = Vec::new();

    for (index, record) in csv_reader.deserialize::<CompRow>().enumerate() {
        comps.push(record?.into_comp(index));
    }

    debug!(count = comps.len(), "loaded rental comps from csv");
    Ok(comps)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListingRow {
    #[serde(deserialize_with = "empty_string_as_none")]
    listing_id: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    address: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    city: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    state: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    zip_code: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    price: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    sqft: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    bedrooms: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    bathrooms: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    year_built: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    lot_size_sqft: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    hoa_monthly: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    property_type: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    prop_type: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    listing_url: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    url: Option<String>,
}

impl ListingRow {
    fn into_listing(self, index: usize) -> Listing {
        let zip_code = self.zip_code.unwrap_or_default();
        Listing {
            listing_id: self
                .listing_id
                .unwrap_or_else(|| format!("listing-{}", index + 1)),
            address: self.address.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            state: self.state.unwrap_or_default().to_ascii_uppercase(),
            zip_code,
            price: self.price.as_deref().and_then(parse_amount).unwrap_or(0.0),
            sqft: self.sqft.as_deref().and_then(parse_amount),
            bedrooms: self.bedrooms.as_deref().and_then(parse_amount),
            bathrooms: self.bathrooms.as_deref().and_then(parse_amount),
            year_built: self.year_built.as_deref().and_then(parse_year),
            lot_size_sqft: self.lot_size_sqft.as_deref().and_then(parse_amount),
            hoa_monthly: self
                .hoa_monthly
                .as_deref()
                .and_then(parse_amount)
                .filter(|hoa| *hoa > 0.0)
                .unwrap_or(0.0),
            property_type: self.property_type.or(self.prop_type),
            listing_url: self.listing_url.or(self.url),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CompRow {
    #[serde(deserialize_with = "empty_string_as_none")]
    comp_id: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    listing_id: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    address: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    city: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    state: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    zip_code: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    monthly_rent: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    rent: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    price: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    sqft: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    bedrooms: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    bathrooms: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    year_built: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    lot_size_sqft: Option<String>,
}

impl CompRow {
    fn into_comp(self, index: usize) -> RentalComp {
        let monthly_rent = [&self.monthly_rent, &self.rent, &self.price]
            .into_iter()
            .find_map(|value| value.as_deref().and_then(parse_amount));

        RentalComp {
            comp_id: self
                .comp_id
                .or(self.listing_id)
                .unwrap_or_else(|| format!("rent-comp-{}", index + 1)),
            address: self.address.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            state: self.state.unwrap_or_default().to_ascii_uppercase(),
            zip_code: self.zip_code.unwrap_or_default(),
            monthly_rent,
            sqft: self.sqft.as_deref().and_then(parse_amount),
            bedrooms: self.bedrooms.as_deref().and_then(parse_amount),
            bathrooms: self.bathrooms.as_deref().and_then(parse_amount),
            year_built: self.year_built.as_deref().and_then(parse_year),
            lot_size_sqft: self.lot_size_sqft.as_deref().and_then(parse_amount),
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}
