use house_hunter::ingest::csv::{read_listings, read_rental_comps};
use house_hunter::ingest::realtor::{extract_results, listing_from_value, rental_comp_from_value};
use house_hunter::underwriting::{
    CompIndex, CompSources, EstimateSource, FinancingAssumptions, FinancingTerms,
    HeuristicRentModel, ListingFilter, LocationFilter, PipelineOptions, RentSource,
    RentEstimatorConfig, UnderwritingPipeline,
};
use serde_json::json;

const LISTINGS: &str = "\
listing_id,address,city,state,zip_code,price,sqft,bedrooms,bathrooms,year_built,lot_size_sqft,hoa_monthly,property_type
T-1,1208 Monroe St,Toledo,OH,43604,119000,1400,3,1.5,1955,4800,,single_family
T-2,1208 Monroe Street,Toledo,OH,43604,121500,1400,3,1.5,1955,4800,,single_family
T-3,55 Summit Ave,Toledo,OH,43604,149000,1650,3,2,1978,5200,35,townhouse
T-4,9 Front St,Erie,PA,16501,99000,1100,2,1,1940,3000,,single_family
T-5,300 Bluff Rd,Toledo,OH,43604,480000,3200,5,4,2015,12000,,single_family
";

const COMPS: &str = "\
comp_id,address,city,state,zip_code,monthly_rent,sqft,bedrooms,bathrooms,year_built
R-1,14 Erie St,Toledo,OH,43604,1475,1350,3,1,1950
R-2,77 Adams St,Toledo,OH,43604,1525,1450,3,2,1962
R-3,301 Huron St,Toledo,OH,43604,1600,1500,3,1.5,1971
R-4,18 Ottawa St,Toledo,OH,4360,1500,1400,3,1,1960
R-5,22 Jackson St,Toledo,OH,43604,,1400,3,1,1960
";

fn pipeline(options: PipelineOptions) -> UnderwritingPipeline {
    let assumptions = FinancingAssumptions::new(FinancingTerms {
        max_price: 200_000.0,
        max_down_payment: 40_000.0,
        ..FinancingTerms::default()
    })
    .expect("valid assumptions");
    UnderwritingPipeline::new(
        RentEstimatorConfig::new(HeuristicRentModel::standard(2026)),
        assumptions,
        options,
    )
}

#[test]
fn csv_inputs_flow_through_the_pipeline() {
    let listings = read_listings(LISTINGS.as_bytes()).expect("listings parse");
    let comps = read_rental_comps(COMPS.as_bytes()).expect("comps parse");
    assert_eq!(listings.len(), 5);
    assert_eq!(comps.len(), 5);

    let index = CompIndex::new(comps);
    assert_eq!(index.len(), 3);
    assert_eq!(index.excluded(), 2);

    let results = pipeline(PipelineOptions {
        rent_source: RentSource::Csv,
        filter: ListingFilter {
            location: Some(LocationFilter::parse("Toledo, OH")),
            ..ListingFilter::default()
        },
        ..PipelineOptions::default()
    })
    .run(&listings, &CompSources::csv(&index));

    assert!(!results.is_empty());
    assert!(results
        .iter()
        .all(|result| result.listing.city == "Toledo" && result.listing.price <= 200_000.0));
    assert!(results.iter().all(|result| {
        result.rent.source_used == EstimateSource::Csv && result.rent.comp_count == 3
    }));
    assert!(results
        .windows(2)
        .all(|pair| pair[0].cashflow.net_cashflow >= pair[1].cashflow.net_cashflow));

    let monroe: Vec<_> = results
        .iter()
        .filter(|result| result.listing.address.starts_with("1208 Monroe"))
        .collect();
    assert!(monroe.len() <= 1, "duplicate address survived de-duplication");
}

#[test]
fn realtor_payload_flows_into_listings_and_comps() {
    let sale = json!({
        "data": {"home_search": {"results": [
            {
                "property_id": "P-1",
                "list_price": 158000,
                "location": {"address": {"line": "12 Orchard Ln", "city": "Toledo", "state_code": "OH", "postal_code": "43604"}},
                "description": {"sqft": 1500, "beds": 3, "baths": 2, "year_built": 1992, "type": "single_family"},
                "hoa": {"monthly_fee": 40}
            },
            {
                "property_id": "P-2",
                "list_price": null,
                "location": {"address": {"line": "14 Orchard Ln", "postal_code": "43604"}}
            }
        ]}}
    });
    let listings: Vec<_> = extract_results(&sale)
        .into_iter()
        .filter_map(listing_from_value)
        .collect();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].hoa_monthly, 40.0);

    let rent = json!({"properties": [
        {"property_id": "R-1", "list_price": 1550, "location": {"address": {"postal_code": "43604"}}},
        {"property_id": "R-2", "list_price": "1,495", "location": {"address": {"postal_code": "43604"}}},
        {"property_id": "R-3", "list_price": 1610, "location": {"address": {"postal_code": "43604"}}}
    ]});
    let comps: Vec<_> = extract_results(&rent)
        .into_iter()
        .filter_map(rental_comp_from_value)
        .collect();
    assert_eq!(comps.len(), 3);
    assert_eq!(comps[1].monthly_rent, Some(1495.0));

    let index = CompIndex::new(comps);
    let result = pipeline(PipelineOptions {
        rent_source: RentSource::Csv,
        ..PipelineOptions::default()
    })
    .underwrite(&listings[0], &CompSources::csv(&index))
    .expect("within budget");
    assert_eq!(result.rent.source_used, EstimateSource::Csv);
    assert_eq!(result.rent.comp_count, 3);
    assert_eq!(result.cashflow.hoa, 40.0);
}
