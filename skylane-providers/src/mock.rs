use chrono::{Duration, NaiveDate};
use rand::Rng;

use skylane_core::iata::title_case;
use skylane_core::offer::{FlightOffer, OfferSource};

/// Fixed airline roster for synthetic offers.
const AIRLINES: &[(&str, &str)] = &[
    ("AA", "American Airlines"),
    ("DL", "Delta Air Lines"),
    ("UA", "United Airlines"),
    ("WN", "Southwest Airlines"),
    ("BA", "British Airways"),
    ("LH", "Lufthansa"),
    ("AF", "Air France"),
    ("KL", "KLM"),
    ("EK", "Emirates"),
    ("SQ", "Singapore Airlines"),
];

const DEPARTURE_MINUTES: [u32; 4] = [0, 15, 30, 45];

/// Generate 5-10 plausible offers for a route/date, sorted ascending by
/// price and tagged `source = mock`. This keeps the search endpoint
/// usable when no provider key is configured or the live provider is
/// unreachable; it never returns an empty list.
pub fn generate_offers(departure: &str, arrival: &str, date: NaiveDate) -> Vec<FlightOffer> {
    let mut rng = rand::thread_rng();
    let count = rng.gen_range(5..=10);
    let mut offers = Vec::with_capacity(count);

    for i in 0..count {
        let (airline_code, airline_name) = AIRLINES[rng.gen_range(0..AIRLINES.len())];
        let flight_number = format!("{airline_code}{}", rng.gen_range(100..=9999));

        let departure_hour = rng.gen_range(6..=22);
        let departure_minute = DEPARTURE_MINUTES[rng.gen_range(0..DEPARTURE_MINUTES.len())];
        let departure_time = date
            .and_hms_opt(departure_hour, departure_minute, 0)
            .expect("departure hour/minute are in range")
            .and_utc();

        let duration_hours = rng.gen_range(2..=12);
        let duration_minutes = rng.gen_range(0..60);
        let arrival_time = departure_time
            + Duration::hours(duration_hours)
            + Duration::minutes(duration_minutes);

        let price = (rng.gen_range(100.0..=1500.0_f64) * 100.0).round() / 100.0;

        offers.push(FlightOffer {
            id: format!("mock_{}", i + 1),
            flight_number,
            origin: title_case(departure),
            destination: title_case(arrival),
            departure_time: departure_time.to_rfc3339(),
            arrival_time: arrival_time.to_rfc3339(),
            duration: format!("PT{duration_hours}H{duration_minutes}M"),
            stops: rng.gen_range(0..=2),
            price,
            currency: "USD".to_string(),
            airline: airline_name.to_string(),
            status: "scheduled".to_string(),
            source: OfferSource::Mock,
        });
    }

    offers.sort_by(|a, b| a.price.partial_cmp(&b.price).expect("prices are finite"));
    offers
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn route_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 15).unwrap()
    }

    #[test]
    fn test_generates_between_five_and_ten_offers() {
        for _ in 0..20 {
            let offers = generate_offers("new york", "london", route_date());
            assert!((5..=10).contains(&offers.len()));
        }
    }

    #[test]
    fn test_offers_are_sorted_by_ascending_price() {
        let offers = generate_offers("jfk", "lhr", route_date());
        for pair in offers.windows(2) {
            assert!(pair[0].price <= pair[1].price);
        }
    }

    #[test]
    fn test_offers_are_plausible_and_tagged_as_mock() {
        let offers = generate_offers("paris", "tokyo", route_date());
        for offer in &offers {
            assert_eq!(offer.source, OfferSource::Mock);
            assert_eq!(offer.status, "scheduled");
            assert_eq!(offer.currency, "USD");
            assert!((100.0..=1500.0).contains(&offer.price));
            assert!(offer.stops <= 2);
            assert_eq!(offer.origin, "Paris");
            assert_eq!(offer.destination, "Tokyo");

            let departure =
                chrono::DateTime::parse_from_rfc3339(&offer.departure_time).expect("rfc3339");
            assert!((6..=22).contains(&departure.hour()));
            assert!(DEPARTURE_MINUTES.contains(&departure.minute()));
        }
    }
}
