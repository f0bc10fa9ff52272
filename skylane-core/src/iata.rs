use std::collections::HashMap;
use std::sync::OnceLock;

/// City/alias to IATA code table. Declaration order matters: the reverse
/// index keeps the first alias declared for a code.
const CITY_TO_IATA: &[(&str, &str)] = &[
    // United States
    ("new york", "JFK"),
    ("nyc", "JFK"),
    ("ny", "JFK"),
    ("los angeles", "LAX"),
    ("la", "LAX"),
    ("chicago", "ORD"),
    ("chi", "ORD"),
    ("miami", "MIA"),
    ("san francisco", "SFO"),
    ("sf", "SFO"),
    ("dallas", "DFW"),
    ("atlanta", "ATL"),
    ("denver", "DEN"),
    ("seattle", "SEA"),
    ("boston", "BOS"),
    ("las vegas", "LAS"),
    ("phoenix", "PHX"),
    ("houston", "IAH"),
    ("washington", "DCA"),
    ("dc", "DCA"),
    ("orlando", "MCO"),
    ("charlotte", "CLT"),
    ("salt lake city", "SLC"),
    ("detroit", "DTW"),
    ("minneapolis", "MSP"),
    ("tampa", "TPA"),
    ("philadelphia", "PHL"),
    ("newark", "EWR"),
    ("portland", "PDX"),
    ("san diego", "SAN"),
    ("austin", "AUS"),
    ("nashville", "BNA"),
    ("baltimore", "BWI"),
    ("fort lauderdale", "FLL"),
    ("oakland", "OAK"),
    ("pittsburgh", "PIT"),
    ("raleigh", "RDU"),
    ("indianapolis", "IND"),
    ("cincinnati", "CVG"),
    ("columbus", "CMH"),
    ("cleveland", "CLE"),
    ("milwaukee", "MKE"),
    ("kansas city", "MCI"),
    ("omaha", "OMA"),
    ("wichita", "ICT"),
    ("tulsa", "TUL"),
    ("oklahoma city", "OKC"),
    ("albuquerque", "ABQ"),
    ("reno", "RNO"),
    ("boise", "BOI"),
    ("spokane", "GEG"),
    ("anchorage", "ANC"),
    ("honolulu", "HNL"),
    ("kailua", "HNL"),
    ("lihue", "LIH"),
    ("kahului", "OGG"),
    ("kona", "KOA"),
    // United Kingdom
    ("london", "LHR"),
    ("london heathrow", "LHR"),
    ("london gatwick", "LGW"),
    ("london stansted", "STN"),
    ("stansted", "STN"),
    ("london luton", "LTN"),
    ("luton", "LTN"),
    ("london city", "LCY"),
    ("manchester", "MAN"),
    ("birmingham", "BHX"),
    ("edinburgh", "EDI"),
    ("glasgow", "GLA"),
    ("liverpool", "LPL"),
    ("bristol", "BRS"),
    ("newcastle", "NCL"),
    ("belfast", "BFS"),
    // France
    ("paris", "CDG"),
    ("paris charles de gaulle", "CDG"),
    ("paris orly", "ORY"),
    ("nice", "NCE"),
    ("lyon", "LYS"),
    ("marseille", "MRS"),
    ("toulouse", "TLS"),
    ("bordeaux", "BDX"),
    // Germany
    ("berlin", "BER"),
    ("frankfurt", "FRA"),
    ("munich", "MUC"),
    ("hamburg", "HAM"),
    ("dusseldorf", "DUS"),
    ("cologne", "CGN"),
    ("stuttgart", "STR"),
    // Italy
    ("rome", "FCO"),
    ("rome fiumicino", "FCO"),
    ("milan", "MXP"),
    ("milan malpensa", "MXP"),
    ("milan linate", "LIN"),
    ("venice", "VCE"),
    ("naples", "NAP"),
    ("florence", "FLR"),
    ("bologna", "BLQ"),
    ("palermo", "PMO"),
    // Spain & Portugal
    ("madrid", "MAD"),
    ("barcelona", "BCN"),
    ("valencia", "VLC"),
    ("seville", "SVQ"),
    ("malaga", "AGP"),
    ("bilbao", "BIO"),
    ("palma de mallorca", "PMI"),
    ("lisbon", "LIS"),
    ("porto", "OPO"),
    // Benelux & Switzerland & Austria
    ("amsterdam", "AMS"),
    ("rotterdam", "RTM"),
    ("brussels", "BRU"),
    ("zurich", "ZRH"),
    ("geneva", "GVA"),
    ("basel", "BSL"),
    ("vienna", "VIE"),
    ("salzburg", "SZG"),
    // Scandinavia
    ("copenhagen", "CPH"),
    ("stockholm", "ARN"),
    ("oslo", "OSL"),
    ("helsinki", "HEL"),
    ("bergen", "BGO"),
    ("gothenburg", "GOT"),
    // Eastern Europe & Turkey & Greece
    ("warsaw", "WAW"),
    ("krakow", "KRK"),
    ("gdansk", "GDN"),
    ("wroclaw", "WRO"),
    ("prague", "PRG"),
    ("budapest", "BUD"),
    ("bucharest", "OTP"),
    ("sofia", "SOF"),
    ("athens", "ATH"),
    ("santorini", "JTR"),
    ("mykonos", "JMK"),
    ("heraklion", "HER"),
    ("istanbul", "IST"),
    ("istanbul airport", "IST"),
    ("antalya", "AYT"),
    ("izmir", "ADB"),
    ("moscow", "SVO"),
    ("moscow sheremetyevo", "SVO"),
    ("moscow domodedovo", "DME"),
    ("saint petersburg", "LED"),
    ("kiev", "KBP"),
    // Ireland
    ("dublin", "DUB"),
    ("cork", "ORK"),
    // Asia - Japan
    ("tokyo", "NRT"),
    ("tokyo narita", "NRT"),
    ("tokyo haneda", "HND"),
    ("yokohama", "HND"),
    ("osaka", "KIX"),
    ("kyoto", "KIX"),
    ("nagoya", "NGO"),
    ("sapporo", "CTS"),
    ("fukuoka", "FUK"),
    ("kobe", "UKB"),
    ("okinawa", "OKA"),
    // Asia - China
    ("beijing", "PEK"),
    ("beijing capital", "PEK"),
    ("shanghai", "PVG"),
    ("shanghai pudong", "PVG"),
    ("shanghai hongqiao", "SHA"),
    ("hong kong", "HKG"),
    ("guangzhou", "CAN"),
    ("shenzhen", "SZX"),
    ("chengdu", "CTU"),
    ("xian", "XIY"),
    // Asia - Southeast Asia
    ("singapore", "SIN"),
    ("bangkok", "BKK"),
    ("bangkok suvarnabhumi", "BKK"),
    ("phuket", "HKT"),
    ("kuala lumpur", "KUL"),
    ("jakarta", "CGK"),
    ("bali", "DPS"),
    ("denpasar", "DPS"),
    ("manila", "MNL"),
    ("ho chi minh city", "SGN"),
    ("saigon", "SGN"),
    ("hanoi", "HAN"),
    ("phnom penh", "PNH"),
    ("yangon", "RGN"),
    // Asia - South Korea & Taiwan
    ("seoul", "ICN"),
    ("seoul incheon", "ICN"),
    ("busan", "PUS"),
    ("taipei", "TPE"),
    ("taichung", "RMQ"),
    ("kaohsiung", "KHH"),
    // Asia - India & Middle East
    ("delhi", "DEL"),
    ("mumbai", "BOM"),
    ("bangalore", "BLR"),
    ("chennai", "MAA"),
    ("kolkata", "CCU"),
    ("hyderabad", "HYD"),
    ("dubai", "DXB"),
    ("abu dhabi", "AUH"),
    ("doha", "DOH"),
    ("kuwait", "KWI"),
    ("riyadh", "RUH"),
    ("jeddah", "JED"),
    ("muscat", "MCT"),
    ("bahrain", "BAH"),
    // Africa
    ("cairo", "CAI"),
    ("johannesburg", "JNB"),
    ("cape town", "CPT"),
    ("durban", "DUR"),
    ("lagos", "LOS"),
    ("nairobi", "NBO"),
    ("addis ababa", "ADD"),
    ("casablanca", "CMN"),
    ("marrakech", "RAK"),
    ("tunis", "TUN"),
    ("algiers", "ALG"),
    // Australia & New Zealand
    ("sydney", "SYD"),
    ("melbourne", "MEL"),
    ("brisbane", "BNE"),
    ("perth", "PER"),
    ("adelaide", "ADL"),
    ("gold coast", "OOL"),
    ("auckland", "AKL"),
    ("wellington", "WLG"),
    ("christchurch", "CHC"),
    ("queenstown", "ZQN"),
    // Canada
    ("toronto", "YYZ"),
    ("toronto pearson", "YYZ"),
    ("montreal", "YUL"),
    ("vancouver", "YVR"),
    ("calgary", "YYC"),
    ("edmonton", "YEG"),
    ("ottawa", "YOW"),
    ("winnipeg", "YWG"),
    ("quebec city", "YQB"),
    ("halifax", "YHZ"),
    ("victoria", "YYJ"),
    // Mexico, Central & South America
    ("mexico city", "MEX"),
    ("cancun", "CUN"),
    ("guadalajara", "GDL"),
    ("puerto vallarta", "PVR"),
    ("los cabos", "SJD"),
    ("monterrey", "MTY"),
    ("panama city", "PTY"),
    ("san jose", "SJO"),
    ("guatemala city", "GUA"),
    ("rio de janeiro", "GIG"),
    ("sao paulo", "GRU"),
    ("buenos aires", "EZE"),
    ("lima", "LIM"),
    ("santiago", "SCL"),
    ("bogota", "BOG"),
    ("medellin", "MDE"),
    ("cartagena", "CTG"),
    ("quito", "UIO"),
    ("caracas", "CCS"),
    ("montevideo", "MVD"),
    ("asuncion", "ASU"),
    ("la paz", "LPB"),
];

fn forward_index() -> &'static HashMap<&'static str, &'static str> {
    static INDEX: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    INDEX.get_or_init(|| CITY_TO_IATA.iter().copied().collect())
}

fn reverse_index() -> &'static HashMap<&'static str, &'static str> {
    static INDEX: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut map = HashMap::new();
        // First alias declared for a code wins.
        for (alias, code) in CITY_TO_IATA {
            map.entry(*code).or_insert(*alias);
        }
        map
    })
}

/// Resolve a free-text city/airport name to an IATA code.
///
/// A 3-letter alphabetic input is assumed to already be a code and is
/// returned upper-cased without validation. Otherwise the alias table is
/// consulted, once verbatim and once with any `" international"` suffix
/// removed. No fuzzy matching: unresolvable input returns `None`.
pub fn resolve(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(trimmed.to_ascii_uppercase());
    }

    let lower = trimmed.to_lowercase();
    if let Some(code) = forward_index().get(lower.as_str()) {
        return Some((*code).to_string());
    }
    if lower.contains("international") {
        let stripped = lower.replace(" international", "");
        if let Some(code) = forward_index().get(stripped.trim()) {
            return Some((*code).to_string());
        }
    }
    None
}

/// Reverse lookup: IATA code to a display city name (first-declared alias).
pub fn city_from_iata(code: &str) -> Option<String> {
    let normalized = code.trim().to_ascii_uppercase();
    reverse_index()
        .get(normalized.as_str())
        .map(|alias| title_case(alias))
}

/// Whether the input has the shape of an IATA code (3 ASCII letters).
pub fn is_valid_iata(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic())
}

/// Upper-case the first letter of each whitespace-separated word.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_known_aliases() {
        assert_eq!(resolve("new york").as_deref(), Some("JFK"));
        assert_eq!(resolve("NYC").as_deref(), Some("JFK"));
        assert_eq!(resolve("  London ").as_deref(), Some("LHR"));
        assert_eq!(resolve("tokyo").as_deref(), Some("NRT"));
    }

    #[test]
    fn test_three_letter_input_is_identity() {
        assert_eq!(resolve("jfk").as_deref(), Some("JFK"));
        assert_eq!(resolve("LHR").as_deref(), Some("LHR"));
        // Not validated against a registry: any 3 letters pass through.
        assert_eq!(resolve("zzz").as_deref(), Some("ZZZ"));
    }

    #[test]
    fn test_international_suffix_is_stripped() {
        assert_eq!(resolve("miami international").as_deref(), Some("MIA"));
        assert_eq!(resolve("Cairo International").as_deref(), Some("CAI"));
    }

    #[test]
    fn test_unknown_city_is_not_found() {
        assert_eq!(resolve("gotham"), None);
        assert_eq!(resolve(""), None);
        assert_eq!(resolve("   "), None);
    }

    #[test]
    fn test_reverse_lookup_uses_first_declared_alias() {
        // "new york" is declared before "nyc" and "ny".
        assert_eq!(city_from_iata("JFK").as_deref(), Some("New York"));
        // "london" is declared before "london heathrow".
        assert_eq!(city_from_iata("lhr").as_deref(), Some("London"));
        assert_eq!(city_from_iata("XXX"), None);
    }

    #[test]
    fn test_is_valid_iata() {
        assert!(is_valid_iata("JFK"));
        assert!(is_valid_iata(" lax "));
        assert!(!is_valid_iata("JFKX"));
        assert!(!is_valid_iata("J1K"));
    }
}
