//! Country name normalization
//!
//! The chat platform records the visitor's country as free text. Dashboards plot
//! ISO 3166-1 alpha-2 codes, so names are mapped through a static table. The first
//! entry for a code is its display name; later entries with the same code are aliases.

/// Country display names and aliases mapped to ISO alpha-2 codes
pub const COUNTRIES: &[(&str, &str)] = &[
    // North America
    ("United States", "US"),
    ("USA", "US"),
    ("United States of America", "US"),
    ("US", "US"),
    ("Canada", "CA"),
    ("Mexico", "MX"),
    ("Guatemala", "GT"),
    ("Belize", "BZ"),
    ("Honduras", "HN"),
    ("El Salvador", "SV"),
    ("Nicaragua", "NI"),
    ("Costa Rica", "CR"),
    ("Panama", "PA"),
    ("Cuba", "CU"),
    ("Jamaica", "JM"),
    ("Haiti", "HT"),
    ("Dominican Republic", "DO"),
    ("Puerto Rico", "PR"),
    ("Bahamas", "BS"),
    ("Trinidad and Tobago", "TT"),
    ("Barbados", "BB"),
    ("Greenland", "GL"),
    // South America
    ("Brazil", "BR"),
    ("Brasil", "BR"),
    ("Argentina", "AR"),
    ("Chile", "CL"),
    ("Colombia", "CO"),
    ("Peru", "PE"),
    ("Venezuela", "VE"),
    ("Ecuador", "EC"),
    ("Bolivia", "BO"),
    ("Paraguay", "PY"),
    ("Uruguay", "UY"),
    ("Guyana", "GY"),
    ("Suriname", "SR"),
    // Europe
    ("United Kingdom", "GB"),
    ("UK", "GB"),
    ("Great Britain", "GB"),
    ("England", "GB"),
    ("Scotland", "GB"),
    ("Wales", "GB"),
    ("Northern Ireland", "GB"),
    ("Ireland", "IE"),
    ("France", "FR"),
    ("Germany", "DE"),
    ("Deutschland", "DE"),
    ("Italy", "IT"),
    ("Spain", "ES"),
    ("Portugal", "PT"),
    ("Netherlands", "NL"),
    ("The Netherlands", "NL"),
    ("Holland", "NL"),
    ("Belgium", "BE"),
    ("Luxembourg", "LU"),
    ("Switzerland", "CH"),
    ("Austria", "AT"),
    ("Denmark", "DK"),
    ("Norway", "NO"),
    ("Sweden", "SE"),
    ("Finland", "FI"),
    ("Iceland", "IS"),
    ("Poland", "PL"),
    ("Czechia", "CZ"),
    ("Czech Republic", "CZ"),
    ("Slovakia", "SK"),
    ("Hungary", "HU"),
    ("Romania", "RO"),
    ("Bulgaria", "BG"),
    ("Greece", "GR"),
    ("Croatia", "HR"),
    ("Slovenia", "SI"),
    ("Serbia", "RS"),
    ("Bosnia and Herzegovina", "BA"),
    ("Montenegro", "ME"),
    ("North Macedonia", "MK"),
    ("Macedonia", "MK"),
    ("Albania", "AL"),
    ("Kosovo", "XK"),
    ("Estonia", "EE"),
    ("Latvia", "LV"),
    ("Lithuania", "LT"),
    ("Belarus", "BY"),
    ("Ukraine", "UA"),
    ("Moldova", "MD"),
    ("Russia", "RU"),
    ("Russian Federation", "RU"),
    ("Malta", "MT"),
    ("Cyprus", "CY"),
    ("Monaco", "MC"),
    ("Andorra", "AD"),
    ("Liechtenstein", "LI"),
    ("San Marino", "SM"),
    // Middle East
    ("Turkey", "TR"),
    ("Türkiye", "TR"),
    ("Israel", "IL"),
    ("Palestine", "PS"),
    ("Lebanon", "LB"),
    ("Jordan", "JO"),
    ("Syria", "SY"),
    ("Iraq", "IQ"),
    ("Iran", "IR"),
    ("Saudi Arabia", "SA"),
    ("United Arab Emirates", "AE"),
    ("UAE", "AE"),
    ("Qatar", "QA"),
    ("Kuwait", "KW"),
    ("Bahrain", "BH"),
    ("Oman", "OM"),
    ("Yemen", "YE"),
    // Asia
    ("China", "CN"),
    ("Hong Kong", "HK"),
    ("Macao", "MO"),
    ("Macau", "MO"),
    ("Taiwan", "TW"),
    ("Japan", "JP"),
    ("South Korea", "KR"),
    ("Korea", "KR"),
    ("Republic of Korea", "KR"),
    ("North Korea", "KP"),
    ("Mongolia", "MN"),
    ("India", "IN"),
    ("Pakistan", "PK"),
    ("Bangladesh", "BD"),
    ("Sri Lanka", "LK"),
    ("Nepal", "NP"),
    ("Bhutan", "BT"),
    ("Maldives", "MV"),
    ("Afghanistan", "AF"),
    ("Kazakhstan", "KZ"),
    ("Uzbekistan", "UZ"),
    ("Turkmenistan", "TM"),
    ("Kyrgyzstan", "KG"),
    ("Tajikistan", "TJ"),
    ("Armenia", "AM"),
    ("Azerbaijan", "AZ"),
    ("Georgia", "GE"),
    ("Thailand", "TH"),
    ("Vietnam", "VN"),
    ("Viet Nam", "VN"),
    ("Cambodia", "KH"),
    ("Laos", "LA"),
    ("Myanmar", "MM"),
    ("Malaysia", "MY"),
    ("Singapore", "SG"),
    ("Indonesia", "ID"),
    ("Philippines", "PH"),
    ("Brunei", "BN"),
    ("Timor-Leste", "TL"),
    // Oceania
    ("Australia", "AU"),
    ("New Zealand", "NZ"),
    ("Papua New Guinea", "PG"),
    ("Fiji", "FJ"),
    ("Samoa", "WS"),
    ("Tonga", "TO"),
    ("Vanuatu", "VU"),
    ("Solomon Islands", "SB"),
    ("New Caledonia", "NC"),
    ("French Polynesia", "PF"),
    // Africa
    ("South Africa", "ZA"),
    ("Egypt", "EG"),
    ("Morocco", "MA"),
    ("Algeria", "DZ"),
    ("Tunisia", "TN"),
    ("Libya", "LY"),
    ("Sudan", "SD"),
    ("South Sudan", "SS"),
    ("Ethiopia", "ET"),
    ("Eritrea", "ER"),
    ("Somalia", "SO"),
    ("Djibouti", "DJ"),
    ("Kenya", "KE"),
    ("Uganda", "UG"),
    ("Tanzania", "TZ"),
    ("Rwanda", "RW"),
    ("Burundi", "BI"),
    ("Nigeria", "NG"),
    ("Ghana", "GH"),
    ("Ivory Coast", "CI"),
    ("Côte d'Ivoire", "CI"),
    ("Cote d'Ivoire", "CI"),
    ("Senegal", "SN"),
    ("Mali", "ML"),
    ("Burkina Faso", "BF"),
    ("Niger", "NE"),
    ("Chad", "TD"),
    ("Cameroon", "CM"),
    ("Benin", "BJ"),
    ("Togo", "TG"),
    ("Guinea", "GN"),
    ("Sierra Leone", "SL"),
    ("Liberia", "LR"),
    ("Mauritania", "MR"),
    ("Gambia", "GM"),
    ("Gabon", "GA"),
    ("Congo", "CG"),
    ("Republic of the Congo", "CG"),
    ("Democratic Republic of the Congo", "CD"),
    ("DR Congo", "CD"),
    ("Angola", "AO"),
    ("Zambia", "ZM"),
    ("Zimbabwe", "ZW"),
    ("Mozambique", "MZ"),
    ("Malawi", "MW"),
    ("Botswana", "BW"),
    ("Namibia", "NA"),
    ("Lesotho", "LS"),
    ("Eswatini", "SZ"),
    ("Swaziland", "SZ"),
    ("Madagascar", "MG"),
    ("Mauritius", "MU"),
    ("Seychelles", "SC"),
    ("Reunion", "RE"),
    ("Réunion", "RE"),
];

/// Map a free-text country name to its ISO alpha-2 code.
///
/// Matching is exact and case-sensitive after trimming. Unknown names (including the
/// platform's `"0"` and `"undefined"` placeholders) return `None`.
pub fn normalize(name: &str) -> Option<&'static str> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    COUNTRIES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, code)| *code)
}

/// Display name for a code produced by [`normalize`]
pub fn display_name(code: &str) -> Option<&'static str> {
    COUNTRIES
        .iter()
        .find(|(_, known)| *known == code)
        .map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn aliases_share_a_code() {
        assert_eq!(normalize("Czechia"), Some("CZ"));
        assert_eq!(normalize("Czech Republic"), Some("CZ"));
        assert_eq!(normalize("USA"), Some("US"));
        assert_eq!(normalize("UK"), Some("GB"));
        assert_eq!(normalize("  France "), Some("FR"));
    }

    #[test]
    fn unknown_names_are_not_mapped() {
        assert_eq!(normalize("0"), None);
        assert_eq!(normalize("undefined"), None);
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("france"), None);
        assert_eq!(normalize("Atlantis"), None);
    }

    #[test]
    fn display_name_is_the_first_entry_for_a_code() {
        assert_eq!(display_name("US"), Some("United States"));
        assert_eq!(display_name("GB"), Some("United Kingdom"));
        assert_eq!(display_name("CZ"), Some("Czechia"));
        assert_eq!(display_name("ZZ"), None);
    }

    #[test]
    fn table_is_well_formed() {
        let mut names = HashSet::new();
        for (name, code) in COUNTRIES {
            assert!(names.insert(*name), "duplicate country name {name}");
            assert_eq!(code.len(), 2, "bad code for {name}");
            assert!(code.chars().all(|c| c.is_ascii_uppercase()), "bad code for {name}");
            // every code round-trips through its display name
            let display = display_name(code).unwrap();
            assert_eq!(normalize(display), Some(*code));
        }
        assert!(COUNTRIES.len() >= 150);
    }
}
