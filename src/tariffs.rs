//! Built-in tariff table
//!
//! Default per-minute rates for Italian outbound traffic. Hosts normally
//! replace this table with their own (see [`PrefixTable::load_from_file`]),
//! so the values here only have to be plausible, not contractual.
//!
//! Shorter prefixes act as catch-alls for the longer ones below them: `3`
//! catches any mobile range not listed, `0` any geographic district, `1`
//! any service number.

use crate::models::{CategoryType, PrefixRule};
use crate::prefix_table::PrefixTable;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const GEOGRAPHIC: &[(&str, &str)] = &[
    ("010", "Genova"),
    ("011", "Torino"),
    ("02", "Milano"),
    ("030", "Brescia"),
    ("035", "Bergamo"),
    ("040", "Trieste"),
    ("041", "Venezia"),
    ("045", "Verona"),
    ("049", "Padova"),
    ("050", "Pisa"),
    ("051", "Bologna"),
    ("055", "Firenze"),
    ("059", "Modena"),
    ("06", "Roma"),
    ("070", "Cagliari"),
    ("071", "Ancona"),
    ("075", "Perugia"),
    ("080", "Bari"),
    ("081", "Napoli"),
    ("089", "Salerno"),
    ("090", "Messina"),
    ("091", "Palermo"),
    ("095", "Catania"),
    ("0961", "Catanzaro"),
    ("0965", "Reggio Calabria"),
];

const MOBILE_OPERATORS: &[(&str, &str)] = &[
    ("320", "WindTre"),
    ("324", "WindTre"),
    ("327", "WindTre"),
    ("328", "WindTre"),
    ("329", "WindTre"),
    ("330", "TIM"),
    ("331", "TIM"),
    ("333", "TIM"),
    ("334", "TIM"),
    ("335", "TIM"),
    ("336", "TIM"),
    ("337", "TIM"),
    ("338", "TIM"),
    ("339", "TIM"),
    ("340", "Vodafone"),
    ("342", "Vodafone"),
    ("345", "Vodafone"),
    ("346", "Vodafone"),
    ("347", "Vodafone"),
    ("348", "Vodafone"),
    ("349", "Vodafone"),
    ("351", "Iliad"),
    ("352", "Iliad"),
    ("371", "PosteMobile"),
    ("377", "PosteMobile"),
    ("380", "WindTre"),
    ("383", "WindTre"),
    ("388", "WindTre"),
    ("389", "WindTre"),
    ("391", "WindTre"),
    ("392", "WindTre"),
    ("393", "WindTre"),
];

/// (prefix, description, rate)
const INTERNATIONAL: &[(&str, &str, Decimal)] = &[
    ("001", "Stati Uniti e Canada", dec!(0.03)),
    ("007", "Russia", dec!(0.20)),
    ("0030", "Grecia", dec!(0.08)),
    ("0031", "Paesi Bassi Fisso", dec!(0.05)),
    ("00316", "Paesi Bassi Mobile", dec!(0.15)),
    ("0032", "Belgio Fisso", dec!(0.05)),
    ("00324", "Belgio Mobile", dec!(0.15)),
    ("0033", "Francia Fisso", dec!(0.05)),
    ("00336", "Francia Mobile", dec!(0.12)),
    ("00337", "Francia Mobile", dec!(0.12)),
    ("0034", "Spagna Fisso", dec!(0.05)),
    ("00346", "Spagna Mobile", dec!(0.12)),
    ("00347", "Spagna Mobile", dec!(0.12)),
    ("00351", "Portogallo Fisso", dec!(0.06)),
    ("003519", "Portogallo Mobile", dec!(0.15)),
    ("00355", "Albania", dec!(0.25)),
    ("00378", "San Marino", dec!(0.10)),
    ("0040", "Romania Fisso", dec!(0.08)),
    ("00407", "Romania Mobile", dec!(0.18)),
    ("0041", "Svizzera Fisso", dec!(0.08)),
    ("004176", "Svizzera Mobile", dec!(0.30)),
    ("004177", "Svizzera Mobile", dec!(0.30)),
    ("004178", "Svizzera Mobile", dec!(0.30)),
    ("004179", "Svizzera Mobile", dec!(0.30)),
    ("0043", "Austria Fisso", dec!(0.06)),
    ("00436", "Austria Mobile", dec!(0.18)),
    ("0044", "Regno Unito Fisso", dec!(0.05)),
    ("00447", "Regno Unito Mobile", dec!(0.15)),
    ("0048", "Polonia", dec!(0.08)),
    ("0049", "Germania Fisso", dec!(0.05)),
    ("004915", "Germania Mobile", dec!(0.15)),
    ("004916", "Germania Mobile", dec!(0.15)),
    ("004917", "Germania Mobile", dec!(0.15)),
    ("0054", "Argentina", dec!(0.20)),
    ("0055", "Brasile", dec!(0.20)),
    ("0061", "Australia", dec!(0.20)),
    ("0086", "Cina", dec!(0.10)),
    ("0091", "India", dec!(0.12)),
    ("00212", "Marocco", dec!(0.35)),
];

pub const GEOGRAPHIC_RATE: Decimal = dec!(0.03);
pub const GENERIC_LANDLINE_RATE: Decimal = dec!(0.05);
pub const MOBILE_RATE: Decimal = dec!(0.15);

pub fn default_rules() -> Vec<PrefixRule> {
    let mut rules = Vec::with_capacity(
        GEOGRAPHIC.len() + MOBILE_OPERATORS.len() + INTERNATIONAL.len() + 10,
    );

    for (prefix, city) in GEOGRAPHIC {
        rules.push(PrefixRule::new(*prefix, CategoryType::Landline, *city, GEOGRAPHIC_RATE));
    }
    rules.push(PrefixRule::new(
        "0",
        CategoryType::Landline,
        "Fisso",
        GENERIC_LANDLINE_RATE,
    ));

    for (prefix, operator) in MOBILE_OPERATORS {
        rules.push(PrefixRule::new(*prefix, CategoryType::Mobile, *operator, MOBILE_RATE));
    }
    rules.push(PrefixRule::new("3", CategoryType::Mobile, "Mobile", MOBILE_RATE));

    rules.push(PrefixRule::new("800", CategoryType::Special, "Numero Verde", Decimal::ZERO));
    rules.push(PrefixRule::new("803", CategoryType::Special, "Numero Verde", Decimal::ZERO));
    rules.push(PrefixRule::new("892", CategoryType::Special, "Numero Premium", dec!(0.90)));
    rules.push(PrefixRule::new("895", CategoryType::Special, "Numero Premium", dec!(1.50)));
    rules.push(PrefixRule::new("899", CategoryType::Special, "Numero Premium", dec!(1.50)));
    rules.push(PrefixRule::new(
        "199",
        CategoryType::Special,
        "Numero a tariffazione specifica",
        dec!(0.12),
    ));
    rules.push(PrefixRule::new("1", CategoryType::Special, "Servizi", Decimal::ZERO));

    for (prefix, country, rate) in INTERNATIONAL {
        rules.push(PrefixRule::new(*prefix, CategoryType::International, *country, *rate));
    }

    rules
}

pub fn default_prefix_table() -> PrefixTable {
    // The literals above are all well-formed; fall back to an empty table
    // rather than panic if that ever stops being true.
    PrefixTable::new(default_rules()).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Built-in prefix table is invalid");
        PrefixTable::empty()
    })
}
