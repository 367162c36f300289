//! Name normalization
//!
//! Pure string transforms that turn raw catalog names into stable identifiers.
//! The same input always yields the same output, which is what lets a second
//! run land on the names the first run produced.

use modelsync_core::EntityNaming;
use regex::Regex;
use std::sync::OnceLock;

/// Suffix appended when a member would share its container's name
pub const CONTAINER_SUFFIX: &str = "Value";

/// Prefix for identifiers that start with a digit or shadow a reserved name
pub const IDENTIFIER_MARKER: &str = "_";

/// Names that clash with built-in type names in generated code
const RESERVED: &[&str] = &[
    "Object", "String", "Void", "Boolean", "Int32", "Int64", "Decimal", "Double", "Guid", "DateTime",
];

/// What kind of catalog object a name belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Table,
    View,
    TableType,
    Column,
    Procedure,
    Parameter,
    Index,
}

impl NameKind {
    /// Conventional Hungarian prefixes stripped for this kind
    fn prefixes(&self) -> &'static [&'static str] {
        match self {
            Self::Table | Self::View | Self::TableType => &["tbl"],
            Self::Column => &["col", "pk"],
            Self::Procedure => &["prc"],
            Self::Parameter | Self::Index => &[],
        }
    }
}

fn word_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\p{L}\p{N}]+").expect("valid word boundary regex"))
}

fn is_separator(c: char) -> bool {
    matches!(c, '_' | ' ' | '-' | '.')
}

/// Strip a leading Hungarian prefix such as `tbl` in `tblCustomer` or `PK_Customer`
fn strip_prefix<'a>(raw: &'a str, kind: NameKind) -> &'a str {
    for prefix in kind.prefixes() {
        let n = prefix.len();
        if raw.len() <= n || !raw.is_char_boundary(n) {
            continue;
        }

        let (head, rest) = raw.split_at(n);
        let Some(next) = rest.chars().next() else { continue };

        // `tblCustomer` / `tbl_customer`, or `PK_Customer`; never `COLUMN_NAME`
        let stripped = (head == *prefix && (next.is_uppercase() || is_separator(next)))
            || (head.eq_ignore_ascii_case(prefix) && is_separator(next));

        if stripped {
            let remainder = rest.trim_start_matches(is_separator);
            if !remainder.is_empty() {
                return remainder;
            }
        }
    }

    raw
}

/// Spell out punctuation that carries meaning
fn expand_symbols(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '#' => out.push_str(" Hash "),
            '%' => out.push_str(" Percent "),
            '$' => out.push_str(" Dollar "),
            '?' => out.push_str(" Question "),
            '!' => out.push_str(" Exclamation "),
            _ => out.push(c),
        }
    }
    out
}

/// Upper-case the first character of every word and join them
fn pascal_case(text: &str) -> String {
    word_boundary()
        .split(text)
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// `CustomerID` -> `CustomerId`, `ID` -> `Id`; `PAID` stays as is
fn fix_trailing_id(name: String) -> String {
    if name == "ID" {
        return "Id".to_string();
    }

    if let Some(stem) = name.strip_suffix("ID") {
        if stem.chars().last().is_some_and(|c| c.is_lowercase() || c.is_numeric()) {
            return format!("{}Id", stem);
        }
    }

    name
}

/// Prefix identifiers that cannot stand on their own
fn guard_identifier(name: String) -> String {
    let digit_leading = name.chars().next().is_some_and(|c| c.is_numeric());
    if digit_leading || RESERVED.contains(&name.as_str()) {
        format!("{}{}", IDENTIFIER_MARKER, name)
    } else {
        name
    }
}

/// Normalize a raw catalog name into an identifier
///
/// `container` is the name of the node that will own the result (the class
/// for a column, the procedure for a parameter). A result equal to it gets
/// [`CONTAINER_SUFFIX`] appended.
pub fn normalize(raw: &str, kind: NameKind, container: Option<&str>) -> String {
    let trimmed = raw.trim();
    let trimmed = if kind == NameKind::Parameter {
        trimmed.trim_start_matches('@')
    } else {
        trimmed
    };

    let stripped = strip_prefix(trimmed, kind);
    let mut name = pascal_case(&expand_symbols(stripped));

    if name.is_empty() {
        name = "Unnamed".to_string();
    }

    let name = guard_identifier(fix_trailing_id(name));

    match container {
        Some(owner) if owner.eq_ignore_ascii_case(&name) => format!("{}{}", name, CONTAINER_SUFFIX),
        _ => name,
    }
}

/// Class name for a table or view under the configured convention
pub fn entity_name(raw: &str, kind: NameKind, convention: EntityNaming) -> String {
    let normalized = normalize(raw, kind, None);
    match convention {
        EntityNaming::MatchTableName => normalized,
        EntityNaming::Singularize => {
            let singular = singularize(&normalized);
            if singular == normalized {
                singular
            } else {
                guard_identifier(singular)
            }
        }
    }
}

/// Irregular plurals, lowercase
const IRREGULAR: &[(&str, &str)] = &[
    ("people", "person"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("teeth", "tooth"),
    ("feet", "foot"),
    ("criteria", "criterion"),
    ("statuses", "status"),
    ("aliases", "alias"),
];

/// Words that are the same in singular and plural, lowercase
const UNCOUNTABLE: &[&str] = &["series", "species", "news", "information", "equipment", "data", "metadata"];

/// Singularize the last word of a PascalCase identifier
pub fn singularize(name: &str) -> String {
    let start = last_word_start(name);
    let (head, word) = name.split_at(start);
    format!("{}{}", head, singularize_word(word))
}

/// Byte offset of the last PascalCase word
fn last_word_start(name: &str) -> usize {
    let chars: Vec<(usize, char)> = name.char_indices().collect();
    for i in (1..chars.len()).rev() {
        let (pos, c) = chars[i];
        let prev = chars[i - 1].1;
        if c.is_uppercase() && (prev.is_lowercase() || prev.is_numeric()) {
            return pos;
        }
    }
    0
}

fn singularize_word(word: &str) -> String {
    let lower = word.to_lowercase();
    let shouting = word.len() > 1 && word.chars().all(|c| !c.is_lowercase());

    let respell = |keep: usize, ending: &str| -> String {
        let ending = if shouting { ending.to_uppercase() } else { ending.to_string() };
        format!("{}{}", &word[..keep], ending)
    };

    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }

    if let Some((_, singular)) = IRREGULAR.iter().find(|(plural, _)| lower == *plural) {
        let first_upper = word.chars().next().is_some_and(|c| c.is_uppercase());
        return match (shouting, first_upper) {
            (true, _) => singular.to_uppercase(),
            (false, true) => pascal_case(singular),
            (false, false) => singular.to_string(),
        };
    }

    if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") || !lower.ends_with('s') {
        return word.to_string();
    }

    if lower.len() > 3 && lower.ends_with("ies") {
        return respell(word.len() - 3, "y");
    }

    for ending in ["sses", "xes", "ches", "shes", "zes"] {
        if lower.ends_with(ending) {
            return word[..word.len() - 2].to_string();
        }
    }

    word[..word.len() - 1].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_cases_separated_words() {
        assert_eq!(normalize("order_items", NameKind::Table, None), "OrderItems");
        assert_eq!(normalize("first name", NameKind::Column, None), "FirstName");
        assert_eq!(normalize("ship-to.address", NameKind::Column, None), "ShipToAddress");
        assert_eq!(normalize("  customer__id ", NameKind::Column, None), "CustomerId");
    }

    #[test]
    fn strips_hungarian_prefixes() {
        assert_eq!(normalize("tblCustomer", NameKind::Table, None), "Customer");
        assert_eq!(normalize("tbl_customer", NameKind::Table, None), "Customer");
        assert_eq!(normalize("colFirstName", NameKind::Column, None), "FirstName");
        assert_eq!(normalize("PK_OrderId", NameKind::Column, None), "OrderId");
        assert_eq!(normalize("prcGetOrders", NameKind::Procedure, None), "GetOrders");
    }

    #[test]
    fn keeps_words_that_only_look_prefixed() {
        assert_eq!(normalize("Colour", NameKind::Column, None), "Colour");
        assert_eq!(normalize("COLUMN_NAME", NameKind::Column, None), "COLUMNNAME");
        assert_eq!(normalize("tbl", NameKind::Table, None), "Tbl");
        assert_eq!(normalize("Tables", NameKind::Table, None), "Tables");
    }

    #[test]
    fn spells_out_symbols() {
        assert_eq!(normalize("Order#", NameKind::Column, None), "OrderHash");
        assert_eq!(normalize("discount%", NameKind::Column, None), "DiscountPercent");
        assert_eq!(normalize("price$", NameKind::Column, None), "PriceDollar");
        assert_eq!(normalize("is_active?", NameKind::Column, None), "IsActiveQuestion");
        assert_eq!(normalize("urgent!", NameKind::Column, None), "UrgentExclamation");
    }

    #[test]
    fn strips_unsuitable_characters() {
        assert_eq!(normalize("[Order Total]", NameKind::Column, None), "OrderTotal");
        assert_eq!(normalize("amount(usd)", NameKind::Column, None), "AmountUsd");
        assert_eq!(normalize("()", NameKind::Column, None), "Unnamed");
    }

    #[test]
    fn fixes_trailing_id() {
        assert_eq!(normalize("CustomerID", NameKind::Column, None), "CustomerId");
        assert_eq!(normalize("ID", NameKind::Column, None), "Id");
        assert_eq!(normalize("customer_ID", NameKind::Column, None), "CustomerId");
        assert_eq!(normalize("PAID", NameKind::Column, None), "PAID");
    }

    #[test]
    fn guards_digit_leading_and_reserved() {
        assert_eq!(normalize("2fa_codes", NameKind::Table, None), "_2faCodes");
        assert_eq!(normalize("object", NameKind::Table, None), "_Object");
        assert_eq!(normalize("Objects", NameKind::Table, None), "Objects");
    }

    #[test]
    fn disambiguates_container_name() {
        assert_eq!(normalize("customer", NameKind::Column, Some("Customer")), "CustomerValue");
        assert_eq!(normalize("Name", NameKind::Column, Some("Customer")), "Name");
    }

    #[test]
    fn strips_parameter_marker() {
        assert_eq!(normalize("@customer_id", NameKind::Parameter, None), "CustomerId");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["tblOrder_Items", "customer_ID", "Amount%", "2fa", "[x y]"] {
            let once = normalize(raw, NameKind::Column, None);
            assert_eq!(normalize(&once, NameKind::Column, None), once, "{}", raw);
        }
    }

    #[test]
    fn singularizes_last_word() {
        assert_eq!(singularize("Customers"), "Customer");
        assert_eq!(singularize("OrderItems"), "OrderItem");
        assert_eq!(singularize("Categories"), "Category");
        assert_eq!(singularize("Addresses"), "Address");
        assert_eq!(singularize("Boxes"), "Box");
        assert_eq!(singularize("Batches"), "Batch");
        assert_eq!(singularize("People"), "Person");
        assert_eq!(singularize("SalesPeople"), "SalesPerson");
        assert_eq!(singularize("OrderStatuses"), "OrderStatus");
        assert_eq!(singularize("CUSTOMERS"), "CUSTOMER");
    }

    #[test]
    fn singular_words_stay_put() {
        for word in ["Customer", "Address", "Status", "Analysis", "Series", "Order", "Data"] {
            assert_eq!(singularize(word), word);
        }
    }

    #[test]
    fn entity_names_follow_convention() {
        assert_eq!(entity_name("tblCustomers", NameKind::Table, EntityNaming::Singularize), "Customer");
        assert_eq!(entity_name("tblCustomers", NameKind::Table, EntityNaming::MatchTableName), "Customers");
        assert_eq!(entity_name("Strings", NameKind::Table, EntityNaming::Singularize), "_String");
    }
}
