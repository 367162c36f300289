//! SQL Server type mapping
//!
//! Maps catalog type names to [`SemanticType`]. Unknown types yield `None` and
//! are left untyped by the caller.

use modelsync_core::SemanticType;

/// Normalize a type name: lowercase, without size arguments
fn base_type(sql_type: &str) -> String {
    let lower = sql_type.trim().to_lowercase();
    match lower.find('(') {
        Some(pos) => lower[..pos].trim().to_string(),
        None => lower,
    }
}

/// Map a SQL Server type name to a semantic type
pub fn map_sql_type(sql_type: &str) -> Option<SemanticType> {
    let ty = match base_type(sql_type).as_str() {
        // Numeric types
        "bigint" => SemanticType::Long,
        "int" | "integer" => SemanticType::Int,
        "smallint" => SemanticType::Short,
        "tinyint" => SemanticType::Byte,
        "bit" => SemanticType::Bool,
        "decimal" | "numeric" | "money" | "smallmoney" => SemanticType::Decimal,
        "float" => SemanticType::Double,
        "real" => SemanticType::Float,

        // Character types
        "char" | "varchar" | "text" | "nchar" | "nvarchar" | "ntext" | "sysname" | "xml" => {
            SemanticType::String
        }

        // Date/time types
        "date" => SemanticType::Date,
        "time" => SemanticType::Time,
        "datetime" | "datetime2" | "smalldatetime" => SemanticType::DateTime,
        "datetimeoffset" => SemanticType::DateTimeOffset,

        // Other types
        "uniqueidentifier" => SemanticType::Guid,
        "binary" | "varbinary" | "image" | "timestamp" | "rowversion" => SemanticType::Binary,

        _ => return None,
    };

    Some(ty)
}

/// Whether the type carries a character length
pub fn is_text_type(sql_type: &str) -> bool {
    matches!(
        base_type(sql_type).as_str(),
        "char" | "varchar" | "text" | "nchar" | "nvarchar" | "ntext"
    )
}

/// Whether the type stores unicode text
pub fn is_unicode_type(sql_type: &str) -> bool {
    matches!(base_type(sql_type).as_str(), "nchar" | "nvarchar" | "ntext")
}

/// Whether the type carries precision and scale
pub fn is_decimal_type(sql_type: &str) -> bool {
    matches!(base_type(sql_type).as_str(), "decimal" | "numeric")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_type_mapping() {
        assert_eq!(map_sql_type("int"), Some(SemanticType::Int));
        assert_eq!(map_sql_type("BIGINT"), Some(SemanticType::Long));
        assert_eq!(map_sql_type("bit"), Some(SemanticType::Bool));
        assert_eq!(map_sql_type("uniqueidentifier"), Some(SemanticType::Guid));
        assert_eq!(map_sql_type("datetime2"), Some(SemanticType::DateTime));
        assert_eq!(map_sql_type("rowversion"), Some(SemanticType::Binary));
    }

    #[test]
    fn test_type_with_arguments() {
        assert_eq!(map_sql_type("nvarchar(max)"), Some(SemanticType::String));
        assert_eq!(map_sql_type("decimal(10, 2)"), Some(SemanticType::Decimal));
    }

    #[test]
    fn test_unknown_types() {
        assert_eq!(map_sql_type("sql_variant"), None);
        assert_eq!(map_sql_type("geography"), None);
        assert_eq!(map_sql_type("hierarchyid"), None);
    }

    #[test]
    fn test_type_families() {
        assert!(is_text_type("varchar(50)"));
        assert!(is_unicode_type("NVARCHAR"));
        assert!(!is_unicode_type("varchar"));
        assert!(is_decimal_type("numeric(18,4)"));
        assert!(!is_decimal_type("money"));
    }
}
