use crate::error::{RelgenError, Result};

/// Referential action vocabulary for ON DELETE / ON UPDATE clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
}

impl ReferentialAction {
    /// The SQL rendering of this action.
    pub fn as_sql(self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::Restrict => "RESTRICT",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "cascade" => Some(ReferentialAction::Cascade),
            "set_null" => Some(ReferentialAction::SetNull),
            "set_default" => Some(ReferentialAction::SetDefault),
            "restrict" => Some(ReferentialAction::Restrict),
            _ => None,
        }
    }
}

/// A parsed `foreignKey:Entity.Field` rule value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRule {
    pub target_entity: String,
    pub target_field: String,
}

/// Typed per-field rule configuration, converted once from the raw
/// `;`-separated `key[:value]` tokens during graph building. Downstream
/// components never re-parse rule strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldRules {
    pub skip: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub unique: bool,
    pub unique_index: bool,
    pub unique_index_name: Option<String>,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub check: Option<String>,
    pub constraint: Option<String>,
    pub type_override: Option<String>,
    pub foreign_key: Option<ForeignKeyRule>,
    pub many_to_many: Option<String>,
    pub embedded: bool,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

/// Parse the raw rule tokens of one field into a [`FieldRules`] value.
///
/// The field carrying a lone `-` token is marked skipped. Unknown rule keys
/// are ignored with a warning.
pub fn parse_rules(entity: &str, field: &str, raw: &str) -> Result<FieldRules> {
    let mut rules = FieldRules::default();

    for token in raw.split(';') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if token == "-" {
            rules.skip = true;
            continue;
        }

        let (key, value) = match token.split_once(':') {
            Some((key, value)) => (key.trim(), Some(value.trim())),
            None => (token, None),
        };

        match key {
            "primaryKey" => rules.primary_key = true,
            "autoIncrement" => rules.auto_increment = true,
            "unique" => rules.unique = true,
            "uniqueIndex" => {
                rules.unique_index = true;
                rules.unique_index_name = value.map(str::to_string);
            }
            "null" => rules.nullable = true,
            "default" => rules.default_value = Some(require_value(entity, field, key, value)?),
            "check" => rules.check = Some(require_value(entity, field, key, value)?),
            "constraint" => rules.constraint = Some(require_value(entity, field, key, value)?),
            "type" => rules.type_override = Some(require_value(entity, field, key, value)?),
            "foreignKey" => {
                let value = require_value(entity, field, key, value)?;
                let mut parts = value.split('.');
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(target_entity), Some(target_field), None)
                        if !target_entity.is_empty() && !target_field.is_empty() =>
                    {
                        rules.foreign_key = Some(ForeignKeyRule {
                            target_entity: target_entity.to_string(),
                            target_field: target_field.to_string(),
                        });
                    }
                    _ => {
                        return Err(RelgenError::Configuration {
                            entity: entity.to_string(),
                            field: field.to_string(),
                            message: format!(
                                "foreign key declaration '{value}' must be in the form 'Entity.Field'"
                            ),
                        });
                    }
                }
            }
            "many2many" => rules.many_to_many = Some(require_value(entity, field, key, value)?),
            "ref" => rules.embedded = true,
            "onDelete" => rules.on_delete = Some(parse_action(entity, field, value)?),
            "onUpdate" => rules.on_update = Some(parse_action(entity, field, value)?),
            other => log::warn!("ignoring unknown rule '{other}' on {entity}.{field}"),
        }
    }

    Ok(rules)
}

fn require_value(entity: &str, field: &str, key: &str, value: Option<&str>) -> Result<String> {
    match value {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(RelgenError::Configuration {
            entity: entity.to_string(),
            field: field.to_string(),
            message: format!("rule '{key}' requires a value"),
        }),
    }
}

fn parse_action(entity: &str, field: &str, value: Option<&str>) -> Result<ReferentialAction> {
    let value = value.unwrap_or_default();
    ReferentialAction::parse(value).ok_or_else(|| RelgenError::UnknownConstraint {
        entity: entity.to_string(),
        field: field.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelgenError;

    #[test]
    fn test_parse_bare_and_valued_rules() {
        let rules = parse_rules("User", "ID", "primaryKey;autoIncrement").unwrap();
        assert!(rules.primary_key);
        assert!(rules.auto_increment);
        assert!(!rules.unique);

        let rules = parse_rules("User", "Name", "unique;default:''").unwrap();
        assert!(rules.unique);
        assert_eq!(rules.default_value.as_deref(), Some("''"));
    }

    #[test]
    fn test_parse_foreign_key() {
        let rules = parse_rules("User", "RoleID", "foreignKey:Role.ID;onDelete:cascade").unwrap();
        let fk = rules.foreign_key.unwrap();
        assert_eq!(fk.target_entity, "Role");
        assert_eq!(fk.target_field, "ID");
        assert_eq!(rules.on_delete, Some(ReferentialAction::Cascade));
    }

    #[test]
    fn test_malformed_foreign_key_is_configuration_error() {
        for bad in ["foreignKey:Role", "foreignKey:Role.ID.Extra", "foreignKey:.ID"] {
            let err = parse_rules("User", "RoleID", bad).unwrap_err();
            match err {
                RelgenError::Configuration { entity, field, .. } => {
                    assert_eq!(entity, "User");
                    assert_eq!(field, "RoleID");
                }
                other => panic!("expected Configuration error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_unknown_action_is_unknown_constraint_error() {
        let err = parse_rules("User", "RoleID", "foreignKey:Role.ID;onDelete:explode").unwrap_err();
        match err {
            RelgenError::UnknownConstraint { value, .. } => assert_eq!(value, "explode"),
            other => panic!("expected UnknownConstraint error, got {other:?}"),
        }
    }

    #[test]
    fn test_actions_parse_case_insensitively() {
        let rules = parse_rules("User", "RoleID", "foreignKey:Role.ID;onUpdate:SET_NULL").unwrap();
        assert_eq!(rules.on_update, Some(ReferentialAction::SetNull));
    }

    #[test]
    fn test_skip_marker() {
        let rules = parse_rules("User", "Internal", "-").unwrap();
        assert!(rules.skip);
    }

    #[test]
    fn test_unique_index_with_and_without_name() {
        let rules = parse_rules("User", "Email", "uniqueIndex").unwrap();
        assert!(rules.unique_index);
        assert_eq!(rules.unique_index_name, None);

        let rules = parse_rules("User", "Email", "uniqueIndex:user_email_key").unwrap();
        assert_eq!(rules.unique_index_name.as_deref(), Some("user_email_key"));
    }

    #[test]
    fn test_unknown_rules_are_ignored() {
        let rules = parse_rules("User", "Name", "frobnicate;unique").unwrap();
        assert!(rules.unique);
    }
}
