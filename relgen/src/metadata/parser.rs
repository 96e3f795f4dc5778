use super::types::ModelSet;
use crate::error::Result;
use std::path::Path;

/// Parse a models.yaml file into a ModelSet
pub fn parse_models(path: &Path) -> Result<ModelSet> {
    let content = std::fs::read_to_string(path)?;
    parse_models_str(&content)
}

/// Parse a model definition YAML string into a ModelSet
pub fn parse_models_str(content: &str) -> Result<ModelSet> {
    let models: ModelSet = serde_yaml::from_str(content)?;
    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FieldKind, ScalarKind};

    #[test]
    fn test_parse_models_str() {
        let models = parse_models_str(
            r#"
entities:
  - name: User
    fields:
      - { name: ID, type: int, rules: "primaryKey;autoIncrement" }
      - { name: Name, type: text, rules: "default:''" }
      - { name: RoleID, type: int64, rules: "foreignKey:Role.ID" }
  - name: Role
    fields:
      - { name: ID, type: int64 }
"#,
        )
        .unwrap();

        assert_eq!(models.entities.len(), 2);
        let user = &models.entities[0];
        assert_eq!(user.name, "User");
        assert_eq!(user.fields.len(), 3);
        assert_eq!(user.fields[0].kind, FieldKind::Scalar(ScalarKind::Int));
        assert_eq!(user.fields[2].rules, "foreignKey:Role.ID");
        assert!(!user.skip);
    }

    #[test]
    fn test_parse_column_override() {
        let models = parse_models_str(
            r#"
entities:
  - name: Event
    fields:
      - { name: Kind, column: event_kind, type: text }
"#,
        )
        .unwrap();
        assert_eq!(
            models.entities[0].fields[0].column.as_deref(),
            Some("event_kind")
        );
    }
}
