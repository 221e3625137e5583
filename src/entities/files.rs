use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub uploaded_at: DateTimeUtc,
    /// Storage key of the uploaded blob, e.g. `uploads/<uuid>/a.txt`
    pub file: String,
    pub size: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Display name of the stored file: the last segment of its storage key.
    pub fn name(&self) -> &str {
        self.file.rsplit('/').next().unwrap_or(&self.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_name_is_last_key_segment() {
        let model = Model {
            id: 1,
            uploaded_at: Utc::now(),
            file: "uploads/0b4c/report.pdf".to_string(),
            size: 10,
        };
        assert_eq!(model.name(), "report.pdf");

        let flat = Model {
            file: "plain.txt".to_string(),
            ..model
        };
        assert_eq!(flat.name(), "plain.txt");
    }
}
